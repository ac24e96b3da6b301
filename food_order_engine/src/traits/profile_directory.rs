use crate::{db_types::Role, traits::OrderFlowError};

/// Maps identity-provider user ids onto the profile ids that orders refer to.
#[allow(async_fn_in_trait)]
pub trait ProfileDirectory {
    async fn fetch_profile_id(&self, role: Role, user_id: &str) -> Result<Option<i64>, OrderFlowError>;
}
