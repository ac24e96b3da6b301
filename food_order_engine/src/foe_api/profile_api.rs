use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, Role},
    traits::{OrderFlowError, ProfileDirectory},
};

/// Resolves authenticated user ids to the customer, restaurant or courier profile they act as.
pub struct ProfileApi<B> {
    db: B,
}

impl<B> Debug for ProfileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileApi")
    }
}

impl<B> ProfileApi<B>
where B: ProfileDirectory
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn resolve(&self, role: Role, user_id: &str) -> Result<Actor, OrderFlowError> {
        let id = self.db.fetch_profile_id(role, user_id).await?.ok_or_else(|| {
            debug!("🪪️ User {user_id} has no {role} profile");
            OrderFlowError::ProfileNotFound { role: role.to_string(), user_id: user_id.to_string() }
        })?;
        let actor = match role {
            Role::Customer => Actor::Customer(id),
            Role::Restaurant => Actor::Restaurant(id),
            Role::Courier => Actor::Courier(id),
        };
        Ok(actor)
    }
}
