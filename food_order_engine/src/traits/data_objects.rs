use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// The order and payment rows as they were left by an atomic payment commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCommit {
    pub order: Order,
    pub payment: Payment,
}
