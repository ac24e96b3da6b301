use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for opening a payable transaction on the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct NewGatewayOrder {
    /// Amount in the currency's minor unit.
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub notes: HashMap<String, String>,
}

impl NewGatewayOrder {
    pub fn new(amount: u64, currency: &str, receipt: &str) -> Self {
        Self { amount, currency: currency.to_string(), receipt: receipt.to_string(), notes: HashMap::new() }
    }

    pub fn with_note<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.notes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: u32,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefundSpeed {
    #[default]
    Normal,
    Optimum,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundRequest {
    /// Amount in the currency's minor unit.
    pub amount: u64,
    pub speed: RefundSpeed,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub notes: HashMap<String, String>,
}

impl RefundRequest {
    pub fn new(amount: u64) -> Self {
        Self { amount, speed: RefundSpeed::default(), notes: HashMap::new() }
    }

    pub fn with_reason(mut self, reason: Option<&str>) -> Self {
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            self.notes.insert("reason".to_string(), reason.to_string());
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayRefund {
    pub id: String,
    pub payment_id: String,
    pub amount: u64,
    #[serde(default)]
    pub currency: Option<String>,
    pub status: String,
    #[serde(default)]
    pub speed_processed: Option<RefundSpeed>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}
