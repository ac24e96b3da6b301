use std::time::Duration;

use fos_common::{Secret, DEFAULT_CURRENCY_CODE};
use log::*;

pub const DEFAULT_GATEWAY_URL: &str = "https://api.razorpay.com";
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base url of the gateway REST API, without a trailing slash.
    pub base_url: String,
    /// Public key id. Handed to clients so that they can open the gateway checkout.
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub currency: String,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            key_id: String::default(),
            key_secret: Secret::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("FOS_GATEWAY_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("🪛️ FOS_GATEWAY_URL not set, using {DEFAULT_GATEWAY_URL}");
                DEFAULT_GATEWAY_URL.to_string()
            });
        let key_id = std::env::var("FOS_GATEWAY_KEY_ID").unwrap_or_else(|_| {
            warn!("🪛️ FOS_GATEWAY_KEY_ID not set, using (probably useless) default");
            "rzp_test_00000000000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("FOS_GATEWAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ FOS_GATEWAY_KEY_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let currency = std::env::var("FOS_GATEWAY_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY_CODE.to_string());
        let timeout = std::env::var("FOS_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| match s.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    warn!("🪛️ FOS_GATEWAY_TIMEOUT_SECS is not a positive integer: {s}. Using the default.");
                    None
                },
            })
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        Self { base_url, key_id, key_secret, currency, timeout }
    }
}
