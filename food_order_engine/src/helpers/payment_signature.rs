//! # Payment proof signatures
//!
//! When the customer completes a checkout, the gateway hands the client a signature that proves that the payment
//! `payment_ref` was captured against the gateway order `order_ref`. The signature is
//!
//! ```text
//!    hex( HMAC-SHA256( key_secret, "{order_ref}|{payment_ref}" ) )
//! ```
//!
//! where `key_secret` is the merchant's gateway API secret, which the client never sees.
use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, order_ref: &str, payment_ref: &str) -> Result<HmacSha256, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(order_ref.as_bytes());
    mac.update(b"|");
    mac.update(payment_ref.as_bytes());
    Ok(mac)
}

/// Calculates the hex-encoded signature for a payment.
pub fn payment_signature(secret: &str, order_ref: &str, payment_ref: &str) -> Result<String, InvalidLength> {
    let mac = mac_for(secret, order_ref, payment_ref)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `proof` against the expected signature in constant time. A proof that is not valid hex is not valid.
pub fn verify_payment_signature(secret: &str, order_ref: &str, payment_ref: &str, proof: &str) -> bool {
    let Ok(proof) = hex::decode(proof.trim()) else {
        return false;
    };
    match mac_for(secret, order_ref, payment_ref) {
        Ok(mac) => mac.verify_slice(&proof).is_ok(),
        Err(_) => false,
    }
}
