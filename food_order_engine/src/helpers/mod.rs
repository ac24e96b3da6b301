mod payment_signature;

pub use payment_signature::{payment_signature, verify_payment_signature};
