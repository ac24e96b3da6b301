use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use crate::{
    db_types::Money,
    helpers::{payment_signature, verify_payment_signature},
    traits::{GatewayError, OpenTransaction, PaymentGateway},
};

pub const FAKE_GATEWAY_SECRET: &str = "fake-gateway-secret";

/// What the fake gateway does when it is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayBehaviour {
    #[default]
    Normal,
    Reject,
    Hang(Duration),
}

/// An in-memory [`PaymentGateway`] that signs payments with [`FAKE_GATEWAY_SECRET`] and records the calls made to it.
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    behaviour: Arc<Mutex<GatewayBehaviour>>,
    counter: Arc<AtomicU64>,
    pub opened: Arc<Mutex<Vec<OpenTransaction>>>,
    pub refunds: Arc<Mutex<Vec<(String, Money)>>>,
}

impl FakeGateway {
    pub fn set_behaviour(&self, behaviour: GatewayBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    /// The signature a real checkout would hand back to the client.
    pub fn sign(order_ref: &str, payment_ref: &str) -> String {
        payment_signature(FAKE_GATEWAY_SECRET, order_ref, payment_ref).unwrap()
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.lock().unwrap().len()
    }

    async fn behave(&self) -> Result<(), GatewayError> {
        let behaviour = *self.behaviour.lock().unwrap();
        match behaviour {
            GatewayBehaviour::Normal => Ok(()),
            GatewayBehaviour::Reject => Err(GatewayError::Rejected("BAD_REQUEST_ERROR".into())),
            GatewayBehaviour::Hang(d) => {
                tokio::time::sleep(d).await;
                Ok(())
            },
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}_{:06}", self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl PaymentGateway for FakeGateway {
    fn public_key(&self) -> &str {
        "rzp_test_fake"
    }

    fn currency(&self) -> &str {
        "INR"
    }

    async fn open_transaction(&self, request: OpenTransaction) -> Result<String, GatewayError> {
        self.behave().await?;
        self.opened.lock().unwrap().push(request);
        Ok(self.next_id("order"))
    }

    fn verify_signature(&self, order_ref: &str, payment_ref: &str, proof: &str) -> Result<bool, GatewayError> {
        Ok(verify_payment_signature(FAKE_GATEWAY_SECRET, order_ref, payment_ref, proof))
    }

    async fn refund(
        &self,
        transaction_ref: &str,
        amount: Money,
        _reason: Option<&str>,
    ) -> Result<String, GatewayError> {
        self.behave().await?;
        self.refunds.lock().unwrap().push((transaction_ref.to_string(), amount));
        Ok(self.next_id("rfnd"))
    }
}
