use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::GatewayConfig,
    data_objects::{GatewayOrder, GatewayRefund, NewGatewayOrder, RefundRequest},
    GatewayApiError,
};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.base_url)
    }

    /// Opens a payable transaction. The returned order id is what the client checkout is started with.
    pub async fn create_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, GatewayApiError> {
        debug!("Opening gateway order for receipt {} ({} {})", order.receipt, order.amount, order.currency);
        let result = self.rest_query::<GatewayOrder, NewGatewayOrder>(Method::POST, "/orders", Some(order)).await?;
        info!("Gateway order {} opened", result.id);
        Ok(result)
    }

    pub async fn refund_payment(
        &self,
        gateway_payment_id: &str,
        refund: RefundRequest,
    ) -> Result<GatewayRefund, GatewayApiError> {
        let path = format!("/payments/{gateway_payment_id}/refund");
        debug!("Requesting refund of {} on payment {gateway_payment_id}", refund.amount);
        let result = self.rest_query::<GatewayRefund, RefundRequest>(Method::POST, &path, Some(refund)).await?;
        info!("Refund {} issued for payment {gateway_payment_id}. Status: {}", result.id, result.status);
        Ok(result)
    }
}
