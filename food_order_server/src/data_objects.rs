use food_order_engine::{db_types::OrderStatusType, order_objects::OrderQueryFilter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub address_id: i64,
}

/// Query parameters for order listings, e.g. `?status=PENDING&page=1&page_size=20`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListParams {
    pub status: Option<OrderStatusType>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl From<OrderListParams> for OrderQueryFilter {
    fn from(params: OrderListParams) -> Self {
        OrderQueryFilter { status: params.status, page: params.page, page_size: params.page_size, ..Default::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }
}
