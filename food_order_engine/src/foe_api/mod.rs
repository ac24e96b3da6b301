pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;
pub mod payment_flow_api;
pub mod payment_objects;
pub mod profile_api;
