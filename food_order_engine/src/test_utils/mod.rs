pub mod fake_gateway;
pub mod fixtures;
pub mod prepare_env;
