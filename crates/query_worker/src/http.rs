mod query_service_client;

pub use query_service_client::*;
