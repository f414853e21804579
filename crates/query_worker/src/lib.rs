pub mod domain;
pub mod http;
pub mod nats;
pub mod query_worker;

pub use domain::*;
pub use http::*;
pub use nats::*;
pub use query_worker::*;
