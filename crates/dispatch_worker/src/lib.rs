pub mod dispatch_worker;
pub mod domain;
pub mod http;
pub mod nats;

pub use dispatch_worker::*;
pub use domain::*;
pub use http::*;
pub use nats::*;
