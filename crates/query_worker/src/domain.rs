mod query_orchestrator;
mod result_publisher;
mod sql;

pub use query_orchestrator::*;
pub use result_publisher::*;
pub use sql::*;
