mod ingest_service;
mod partition;

pub use ingest_service::*;
pub use partition::*;
