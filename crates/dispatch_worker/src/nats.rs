mod dispatch_batch_processor;

pub use dispatch_batch_processor::*;
