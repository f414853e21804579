mod sensor_batch_processor;

pub use sensor_batch_processor::*;
