mod dispatch_message_producer;

pub use dispatch_message_producer::*;
