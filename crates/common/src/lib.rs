mod domain;
mod nats;
mod telemetry;

pub use domain::*;
pub use nats::*;
pub use telemetry::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockDispatchMessageProducer;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockObjectStoreWriter;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockQueryService;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockRowSink;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockJetStreamConsumer;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockJetStreamPublisher;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockPullConsumer;
