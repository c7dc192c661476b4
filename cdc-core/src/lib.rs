pub mod controller;
pub mod source;
pub mod telemetry;

pub use controller::Controller;
pub use source::{ReplicationSource, TableFilter};
pub use telemetry::{TelemetryLayer, TelemetryReceiver};
