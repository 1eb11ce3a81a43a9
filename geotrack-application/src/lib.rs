// Geotrack Application Layer

pub mod commands;
pub mod error;
pub mod metrics;
pub mod ops;
pub mod state;

pub use error::{ProcessingError, ProcessingStage};
pub use metrics::{Metrics, MetricsSnapshot};
pub use state::ProcessorState;
