pub mod context;
pub mod intake;
pub mod lifecycle;
pub mod telemetry;

pub use context::AppContext;
pub use lifecycle::run;
