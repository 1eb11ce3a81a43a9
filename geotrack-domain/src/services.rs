// Stateless domain services
pub mod classifier;
pub mod geo;

pub use classifier::*;
pub use geo::*;
