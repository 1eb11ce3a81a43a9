// Domain entities
pub mod classification;
pub mod event;
pub mod location;
pub mod runtime_config;

pub use classification::*;
pub use event::*;
pub use location::*;
pub use runtime_config::*;
