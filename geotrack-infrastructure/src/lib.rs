pub mod config;
pub mod kv;
pub mod repositories;
pub mod utils;

pub use config::*;
pub use kv::*;
pub use repositories::*;
pub use utils::*;
