pub mod activity_counters;
pub mod anomaly_log;
pub mod keys;
pub mod location_codec;
pub mod location_state;

pub use activity_counters::*;
pub use anomaly_log::*;
pub use location_state::*;
