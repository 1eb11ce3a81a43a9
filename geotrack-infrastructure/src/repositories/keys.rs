// Key layout in the shared key-value store

use geotrack_domain::UserId;

pub const GLOBAL_ACTIVITY_KEY: &str = "activity:global";

pub fn location_key(user_id: &UserId) -> String {
    format!("location:{}", user_id.as_str())
}

pub fn user_activity_key(user_id: &UserId) -> String {
    format!("activity:user:{}", user_id.as_str())
}

pub fn anomalies_key(user_id: &UserId) -> String {
    format!("anomalies:{}", user_id.as_str())
}
