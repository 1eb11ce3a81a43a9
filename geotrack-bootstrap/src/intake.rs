pub mod jsonl;
pub mod websocket;

pub use jsonl::*;
pub use websocket::*;

use geotrack_domain::LocationEvent;

/// Decodes one event payload as produced by the ingress service.
pub fn parse_event_payload(raw: &str) -> Result<LocationEvent, serde_json::Error> {
    serde_json::from_str(raw.trim())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntakeStats {
    pub accepted: u64,
    pub rejected: u64,
}
