use serde::{Deserialize, Serialize};

use crate::change::Method;

/// A declared dependency edge between a consumer and a producer route,
/// taken from the static service map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEdge {
    pub consumer_service: String,
    pub producer_service: String,
    pub path: String,
    pub method: Method,
}

/// One observed call between a consumer and a producer route, taken from
/// telemetry within the configured lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub consumer_service: String,
    pub producer_service: String,
    pub path: String,
    pub method: Method,
    pub call_count: u64,
}

/// How sure the impact mapper is that a consumer is actually affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A consumer service impacted by a contract change, with the evidence
/// behind the confidence assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    pub consumer_service: String,
    pub producer_service: String,
    pub path: String,
    pub method: Method,
    pub confidence: Confidence,
    pub declared: bool,
    pub observed_call_count: Option<u64>,
}

impl Impact {
    /// High confidence requires both a declared service-map edge and
    /// corroborating telemetry; either one alone is weaker evidence than
    /// both together, and neither is full confidence.
    pub fn confidence_for(declared: bool, observed: bool) -> Confidence {
        match (declared, observed) {
            (true, true) => Confidence::High,
            (false, true) => Confidence::Medium,
            (true, false) => Confidence::Low,
            (false, false) => Confidence::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_and_observed_edge_is_high_confidence() {
        assert_eq!(Impact::confidence_for(true, true), Confidence::High);
    }

    #[test]
    fn declared_only_edge_is_low_confidence() {
        assert_eq!(Impact::confidence_for(true, false), Confidence::Low);
    }

    #[test]
    fn observed_only_edge_is_medium_confidence() {
        assert_eq!(Impact::confidence_for(false, true), Confidence::Medium);
    }
}
