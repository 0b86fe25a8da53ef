//! Loaders for the two inputs the impact mapper fuses: the declared service
//! dependency graph and the observed telemetry window.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use propagate_types::{ServiceEdge, TelemetrySample};

#[derive(Debug, Error)]
pub enum ServiceMapError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The declared consumer -> producer route dependency graph, as maintained
/// by service owners (outside this engine's scope).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceMap {
    pub edges: Vec<ServiceEdge>,
}

impl ServiceMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceMapError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ServiceMapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ServiceMapError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn edges_for_producer(&self, producer_service: &str) -> Vec<&ServiceEdge> {
        self.edges
            .iter()
            .filter(|e| e.producer_service == producer_service)
            .collect()
    }
}

/// Observed call samples within the configured telemetry lookback window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryWindow {
    pub samples: Vec<TelemetrySample>,
}

impl TelemetryWindow {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceMapError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ServiceMapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ServiceMapError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn samples_for_producer(&self, producer_service: &str) -> Vec<&TelemetrySample> {
        self.samples
            .iter()
            .filter(|s| s.producer_service == producer_service)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propagate_types::Method;
    use std::io::Write;

    #[test]
    fn loads_service_map_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"edges":[{{"consumer_service":"checkout","producer_service":"billing","path":"/sessions","method":"POST"}}]}}"#
        )
        .unwrap();
        let map = ServiceMap::load(file.path()).unwrap();
        assert_eq!(map.edges.len(), 1);
        assert_eq!(map.edges_for_producer("billing").len(), 1);
    }

    #[test]
    fn filters_telemetry_by_producer() {
        let window = TelemetryWindow {
            samples: vec![
                TelemetrySample {
                    consumer_service: "checkout".into(),
                    producer_service: "billing".into(),
                    path: "/sessions".into(),
                    method: Method::Post,
                    call_count: 42,
                },
                TelemetrySample {
                    consumer_service: "checkout".into(),
                    producer_service: "inventory".into(),
                    path: "/stock".into(),
                    method: Method::Get,
                    call_count: 7,
                },
            ],
        };
        assert_eq!(window.samples_for_producer("billing").len(), 1);
    }
}
