//! Fuses declared service-map edges with observed telemetry into a list of
//! confidence-tiered `Impact` records for a change set's breaking routes.

use propagate_servicemap::{ServiceMap, TelemetryWindow};
use propagate_types::{ChangeSet, Impact, Method};

/// For every route touched by a breaking change in `change_set`, find every
/// consumer either declared (service map) or observed (telemetry) calling
/// it, and assign a confidence: `high` requires both a declared edge and
/// corroborating telemetry, an observed-only edge is `medium`, and a
/// declared-only edge (no traffic seen in the lookback window) is `low`.
pub fn map_impact(
    change_set: &ChangeSet,
    service_map: &ServiceMap,
    telemetry: &TelemetryWindow,
) -> Vec<Impact> {
    let producer = &change_set.producer_service;
    let mut impacts = Vec::new();

    let mut routes: Vec<(Method, &str)> = change_set
        .breaking_changes()
        .map(|c| c.entry.route_key())
        .collect();
    routes.sort();
    routes.dedup();

    for (method, path) in routes {
        let declared_edges: Vec<_> = service_map
            .edges_for_producer(producer)
            .into_iter()
            .filter(|e| e.method == method && e.path == path)
            .collect();
        let observed_samples: Vec<_> = telemetry
            .samples_for_producer(producer)
            .into_iter()
            .filter(|s| s.method == method && s.path == path)
            .collect();

        let mut consumers: Vec<&str> = declared_edges
            .iter()
            .map(|e| e.consumer_service.as_str())
            .chain(observed_samples.iter().map(|s| s.consumer_service.as_str()))
            .collect();
        consumers.sort();
        consumers.dedup();

        for consumer in consumers {
            let declared = declared_edges.iter().any(|e| e.consumer_service == consumer);
            let matching_samples: Vec<_> = observed_samples
                .iter()
                .filter(|s| s.consumer_service == consumer)
                .collect();
            let observed = !matching_samples.is_empty();
            let confidence = Impact::confidence_for(declared, observed);
            let observed_call_count = if observed {
                Some(matching_samples.iter().map(|s| s.call_count).sum())
            } else {
                None
            };

            impacts.push(Impact {
                consumer_service: consumer.to_string(),
                producer_service: producer.clone(),
                path: path.to_string(),
                method,
                confidence,
                declared,
                observed_call_count,
            });
        }
    }

    impacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use propagate_types::{ChangeEntry, ChangeKind, ChangeLocation, ClassifiedChange, Severity, ServiceEdge, TelemetrySample};

    fn breaking_change(path: &str) -> ClassifiedChange {
        ClassifiedChange {
            entry: ChangeEntry {
                path: path.to_string(),
                method: Method::Post,
                kind: ChangeKind::RequiredAdded,
                location: ChangeLocation::RequestBody,
                field: "budget".into(),
                before: None,
                after: None,
            },
            severity: Severity::High,
            is_breaking: true,
            rationale: "test".into(),
        }
    }

    #[test]
    fn declared_only_consumer_is_low_confidence_without_traffic() {
        let change_set = ChangeSet::new("billing", "v1", "v2", vec![breaking_change("/sessions")]);
        let service_map = ServiceMap {
            edges: vec![ServiceEdge {
                consumer_service: "checkout".into(),
                producer_service: "billing".into(),
                path: "/sessions".into(),
                method: Method::Post,
            }],
        };
        let telemetry = TelemetryWindow::default();
        let impacts = map_impact(&change_set, &service_map, &telemetry);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].confidence, propagate_types::Confidence::Low);
        assert!(impacts[0].declared);
    }

    #[test]
    fn declared_and_observed_consumer_is_high_confidence() {
        let change_set = ChangeSet::new("billing", "v1", "v2", vec![breaking_change("/sessions")]);
        let service_map = ServiceMap {
            edges: vec![ServiceEdge {
                consumer_service: "checkout".into(),
                producer_service: "billing".into(),
                path: "/sessions".into(),
                method: Method::Post,
            }],
        };
        let telemetry = TelemetryWindow {
            samples: vec![TelemetrySample {
                consumer_service: "checkout".into(),
                producer_service: "billing".into(),
                path: "/sessions".into(),
                method: Method::Post,
                call_count: 4,
            }],
        };
        let impacts = map_impact(&change_set, &service_map, &telemetry);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].confidence, propagate_types::Confidence::High);
        assert!(impacts[0].declared);
        assert_eq!(impacts[0].observed_call_count, Some(4));
    }

    #[test]
    fn observed_only_consumer_is_medium_confidence() {
        let change_set = ChangeSet::new("billing", "v1", "v2", vec![breaking_change("/sessions")]);
        let service_map = ServiceMap::default();
        let telemetry = TelemetryWindow {
            samples: vec![TelemetrySample {
                consumer_service: "shadow-consumer".into(),
                producer_service: "billing".into(),
                path: "/sessions".into(),
                method: Method::Post,
                call_count: 11,
            }],
        };
        let impacts = map_impact(&change_set, &service_map, &telemetry);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].confidence, propagate_types::Confidence::Medium);
        assert!(!impacts[0].declared);
        assert_eq!(impacts[0].observed_call_count, Some(11));
    }

    #[test]
    fn non_breaking_changes_are_not_mapped() {
        let change_set = ChangeSet::new(
            "billing",
            "v1",
            "v2",
            vec![ClassifiedChange {
                entry: ChangeEntry {
                    path: "/sessions".into(),
                    method: Method::Get,
                    kind: ChangeKind::Added,
                    location: ChangeLocation::Response,
                    field: "note".into(),
                    before: None,
                    after: None,
                },
                severity: Severity::Low,
                is_breaking: false,
                rationale: "additive".into(),
            }],
        );
        let service_map = ServiceMap {
            edges: vec![ServiceEdge {
                consumer_service: "checkout".into(),
                producer_service: "billing".into(),
                path: "/sessions".into(),
                method: Method::Get,
            }],
        };
        let impacts = map_impact(&change_set, &service_map, &TelemetryWindow::default());
        assert!(impacts.is_empty());
    }
}
