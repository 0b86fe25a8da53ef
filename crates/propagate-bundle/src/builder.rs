use propagate_types::{Bundle, ChangeSet, Impact, RemediationKind, RepoConvention};

use crate::fingerprint::fingerprint;

/// Build one remediation bundle for `consumer`, scoped to the impacts and
/// breaking changes that actually touch it. Returns `None` if the consumer
/// has no impact records in `impacts` — nothing to remediate.
pub fn build_bundle(
    consumer: &RepoConvention,
    change_set: &ChangeSet,
    impacts: &[Impact],
) -> Option<Bundle> {
    let consumer_impacts: Vec<Impact> = impacts
        .iter()
        .filter(|i| i.consumer_service == consumer.consumer_service)
        .cloned()
        .collect();
    if consumer_impacts.is_empty() {
        return None;
    }

    let fingerprint = fingerprint(&consumer.consumer_service, change_set, impacts);
    let candidate_paths = consumer
        .candidate_globs()
        .into_iter()
        .map(str::to_string)
        .collect();

    Some(Bundle {
        kind: RemediationKind::BreakingContractChange,
        consumer_service: consumer.consumer_service.clone(),
        consumer_repo: consumer.repo.clone(),
        producer_service: change_set.producer_service.clone(),
        change_set: change_set.clone(),
        impacts: consumer_impacts,
        candidate_paths,
        protected_paths: consumer.protected_globs.clone(),
        fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use propagate_types::{ChangeEntry, ChangeKind, ChangeLocation, ClassifiedChange, Confidence, Method, Severity};

    fn convention() -> RepoConvention {
        RepoConvention {
            consumer_service: "checkout".into(),
            repo: "org/checkout".into(),
            client_globs: vec!["src/clients/billing/**".into()],
            schema_mirror_globs: vec![],
            fixture_globs: vec![],
            test_globs: vec!["tests/billing/**".into()],
            protected_globs: vec!["src/clients/billing/generated/**".into()],
        }
    }

    fn change_set() -> ChangeSet {
        ChangeSet::new(
            "billing",
            "v1",
            "v2",
            vec![ClassifiedChange {
                entry: ChangeEntry {
                    path: "/sessions".into(),
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
            }],
        )
    }

    fn impact() -> Impact {
        Impact {
            consumer_service: "checkout".into(),
            producer_service: "billing".into(),
            path: "/sessions".into(),
            method: Method::Post,
            confidence: Confidence::High,
            declared: true,
            observed_call_count: None,
        }
    }

    #[test]
    fn builds_bundle_for_impacted_consumer() {
        let bundle = build_bundle(&convention(), &change_set(), &[impact()]).unwrap();
        assert_eq!(bundle.consumer_service, "checkout");
        assert!(!bundle.fingerprint.is_empty());
        assert_eq!(bundle.impacts.len(), 1);
    }

    #[test]
    fn returns_none_for_unimpacted_consumer() {
        let other = RepoConvention {
            consumer_service: "reporting".into(),
            ..convention()
        };
        assert!(build_bundle(&other, &change_set(), &[impact()]).is_none());
    }
}
