use sha2::{Digest, Sha256};

use propagate_types::{ChangeSet, Impact};

/// Compute a stable fingerprint for a consumer's exposure to a change set.
///
/// Hashed over an explicitly ordered tuple of fields rather than a
/// serialized blob, so the result is invariant to the order changes or
/// impacts were discovered in, and to any future addition of non-semantic
/// fields to `ChangeSet`/`Impact` that a blind JSON hash would pick up as a
/// spurious fingerprint change.
pub fn fingerprint(consumer_service: &str, change_set: &ChangeSet, impacts: &[Impact]) -> String {
    let mut hasher = Sha256::new();

    hasher.update(b"producer=");
    hasher.update(change_set.producer_service.as_bytes());
    hasher.update(b"\nconsumer=");
    hasher.update(consumer_service.as_bytes());
    hasher.update(b"\nfrom=");
    hasher.update(change_set.from_version.as_bytes());
    hasher.update(b"\nto=");
    hasher.update(change_set.to_version.as_bytes());

    let mut change_keys: Vec<String> = change_set
        .breaking_changes()
        .map(|c| {
            format!(
                "{}:{}:{:?}:{:?}:{}",
                c.entry.method, c.entry.path, c.entry.kind, c.entry.location, c.entry.field
            )
        })
        .collect();
    change_keys.sort();
    hasher.update(b"\nchanges=");
    for key in &change_keys {
        hasher.update(key.as_bytes());
        hasher.update(b";");
    }

    let mut impact_keys: Vec<String> = impacts
        .iter()
        .filter(|i| i.consumer_service == consumer_service)
        .map(|i| format!("{}:{}:{:?}", i.method, i.path, i.confidence))
        .collect();
    impact_keys.sort();
    hasher.update(b"\nimpacts=");
    for key in &impact_keys {
        hasher.update(key.as_bytes());
        hasher.update(b";");
    }

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use propagate_types::{ChangeEntry, ChangeKind, ChangeLocation, ClassifiedChange, Confidence, Method, Severity};

    fn change(path: &str, field: &str) -> ClassifiedChange {
        ClassifiedChange {
            entry: ChangeEntry {
                path: path.to_string(),
                method: Method::Post,
                kind: ChangeKind::RequiredAdded,
                location: ChangeLocation::RequestBody,
                field: field.to_string(),
                before: None,
                after: None,
            },
            severity: Severity::High,
            is_breaking: true,
            rationale: "test".into(),
        }
    }

    fn impact(consumer: &str, path: &str) -> Impact {
        Impact {
            consumer_service: consumer.to_string(),
            producer_service: "billing".to_string(),
            path: path.to_string(),
            method: Method::Post,
            confidence: Confidence::High,
            declared: true,
            observed_call_count: None,
        }
    }

    #[test]
    fn fingerprint_is_stable_under_permutation_of_changes() {
        let forward = ChangeSet::new("billing", "v1", "v2", vec![change("/a", "x"), change("/b", "y")]);
        let backward = ChangeSet::new("billing", "v1", "v2", vec![change("/b", "y"), change("/a", "x")]);
        let impacts = vec![impact("checkout", "/a"), impact("checkout", "/b")];
        assert_eq!(
            fingerprint("checkout", &forward, &impacts),
            fingerprint("checkout", &backward, &impacts)
        );
    }

    #[test]
    fn fingerprint_differs_across_consumers() {
        let change_set = ChangeSet::new("billing", "v1", "v2", vec![change("/a", "x")]);
        let impacts = vec![impact("checkout", "/a"), impact("reporting", "/a")];
        assert_ne!(
            fingerprint("checkout", &change_set, &impacts),
            fingerprint("reporting", &change_set, &impacts)
        );
    }

    #[test]
    fn fingerprint_differs_across_contract_versions() {
        let v2 = ChangeSet::new("billing", "v1", "v2", vec![change("/a", "x")]);
        let v3 = ChangeSet::new("billing", "v1", "v3", vec![change("/a", "x")]);
        let impacts = vec![impact("checkout", "/a")];
        assert_ne!(
            fingerprint("checkout", &v2, &impacts),
            fingerprint("checkout", &v3, &impacts)
        );
    }
}
