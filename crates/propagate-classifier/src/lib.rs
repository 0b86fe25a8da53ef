//! Classifies a single structural `ChangeEntry` into a severity and a
//! breaking verdict. Pure, deterministic, no I/O — every call with the same
//! input produces the same output, which is the property `tests::
//! classification_is_deterministic` pins down.

use propagate_types::{ChangeEntry, ChangeKind, ChangeLocation, ClassifiedChange, Severity};

/// First-match decision table: rules are tried top to bottom and the first
/// one whose predicate matches wins. Order matters — more specific
/// `(location, kind)` rules are listed before the kind-only fallbacks they'd
/// otherwise be shadowed by.
pub fn classify(entry: &ChangeEntry) -> ClassifiedChange {
    let (severity, is_breaking, rationale) = decide(entry);
    ClassifiedChange {
        entry: entry.clone(),
        severity,
        is_breaking,
        rationale: rationale.to_string(),
    }
}

fn decide(entry: &ChangeEntry) -> (Severity, bool, &'static str) {
    use ChangeKind::*;
    use ChangeLocation::*;

    match (entry.location, entry.kind) {
        (Route, Removed) => (
            Severity::High,
            true,
            "route removed; consumers calling it will receive 404s",
        ),
        (Route, Added) => (
            Severity::Low,
            false,
            "new route added; no effect on existing consumers",
        ),
        (_, Removed) => (
            Severity::High,
            true,
            "field or parameter removed; consumers referencing it will break",
        ),
        (RequestBody | Parameter | Header, RequiredAdded) => (
            Severity::High,
            true,
            "new required input with no default; callers omitting it will fail validation",
        ),
        (Response, RequiredAdded) => (
            Severity::Low,
            false,
            "response now guarantees an additional field; additive for consumers",
        ),
        (RequestBody | Parameter | Header, RequiredRemoved) => (
            Severity::Low,
            false,
            "input is now optional; existing callers are unaffected",
        ),
        (Response, RequiredRemoved) => (
            Severity::High,
            true,
            "response field is no longer guaranteed; consumers assuming its presence may break",
        ),
        (_, TypeChanged) => (
            Severity::High,
            true,
            "field type changed; serialization on either side is likely incompatible",
        ),
        (_, Renamed) => (
            Severity::High,
            true,
            "field renamed; the old name is no longer present",
        ),
        (Response, EnumNarrowed) => (
            Severity::High,
            true,
            "response enum narrowed; consumers matching on a now-removed value may break",
        ),
        (_, EnumNarrowed) => (
            Severity::Medium,
            true,
            "enum values removed; previously valid values may now be rejected",
        ),
        (_, Deprecated) => (
            Severity::Medium,
            false,
            "marked deprecated but still functional",
        ),
        (_, DefaultChanged) => (
            Severity::Medium,
            false,
            "default value changed; only affects callers that omit the field",
        ),
        (_, Added) => (
            Severity::Low,
            false,
            "purely additive change",
        ),
        (_, Other) => (
            Severity::Medium,
            true,
            "unrecognized change shape; treated conservatively as breaking",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propagate_types::Method;
    use proptest::prelude::*;

    fn entry(kind: ChangeKind, location: ChangeLocation) -> ChangeEntry {
        ChangeEntry {
            path: "/sessions".to_string(),
            method: Method::Post,
            kind,
            location,
            field: "budget".to_string(),
            before: None,
            after: None,
        }
    }

    #[test]
    fn required_field_added_on_request_is_breaking() {
        let c = classify(&entry(ChangeKind::RequiredAdded, ChangeLocation::RequestBody));
        assert!(c.is_breaking);
        assert_eq!(c.severity, Severity::High);
    }

    #[test]
    fn required_field_added_on_response_is_not_breaking() {
        let c = classify(&entry(ChangeKind::RequiredAdded, ChangeLocation::Response));
        assert!(!c.is_breaking);
    }

    #[test]
    fn route_addition_is_never_breaking() {
        let c = classify(&entry(ChangeKind::Added, ChangeLocation::Route));
        assert!(!c.is_breaking);
    }

    #[test]
    fn every_verdict_satisfies_the_severity_invariant() {
        for kind in [
            ChangeKind::Added,
            ChangeKind::Removed,
            ChangeKind::Renamed,
            ChangeKind::TypeChanged,
            ChangeKind::RequiredAdded,
            ChangeKind::RequiredRemoved,
            ChangeKind::Deprecated,
            ChangeKind::EnumNarrowed,
            ChangeKind::DefaultChanged,
            ChangeKind::Other,
        ] {
            for location in [
                ChangeLocation::Route,
                ChangeLocation::Parameter,
                ChangeLocation::RequestBody,
                ChangeLocation::Response,
                ChangeLocation::Header,
            ] {
                let c = classify(&entry(kind, location));
                assert!(c.is_consistent(), "inconsistent verdict for {kind:?}/{location:?}");
            }
        }
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(seed in 0u8..10) {
            let kind = match seed {
                0 => ChangeKind::Added,
                1 => ChangeKind::Removed,
                2 => ChangeKind::Renamed,
                3 => ChangeKind::TypeChanged,
                4 => ChangeKind::RequiredAdded,
                5 => ChangeKind::RequiredRemoved,
                6 => ChangeKind::Deprecated,
                7 => ChangeKind::EnumNarrowed,
                8 => ChangeKind::DefaultChanged,
                _ => ChangeKind::Other,
            };
            let e = entry(kind, ChangeLocation::RequestBody);
            let a = classify(&e);
            let b = classify(&e);
            prop_assert_eq!(a.severity, b.severity);
            prop_assert_eq!(a.is_breaking, b.is_breaking);
        }
    }
}
