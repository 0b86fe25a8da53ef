use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// HTTP method of a route, as it appears in an OpenAPI `paths` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        };
        f.write_str(s)
    }
}

/// Where in a route's request/response shape a change was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeLocation {
    Route,
    Parameter,
    RequestBody,
    Response,
    Header,
}

/// The kind of structural delta the differ observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Renamed,
    TypeChanged,
    RequiredAdded,
    RequiredRemoved,
    Deprecated,
    EnumNarrowed,
    DefaultChanged,
    Other,
}

/// A single structural delta between two contract versions at a specific
/// route, method, and location. Produced by the differ; lives for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Route template, e.g. `/sessions/{id}`.
    pub path: String,
    pub method: Method,
    pub kind: ChangeKind,
    pub location: ChangeLocation,
    /// Dotted field path within the location, e.g. `usage.cached_tokens`.
    /// Empty for route/operation-level changes (added/removed route).
    pub field: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl ChangeEntry {
    pub fn route_key(&self) -> (Method, &str) {
        (self.method, self.path.as_str())
    }
}

/// Severity assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A `ChangeEntry` with a classifier verdict attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedChange {
    pub entry: ChangeEntry,
    pub severity: Severity,
    pub is_breaking: bool,
    pub rationale: String,
}

impl ClassifiedChange {
    /// Invariant (d) from the data model: a breaking change must be at least
    /// medium severity.
    pub fn is_consistent(&self) -> bool {
        !self.is_breaking || self.severity >= Severity::Medium
    }
}

/// Sort key imposing a deterministic order over classified changes for
/// prompt rendering and fingerprinting: breaking first, then by severity
/// descending, then by route/field for stability.
pub fn classified_change_order(a: &ClassifiedChange, b: &ClassifiedChange) -> Ordering {
    b.is_breaking
        .cmp(&a.is_breaking)
        .then(b.severity.cmp(&a.severity))
        .then(a.entry.path.cmp(&b.entry.path))
        .then(a.entry.method.cmp(&b.entry.method))
        .then(a.entry.field.cmp(&b.entry.field))
}

/// One run's worth of classified changes between two contract versions of a
/// single producer service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    pub producer_service: String,
    pub from_version: String,
    pub to_version: String,
    pub changes: Vec<ClassifiedChange>,
    pub severity: Severity,
    pub is_breaking: bool,
}

impl ChangeSet {
    /// Build a `ChangeSet` from classified changes, computing the rollup
    /// severity (max) and breaking flag (any) per spec.md §4.2.
    pub fn new(
        producer_service: impl Into<String>,
        from_version: impl Into<String>,
        to_version: impl Into<String>,
        mut changes: Vec<ClassifiedChange>,
    ) -> Self {
        changes.sort_by(classified_change_order);
        let is_breaking = changes.iter().any(|c| c.is_breaking);
        let severity = changes
            .iter()
            .map(|c| c.severity)
            .max()
            .unwrap_or(Severity::Low);
        Self {
            producer_service: producer_service.into(),
            from_version: from_version.into(),
            to_version: to_version.into(),
            changes,
            severity,
            is_breaking,
        }
    }

    pub fn breaking_changes(&self) -> impl Iterator<Item = &ClassifiedChange> {
        self.changes.iter().filter(|c| c.is_breaking)
    }

    /// Distinct `(method, route)` pairs touched by any change in this set.
    pub fn touched_routes(&self) -> Vec<(Method, &str)> {
        let mut routes: Vec<(Method, &str)> = self
            .changes
            .iter()
            .map(|c| c.entry.route_key())
            .collect();
        routes.sort();
        routes.dedup();
        routes
    }
}
