//! Structural diff between two versions of a producer's OpenAPI contract.
//!
//! The differ is pure and allocation-light: it walks both documents once,
//! normalizes away ordering, and emits an unordered `Vec<ChangeEntry>` for
//! the classifier to score. No network, no file I/O, no randomness.

mod rename;
mod schema_diff;

use propagate_openapi::{OpenApiDocument, Parameter, ParameterLocation};
use propagate_types::{ChangeEntry, ChangeKind, ChangeLocation, Method};

use schema_diff::diff_schema;

/// Diff every route in `from` against `to`, returning one `ChangeEntry` per
/// structural delta. Routes present in only one document produce a single
/// route-level `Added`/`Removed` entry rather than a synthetic tree of
/// field-level deltas, per spec.md §4.1.
pub fn diff_documents(from: &OpenApiDocument, to: &OpenApiDocument) -> Vec<ChangeEntry> {
    let mut out = Vec::new();

    for (path, from_item) in &from.paths {
        match to.paths.get(path) {
            None => {
                for method in from_item.operations.keys() {
                    out.push(route_entry(path, *method, ChangeKind::Removed));
                }
            }
            Some(to_item) => {
                for (method, from_op) in &from_item.operations {
                    match to_item.operations.get(method) {
                        None => out.push(route_entry(path, *method, ChangeKind::Removed)),
                        Some(to_op) => diff_operation(
                            path,
                            *method,
                            from_op,
                            to_op,
                            &mut out,
                        ),
                    }
                }
                for method in to_item.operations.keys() {
                    if !from_item.operations.contains_key(method) {
                        out.push(route_entry(path, *method, ChangeKind::Added));
                    }
                }
            }
        }
    }
    for (path, to_item) in &to.paths {
        if !from.paths.contains_key(path) {
            for method in to_item.operations.keys() {
                out.push(route_entry(path, *method, ChangeKind::Added));
            }
        }
    }

    diff_named_schemas(from, to, &mut out);

    out
}

fn route_entry(path: &str, method: Method, kind: ChangeKind) -> ChangeEntry {
    ChangeEntry {
        path: path.to_string(),
        method,
        kind,
        location: ChangeLocation::Route,
        field: String::new(),
        before: None,
        after: None,
    }
}

fn diff_operation(
    path: &str,
    method: Method,
    from_op: &propagate_openapi::Operation,
    to_op: &propagate_openapi::Operation,
    out: &mut Vec<ChangeEntry>,
) {
    if to_op.deprecated && !from_op.deprecated {
        out.push(ChangeEntry {
            path: path.to_string(),
            method,
            kind: ChangeKind::Deprecated,
            location: ChangeLocation::Route,
            field: String::new(),
            before: None,
            after: None,
        });
    }

    diff_parameters(path, method, &from_op.parameters, &to_op.parameters, out);

    match (&from_op.request_body, &to_op.request_body) {
        (None, Some(_)) => out.push(ChangeEntry {
            path: path.to_string(),
            method,
            kind: ChangeKind::RequiredAdded,
            location: ChangeLocation::RequestBody,
            field: String::new(),
            before: None,
            after: None,
        }),
        (Some(_), None) => out.push(ChangeEntry {
            path: path.to_string(),
            method,
            kind: ChangeKind::Removed,
            location: ChangeLocation::RequestBody,
            field: String::new(),
            before: None,
            after: None,
        }),
        (Some(from_body), Some(to_body)) => {
            if to_body.required && !from_body.required {
                out.push(ChangeEntry {
                    path: path.to_string(),
                    method,
                    kind: ChangeKind::RequiredAdded,
                    location: ChangeLocation::RequestBody,
                    field: String::new(),
                    before: None,
                    after: None,
                });
            } else if from_body.required && !to_body.required {
                out.push(ChangeEntry {
                    path: path.to_string(),
                    method,
                    kind: ChangeKind::RequiredRemoved,
                    location: ChangeLocation::RequestBody,
                    field: String::new(),
                    before: None,
                    after: None,
                });
            }
            if let (Some(from_schema), Some(to_schema)) = (
                from_body.content.get("application/json").and_then(|m| m.schema.as_ref()),
                to_body.content.get("application/json").and_then(|m| m.schema.as_ref()),
            ) {
                diff_schema(path, method, ChangeLocation::RequestBody, "", from_schema, to_schema, out);
            }
        }
        (None, None) => {}
    }

    for (status, from_resp) in &from_op.responses {
        let Some(to_resp) = to_op.responses.get(status) else {
            continue;
        };
        if let (Some(from_schema), Some(to_schema)) = (
            from_resp.content.get("application/json").and_then(|m| m.schema.as_ref()),
            to_resp.content.get("application/json").and_then(|m| m.schema.as_ref()),
        ) {
            diff_schema(path, method, ChangeLocation::Response, status, from_schema, to_schema, out);
        }
    }
}

fn diff_parameters(
    path: &str,
    method: Method,
    from_params: &[Parameter],
    to_params: &[Parameter],
    out: &mut Vec<ChangeEntry>,
) {
    for from_param in from_params {
        let location = location_for(from_param);
        match to_params.iter().find(|p| p.name == from_param.name) {
            None => out.push(ChangeEntry {
                path: path.to_string(),
                method,
                kind: ChangeKind::Removed,
                location,
                field: from_param.name.clone(),
                before: None,
                after: None,
            }),
            Some(to_param) => {
                if to_param.required && !from_param.required {
                    out.push(ChangeEntry {
                        path: path.to_string(),
                        method,
                        kind: ChangeKind::RequiredAdded,
                        location,
                        field: from_param.name.clone(),
                        before: None,
                        after: None,
                    });
                } else if from_param.required && !to_param.required {
                    out.push(ChangeEntry {
                        path: path.to_string(),
                        method,
                        kind: ChangeKind::RequiredRemoved,
                        location,
                        field: from_param.name.clone(),
                        before: None,
                        after: None,
                    });
                }
                if let (Some(from_schema), Some(to_schema)) =
                    (from_param.schema.as_ref(), to_param.schema.as_ref())
                {
                    diff_schema(path, method, location, &from_param.name, from_schema, to_schema, out);
                }
            }
        }
    }
    for to_param in to_params {
        if !from_params.iter().any(|p| p.name == to_param.name) {
            out.push(ChangeEntry {
                path: path.to_string(),
                method,
                kind: ChangeKind::Added,
                location: location_for(to_param),
                field: to_param.name.clone(),
                before: None,
                after: None,
            });
        }
    }
}

fn location_for(param: &Parameter) -> ChangeLocation {
    match param.location {
        ParameterLocation::Header => ChangeLocation::Header,
        _ => ChangeLocation::Parameter,
    }
}

fn diff_named_schemas(from: &OpenApiDocument, to: &OpenApiDocument, out: &mut Vec<ChangeEntry>) {
    for (name, from_schema) in &from.named_schemas {
        match to.named_schemas.get(name) {
            None => out.push(named_schema_entry(name, ChangeKind::Removed, None, None)),
            Some(to_schema) => {
                // Named schemas aren't attached to a single route; route is
                // left empty and `field` carries the schema name so the
                // classifier and bundle builder can still key off it.
                diff_schema("", Method::Get, ChangeLocation::Response, name, from_schema, to_schema, out);
            }
        }
    }
    for name in to.named_schemas.keys() {
        if !from.named_schemas.contains_key(name) {
            out.push(named_schema_entry(name, ChangeKind::Added, None, None));
        }
    }
}

fn named_schema_entry(
    name: &str,
    kind: ChangeKind,
    before: Option<String>,
    after: Option<String>,
) -> ChangeEntry {
    ChangeEntry {
        path: String::new(),
        method: Method::Get,
        kind,
        location: ChangeLocation::Response,
        field: name.to_string(),
        before,
        after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propagate_openapi::parse_document;

    #[test]
    fn added_route_produces_single_entry() {
        let from = parse_document(br#"{"openapi":"3.0.3","paths":{}}"#).unwrap();
        let to = parse_document(br#"{"openapi":"3.0.3","paths":{"/sessions":{"post":{}}}}"#).unwrap();
        let changes = diff_documents(&from, &to);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Added);
        assert_eq!(changes[0].location, ChangeLocation::Route);
    }

    #[test]
    fn removed_route_produces_single_entry() {
        let from = parse_document(br#"{"openapi":"3.0.3","paths":{"/sessions":{"post":{}}}}"#).unwrap();
        let to = parse_document(br#"{"openapi":"3.0.3","paths":{}}"#).unwrap();
        let changes = diff_documents(&from, &to);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Removed);
    }

    #[test]
    fn new_required_request_field_is_detected() {
        let from = parse_document(
            br#"{"openapi":"3.0.3","paths":{"/sessions":{"post":{
                "requestBody":{"required":true,"content":{"application/json":{"schema":{"type":"object","properties":{"id":{"type":"string"}},"required":["id"]}}}}
            }}}}"#,
        )
        .unwrap();
        let to = parse_document(
            br#"{"openapi":"3.0.3","paths":{"/sessions":{"post":{
                "requestBody":{"required":true,"content":{"application/json":{"schema":{"type":"object","properties":{"id":{"type":"string"},"budget":{"type":"number"}},"required":["id","budget"]}}}}
            }}}}"#,
        )
        .unwrap();
        let changes = diff_documents(&from, &to);
        assert!(changes
            .iter()
            .any(|c| c.kind == ChangeKind::RequiredAdded && c.field == "budget"));
    }

    #[test]
    fn identical_documents_produce_no_changes() {
        let doc = parse_document(
            br#"{"openapi":"3.0.3","paths":{"/sessions":{"get":{"operationId":"listSessions"}}}}"#,
        )
        .unwrap();
        assert!(diff_documents(&doc, &doc).is_empty());
    }
}
