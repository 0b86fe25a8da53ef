use propagate_openapi::Schema;
use propagate_types::{ChangeEntry, ChangeKind, ChangeLocation, Method};

use crate::rename::{match_renames, FieldShape};

fn dotted(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn entry(
    path: &str,
    method: Method,
    location: ChangeLocation,
    kind: ChangeKind,
    field: String,
    before: Option<String>,
    after: Option<String>,
) -> ChangeEntry {
    ChangeEntry {
        path: path.to_string(),
        method,
        kind,
        location,
        field,
        before,
        after,
    }
}

/// Diff two schemas rooted at `prefix` (a dotted field path, empty at the
/// object's own root), emitting one `ChangeEntry` per structural delta.
/// Recurses into nested `properties` for common fields.
pub fn diff_schema(
    path: &str,
    method: Method,
    location: ChangeLocation,
    prefix: &str,
    from: &Schema,
    to: &Schema,
    out: &mut Vec<ChangeEntry>,
) {
    if from.schema_type != to.schema_type || from.format != to.format {
        out.push(entry(
            path,
            method,
            location,
            ChangeKind::TypeChanged,
            prefix.to_string(),
            Some(type_label(from)),
            Some(type_label(to)),
        ));
    }

    if !to.deprecated && from.deprecated {
        // un-deprecating is not itself tracked as a change kind; only the
        // forward direction (newly deprecated) matters to consumers.
    } else if to.deprecated && !from.deprecated {
        out.push(entry(
            path,
            method,
            location,
            ChangeKind::Deprecated,
            prefix.to_string(),
            None,
            None,
        ));
    }

    if is_enum_narrowed(&from.enum_values, &to.enum_values) {
        out.push(entry(
            path,
            method,
            location,
            ChangeKind::EnumNarrowed,
            prefix.to_string(),
            Some(from.enum_values.join(",")),
            Some(to.enum_values.join(",")),
        ));
    }

    if from.default != to.default {
        out.push(entry(
            path,
            method,
            location,
            ChangeKind::DefaultChanged,
            prefix.to_string(),
            from.default.as_ref().map(|v| v.to_string()),
            to.default.as_ref().map(|v| v.to_string()),
        ));
    }

    diff_properties(path, method, location, prefix, from, to, out);
}

fn type_label(schema: &Schema) -> String {
    format!(
        "{}:{}",
        schema.schema_type.as_deref().unwrap_or("any"),
        schema.format.as_deref().unwrap_or("-")
    )
}

fn is_enum_narrowed(before: &[String], after: &[String]) -> bool {
    !after.is_empty() && after.len() < before.len() && after.iter().all(|v| before.contains(v))
}

fn diff_properties(
    path: &str,
    method: Method,
    location: ChangeLocation,
    prefix: &str,
    from: &Schema,
    to: &Schema,
    out: &mut Vec<ChangeEntry>,
) {
    let mut removed: Vec<(String, FieldShape)> = Vec::new();
    let mut added: Vec<(String, FieldShape)> = Vec::new();
    let mut common: Vec<String> = Vec::new();

    for name in from.properties.keys() {
        if to.properties.contains_key(name) {
            common.push(name.clone());
        } else {
            let shape = FieldShape::of(from.properties.get(name), from.required.contains(name));
            removed.push((name.clone(), shape));
        }
    }
    for name in to.properties.keys() {
        if !from.properties.contains_key(name) {
            let shape = FieldShape::of(to.properties.get(name), to.required.contains(name));
            added.push((name.clone(), shape));
        }
    }

    let renames = match_renames(&removed, &added);
    let renamed_away: Vec<&str> = renames.iter().map(|(r, _)| r.as_str()).collect();
    let renamed_into: Vec<&str> = renames.iter().map(|(_, a)| a.as_str()).collect();

    for (before_name, after_name) in &renames {
        out.push(entry(
            path,
            method,
            location,
            ChangeKind::Renamed,
            dotted(prefix, after_name),
            Some(before_name.clone()),
            Some(after_name.clone()),
        ));
    }

    for (name, _) in &removed {
        if renamed_away.contains(&name.as_str()) {
            continue;
        }
        out.push(entry(
            path,
            method,
            location,
            ChangeKind::Removed,
            dotted(prefix, name),
            None,
            None,
        ));
    }

    for (name, _) in &added {
        if renamed_into.contains(&name.as_str()) {
            continue;
        }
        out.push(entry(
            path,
            method,
            location,
            ChangeKind::Added,
            dotted(prefix, name),
            None,
            None,
        ));
    }

    for name in common {
        let field = dotted(prefix, &name);
        let was_required = from.required.contains(&name);
        let is_required = to.required.contains(&name);
        if is_required && !was_required {
            out.push(entry(
                path,
                method,
                location,
                ChangeKind::RequiredAdded,
                field.clone(),
                None,
                None,
            ));
        } else if was_required && !is_required {
            out.push(entry(
                path,
                method,
                location,
                ChangeKind::RequiredRemoved,
                field.clone(),
                None,
                None,
            ));
        }

        let from_child = from.properties.get(&name).expect("present in common set");
        let to_child = to.properties.get(&name).expect("present in common set");
        diff_schema(path, method, location, &field, from_child, to_child, out);
    }
}
