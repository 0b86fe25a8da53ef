use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use propagate_openapi::Schema;

/// The normalized shape of a field used to detect renames: type, format,
/// and required-ness. Two fields with the same shape on either side of an
/// added/removed pair are assumed to be the same field renamed, per the
/// structural-hash-match heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldShape {
    pub schema_type: Option<String>,
    pub format: Option<String>,
    pub required: bool,
}

impl FieldShape {
    pub fn of(schema: Option<&Schema>, required: bool) -> Self {
        Self {
            schema_type: schema.and_then(|s| s.schema_type.clone()),
            format: schema.and_then(|s| s.format.clone()),
            required,
        }
    }

    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Match removed field names against added field names by structural hash.
/// A removed/added pair is treated as a rename only when the match is
/// unambiguous: exactly one added candidate shares the removed field's
/// shape, and that candidate isn't also the unique match for a different
/// removed field. Ambiguous candidates are left as separate add/remove
/// entries (kind=`other` is applied by the caller).
pub fn match_renames(
    removed: &[(String, FieldShape)],
    added: &[(String, FieldShape)],
) -> Vec<(String, String)> {
    let mut matches = Vec::new();
    let mut used_added: Vec<&str> = Vec::new();

    for (removed_name, removed_shape) in removed {
        let candidates: Vec<&str> = added
            .iter()
            .filter(|(name, shape)| shape == removed_shape && !used_added.contains(&name.as_str()))
            .map(|(name, _)| name.as_str())
            .collect();
        if candidates.len() == 1 {
            let added_name = candidates[0];
            used_added.push(added_name);
            matches.push((removed_name.clone(), added_name.to_string()));
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(t: &str) -> FieldShape {
        FieldShape {
            schema_type: Some(t.to_string()),
            format: None,
            required: true,
        }
    }

    #[test]
    fn unique_shape_match_is_treated_as_rename() {
        let removed = vec![("old_name".to_string(), shape("string"))];
        let added = vec![("new_name".to_string(), shape("string"))];
        let matches = match_renames(&removed, &added);
        assert_eq!(matches, vec![("old_name".to_string(), "new_name".to_string())]);
    }

    #[test]
    fn ambiguous_shape_match_produces_no_rename() {
        let removed = vec![("old_name".to_string(), shape("string"))];
        let added = vec![
            ("candidate_a".to_string(), shape("string")),
            ("candidate_b".to_string(), shape("string")),
        ];
        assert!(match_renames(&removed, &added).is_empty());
    }

    #[test]
    fn differing_shape_is_not_matched() {
        let removed = vec![("old_name".to_string(), shape("string"))];
        let added = vec![("new_name".to_string(), shape("integer"))];
        assert!(match_renames(&removed, &added).is_empty());
    }
}
