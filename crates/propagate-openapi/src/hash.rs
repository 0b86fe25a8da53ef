use sha2::{Digest, Sha256};

use crate::model::OpenApiDocument;

/// Canonical byte representation of a document: every collection in
/// `OpenApiDocument` is a `BTreeMap`, so `serde_json` serializes map keys in
/// sorted order regardless of the order they appeared in the source file.
/// Two documents describing the same contract therefore always produce the
/// same bytes here, which is what makes `hash_document` stable.
pub fn canonical_bytes(document: &OpenApiDocument) -> Vec<u8> {
    serde_json::to_vec(document).expect("OpenApiDocument is always serializable")
}

/// SHA-256 over the canonical byte representation, hex-encoded.
pub fn hash_document(document: &OpenApiDocument) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes(document));
    hex::encode(hasher.finalize())
}
