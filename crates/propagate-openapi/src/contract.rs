use serde::{Deserialize, Serialize};

use crate::hash::hash_document;
use crate::model::OpenApiDocument;

/// One version of one producer service's contract: the parsed document plus
/// its canonical hash, which is what the rest of the engine uses for
/// equality and fingerprinting instead of re-hashing on every comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractVersion {
    pub service: String,
    pub version: String,
    pub document: OpenApiDocument,
    pub hash: String,
}

impl ContractVersion {
    pub fn new(service: impl Into<String>, version: impl Into<String>, document: OpenApiDocument) -> Self {
        let hash = hash_document(&document);
        Self {
            service: service.into(),
            version: version.into(),
            document,
            hash,
        }
    }
}
