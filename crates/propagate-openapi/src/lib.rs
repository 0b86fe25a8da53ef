//! A minimal OpenAPI 3.x document model, format-tolerant parsing (JSON or
//! YAML), and canonical hashing, scoped to exactly what the differ needs:
//! routes, operations, parameters, request/response bodies, and named
//! component schemas.

pub mod contract;
pub mod hash;
pub mod model;
pub mod parse;

pub use contract::ContractVersion;
pub use hash::{canonical_bytes, hash_document};
pub use model::{
    Info, MediaType, OpenApiDocument, Operation, Parameter, ParameterLocation, PathItem,
    RequestBody, ResponseObject, Schema,
};
pub use parse::{parse_document, OpenApiError};
