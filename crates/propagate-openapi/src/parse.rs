use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use propagate_types::Method;

use crate::model::{
    Info, MediaType, OpenApiDocument, Operation, Parameter, ParameterLocation, PathItem,
    RequestBody, ResponseObject, Schema,
};

#[derive(Debug, Error)]
pub enum OpenApiError {
    #[error("document is neither valid JSON nor valid YAML: {0}")]
    UnrecognizedFormat(String),
    #[error("malformed field `{field}`: {detail}")]
    Malformed { field: String, detail: String },
}

/// Parse an OpenAPI 3.x document from raw bytes. Tries JSON first (the more
/// restrictive format, so a JSON document is never misparsed as YAML), then
/// falls back to YAML.
pub fn parse_document(bytes: &[u8]) -> Result<OpenApiDocument, OpenApiError> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(json_err) => serde_yaml::from_slice(bytes)
            .map_err(|yaml_err| {
                OpenApiError::UnrecognizedFormat(format!(
                    "json: {json_err}; yaml: {yaml_err}"
                ))
            })?,
    };
    document_from_value(&value)
}

fn document_from_value(value: &Value) -> Result<OpenApiDocument, OpenApiError> {
    let openapi = value
        .get("openapi")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let info = value
        .get("info")
        .map(info_from_value)
        .unwrap_or_default();
    let paths = value
        .get("paths")
        .and_then(Value::as_object)
        .map(|paths_obj| {
            paths_obj
                .iter()
                .map(|(path, item)| Ok((path.clone(), path_item_from_value(item)?)))
                .collect::<Result<BTreeMap<_, _>, OpenApiError>>()
        })
        .transpose()?
        .unwrap_or_default();
    let named_schemas = value
        .pointer("/components/schemas")
        .and_then(Value::as_object)
        .map(|schemas| {
            schemas
                .iter()
                .map(|(name, schema)| (name.clone(), schema_from_value(schema)))
                .collect()
        })
        .unwrap_or_default();

    Ok(OpenApiDocument {
        openapi,
        info,
        paths,
        named_schemas,
    })
}

fn info_from_value(value: &Value) -> Info {
    Info {
        title: value
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        version: value
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

const KNOWN_METHODS: &[(&str, Method)] = &[
    ("get", Method::Get),
    ("post", Method::Post),
    ("put", Method::Put),
    ("patch", Method::Patch),
    ("delete", Method::Delete),
    ("head", Method::Head),
    ("options", Method::Options),
    ("trace", Method::Trace),
];

fn path_item_from_value(value: &Value) -> Result<PathItem, OpenApiError> {
    let Some(obj) = value.as_object() else {
        return Ok(PathItem::default());
    };
    let mut operations = BTreeMap::new();
    for (key, method) in KNOWN_METHODS {
        if let Some(op_value) = obj.get(*key) {
            operations.insert(*method, operation_from_value(op_value)?);
        }
    }
    Ok(PathItem { operations })
}

fn operation_from_value(value: &Value) -> Result<Operation, OpenApiError> {
    let operation_id = value
        .get("operationId")
        .and_then(Value::as_str)
        .map(str::to_string);
    let deprecated = value
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let parameters = value
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .map(parameter_from_value)
                .collect::<Result<Vec<_>, OpenApiError>>()
        })
        .transpose()?
        .unwrap_or_default();
    let request_body = value.get("requestBody").map(request_body_from_value);
    let responses = value
        .get("responses")
        .and_then(Value::as_object)
        .map(|responses| {
            responses
                .iter()
                .map(|(status, resp)| (status.clone(), response_from_value(resp)))
                .collect()
        })
        .unwrap_or_default();

    Ok(Operation {
        operation_id,
        deprecated,
        parameters,
        request_body,
        responses,
    })
}

fn parameter_from_value(value: &Value) -> Result<Parameter, OpenApiError> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| OpenApiError::Malformed {
            field: "parameter.name".to_string(),
            detail: "missing or not a string".to_string(),
        })?
        .to_string();
    let location = match value.get("in").and_then(Value::as_str) {
        Some("query") => ParameterLocation::Query,
        Some("path") => ParameterLocation::Path,
        Some("header") => ParameterLocation::Header,
        Some("cookie") => ParameterLocation::Cookie,
        other => {
            return Err(OpenApiError::Malformed {
                field: "parameter.in".to_string(),
                detail: format!("unrecognized location {other:?}"),
            });
        }
    };
    let required = value
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let schema = value.get("schema").map(schema_from_value);
    Ok(Parameter {
        name,
        location,
        required,
        schema,
    })
}

fn request_body_from_value(value: &Value) -> RequestBody {
    RequestBody {
        required: value
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        content: content_from_value(value),
    }
}

fn response_from_value(value: &Value) -> ResponseObject {
    ResponseObject {
        content: content_from_value(value),
    }
}

fn content_from_value(value: &Value) -> BTreeMap<String, MediaType> {
    value
        .get("content")
        .and_then(Value::as_object)
        .map(|content| {
            content
                .iter()
                .map(|(media_type, body)| {
                    let schema = body.get("schema").map(schema_from_value);
                    (media_type.clone(), MediaType { schema })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn schema_from_value(value: &Value) -> Schema {
    let schema_type = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);
    let format = value
        .get("format")
        .and_then(Value::as_str)
        .map(str::to_string);
    let properties = value
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| (name.clone(), schema_from_value(prop)))
                .collect()
        })
        .unwrap_or_default();
    let required = value
        .get("required")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let items = value
        .get("items")
        .map(|item| Box::new(schema_from_value(item)));
    let enum_values = value
        .get("enum")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect()
        })
        .unwrap_or_default();
    let default = value.get("default").cloned();
    let nullable = value
        .get("nullable")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let deprecated = value
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Schema {
        schema_type,
        format,
        properties,
        required,
        items,
        enum_values,
        default,
        nullable,
        deprecated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_json_document() {
        let json = br#"{
            "openapi": "3.0.3",
            "info": {"title": "billing", "version": "1.2.0"},
            "paths": {
                "/sessions": {
                    "post": {
                        "operationId": "createSession",
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {"type": "object", "required": ["budget"]}
                                }
                            }
                        },
                        "responses": {
                            "200": {"content": {"application/json": {"schema": {"type": "object"}}}}
                        }
                    }
                }
            }
        }"#;
        let doc = parse_document(json).unwrap();
        assert_eq!(doc.info.title, "billing");
        let item = doc.paths.get("/sessions").unwrap();
        let op = item.operations.get(&Method::Post).unwrap();
        assert_eq!(op.operation_id.as_deref(), Some("createSession"));
        assert!(op.request_body.as_ref().unwrap().required);
    }

    #[test]
    fn parses_equivalent_yaml_document() {
        let yaml = b"
openapi: 3.0.3
info:
  title: billing
  version: 1.2.0
paths:
  /sessions:
    post:
      operationId: createSession
      responses:
        '200':
          content: {}
";
        let doc = parse_document(yaml).unwrap();
        assert_eq!(doc.info.version, "1.2.0");
        assert!(doc.paths.contains_key("/sessions"));
    }

    #[test]
    fn rejects_unrecognized_parameter_location() {
        let json = br#"{
            "openapi": "3.0.3",
            "paths": {
                "/x": {
                    "get": {
                        "parameters": [{"name": "id", "in": "body", "required": true}]
                    }
                }
            }
        }"#;
        assert!(parse_document(json).is_err());
    }
}
