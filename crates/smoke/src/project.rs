//! Response projection
//!
//! Copies a declared subset of keys out of a JSON response. Dotted paths
//! reach into nested objects and are rebuilt with the same nesting.

use serde_json::{Map, Value};

use crate::error::{HarnessError, HarnessResult};

/// A key to copy, and whether its absence is an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub path: &'static str,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(path: &'static str) -> Self {
        Self { path, required: true }
    }

    pub const fn optional(path: &'static str) -> Self {
        Self { path, required: false }
    }
}

/// Fields of a concept carried forward as the selection
pub const SELECTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("id"),
    FieldSpec::required("title"),
    FieldSpec::required("logline"),
    FieldSpec::required("style"),
    FieldSpec::optional("anchors"),
    FieldSpec::optional("cast"),
    FieldSpec::required("storyline"),
];

/// Fields of a qa-validate response the harness reads
pub const QA_REPORT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("report.severity"),
    FieldSpec::required("report.story_match_score"),
    FieldSpec::required("report.coverage_score"),
    FieldSpec::optional("report.conflicts"),
];

/// Build a new object holding only `fields` from `source`.
///
/// `endpoint` names the response in errors.
pub fn project_fields(source: &Value, fields: &[FieldSpec], endpoint: &str) -> HarnessResult<Value> {
    if !source.is_object() {
        return Err(HarnessError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: format!("expected a JSON object, got {}", kind(source)),
        });
    }

    let mut projected = Map::new();
    for field in fields {
        match lookup(source, field.path) {
            Some(value) => insert(&mut projected, field.path, value.clone()),
            None if field.required => {
                return Err(HarnessError::MissingField {
                    endpoint: endpoint.to_string(),
                    field: field.path.to_string(),
                });
            }
            None => {}
        }
    }

    Ok(Value::Object(projected))
}

fn lookup<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(source, |current, segment| current.as_object()?.get(segment))
}

fn insert(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = child {
                insert(child, rest, value);
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
