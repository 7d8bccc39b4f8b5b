//! OpenAPI document checks
//!
//! The Actions API publishes its description at `/openapi.json`. Clients
//! that import it (GPT actions, SDK generators) rely on the document version
//! and on stable operation ids, so both are part of the contract.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{ContractError, Result};

pub const ACCEPTED_OPENAPI_VERSIONS: &[&str] = &["3.1.0", "3.1.1"];

pub const REQUIRED_OPERATION_IDS: &[&str] = &[
    "getHealth",
    "getPrivacy",
    "deriveConcepts",
    "composeStills",
    "expandScene",
    "qaValidate",
];

const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// The parts of an OpenAPI document the harness asserts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenApiSummary {
    pub version: String,
    pub operation_ids: BTreeSet<String>,
}

impl OpenApiSummary {
    /// Extract the version and every declared operation id.
    pub fn from_value(doc: &Value) -> Result<Self> {
        let version = doc
            .get("openapi")
            .and_then(Value::as_str)
            .ok_or(ContractError::MissingDocumentField("openapi"))?
            .to_string();

        let paths = doc
            .get("paths")
            .and_then(Value::as_object)
            .ok_or(ContractError::MissingDocumentField("paths"))?;

        let operation_ids = paths
            .values()
            .filter_map(Value::as_object)
            .flat_map(|item| {
                HTTP_METHODS
                    .iter()
                    .filter_map(|method| item.get(*method))
                    .filter_map(|op| op.get("operationId").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(Self {
            version,
            operation_ids,
        })
    }

    pub fn check_version(&self) -> Result<()> {
        if ACCEPTED_OPENAPI_VERSIONS.contains(&self.version.as_str()) {
            Ok(())
        } else {
            Err(ContractError::UnsupportedOpenApiVersion {
                found: self.version.clone(),
                accepted: ACCEPTED_OPENAPI_VERSIONS.join(", "),
            })
        }
    }

    /// Required ids absent from the document, in declaration order.
    pub fn missing_operations(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|id| !self.operation_ids.contains(**id))
            .map(|id| id.to_string())
            .collect()
    }

    pub fn check_operations(&self, required: &[&str]) -> Result<()> {
        let missing = self.missing_operations(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContractError::MissingOperations(missing))
        }
    }

    /// Version check followed by the required-operation check.
    pub fn check(&self) -> Result<()> {
        self.check_version()?;
        self.check_operations(REQUIRED_OPERATION_IDS)
    }
}
