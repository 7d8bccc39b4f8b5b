//! Error types for the API contract

use thiserror::Error;

/// Result type alias using ContractError
pub type Result<T> = std::result::Result<T, ContractError>;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Invalid request: {field} {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    #[error("OpenAPI document is missing field: {0}")]
    MissingDocumentField(&'static str),

    #[error("Unsupported OpenAPI version {found:?} (accepted: {accepted})")]
    UnsupportedOpenApiVersion { found: String, accepted: String },

    #[error("Missing operation ids: {}", .0.join(", "))]
    MissingOperations(Vec<String>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
