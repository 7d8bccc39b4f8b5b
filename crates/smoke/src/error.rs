//! Error types for the harness

use directoros_contract::ContractError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    Configuration(Vec<String>),

    #[error("{method} {endpoint} returned {status} (expected {})", format_codes(.expected))]
    UnexpectedStatus {
        method: String,
        endpoint: String,
        status: u16,
        expected: Vec<u16>,
    },

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("Response from {endpoint} is missing field `{field}`")]
    MissingField { endpoint: String, field: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Process exit code for this failure.
    ///
    /// `1` means the server broke the contract, `2` means the run never got
    /// a meaningful answer (bad configuration, transport, local IO).
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::Configuration(_)
            | HarnessError::InvalidRequest(_)
            | HarnessError::Http(_)
            | HarnessError::Io(_) => 2,
            _ => 1,
        }
    }
}

impl From<ContractError> for HarnessError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::InvalidRequest { .. } => HarnessError::InvalidRequest(e.to_string()),
            ContractError::MissingDocumentField(field) => HarnessError::MissingField {
                endpoint: directoros_contract::routes::OPENAPI_JSON.to_string(),
                field: field.to_string(),
            },
            ContractError::UnsupportedOpenApiVersion { .. } | ContractError::MissingOperations(_) => {
                HarnessError::AssertionFailed(e.to_string())
            }
            ContractError::Serialization(inner) => HarnessError::Json(inner),
        }
    }
}

fn format_codes(codes: &[u16]) -> String {
    codes
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

pub type HarnessResult<T> = Result<T, HarnessError>;
