//! DirectorOS Actions API Contract
//!
//! Typed request/response models, route constants and the OpenAPI
//! document checks shared by the smoke harness and its mock server.

pub mod error;
pub mod openapi;
pub mod routes;
pub mod types;

// Re-export commonly used types
pub use error::{ContractError, Result};
pub use openapi::{OpenApiSummary, ACCEPTED_OPENAPI_VERSIONS, REQUIRED_OPERATION_IDS};
pub use types::*;

/// API version this contract was written against
pub const API_VERSION: &str = "0.3.1a";
