//! DirectorOS Actions API Smoke Harness
//!
//! Exercises the HTTP contract of a deployed Actions API:
//! - probes the public privacy and health routes under every alias
//! - checks the published OpenAPI document
//! - verifies the bearer guard rejects anonymous calls
//! - chains derive-concepts -> compose-stills -> expand-scene -> qa-validate
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    HarnessRunner                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  config      require_config() -> HarnessConfig           │
//! │  client      call_endpoint() -> ApiResponse              │
//! │              expect_status()                             │
//! │  project     project_fields() -> reduced JSON            │
//! │  steps       one async fn per step, value in, value out  │
//! │  runner      Journal: Idle -> Running -> Done | Failed   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod project;
pub mod runner;
pub mod steps;

pub use client::{ApiClient, ApiResponse, CallRecord, Credential};
pub use config::{HarnessConfig, HarnessOptions, ScenarioConfig};
pub use error::{HarnessError, HarnessResult};
pub use runner::{HarnessRunner, RunOutcome, RunReport, RunState, Suite};
