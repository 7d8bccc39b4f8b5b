//! Main harness runner that sequences the steps of a suite
//!
//! A run is a straight line: configuration check, then each step in order.
//! The first error moves the run to `Failed` and nothing else is sent.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use directoros_contract::QaReport;

use crate::client::{ApiClient, CallRecord};
use crate::config::{HarnessConfig, HarnessOptions};
use crate::error::{HarnessError, HarnessResult};
use crate::steps;

/// Which steps a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suite {
    /// Public probes, OpenAPI contract and the auth guard
    Smoke,
    /// derive-concepts -> compose-stills -> expand-scene -> qa-validate
    E2e,
    /// Smoke followed by E2e
    All,
}

impl Suite {
    fn includes_smoke(self) -> bool {
        matches!(self, Suite::Smoke | Suite::All)
    }

    fn includes_e2e(self) -> bool {
        matches!(self, Suite::E2e | Suite::All)
    }
}

impl std::fmt::Display for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suite::Smoke => write!(f, "smoke"),
            Suite::E2e => write!(f, "e2e"),
            Suite::All => write!(f, "all"),
        }
    }
}

/// Position of a run in its linear state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running { step: usize, name: String },
    Done,
    Failed { step: usize, name: String },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed { .. })
    }
}

/// Result of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub calls: Vec<CallRecord>,
    pub error: Option<String>,
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub suite: Suite,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub state: RunState,
    pub steps: Vec<StepResult>,
    pub qa_report: Option<QaReport>,
    pub error: Option<String>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.state == RunState::Done
    }

    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|s| s.success).count()
    }

    /// Every request made during the run, in order.
    pub fn calls(&self) -> impl Iterator<Item = &CallRecord> {
        self.steps.iter().flat_map(|s| s.calls.iter())
    }
}

/// Report plus the error that stopped the run, if any
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub error: Option<HarnessError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map(HarnessError::exit_code).unwrap_or(0)
    }
}

/// Step bookkeeping and state transitions for one run
#[derive(Debug)]
pub struct Journal {
    state: RunState,
    steps: Vec<StepResult>,
}

impl Journal {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            steps: Vec::new(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// Run a synchronous step that makes no requests.
    pub fn preflight<T, F>(&mut self, name: &str, f: F) -> HarnessResult<T>
    where
        F: FnOnce() -> HarnessResult<T>,
    {
        let start = self.begin(name);
        let result = f();
        self.finish(name, start, Vec::new(), result)
    }

    /// Await a step and record the requests it made on `client`.
    pub async fn step<T, Fut>(&mut self, name: &str, client: &ApiClient, fut: Fut) -> HarnessResult<T>
    where
        Fut: Future<Output = HarnessResult<T>>,
    {
        let start = self.begin(name);
        let result = fut.await;
        self.finish(name, start, client.take_calls(), result)
    }

    /// Mark a run that got through every step.
    pub fn complete(&mut self) {
        if !self.state.is_terminal() {
            self.state = RunState::Done;
        }
    }

    fn begin(&mut self, name: &str) -> Instant {
        self.state = RunState::Running {
            step: self.steps.len(),
            name: name.to_string(),
        };
        debug!("Step {} ({}) started", self.steps.len(), name);
        Instant::now()
    }

    fn finish<T>(
        &mut self,
        name: &str,
        start: Instant,
        calls: Vec<CallRecord>,
        result: HarnessResult<T>,
    ) -> HarnessResult<T> {
        let duration_ms = start.elapsed().as_millis() as u64;
        let step = self.steps.len();

        match &result {
            Ok(_) => info!("✓ {} ({} ms)", name, duration_ms),
            Err(e) => {
                error!("✗ {} - {}", name, e);
                self.state = RunState::Failed {
                    step,
                    name: name.to_string(),
                };
            }
        }

        self.steps.push(StepResult {
            name: name.to_string(),
            success: result.is_ok(),
            duration_ms,
            calls,
            error: result.as_ref().err().map(|e| e.to_string()),
        });
        result
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequences a suite against the Actions API
pub struct HarnessRunner {
    suite: Suite,
    options: HarnessOptions,
}

impl HarnessRunner {
    pub fn new(suite: Suite, options: HarnessOptions) -> Self {
        Self { suite, options }
    }

    /// Run the suite; `lookup` supplies the required configuration values.
    pub async fn run<F>(self, lookup: F) -> RunOutcome
    where
        F: Fn(&str) -> Option<String>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut journal = Journal::new();
        let mut qa_report = None;

        info!("Running {} suite...", self.suite);
        let result = self.execute(&mut journal, lookup, &mut qa_report).await;
        if result.is_ok() {
            journal.complete();
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let error = result.err();
        let report = RunReport {
            suite: self.suite,
            started_at,
            duration_ms,
            state: journal.state,
            steps: journal.steps,
            qa_report,
            error: error.as_ref().map(|e| e.to_string()),
        };

        info!(
            "Results: {} of {} step(s) passed ({} ms)",
            report.passed(),
            report.steps.len(),
            duration_ms
        );

        RunOutcome { report, error }
    }

    async fn execute<F>(
        &self,
        journal: &mut Journal,
        lookup: F,
        qa_report: &mut Option<QaReport>,
    ) -> HarnessResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let options = self.options.clone();
        let config = journal.preflight("config", || HarnessConfig::from_lookup(lookup, options))?;
        let client = ApiClient::new(&config)?;
        let scenario = &config.options.scenario;
        info!("Target: {}", client.base_url());

        if self.suite.includes_smoke() {
            journal
                .step("privacy", &client, steps::probe_aliases(&client, &config.options.privacy_paths))
                .await?;
            journal
                .step("health", &client, steps::probe_aliases(&client, &config.options.health_paths))
                .await?;
            journal
                .step("openapi", &client, steps::check_openapi(&client))
                .await?;
            journal
                .step("auth-guard", &client, steps::check_auth_guard(&client, scenario))
                .await?;
        }

        if self.suite.includes_e2e() {
            let selection = journal
                .step("derive-concepts", &client, steps::derive_concepts(&client, scenario))
                .await?;
            journal
                .step(
                    "compose-stills",
                    &client,
                    steps::compose_stills(&client, &selection, scenario.stills_count),
                )
                .await?;
            let scene = journal
                .step("expand-scene", &client, steps::expand_scene(&client, &selection, scenario))
                .await?;
            let report = journal
                .step("qa-validate", &client, steps::qa_validate(&client, &scene, scenario))
                .await?;
            *qa_report = Some(report);
        }

        Ok(())
    }
}

/// Write the run report as JSON, creating parent directories.
pub fn write_results(report: &RunReport, path: &Path) -> HarnessResult<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path.to_path_buf())
}
