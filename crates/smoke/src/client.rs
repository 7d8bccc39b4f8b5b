//! HTTP client for the Actions API

use std::sync::Mutex;
use std::time::Instant;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use directoros_contract::routes;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

/// Whether a request carries the bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    Bearer,
    Omit,
}

/// One HTTP exchange, as recorded in the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub method: String,
    pub endpoint: String,
    pub authenticated: bool,
    /// None when the request never got a response
    pub status: Option<u16>,
    pub duration_ms: u64,
}

impl CallRecord {
    fn new(
        method: &Method,
        endpoint: &str,
        credential: Credential,
        status: Option<StatusCode>,
        start: Instant,
    ) -> Self {
        Self {
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            authenticated: credential == Credential::Bearer,
            status: status.map(|s| s.as_u16()),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Status and raw body of a completed request
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: Method,
    pub endpoint: String,
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn expect_status(&self, expected: &[u16]) -> HarnessResult<&Self> {
        expect_status(&self.method, &self.endpoint, self.status, expected)?;
        Ok(self)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> HarnessResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| HarnessError::MalformedResponse {
            endpoint: self.endpoint.clone(),
            reason: format!("body is not valid JSON: {}", e),
        })
    }
}

/// Fail unless `actual` is one of the `expected` codes.
pub fn expect_status(
    method: &Method,
    endpoint: &str,
    actual: StatusCode,
    expected: &[u16],
) -> HarnessResult<()> {
    if expected.contains(&actual.as_u16()) {
        Ok(())
    } else {
        Err(HarnessError::UnexpectedStatus {
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            status: actual.as_u16(),
            expected: expected.to_vec(),
        })
    }
}

/// Client bound to one base URL and credential
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: String,
    calls: Mutex<Vec<CallRecord>>,
}

impl ApiClient {
    /// Create a client from the run configuration.
    ///
    /// No timeout is set; requests wait as long as the transport does.
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("directoros-smoke/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            bearer: config.bearer.clone(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one request. No retry.
    pub async fn call_endpoint(
        &self,
        method: Method,
        endpoint: &str,
        credential: Credential,
        body: Option<&Value>,
    ) -> HarnessResult<ApiResponse> {
        let url = routes::join(&self.base_url, endpoint);
        debug!("{} {} (credential: {:?})", method, url, credential);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if credential == Credential::Bearer {
            request = request.bearer_auth(&self.bearer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.record(CallRecord::new(&method, endpoint, credential, None, start));
                return Err(e.into());
            }
        };

        // The status is known once headers arrive, even if the body fails.
        let status = response.status();
        let body = response.text().await;
        let call = CallRecord::new(&method, endpoint, credential, Some(status), start);
        let duration_ms = call.duration_ms;
        self.record(call);

        let body = body?;
        debug!("{} {} -> {} ({} ms)", method, endpoint, status, duration_ms);

        Ok(ApiResponse {
            method,
            endpoint: endpoint.to_string(),
            status,
            body,
        })
    }

    /// Unauthenticated GET
    pub async fn get(&self, endpoint: &str) -> HarnessResult<ApiResponse> {
        self.call_endpoint(Method::GET, endpoint, Credential::Omit, None)
            .await
    }

    /// JSON POST
    pub async fn post_json<T: Serialize>(
        &self,
        endpoint: &str,
        credential: Credential,
        body: &T,
    ) -> HarnessResult<ApiResponse> {
        let body = serde_json::to_value(body)?;
        self.call_endpoint(Method::POST, endpoint, credential, Some(&body))
            .await
    }

    /// Drain the calls recorded since the last drain.
    pub fn take_calls(&self) -> Vec<CallRecord> {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *calls)
    }

    fn record(&self, call: CallRecord) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}
