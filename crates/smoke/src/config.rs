//! Harness configuration
//!
//! The base URL and bearer credential are read exactly once, before the
//! first request, and then passed by reference to every step.

use std::collections::BTreeMap;
use std::fmt;

use directoros_contract::{routes, AlbumInfo, Controls, DeriveConceptsRequest, Engine};

use crate::error::{HarnessError, HarnessResult};

pub const BASE_URL_VAR: &str = "BASE_URL";
pub const BEARER_VAR: &str = "ACTIONS_BEARER";

/// Look up every name and fail if any is absent or blank.
///
/// All missing names are reported together so one run shows the whole gap.
pub fn require_config<F>(names: &[&str], lookup: F) -> HarnessResult<BTreeMap<String, String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = BTreeMap::new();
    let mut missing = Vec::new();

    for name in names {
        match lookup(*name).map(|v| v.trim().to_string()) {
            Some(value) if !value.is_empty() => {
                values.insert(name.to_string(), value);
            }
            _ => missing.push(name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(values)
    } else {
        Err(HarnessError::Configuration(missing))
    }
}

/// Immutable configuration for one run
#[derive(Clone)]
pub struct HarnessConfig {
    pub base_url: String,
    pub bearer: String,
    pub options: HarnessOptions,
}

impl HarnessConfig {
    /// Build the configuration from any name -> value source.
    pub fn from_lookup<F>(lookup: F, options: HarnessOptions) -> HarnessResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = require_config(&[BASE_URL_VAR, BEARER_VAR], lookup)?;
        let base_url = values.remove(BASE_URL_VAR).unwrap_or_default();
        let bearer = values.remove(BEARER_VAR).unwrap_or_default();

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer,
            options,
        })
    }
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("base_url", &self.base_url)
            .field("bearer", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

/// Everything about a run that is not a credential
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    /// Every spelling of the privacy page that must answer 200
    pub privacy_paths: Vec<String>,

    /// Every spelling of the health probe that must answer 200
    pub health_paths: Vec<String>,

    pub scenario: ScenarioConfig,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            privacy_paths: routes::PRIVACY_ALIASES.iter().map(|p| p.to_string()).collect(),
            health_paths: routes::HEALTH_ALIASES.iter().map(|p| p.to_string()).collect(),
            scenario: ScenarioConfig::default(),
        }
    }
}

/// Inputs of the end-to-end pipeline
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub album: AlbumInfo,

    /// Concept variants to request (None = server default)
    pub variants: Option<u32>,

    pub stills_count: u32,

    pub brief: String,

    pub duration_sec: f64,

    pub beats: u32,

    pub engine: Engine,
}

impl ScenarioConfig {
    pub fn derive_request(&self) -> DeriveConceptsRequest {
        let request = DeriveConceptsRequest::new(self.album.clone());
        match self.variants {
            Some(variants) => request.with_controls(Controls {
                variants,
                ..Default::default()
            }),
            None => request,
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            album: AlbumInfo {
                title: "Winter Love".to_string(),
                style: "pop ballad".to_string(),
                lyrics: "snow and warm hands".to_string(),
            },
            variants: None,
            stills_count: 3,
            brief: "hot pack handoff".to_string(),
            duration_sec: 3.0,
            beats: 5,
            engine: Engine::Sora,
        }
    }
}
