//! Request and response models for the Actions API
//!
//! Requests that carry a value produced by an earlier call (`selection`,
//! `scene`) are generic over that value. The harness forwards the raw JSON it
//! received, unmodified; a server-side consumer uses the typed default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ContractError, Result};

pub const MAX_VARIANTS: u32 = 6;
pub const MAX_STILLS: u32 = 6;
pub const MAX_BEATS: u32 = 12;

/// Album metadata that seeds concept derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumInfo {
    pub title: String,
    pub style: String,
    pub lyrics: String,
}

/// Optional knobs for concept derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    #[serde(default = "default_variants")]
    pub variants: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette_override: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_override: Option<Vec<String>>,
}

fn default_variants() -> u32 {
    3
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            variants: default_variants(),
            palette_override: None,
            lighting_override: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeriveConceptsRequest {
    pub album_info: AlbumInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Controls>,
}

impl DeriveConceptsRequest {
    pub fn new(album_info: AlbumInfo) -> Self {
        Self {
            album_info,
            controls: None,
        }
    }

    pub fn with_controls(mut self, controls: Controls) -> Self {
        self.controls = Some(controls);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(controls) = &self.controls {
            check_range("controls.variants", controls.variants, 1, MAX_VARIANTS)?;
        }
        Ok(())
    }
}

/// A server-generated narrative/visual idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub title: String,
    pub logline: String,
    pub style: String,
    #[serde(default)]
    pub cast: Vec<String>,
    /// palette, lighting, props
    #[serde(default)]
    pub anchors: BTreeMap<String, Vec<String>>,
    pub storyline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeriveConceptsResponse {
    pub concepts: Vec<Concept>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeStillsRequest<S = Concept> {
    pub selection: S,
    #[serde(default = "default_stills")]
    pub count: u32,
}

fn default_stills() -> u32 {
    3
}

impl<S> ComposeStillsRequest<S> {
    pub fn validate(&self) -> Result<()> {
        check_range("count", self.count, 1, MAX_STILLS)
    }
}

/// Midjourney-style still prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MjPrompt {
    pub id: String,
    pub prompt: String,
    #[serde(default = "default_aspect_ratio")]
    pub ar: String,
    #[serde(default)]
    pub notes: serde_json::Map<String, serde_json::Value>,
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeStillsResponse {
    pub stills: Vec<MjPrompt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandSceneRequest<S = Concept> {
    pub brief: String,
    pub selection: S,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub duration_sec: f64,
    pub beats: u32,
}

impl<S> ExpandSceneRequest<S> {
    pub fn validate(&self) -> Result<()> {
        if !(self.duration_sec.is_finite() && self.duration_sec > 0.0) {
            return Err(ContractError::InvalidRequest {
                field: "duration_sec",
                reason: format!("must be a positive number, got {}", self.duration_sec),
            });
        }
        check_range("beats", self.beats, 1, MAX_BEATS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBeat {
    /// Seconds from scene start
    pub t: f64,
    pub beat: String,
    pub intensity: f64,
}

/// Structured description of a short video segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDraft {
    /// Static foundations (aspect ratio, framing, lens)
    pub st: serde_json::Map<String, serde_json::Value>,
    /// Dynamic-strong elements (primary action, camera move)
    pub ds: serde_json::Map<String, serde_json::Value>,
    /// Dynamic-weak elements (ambient, micro VFX)
    pub dw: serde_json::Map<String, serde_json::Value>,
    pub timeline: Vec<TimelineBeat>,
    /// Engine name -> prompt draft
    pub drafts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandSceneResponse<Sc = SceneDraft> {
    pub scene: Sc,
}

/// Video engine a scene is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Engine {
    Sora,
    Veo,
}

impl Default for Engine {
    fn default() -> Self {
        Self::Sora
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Sora => write!(f, "SORA"),
            Engine::Veo => write!(f, "VEO"),
        }
    }
}

impl std::str::FromStr for Engine {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SORA" => Ok(Engine::Sora),
            "VEO" => Ok(Engine::Veo),
            other => Err(ContractError::InvalidRequest {
                field: "engine",
                reason: format!("unknown engine {:?} (expected SORA or VEO)", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaValidateRequest<Sc = SceneDraft> {
    pub scene: Sc,
    #[serde(default)]
    pub engine: Engine,
}

/// QA severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Fail,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Fail => write!(f, "fail"),
        }
    }
}

/// Server-computed quality assessment of a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    pub story_match_score: f64,
    pub coverage_score: f64,
    #[serde(default)]
    pub conflicts: Vec<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaValidateResponse {
    pub engine_render: String,
    pub report: QaReport,
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(ContractError::InvalidRequest {
            field,
            reason: format!("must be between {} and {}, got {}", min, max, value),
        });
    }
    Ok(())
}
