//! In-process mock of the DirectorOS Actions API
//!
//! Serves the same routes and shapes as the real service on an ephemeral
//! port. `Faults` switches individual parts of the contract off so tests
//! can check the harness catches each one.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;

use directoros_contract::{
    routes, ComposeStillsRequest, ComposeStillsResponse, Concept, DeriveConceptsRequest,
    DeriveConceptsResponse, ExpandSceneRequest, ExpandSceneResponse, MjPrompt, QaReport,
    QaValidateRequest, QaValidateResponse, SceneDraft, Severity, TimelineBeat, API_VERSION,
};
use directoros_smoke::config::{BASE_URL_VAR, BEARER_VAR};

pub const TOKEN: &str = "test-bearer-7f3a";

/// Contract breakages the mock can simulate
#[derive(Debug, Clone)]
pub struct Faults {
    /// Protected routes accept anonymous calls
    pub auth_disabled: bool,
    /// Value of the `openapi` field
    pub openapi_version: String,
    /// Operation id left out of the document
    pub drop_operation: Option<&'static str>,
    /// Serve `/openapi.json` as HTML
    pub openapi_html: bool,
    /// Route path that is not registered (answers 404)
    pub broken_alias: Option<&'static str>,
    /// Field removed from every derived concept
    pub concept_without: Option<&'static str>,
    /// derive-concepts answers with an empty list
    pub empty_concepts: bool,
    /// Field removed from every composed still
    pub still_without: Option<&'static str>,
    /// Field removed from the QA report
    pub report_without: Option<&'static str>,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            auth_disabled: false,
            openapi_version: "3.1.0".to_string(),
            drop_operation: None,
            openapi_html: false,
            broken_alias: None,
            concept_without: None,
            empty_concepts: false,
            still_without: None,
            report_without: None,
        }
    }
}

/// A request as seen by the mock, rejected or not
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub authorized: bool,
    /// Parsed JSON body, if there was one
    pub body: Option<Value>,
}

pub struct MockState {
    faults: Faults,
    seen: Mutex<Vec<SeenRequest>>,
    responses: Mutex<BTreeMap<String, Vec<Value>>>,
}

pub struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockApi {
    pub async fn spawn(faults: Faults) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            faults,
            seen: Mutex::new(Vec::new()),
            responses: Mutex::new(BTreeMap::new()),
        });

        let mut router = Router::new();
        for &path in routes::PRIVACY_ALIASES.iter().chain(routes::HEALTH_ALIASES) {
            if state.faults.broken_alias == Some(path) {
                continue;
            }
            // Trailing-slash spellings redirect like FastAPI's redirect_slashes
            let canonical = path.trim_end_matches('/');
            router = if canonical != path {
                router.route(path, get(move || async move { Redirect::temporary(canonical) }))
            } else if routes::PRIVACY_ALIASES.contains(&path) {
                router.route(path, get(privacy))
            } else {
                router.route(path, get(health))
            };
        }
        let app = router
            .route(routes::OPENAPI_JSON, get(openapi))
            .route(routes::DERIVE_CONCEPTS, post(derive_concepts))
            .route(routes::COMPOSE_STILLS, post(compose_stills))
            .route(routes::EXPAND_SCENE, post(expand_scene))
            .route(routes::QA_VALIDATE, post(qa_validate))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        })
    }

    /// Configuration source pointing the harness at this mock
    pub fn lookup(&self) -> impl Fn(&str) -> Option<String> {
        self.lookup_with_token(TOKEN)
    }

    pub fn lookup_with_token(&self, token: &str) -> impl Fn(&str) -> Option<String> {
        let base_url = self.base_url.clone();
        let token = token.to_string();
        move |name: &str| match name {
            BASE_URL_VAR => Some(base_url.clone()),
            BEARER_VAR => Some(token.clone()),
            _ => None,
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.seen().iter().filter(|r| r.path == path).count()
    }

    /// JSON bodies received on `path`, oldest first, including rejected calls
    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.seen()
            .into_iter()
            .filter(|r| r.path == path)
            .filter_map(|r| r.body)
            .collect()
    }

    /// JSON bodies sent from `path`, oldest first
    pub fn responses(&self, path: &str) -> Vec<Value> {
        self.state.responses.lock().unwrap().get(path).cloned().unwrap_or_default()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Log every request with its body before routing or auth runs.
async fn record(State(state): State<Arc<MockState>>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    state.seen.lock().unwrap().push(SeenRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        authorized: parts.headers.contains_key(header::AUTHORIZATION),
        body: serde_json::from_slice(&bytes).ok(),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// FastAPI's HTTPBearer answers 403 without a header and the app 401 on a bad token.
fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    if state.faults.auth_disabled {
        return Ok(());
    }
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        None => Err((StatusCode::FORBIDDEN, Json(json!({"detail": "Not authenticated"}))).into_response()),
        Some(value) if value == format!("Bearer {}", TOKEN) => Ok(()),
        Some(_) => Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Unauthorized"}))).into_response()),
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &Value) -> Result<T, Response> {
    serde_json::from_value(body.clone()).map_err(|e| {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": e.to_string()}))).into_response()
    })
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}

fn without(mut value: Value, field: Option<&str>) -> Value {
    if let (Some(field), Some(object)) = (field, value.as_object_mut()) {
        object.remove(field);
    }
    value
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn reply(state: &MockState, path: &str, body: Value) -> Response {
    state
        .responses
        .lock()
        .unwrap()
        .entry(path.to_string())
        .or_default()
        .push(body.clone());
    Json(body).into_response()
}

async fn privacy() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body><h1>Privacy Policy</h1></body></html>",
    )
}

async fn health() -> Json<Value> {
    Json(json!({
        "ok": true,
        "name": format!("DirectorOS Actions API (v{})", API_VERSION),
        "version": API_VERSION
    }))
}

async fn openapi(State(state): State<Arc<MockState>>) -> Response {
    if state.faults.openapi_html {
        return ([(header::CONTENT_TYPE, "text/html")], "<html>docs</html>").into_response();
    }

    let operations = [
        ("/health", "get", "getHealth"),
        ("/privacy", "get", "getPrivacy"),
        ("/derive-concepts", "post", "deriveConcepts"),
        ("/compose-stills", "post", "composeStills"),
        ("/expand-scene", "post", "expandScene"),
        ("/qa-validate", "post", "qaValidate"),
    ];
    let mut paths = Map::new();
    for (path, method, id) in operations {
        if state.faults.drop_operation == Some(id) {
            continue;
        }
        paths.insert(path.to_string(), json!({ method: { "operationId": id } }));
    }

    Json(json!({
        "openapi": state.faults.openapi_version,
        "info": {"title": format!("DirectorOS Actions API (v{})", API_VERSION), "version": API_VERSION},
        "paths": paths,
    }))
    .into_response()
}

async fn derive_concepts(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let request: DeriveConceptsRequest = match parse(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    let variants = request.controls.map(|c| c.variants).unwrap_or(3);
    let base_id = request.album_info.title.to_lowercase().replace(' ', "-");
    let codes = ["a", "b", "c", "d", "e", "f"];
    let concepts: Vec<Concept> = if state.faults.empty_concepts {
        Vec::new()
    } else {
        codes
            .iter()
            .take(variants as usize)
            .map(|code| Concept {
                id: format!("{}-{}", base_id, code),
                title: format!("{} - {}", request.album_info.title, code.to_uppercase()),
                logline: "intimate, handheld realism take inspired by lyrics".to_string(),
                style: request.album_info.style.clone(),
                cast: vec!["lead (20s)".to_string(), "friend (20s)".to_string()],
                anchors: BTreeMap::from([
                    (
                        "palette".to_string(),
                        vec!["neon pink".into(), "electric blue".into(), "citrus yellow".into(), "white".into()],
                    ),
                    (
                        "lighting".to_string(),
                        vec!["soft key from window".into(), "gentle fill".into(), "subtle rim".into()],
                    ),
                    (
                        "props".to_string(),
                        vec!["phone".into(), "jacket".into(), "hot pack".into()],
                    ),
                ]),
                storyline: "Meet-cute to parting micro-journey aligned to chorus/bridge beats.".to_string(),
            })
            .collect()
    };

    let mut response = to_json(&DeriveConceptsResponse { concepts });
    if let Some(Value::Array(concepts)) = response.get_mut("concepts") {
        for concept in concepts.iter_mut() {
            *concept = without(concept.take(), state.faults.concept_without);
        }
    }
    reply(&state, routes::DERIVE_CONCEPTS, response)
}

async fn compose_stills(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let request: ComposeStillsRequest<Concept> = match parse(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    let stills = (1..=request.count.min(6))
        .map(|i| MjPrompt {
            id: format!("mj-{}", i),
            prompt: format!("{} look, natural skin texture; --ar 16:9", request.selection.style),
            ar: "16:9".to_string(),
            notes: object(json!({"lens": "50 mm"})),
        })
        .collect();

    let mut response = to_json(&ComposeStillsResponse { stills });
    if let Some(Value::Array(stills)) = response.get_mut("stills") {
        for still in stills.iter_mut() {
            *still = without(still.take(), state.faults.still_without);
        }
    }
    reply(&state, routes::COMPOSE_STILLS, response)
}

async fn expand_scene(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let request: ExpandSceneRequest<Concept> = match parse(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    let beats = request.beats.max(1);
    let timeline = (0..beats)
        .map(|i| TimelineBeat {
            t: if beats == 1 {
                0.0
            } else {
                request.duration_sec * f64::from(i) / f64::from(beats - 1)
            },
            beat: format!("beat {}", i + 1),
            intensity: 0.5,
        })
        .collect();

    let scene = SceneDraft {
        st: object(json!({
            "ar": "16:9",
            "framing": "medium shot, eye-level",
            "lens_mm": 85,
            "dof": "shallow",
            "base_lighting": request.selection.anchors.get("lighting").cloned().unwrap_or_default()
        })),
        ds: object(json!({"primary_action": request.brief, "camera_move": "slow push-in"})),
        dw: object(json!({"micro_vfx": "soft breath in cold air"})),
        timeline,
        drafts: BTreeMap::from([
            ("sora".to_string(), "medium shot, 85mm; winter street evening".to_string()),
            ("veo".to_string(), "medium shot, 85mm; city plaza dusk".to_string()),
        ]),
    };

    reply(&state, routes::EXPAND_SCENE, to_json(&ExpandSceneResponse { scene }))
}

async fn qa_validate(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let request: QaValidateRequest = match parse(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    let response = QaValidateResponse {
        engine_render: format!(
            "[BEGIN EngineRender {0}]\n...\n[END EngineRender {0}]",
            request.engine
        ),
        report: QaReport {
            story_match_score: 0.812,
            coverage_score: 1.0,
            conflicts: Vec::new(),
            severity: Severity::Info,
        },
    };

    let mut response = to_json(&response);
    if let Some(report) = response.get_mut("report") {
        *report = without(report.take(), state.faults.report_without);
    }
    reply(&state, routes::QA_VALIDATE, response)
}
