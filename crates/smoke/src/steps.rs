//! Individual harness steps
//!
//! Each step makes one or more requests, asserts on them and returns the
//! value the next step needs. Nothing here keeps state between calls.

use serde_json::Value;
use tracing::{debug, info, warn};

use directoros_contract::{
    routes, ComposeStillsRequest, ComposeStillsResponse, ExpandSceneRequest, ExpandSceneResponse,
    OpenApiSummary, QaReport, QaValidateRequest, Severity,
};

use crate::client::{ApiClient, Credential};
use crate::config::ScenarioConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::project::{project_fields, QA_REPORT_FIELDS, SELECTION_FIELDS};

const OK: &[u16] = &[200];
const AUTH_REJECTED: &[u16] = &[401, 403];

/// GET every alias and require 200 from each one.
pub async fn probe_aliases(client: &ApiClient, paths: &[String]) -> HarnessResult<()> {
    if paths.is_empty() {
        return Err(HarnessError::InvalidRequest("no paths to probe".to_string()));
    }

    for path in paths {
        client.get(path).await?.expect_status(OK)?;
        info!("GET {} -> 200", path);
    }
    Ok(())
}

/// Fetch the OpenAPI document and check its version and operation ids.
pub async fn check_openapi(client: &ApiClient) -> HarnessResult<OpenApiSummary> {
    let response = client.get(routes::OPENAPI_JSON).await?;
    let doc = response.expect_status(OK)?.json()?;

    let summary = OpenApiSummary::from_value(&doc)?;
    summary.check()?;

    info!(
        "OpenAPI {} declares {} operation(s)",
        summary.version,
        summary.operation_ids.len()
    );
    Ok(summary)
}

/// Send the same derive-concepts body without and then with the credential.
pub async fn check_auth_guard(client: &ApiClient, scenario: &ScenarioConfig) -> HarnessResult<()> {
    let request = scenario.derive_request();
    request.validate()?;

    let anonymous = client
        .post_json(routes::DERIVE_CONCEPTS, Credential::Omit, &request)
        .await?;
    anonymous.expect_status(AUTH_REJECTED)?;
    info!("POST {} without credential -> {}", routes::DERIVE_CONCEPTS, anonymous.status.as_u16());

    client
        .post_json(routes::DERIVE_CONCEPTS, Credential::Bearer, &request)
        .await?
        .expect_status(OK)?;
    info!("POST {} with credential -> 200", routes::DERIVE_CONCEPTS);
    Ok(())
}

/// Derive concepts and project the first one into a selection.
pub async fn derive_concepts(client: &ApiClient, scenario: &ScenarioConfig) -> HarnessResult<Value> {
    let request = scenario.derive_request();
    request.validate()?;

    let response = client
        .post_json(routes::DERIVE_CONCEPTS, Credential::Bearer, &request)
        .await?;
    let body = response.expect_status(OK)?.json()?;

    let concepts = body
        .get("concepts")
        .ok_or_else(|| HarnessError::MissingField {
            endpoint: routes::DERIVE_CONCEPTS.to_string(),
            field: "concepts".to_string(),
        })?
        .as_array()
        .ok_or_else(|| malformed(routes::DERIVE_CONCEPTS, "`concepts` is not an array"))?;

    let first = concepts
        .first()
        .ok_or_else(|| malformed(routes::DERIVE_CONCEPTS, "`concepts` is empty"))?;

    let selection = project_fields(first, SELECTION_FIELDS, routes::DERIVE_CONCEPTS)?;
    info!(
        "Derived {} concept(s); selected {}",
        concepts.len(),
        selection["id"]
    );
    debug!("Selection: {}", selection);
    Ok(selection)
}

/// Compose still prompts for the selection; returns how many came back.
pub async fn compose_stills(client: &ApiClient, selection: &Value, count: u32) -> HarnessResult<usize> {
    let request = ComposeStillsRequest {
        selection,
        count,
    };
    request.validate()?;

    let response = client
        .post_json(routes::COMPOSE_STILLS, Credential::Bearer, &request)
        .await?;
    let body = response.expect_status(OK)?.json()?;

    if body.get("stills").is_none() {
        return Err(HarnessError::MissingField {
            endpoint: routes::COMPOSE_STILLS.to_string(),
            field: "stills".to_string(),
        });
    }
    let ComposeStillsResponse { stills } = serde_json::from_value(body)
        .map_err(|e| malformed(routes::COMPOSE_STILLS, &format!("invalid stills: {}", e)))?;

    if stills.is_empty() || stills.len() > count as usize {
        return Err(HarnessError::AssertionFailed(format!(
            "{} returned {} still(s), expected between 1 and {}",
            routes::COMPOSE_STILLS,
            stills.len(),
            count
        )));
    }

    for still in &stills {
        debug!("Still {}: {}", still.id, still.prompt);
    }
    info!("Composed {} still(s)", stills.len());
    Ok(stills.len())
}

/// Expand the brief into a scene; the scene is returned untouched.
pub async fn expand_scene(
    client: &ApiClient,
    selection: &Value,
    scenario: &ScenarioConfig,
) -> HarnessResult<Value> {
    let request = ExpandSceneRequest {
        brief: scenario.brief.clone(),
        selection,
        image_url: None,
        duration_sec: scenario.duration_sec,
        beats: scenario.beats,
    };
    request.validate()?;

    let response = client
        .post_json(routes::EXPAND_SCENE, Credential::Bearer, &request)
        .await?;
    let body = response.expect_status(OK)?.json()?;

    if body.get("scene").is_none() {
        return Err(HarnessError::MissingField {
            endpoint: routes::EXPAND_SCENE.to_string(),
            field: "scene".to_string(),
        });
    }
    let response: ExpandSceneResponse<Value> = serde_json::from_value(body)
        .map_err(|e| malformed(routes::EXPAND_SCENE, &e.to_string()))?;
    let scene = response.scene;
    if !scene.is_object() {
        return Err(malformed(routes::EXPAND_SCENE, "`scene` is not an object"));
    }

    info!("Expanded scene for brief {:?}", scenario.brief);
    Ok(scene)
}

/// Validate the scene and read back the QA report.
pub async fn qa_validate(client: &ApiClient, scene: &Value, scenario: &ScenarioConfig) -> HarnessResult<QaReport> {
    let request = QaValidateRequest {
        scene,
        engine: scenario.engine,
    };

    let response = client
        .post_json(routes::QA_VALIDATE, Credential::Bearer, &request)
        .await?;
    let body = response.expect_status(OK)?.json()?;

    let mut projected = project_fields(&body, QA_REPORT_FIELDS, routes::QA_VALIDATE)?;
    let report: QaReport = serde_json::from_value(projected["report"].take())
        .map_err(|e| malformed(routes::QA_VALIDATE, &format!("invalid report: {}", e)))?;

    if report.severity == Severity::Info {
        info!(
            "QA ({}) severity={} story_match={:.3} coverage={:.3}",
            scenario.engine, report.severity, report.story_match_score, report.coverage_score
        );
    } else {
        warn!(
            "QA ({}) severity={} story_match={:.3} coverage={:.3} conflicts={:?}",
            scenario.engine,
            report.severity,
            report.story_match_score,
            report.coverage_score,
            report.conflicts
        );
    }
    Ok(report)
}

fn malformed(endpoint: &str, reason: &str) -> HarnessError {
    HarnessError::MalformedResponse {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}
