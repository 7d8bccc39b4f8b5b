//! Route paths exposed by the Actions API

pub const PRIVACY: &str = "/privacy";
pub const HEALTH: &str = "/health";
pub const OPENAPI_JSON: &str = "/openapi.json";
pub const DERIVE_CONCEPTS: &str = "/derive-concepts";
pub const COMPOSE_STILLS: &str = "/compose-stills";
pub const EXPAND_SCENE: &str = "/expand-scene";
pub const QA_VALIDATE: &str = "/qa-validate";

/// Spellings under which the privacy page must resolve
pub const PRIVACY_ALIASES: &[&str] = &["/privacy", "/privacy/"];

/// Spellings under which the health probe must resolve
pub const HEALTH_ALIASES: &[&str] = &["/health", "/health/"];

/// Join a base URL and a route path without doubling or dropping the slash.
pub fn join(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
