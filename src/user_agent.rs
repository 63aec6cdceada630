//! User-Agent string shared by every HTTP client in the crate.

/// Project URL included in the User-Agent so upstream operators can reach us.
const PROJECT_UA_URL: &str = "https://github.com/fierce/recitation-mirror";

/// Default User-Agent for API, asset and content-repository requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("recitation-mirror/{version} (+{PROJECT_UA_URL})")
}
