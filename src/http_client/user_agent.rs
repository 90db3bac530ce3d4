//! User agent handling for preview fetches.

pub const USER_AGENT: &str = "CentscapeBot/1.0";

/// Resolve user agent from config value.
/// - None or blank => default Centscape user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}
