use time::Duration;
use tracing::warn;

pub const DEFAULT_TIMESTAMP_TOLERANCE_SECS: i64 = 150;

/// Request checks and response defaults for the Alexa endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlexaSettings {
    /// Application id the endpoint answers for. Any id is accepted when unset.
    pub skill_id: Option<String>,
    pub verify_timestamp: bool,
    pub timestamp_tolerance: Duration,
    /// `shouldEndSession` used when the last reply carries no input hint.
    pub end_session_by_default: bool,
}

impl Default for AlexaSettings {
    fn default() -> Self {
        Self {
            skill_id: None,
            verify_timestamp: true,
            timestamp_tolerance: Duration::seconds(DEFAULT_TIMESTAMP_TOLERANCE_SECS),
            end_session_by_default: true,
        }
    }
}

impl AlexaSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let tolerance = std::env::var("ALEXA_TIMESTAMP_TOLERANCE_SECS")
            .ok()
            .and_then(|raw| match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => Some(Duration::seconds(secs)),
                _ => {
                    warn!(value = %raw, "ignoring invalid ALEXA_TIMESTAMP_TOLERANCE_SECS");
                    None
                }
            })
            .unwrap_or(defaults.timestamp_tolerance);
        Self {
            skill_id: std::env::var("ALEXA_SKILL_ID")
                .ok()
                .filter(|id| !id.trim().is_empty()),
            verify_timestamp: env_flag("ALEXA_VERIFY_TIMESTAMP", defaults.verify_timestamp),
            timestamp_tolerance: tolerance,
            end_session_by_default: env_flag(
                "ALEXA_END_SESSION_BY_DEFAULT",
                defaults.end_session_by_default,
            ),
        }
    }

    pub fn with_skill_id(mut self, skill_id: impl Into<String>) -> Self {
        self.skill_id = Some(skill_id.into());
        self
    }

    pub fn without_timestamp_check(mut self) -> Self {
        self.verify_timestamp = false;
        self
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
            warn!(var = name, value = %raw, "ignoring invalid boolean");
            default
        }),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
