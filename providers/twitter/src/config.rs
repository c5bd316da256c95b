use crate::error::TwitterError;

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwitterSettings {
    pub consumer_key: Option<String>,
    /// Signs CRC responses and webhook payloads.
    pub consumer_secret: String,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    pub bearer_token: String,
    /// Bot account handle without the leading `@`.
    pub screen_name: String,
    pub api_base: String,
    pub verify_signature: bool,
}

impl TwitterSettings {
    pub fn new(
        consumer_secret: impl Into<String>,
        bearer_token: impl Into<String>,
        screen_name: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: None,
            consumer_secret: consumer_secret.into(),
            access_token: None,
            access_token_secret: None,
            bearer_token: bearer_token.into(),
            screen_name: screen_name.into().trim_start_matches('@').to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            verify_signature: true,
        }
    }

    pub fn from_env() -> Result<Self, TwitterError> {
        let mut settings = Self::new(
            required("TWITTER_CONSUMER_SECRET")?,
            required("TWITTER_BEARER_TOKEN")?,
            required("TWITTER_SCREEN_NAME")?,
        );
        settings.consumer_key = optional("TWITTER_CONSUMER_KEY");
        settings.access_token = optional("TWITTER_ACCESS_TOKEN");
        settings.access_token_secret = optional("TWITTER_ACCESS_TOKEN_SECRET");
        if let Some(base) = optional("TWITTER_API_BASE") {
            settings.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(flag) = optional("TWITTER_VERIFY_SIGNATURE") {
            settings.verify_signature = !matches!(flag.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        Ok(settings)
    }

    pub fn configured() -> bool {
        optional("TWITTER_CONSUMER_SECRET").is_some()
    }

    pub fn is_bot(&self, screen_name: &str) -> bool {
        screen_name
            .trim_start_matches('@')
            .eq_ignore_ascii_case(&self.screen_name)
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, TwitterError> {
    optional(name).ok_or(TwitterError::MissingSetting(name))
}
