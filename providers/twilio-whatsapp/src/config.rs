use crate::error::TwilioError;

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, with or without the `whatsapp:` prefix.
    pub whatsapp_number: String,
    /// Public URL Twilio posts to; part of the signed payload.
    pub endpoint_url: String,
    pub api_base: String,
    pub status_callback: Option<String>,
}

impl TwilioSettings {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        whatsapp_number: impl Into<String>,
        endpoint_url: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            whatsapp_number: whatsapp_number.into(),
            endpoint_url: endpoint_url.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            status_callback: None,
        }
    }

    pub fn from_env() -> Result<Self, TwilioError> {
        let mut settings = Self::new(
            required("TWILIO_ACCOUNT_SID")?,
            required("TWILIO_AUTH_TOKEN")?,
            required("TWILIO_WHATSAPP_NUMBER")?,
            required("TWILIO_ENDPOINT_URL")?,
        );
        if let Ok(base) = std::env::var("TWILIO_API_BASE") {
            settings.api_base = base.trim_end_matches('/').to_string();
        }
        settings.status_callback = std::env::var("TWILIO_STATUS_CALLBACK_URL")
            .ok()
            .filter(|url| !url.is_empty());
        Ok(settings)
    }

    /// True when the variables needed to run the adapter are set.
    pub fn configured() -> bool {
        std::env::var("TWILIO_ACCOUNT_SID").is_ok_and(|sid| !sid.is_empty())
    }
}

fn required(name: &'static str) -> Result<String, TwilioError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(TwilioError::MissingSetting(name))
}
