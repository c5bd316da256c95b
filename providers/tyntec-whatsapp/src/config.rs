use crate::error::TyntecError;

pub const DEFAULT_API_BASE: &str = "https://api.tyntec.com";
pub const WEBHOOK_SECRET_HEADER: &str = "x-tyntec-webhook-secret";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TyntecSettings {
    pub api_key: String,
    /// WhatsApp business number messages are sent from.
    pub whatsapp_number: String,
    pub api_base: String,
    /// Expected value of the webhook secret header. No check when unset.
    pub webhook_secret: Option<String>,
}

impl TyntecSettings {
    pub fn new(api_key: impl Into<String>, whatsapp_number: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            whatsapp_number: whatsapp_number.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            webhook_secret: None,
        }
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    pub fn from_env() -> Result<Self, TyntecError> {
        let mut settings = Self::new(
            required("TYNTEC_API_KEY")?,
            required("TYNTEC_WHATSAPP_NUMBER")?,
        );
        if let Some(base) = optional("TYNTEC_API_BASE") {
            settings.api_base = base.trim_end_matches('/').to_string();
        }
        settings.webhook_secret = optional("TYNTEC_WEBHOOK_SECRET");
        Ok(settings)
    }

    pub fn configured() -> bool {
        optional("TYNTEC_API_KEY").is_some()
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, TyntecError> {
    optional(name).ok_or(TyntecError::MissingSetting(name))
}
