use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use bb_provider_alexa::AlexaSettings;
use bb_provider_twilio_whatsapp::TwilioSettings;
use bb_provider_twitter::TwitterSettings;
use bb_provider_tyntec_whatsapp::TyntecSettings;

pub const DEFAULT_BIND: &str = "0.0.0.0:3978";

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub addr: SocketAddr,
    pub sentiment: Option<AzureSentiment>,
    pub channels: Channels,
}

/// Azure Text Analytics credentials; sentiment runs only when a key is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureSentiment {
    pub endpoint: String,
    pub key: String,
}

/// Channel settings. Alexa is always mounted; the rest only when configured.
#[derive(Debug, Clone, Default)]
pub struct Channels {
    pub alexa: AlexaSettings,
    pub alexa_cert_chain_check: bool,
    pub twilio: Option<TwilioSettings>,
    pub twitter: Option<TwitterSettings>,
    pub tyntec: Option<TyntecSettings>,
}

impl SampleConfig {
    pub fn from_env() -> Result<Self> {
        let bind = env::var("BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let addr = bind
            .parse()
            .with_context(|| format!("invalid BIND address {bind}"))?;
        Ok(Self {
            addr,
            sentiment: AzureSentiment::from_env()?,
            channels: Channels::from_env()?,
        })
    }
}

impl AzureSentiment {
    pub fn from_env() -> Result<Option<Self>> {
        let Some(key) = non_empty("AZURE_TEXT_ANALYTICS_KEY") else {
            return Ok(None);
        };
        let endpoint = non_empty("AZURE_TEXT_ANALYTICS_ENDPOINT")
            .context("AZURE_TEXT_ANALYTICS_ENDPOINT is required when AZURE_TEXT_ANALYTICS_KEY is set")?;
        Ok(Some(Self { endpoint, key }))
    }
}

impl Channels {
    pub fn from_env() -> Result<Self> {
        let twilio = TwilioSettings::configured()
            .then(TwilioSettings::from_env)
            .transpose()
            .context("loading twilio settings")?;
        let twitter = TwitterSettings::configured()
            .then(TwitterSettings::from_env)
            .transpose()
            .context("loading twitter settings")?;
        let tyntec = TyntecSettings::configured()
            .then(TyntecSettings::from_env)
            .transpose()
            .context("loading tyntec settings")?;
        Ok(Self {
            alexa: AlexaSettings::from_env(),
            alexa_cert_chain_check: non_empty("ALEXA_VERIFY_CERT_CHAIN")
                .is_some_and(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
            twilio,
            twitter,
            tyntec,
        })
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
