use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub environment: String,
    pub json_logs: bool,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        let service_name =
            env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| default_service_name.to_string());
        let environment = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "dev".into());
        let json_logs = env::var("LOG_FORMAT")
            .map(|v| json_logs_from(&v))
            .unwrap_or(true);
        Self {
            service_name,
            environment,
            json_logs,
        }
    }
}

fn json_logs_from(format: &str) -> bool {
    !matches!(format.to_lowercase().as_str(), "text" | "pretty" | "plain")
}
