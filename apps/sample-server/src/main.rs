use anyhow::Result;
use axum::serve;
use bb_sample_server::{SampleConfig, build_router, build_runner};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    bb_telemetry::install("bb-sample-server")?;
    let config = SampleConfig::from_env()?;
    let http = reqwest::Client::new();
    let runner = build_runner(config.sentiment.as_ref(), http.clone());
    let router = build_router(config.channels, runner, http);

    let listener = TcpListener::bind(config.addr).await?;
    info!("bb-sample-server listening on {}", config.addr);
    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
