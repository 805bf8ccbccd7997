use anyhow::Context;
use ramplo_server::AppState;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>, offline: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    for w in config.validate() {
        tracing::warn!(level = ?w.level, "{}", w.message);
    }
    let advisor = super::advisor(&config, offline);
    let state = AppState::from_config(root, &config, advisor).context("failed to open RampLO state")?;
    let port = port.unwrap_or(config.server.port);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        tokio::select! {
            result = ramplo_server::serve_on(state, listener) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
