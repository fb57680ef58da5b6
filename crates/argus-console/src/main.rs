//! Argus — Real-time video anomaly monitoring console.
//! Entry point for the console binary.

mod config;

use argus_common::ConnectionStatus;
use argus_session::{spawn, BackendClient, SessionConfig, StreamSource, WsTransport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn resolve_source(config: &config::Config) -> anyhow::Result<Option<StreamSource>> {
    match config.source.mode.as_str() {
        "live" => Ok(Some(StreamSource::Live)),
        "cctv" => {
            let Some(ref cctv) = config.source.cctv else {
                anyhow::bail!("source.mode is \"cctv\" but the [source.cctv] section is missing");
            };
            Ok(Some(StreamSource::Cctv {
                ip: cctv.ip.clone(),
                port: cctv.port,
                username: cctv.username.clone(),
                password: cctv.password.clone(),
            }))
        }
        // Upload mode needs the HTTP round-trip first; resolved in main.
        "upload" => Ok(None),
        other => anyhow::bail!("unknown source.mode {other:?} (expected live, cctv or upload)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("argus=debug,info")),
        )
        .init();

    info!("👁️ Argus starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match config::Config::load() {
        Ok(c) => {
            info!(
                "Configuration loaded. Backend: {}, source mode: {}",
                c.backend.ws_url, c.source.mode
            );
            c
        }
        Err(e) => {
            tracing::warn!("Could not load argus.toml: {e}");
            tracing::warn!("Copy argus.example.toml to argus.toml and edit it.");
            return Ok(());
        }
    };

    let backend = BackendClient::new(&config.backend.http_url);

    let source = match resolve_source(&config)? {
        Some(source) => source,
        None => {
            let Some(ref path) = config.source.upload_path else {
                anyhow::bail!("source.mode is \"upload\" but source.upload_path is missing");
            };
            info!("⬆️ Uploading {path}...");
            let filename = backend.upload_video(std::path::Path::new(path)).await?;
            info!("✅ Upload accepted as {filename}");
            StreamSource::Upload { filename }
        }
    };

    let handle = spawn(
        SessionConfig {
            ws_base_url: config.backend.ws_url.clone(),
            username: config.backend.username.clone(),
        },
        Arc::new(WsTransport),
        Some(backend),
    );

    // Seed the anomaly list with the backend's history before streaming.
    handle.refresh();

    // Log every state transition the view would render.
    let mut log_rx = handle.watch();
    tokio::spawn(async move {
        let mut last_status = String::new();
        let mut last_count = 0usize;
        while log_rx.changed().await.is_ok() {
            let snapshot = log_rx.borrow().clone();
            if snapshot.status_line != last_status {
                info!(
                    connection = ?snapshot.connection,
                    anomalies = snapshot.anomalies.len(),
                    "{}",
                    snapshot.status_line
                );
                last_status = snapshot.status_line;
            } else if snapshot.anomalies.len() != last_count {
                info!(anomalies = snapshot.anomalies.len(), "anomaly list updated");
            }
            last_count = snapshot.anomalies.len();
        }
    });

    // Periodic reconciliation against the backend's authoritative list.
    if config.refresh.enabled {
        let refresh_handle = handle.clone();
        let mut refresh_rx = handle.watch();
        let interval = Duration::from_secs(config.refresh.interval_secs.max(1));
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                if refresh_rx.borrow_and_update().connection == ConnectionStatus::Connected {
                    refresh_handle.refresh();
                }
            }
        });
    }

    info!("📡 Connecting ({})...", source.label());
    handle.connect(source);
    info!("👁️ Argus ready. Press Ctrl+C to stop.");

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("could not listen for shutdown signal: {e}");
    }
    info!("Shutting down...");
    handle.disconnect();
    handle.shutdown();
    // Give the session a moment to send its close frame.
    tokio::time::sleep(Duration::from_millis(300)).await;

    Ok(())
}
