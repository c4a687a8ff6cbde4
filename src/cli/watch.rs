use super::App;
use crate::core::{Scheduler, Shutdown};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Fetches at startup and then on the configured schedule until Ctrl-C or SIGTERM.
pub async fn run(app: &App) -> Result<()> {
    let config = app.config();
    let pipeline = Arc::new(app.pipeline()?);
    let scheduler = Scheduler::new(pipeline, config.pivot, config.symbols.clone(), config.schedule);

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let signals = tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received");
        shutdown.trigger();
    });

    let result = scheduler.run(rx).await;
    signals.abort();

    let cycles = result.context("Startup fetch failed")?;
    info!(cycles, "Watch stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Could not install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
