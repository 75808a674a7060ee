use std::{future::IntoFuture, sync::Arc, time::Duration};

use deployment::{Deployment, DeploymentError};
use server::{DeploymentImpl, http};
use services::services::config::{Config, ConfigError};
use thiserror::Error;
use tokio::sync::Notify;
use tracing_subscriber::{EnvFilter, prelude::*};

/// How long in-flight requests may run after a stop signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SiteError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
}

#[tokio::main]
async fn main() -> Result<(), SiteError> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},services={level},db={level},deployment={level},local_deployment={level},utils_core={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).unwrap_or_else(|err| {
        eprintln!("Invalid RUST_LOG level {log_level:?} ({err}); falling back to info");
        EnvFilter::new("warn,server=info,services=info,db=info,local_deployment=info")
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let config = Config::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        upload_dir = %config.upload_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        cors_allowed_origins = ?config.cors_allowed_origins,
        "Loaded configuration"
    );

    let deployment = DeploymentImpl::new(config).await?;
    let app_router = http::router(deployment);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Server running on http://{local_addr}");

    let stopping = Arc::new(Notify::new());
    let server = axum::serve(listener, app_router)
        .with_graceful_shutdown({
            let stopping = stopping.clone();
            async move {
                shutdown_signal().await;
                stopping.notify_one();
            }
        })
        .into_future();

    match drain_within(server, &stopping, DRAIN_TIMEOUT).await {
        Some(result) => result?,
        None => {
            tracing::warn!(timeout = ?DRAIN_TIMEOUT, "Requests still running at shutdown, exiting");
            std::process::exit(130);
        }
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, draining requests"),
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM, draining requests");
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Runs `server` to completion unless it is still running `limit` after
/// `stopping` fires, in which case `None` is returned.
async fn drain_within<F: Future>(
    server: F,
    stopping: &Notify,
    limit: Duration,
) -> Option<F::Output> {
    tokio::select! {
        output = server => Some(output),
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(limit).await;
        } => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::drain_within;

    #[tokio::test]
    async fn server_that_finishes_draining_returns_its_result() {
        let stopping = Notify::new();
        stopping.notify_one();

        let output = drain_within(async { 7 }, &stopping, Duration::from_secs(5)).await;

        assert_eq!(output, Some(7));
    }

    #[tokio::test]
    async fn stuck_server_is_abandoned_after_the_limit() {
        let stopping = Notify::new();
        stopping.notify_one();

        let output = drain_within(
            std::future::pending::<()>(),
            &stopping,
            Duration::from_millis(10),
        )
        .await;

        assert_eq!(output, None);
    }

    #[tokio::test]
    async fn no_deadline_before_a_stop_signal() {
        let stopping = Notify::new();

        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            drain_within(std::future::pending::<()>(), &stopping, Duration::ZERO),
        )
        .await;

        assert!(waited.is_err());
    }
}
