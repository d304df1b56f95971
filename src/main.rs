use anyhow::Result;
use processos_dashboard::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let client = data_source::build_client()?;

    let source = Arc::new(data_source::DataSource::from_config(
        client.clone(),
        &app_config.source,
        &app_config.columns,
    )?);
    let poller = Arc::new(sync_poller::SyncPoller::with_schedule(
        sync_poller::CacheBustingFetcher::new(
            client,
            source.snapshot_url().clone(),
            app_config.columns.clone(),
        ),
        Duration::from_millis(app_config.sync.check_interval_ms),
        app_config.sync.max_attempts,
    ));

    // No data is not fatal: the worker keeps retrying and routes answer 503 meanwhile.
    let initial = match source.load().await {
        Ok(snapshot) => Some(dashboard::Dashboard::build(snapshot)),
        Err(e) => {
            tracing::error!(error = %e, "initial load failed; serving without data");
            None
        }
    };
    let shared = dashboard::shared(initial);

    let (sync_tx, sync_rx) = mpsc::channel(sync_worker::SYNC_REQUEST_CAPACITY);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = sync_worker::spawn(
        sync_worker::SyncWorkerDeps {
            loader: source,
            poller,
            dashboard: shared.clone(),
            request_rx: sync_rx,
            shutdown_rx,
        },
        sync_worker::SyncWorkerConfig {
            refresh_interval_secs: app_config.sync.refresh_interval_secs,
        },
    );

    let app = routes::app(shared, sync_tx, app_config.columns.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = worker_handle.await;
        }
    }

    Ok(())
}
