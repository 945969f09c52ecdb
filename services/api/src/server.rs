use crate::cli::ServeArgs;
use crate::infra::{spawn_expiry_sweep, wire_platform, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use jobhub::clock::SystemClock;
use jobhub::config::AppConfig;
use jobhub::error::AppError;
use jobhub::notify::{LogTransport, NotificationDispatcher, Notifier};
use jobhub::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let dispatcher = Arc::new(NotificationDispatcher::spawn(LogTransport)?);
    let notifier: Arc<dyn Notifier> = dispatcher.clone();
    let platform = wire_platform(&config, notifier, Arc::new(SystemClock));
    let sweep = spawn_expiry_sweep(
        platform.clone(),
        config.marketplace.expiry_sweep_interval,
    );

    let app = with_operational_routes(platform.router())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job board api ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    sweep.abort();
    let delivered = dispatcher.shutdown();
    info!(delivered, "notification queue drained, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
