use crate::cli::ServeArgs;
use crate::infra::{AppState, SqliteMigrator, Stores};
use crate::routes::with_share_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use clap::Args;
use inclinic::clock::SystemClock;
use inclinic::config::AppConfig;
use inclinic::error::AppError;
use inclinic::telemetry;
use inclinic::workflows::sharing::LinkComposer;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

#[derive(Args, Debug, Default)]
pub(crate) struct SyncArgs {
    /// Override the transactional store path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Override the reporting store path
    #[arg(long)]
    pub(crate) reporting_database: Option<PathBuf>,
}

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let stores = Stores::open(&config.storage)?;
    let share_service = stores.share_service(
        Arc::new(SystemClock),
        LinkComposer::new(config.sharing.public_base_url.clone()),
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_share_routes(share_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    match config.reporting.sync_interval() {
        Some(every) => {
            spawn_sync_schedule(stores.migrator(), every);
        }
        None => info!("scheduled reporting sync disabled"),
    }

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "in-clinic sharing service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// One-shot migration for operators and external schedulers.
pub(crate) async fn run_sync_once(args: SyncArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = args.database {
        config.storage.transactional_path = path;
    }
    if let Some(path) = args.reporting_database {
        config.storage.reporting_path = path;
    }

    telemetry::init(&config.telemetry)?;

    let migrator = Stores::open(&config.storage)?.migrator();
    let outcome = tokio::task::spawn_blocking(move || migrator.sync())
        .await
        .map_err(|err| AppError::Io(std::io::Error::other(err)))??;
    println!("Moved {} events", outcome.moved());
    Ok(())
}

fn spawn_sync_schedule(migrator: Arc<SqliteMigrator>, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "scheduled reporting sync enabled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; wait a full interval before the first run.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let job = migrator.clone();
            match tokio::task::spawn_blocking(move || job.sync()).await {
                Ok(Ok(outcome)) => debug!(moved = outcome.moved(), "scheduled reporting sync done"),
                Ok(Err(err)) => warn!(error = %err, "scheduled reporting sync failed"),
                Err(err) => error!(error = %err, "scheduled reporting sync task panicked"),
            }
        }
    })
}
