//! Process wiring: owns the database connection, builds the scrape and
//! custom-query engines, and serves the HTTP surface.

use crate::collectors::config::DisableSet;
use crate::collectors::engine::ScrapeEngine;
use crate::collectors::snapshot;
use crate::custom::CustomQueryEngine;
use crate::db::{self, Connection};
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    http::{HeaderName, HeaderValue},
    routing::get,
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::{net::TcpListener, time::timeout};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};
use ulid::Ulid;

mod handlers;
mod shutdown;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: String,
    pub altibase_port: u16,
    pub user: String,
    pub password: SecretString,
    pub database: String,
    pub listen_port: u16,
    pub connect_timeout: u64,
    pub queries_file: Option<PathBuf>,
    pub disabled: DisableSet,
}

/// Shared per-process state. The single connection is serialized behind a
/// mutex: concurrent scrape requests queue on it.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Box<dyn Connection + Send>>>,
    engine: Arc<ScrapeEngine>,
    custom: Arc<CustomQueryEngine>,
}

impl AppState {
    #[must_use]
    pub fn new(
        conn: Box<dyn Connection + Send>,
        engine: ScrapeEngine,
        custom: CustomQueryEngine,
    ) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            engine: Arc::new(engine),
            custom: Arc::new(custom),
        }
    }

    /// One full scrape: built-in engine, then custom queries on their own
    /// executors, rendered in exposition order. Never fails.
    #[must_use]
    pub fn render_metrics(&self) -> String {
        let mut conn = match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("connection lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let snapshots = self.engine.collect(&mut **conn);
        let custom = self.custom.collect(&mut **conn);
        let families = snapshots.into_families(custom);
        snapshot::write_exposition(&families)
    }
}

/// The HTTP surface: `/metrics`, an index page, a liveness probe, 404 for
/// everything else (unmatched methods on known paths get 405 from the
/// router).
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/", get(handlers::index::root))
        .route("/-/healthy", get(handlers::health::healthy))
        .fallback(handlers::index::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http())
                .layer(Extension(state)),
        )
}

#[cfg(feature = "odbc")]
fn connect(settings: &Settings) -> Result<Box<dyn Connection + Send>> {
    let conn = db::odbc::OdbcConnection::connect(
        &settings.server,
        settings.altibase_port,
        &settings.user,
        &settings.password,
        &settings.database,
    )?;
    Ok(Box::new(conn))
}

#[cfg(not(feature = "odbc"))]
fn connect(settings: &Settings) -> Result<Box<dyn Connection + Send>> {
    let _ = settings;
    Err(anyhow!(
        "built without the 'odbc' feature; rebuild with --features odbc to connect to Altibase"
    ))
}

pub async fn new(settings: Settings) -> Result<()> {
    info!(
        server = %settings.server,
        port = settings.altibase_port,
        database = %settings.database,
        timeout_seconds = settings.connect_timeout,
        "connecting to Altibase"
    );

    let connect_timeout = Duration::from_secs(settings.connect_timeout.max(1));
    let conn = {
        let connect_settings = settings.clone();
        match timeout(
            connect_timeout,
            tokio::task::spawn_blocking(move || connect(&connect_settings)),
        )
        .await
        {
            Ok(Ok(Ok(conn))) => conn,
            Ok(Ok(Err(err))) => return Err(err).context("Failed to connect to database"),
            Ok(Err(join_err)) => return Err(anyhow!("connect task failed: {join_err}")),
            Err(_) => {
                return Err(anyhow!(
                    "Failed to connect to database: timed out after {}s",
                    settings.connect_timeout
                ));
            }
        }
    };

    // Validate the connection and register the exporter's client identity
    // so its own sessions stay out of the full-scan reports.
    let conn = tokio::task::spawn_blocking(move || -> Result<Box<dyn Connection + Send>> {
        let mut conn = conn;
        conn.ping()
            .map_err(|e| anyhow!("connection validation failed: {e}"))?;
        db::register_client_info(&mut *conn);
        Ok(conn)
    })
    .await??;

    info!("connected to database");

    let engine = ScrapeEngine::new(settings.disabled.clone())?;

    let custom = match &settings.queries_file {
        Some(path) => match CustomQueryEngine::from_file(path) {
            Ok(custom) => {
                info!(file = %path.display(), count = custom.len(), "custom queries loaded");
                custom
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "custom queries file load failed");
                CustomQueryEngine::new(Vec::new())
            }
        },
        None => CustomQueryEngine::new(Vec::new()),
    };

    let app = app(AppState::new(conn, engine, custom));

    let port = settings.listen_port;
    let (listener, bind_addr) = match TcpListener::bind(format!("::0:{port}")).await {
        Ok(listener) => (listener, format!("[::]:{port}")),
        Err(_) => (
            TcpListener::bind(format!("0.0.0.0:{port}"))
                .await
                .with_context(|| format!("Failed to bind to 0.0.0.0:{port}"))?,
            format!("0.0.0.0:{port}"),
        ),
    };

    println!(
        "{} {} - Listening on {bind_addr}, metrics at /metrics",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
    }

    info!("shutting down");

    Ok(())
}
