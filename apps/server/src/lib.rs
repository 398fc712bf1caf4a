//! # WellnessHub Server
//!
//! HTTP server of the wellness marketplace back office: every feature slice behind one `Axum`
//! router, persisted in `SurrealDB`, with mutations recorded to the audit trail through the
//! event bus.
//!
//! ```no_run
//! use whub_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder().port(8080).build().await?.run().await
//! }
//! ```

mod router;

use anyhow::{Context, Result, anyhow};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use whub::domain::config::{ApiConfig, SslConfig};
use whub::kernel::server::ApiState;
use whub_database::Database;
use whub_event_bus::EventBus;

/// Time in-flight requests get to finish after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Configures and assembles a [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Connects to the database, applies migrations, initializes every slice and builds the
    /// shared state.
    ///
    /// # Errors
    /// * configured SSL files are missing
    /// * the database is unreachable or rejects the credentials
    /// * a migration fails or was edited after being applied
    /// * a slice fails to initialize
    pub async fn build(self) -> Result<Server> {
        if let Some(ssl) = &self.cfg.server.ssl {
            check_ssl_files(ssl)?;
        }

        info!(address = %bind_address(&self.cfg), "Initializing server");

        let db = connect(&self.cfg).await?;
        let events = EventBus::new();
        let slices =
            whub::init(&db, &events).map_err(|e| anyhow!("Marketplace bootstrap failed: {e}"))?;

        let state = ApiState::builder()
            .config(self.cfg)
            .db(db)
            .events(events)
            .register_slices(slices)
            .build()
            .context("Failed to finalize API state registry")?;

        info!(slices = ?state.slice_names().collect::<Vec<_>>(), "Feature slices registered");
        Ok(Server { state })
    }
}

async fn connect(cfg: &ApiConfig) -> Result<Database> {
    let db_cfg = &cfg.database;
    let mut builder = Database::builder()
        .url(&db_cfg.url)
        .session(&db_cfg.namespace, &db_cfg.database)
        .migrations(whub::migrations());

    if let Some(creds) = &db_cfg.credentials {
        builder = builder.auth(&creds.username, &creds.password);
    }

    builder.init().await.context("Failed to establish database connection")
}

fn bind_address(cfg: &ApiConfig) -> SocketAddr {
    SocketAddr::new(cfg.server.address, cfg.server.port)
}

fn check_ssl_files(ssl: &SslConfig) -> Result<()> {
    if !ssl.cert.exists() {
        anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
    }
    if !ssl.key.exists() {
        anyhow::bail!("SSL key not found at: {}", ssl.key.display());
    }
    warn_if_readable_by_others(&ssl.key)
}

#[cfg(unix)]
fn warn_if_readable_by_others(key: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = key.metadata().context("Reading SSL key metadata")?.permissions().mode();
    if mode & 0o077 != 0 {
        warn!(
            path = %key.display(),
            mode = format!("{:o}", mode & 0o777),
            "SSL private key is readable by group or others, expected 600"
        );
    }
    Ok(())
}

#[cfg(not(unix))]
fn warn_if_readable_by_others(_key: &Path) -> Result<()> {
    Ok(())
}

/// An initialized server, ready to serve.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }

    /// The complete application router, as served by [`Server::run`].
    ///
    /// # Errors
    /// Returns an error if a configured CORS origin is not a valid header value.
    pub fn router(&self) -> Result<axum::Router> {
        router::init(self.state.clone())
    }

    /// Serves HTTP, or HTTPS when `server.ssl` is configured, until SIGINT or SIGTERM.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound or the certificates cannot be loaded.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = bind_address(&cfg);
        let app = self.router()?.into_make_service();

        let handle = Handle::<SocketAddr>::new();
        tokio::spawn(graceful_shutdown(handle.clone()));

        match &cfg.server.ssl {
            Some(ssl) => {
                let tls = RustlsConfig::from_pem_file(&ssl.cert, &ssl.key)
                    .await
                    .context("Failed to load SSL/TLS certificates")?;

                info!("Serving on https://{address}");
                axum_server::bind_rustls(address, tls)
                    .handle(handle)
                    .serve(app)
                    .await
                    .context("HTTPS server failed")?;
            },
            None => {
                info!("Serving on http://{address}");
                axum_server::bind(address)
                    .handle(handle)
                    .serve(app)
                    .await
                    .context("HTTP server failed")?;
            },
        }

        info!("Server shutdown complete");
        self.state.events.shutdown();
        Ok(())
    }
}

async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    if let Err(e) = shutdown_signal().await {
        error!("Error while waiting for shutdown signal: {e}");
        return;
    }
    info!(grace_secs = SHUTDOWN_GRACE.as_secs(), "Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}
