//! # Database
//!
//! [SurrealDB](https://surrealdb.com) access for the marketplace.
//!
//! * `mem://`, `ws://`, `http://` and (with `storage-rocksdb`) `rocksdb://` through the `any`
//!   engine,
//! * health checks with exponential backoff while the engine starts,
//! * slice migrations applied once and fingerprinted in the `migration` table,
//! * [`Table`], a keyed row helper used by every repository.
//!
//! ```rust
//! use whub_database::{Database, DatabaseError, Migration};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), DatabaseError> {
//! let db = Database::builder()
//!     .url("mem://")
//!     .session("whub", "marketplace")
//!     .migrations([Migration::new("shop", "0001_init", "DEFINE TABLE IF NOT EXISTS shop;")])
//!     .init()
//!     .await?;
//! assert!(db.health().await.is_ok());
//! # Ok(())
//! # }
//! ```

mod error;
mod migrations;
mod table;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use migrations::{Migration, MigrationReport};
pub use surrealdb::types::SurrealValue;
pub use table::{Table, WriteGuard};

use migrations::MigrationRunner;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{debug, info, instrument, warn};

const HEALTH_ATTEMPTS: u32 = 3;
const FIRST_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct DatabaseInner {
    instance: Surreal<Any>,
    namespace: String,
    database: String,
}

/// Shared SurrealDB session. Derefs to the client.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.inner.database
    }

    /// Applies migrations that are not recorded yet.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::Migration`] when a script fails or an applied one was edited.
    pub async fn migrate(
        &self,
        migrations: &[Migration],
    ) -> Result<MigrationReport, DatabaseError> {
        MigrationRunner::new(&self.inner.instance).run(migrations).await
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    url: Option<String>,
    namespace: Option<String>,
    database: Option<String>,
    auth: Option<(String, String)>,
    migrations: Vec<Migration>,
}

impl DatabaseBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self.database = Some(database.into());
        self
    }

    /// Root credentials; ignored by in-process engines.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Appends migrations, applied in the given order after the session is active.
    pub fn migrations(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Connects, waits for the engine, signs in, activates the session and migrates.
    ///
    /// # Errors
    ///
    /// * [`DatabaseError::Validation`] when url, namespace or database is missing.
    /// * [`DatabaseError::Connection`] when the engine cannot start or stays unhealthy.
    /// * [`DatabaseError::Auth`] when the credentials are rejected.
    /// * [`DatabaseError::Migration`] when a script fails or an applied one was edited.
    #[instrument(skip_all, fields(url = self.url, ns = self.namespace, db = self.database))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let url = required(self.url, "URL")?;
        let namespace = required(self.namespace, "Namespace")?;
        let database = required(self.database, "Database")?;

        let instance = connect(&url).await.map_err(|e| DatabaseError::Connection {
            message: e.to_string().into(),
            context: Some("Starting engine".into()),
        })?;

        let mut delay = FIRST_BACKOFF;
        for attempt in 1..=HEALTH_ATTEMPTS {
            if instance.health().await.is_ok() {
                break;
            }
            if attempt == HEALTH_ATTEMPTS {
                return Err(DatabaseError::Connection {
                    message: "Engine still unhealthy after retries".into(),
                    context: Some(url.into()),
                });
            }
            warn!(attempt, ?delay, "Database not ready, retrying");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        match self.auth {
            Some(_) if is_embedded(&url) => debug!("Skipping root sign-in for embedded engine"),
            Some((username, password)) => {
                instance.signin(Root { username, password }).await.map_err(|e| {
                    DatabaseError::Auth {
                        message: e.to_string().into(),
                        context: Some(url.clone().into()),
                    }
                })?;
            },
            None => {},
        }

        instance.use_ns(&namespace).use_db(&database).await.context("Activating session")?;

        let report = MigrationRunner::new(&instance).run(&self.migrations).await?;
        for key in &report.applied {
            info!(migration = %key, "Applied migration");
        }
        debug!(skipped = report.skipped.len(), "Migrations already applied");

        info!(%namespace, %database, "SurrealDB session ready");
        Ok(Database { inner: Arc::new(DatabaseInner { instance, namespace, database }) })
    }
}

fn required(value: Option<String>, what: &'static str) -> Result<String, DatabaseError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| DatabaseError::Validation {
        message: format!("{what} is required").into(),
        context: None,
    })
}

fn is_embedded(url: &str) -> bool {
    ["mem://", "memory", "rocksdb://", "surrealkv://"].iter().any(|scheme| url.starts_with(scheme))
}
