use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use sha2::{Digest, Sha256};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::types::SurrealValue;

const BOOTSTRAP: &str = "
    DEFINE TABLE IF NOT EXISTS migration SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS migration_slice_version ON migration FIELDS slice, version UNIQUE;
";

/// One schema script owned by a feature slice.
///
/// Slices embed their scripts with `include_str!` and hand them to
/// [`crate::DatabaseBuilder::migrations`]; scripts run in the order they are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub slice: &'static str,
    pub version: &'static str,
    pub script: &'static str,
}

impl Migration {
    #[must_use]
    pub const fn new(slice: &'static str, version: &'static str, script: &'static str) -> Self {
        Self { slice, version, script }
    }

    /// Hex SHA-256 of the trimmed script text.
    #[must_use]
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.script.trim().as_bytes()))
    }

    fn key(&self) -> String {
        format!("{}:{}", self.slice, self.version)
    }
}

/// Outcome of a migration run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct AppliedMigration {
    pub slice: String,
    pub version: String,
    pub checksum: String,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    db: &'a Surreal<Any>,
}

impl<'a> MigrationRunner<'a> {
    pub(crate) const fn new(db: &'a Surreal<Any>) -> Self {
        Self { db }
    }

    pub(crate) async fn run(
        &self,
        migrations: &[Migration],
    ) -> Result<MigrationReport, DatabaseError> {
        self.db
            .query(BOOTSTRAP)
            .await
            .context("Bootstrapping migration table")?
            .check()
            .map_err(surrealdb::Error::from)?;

        let recorded = self.recorded().await?;
        let mut report = MigrationReport::default();

        for migration in migrations {
            let checksum = migration.checksum();
            match recorded.get(&migration.key()) {
                Some(existing) if existing.checksum == checksum => {
                    report.skipped.push(migration.key());
                },
                Some(existing) => {
                    return Err(DatabaseError::Migration {
                        message: format!(
                            "{} was applied with checksum {} but the script now hashes to \
                             {checksum}",
                            migration.key(),
                            existing.checksum
                        )
                        .into(),
                        context: Some("Applied migrations must not change".into()),
                    });
                },
                None => {
                    self.apply(migration, checksum).await?;
                    report.applied.push(migration.key());
                },
            }
        }

        Ok(report)
    }

    async fn recorded(&self) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let rows = self
            .db
            .query("SELECT slice, version, checksum FROM migration")
            .await
            .context("Loading applied migrations")?
            .take::<Vec<AppliedMigration>>(0)
            .context("Decoding applied migrations")?;

        Ok(rows.into_iter().map(|row| (format!("{}:{}", row.slice, row.version), row)).collect())
    }

    async fn apply(&self, migration: &Migration, checksum: String) -> Result<(), DatabaseError> {
        let script = format!(
            "BEGIN TRANSACTION;\n{}\nCREATE migration CONTENT $record RETURN NONE;\n\
             COMMIT TRANSACTION;",
            migration.script
        );
        let record = AppliedMigration {
            slice: migration.slice.to_owned(),
            version: migration.version.to_owned(),
            checksum,
        };

        self.db
            .query(script)
            .bind(("record", record))
            .await
            .context(format!("Applying {}", migration.key()))?
            .check()
            .map_err(|e| DatabaseError::Migration {
                message: surrealdb::Error::from(e).to_string().into(),
                context: Some(migration.key().into()),
            })?;

        Ok(())
    }
}
