use crate::Database;
use crate::error::{DatabaseError, DatabaseErrorExt};
use std::fmt;
use std::marker::PhantomData;
use surrealdb::types::SurrealValue;

const WRITE_LOCK: &str = "write_lock";

/// Blocks a guarded write while any row matches `condition`.
///
/// `condition` is a SurrealQL `WHERE` clause reading the caller's values through `$guard`.
/// Writers sharing a `scope` are serialized against each other.
#[derive(Debug, Clone)]
pub struct WriteGuard<G> {
    pub scope: String,
    pub condition: &'static str,
    pub values: G,
}

/// Typed access to a table whose rows carry a unique `key` field.
///
/// The record id SurrealDB assigns is never exposed; callers address rows by `key`.
pub struct Table<T> {
    db: Database,
    name: &'static str,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), name: self.name, _row: PhantomData }
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<T> Table<T>
where
    T: SurrealValue + Send + Sync + 'static,
{
    #[must_use]
    pub const fn new(db: Database, name: &'static str) -> Self {
        Self { db, name, _row: PhantomData }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Stores a new row.
    pub async fn insert(&self, row: T) -> Result<(), DatabaseError> {
        self.db
            .query(format!("CREATE {} CONTENT $row RETURN NONE", self.name))
            .bind(("row", row))
            .await
            .context(format!("Inserting into {}", self.name))?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    /// Stores `row` unless a row matches the guard's condition.
    /// Returns `false` when a match blocked the write.
    pub async fn insert_unless<G>(
        &self,
        row: T,
        guard: WriteGuard<G>,
    ) -> Result<bool, DatabaseError>
    where
        G: SurrealValue + Send + Sync + 'static,
    {
        let write = format!("CREATE {} CONTENT $row RETURN NONE", self.name);
        self.write_unless(write, row, guard, None).await
    }

    /// Replaces the row with `key` unless another row matches the guard's condition.
    /// Returns `false` when a match blocked the write; callers check the row exists beforehand.
    pub async fn replace_unless<G>(
        &self,
        key: &str,
        row: T,
        guard: WriteGuard<G>,
    ) -> Result<bool, DatabaseError>
    where
        G: SurrealValue + Send + Sync + 'static,
    {
        let write = format!("UPDATE {} CONTENT $row WHERE key = $key RETURN NONE", self.name);
        self.write_unless(write, row, guard, Some(key)).await
    }

    /// Check and write run as one statement and share a transaction. Writers in the same scope
    /// also upsert one lock record, so concurrent writers conflict on commit.
    async fn write_unless<G>(
        &self,
        write: String,
        row: T,
        guard: WriteGuard<G>,
        key: Option<&str>,
    ) -> Result<bool, DatabaseError>
    where
        G: SurrealValue + Send + Sync + 'static,
    {
        let lock = hex::encode(format!("{}/{}", self.name, guard.scope));
        let statement = format!(
            "IF array::len((SELECT VALUE key FROM {} WHERE {} LIMIT 1)) > 0 {{ false }} ELSE {{ \
             UPSERT {WRITE_LOCK}:⟨{lock}⟩ SET touched = time::now() RETURN NONE; {write}; true }}",
            self.name, guard.condition
        );
        let written = self
            .db
            .query(statement)
            .bind(("row", row))
            .bind(("guard", guard.values))
            .bind(("key", key.unwrap_or_default().to_owned()))
            .await
            .context(format!("Guarded write into {}", self.name))?
            .take::<Option<bool>>(0)
            .context(format!("Decoding the {} guard outcome", self.name))?;
        Ok(written.unwrap_or(false))
    }

    /// Every row of the table, in storage order.
    pub async fn all(&self) -> Result<Vec<T>, DatabaseError> {
        let rows = self
            .db
            .query(format!("SELECT * OMIT id FROM {}", self.name))
            .await
            .context(format!("Listing {}", self.name))?
            .take::<Vec<T>>(0)
            .context(format!("Decoding {} rows", self.name))?;
        Ok(rows)
    }

    /// Rows where `field` equals `value`.
    pub async fn find_by(
        &self,
        field: &'static str,
        value: impl Into<String>,
    ) -> Result<Vec<T>, DatabaseError> {
        let rows = self
            .db
            .query(format!("SELECT * OMIT id FROM {} WHERE {field} = $value", self.name))
            .bind(("value", value.into()))
            .await
            .context(format!("Filtering {} by {field}", self.name))?
            .take::<Vec<T>>(0)
            .context(format!("Decoding {} rows", self.name))?;
        Ok(rows)
    }

    pub async fn find(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        Ok(self.find_by("key", key).await?.into_iter().next())
    }

    /// Replaces the content of the row with `key`. Returns `false` when no such row exists.
    pub async fn replace(&self, key: &str, row: T) -> Result<bool, DatabaseError> {
        if self.find(key).await?.is_none() {
            return Ok(false);
        }
        self.db
            .query(format!("UPDATE {} CONTENT $row WHERE key = $key RETURN NONE", self.name))
            .bind(("row", row))
            .bind(("key", key.to_owned()))
            .await
            .context(format!("Updating {} row {key}", self.name))?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(true)
    }

    /// Adds one to a numeric `field` in a single statement.
    /// Returns `false` when no such row exists.
    pub async fn increment(&self, key: &str, field: &'static str) -> Result<bool, DatabaseError> {
        let touched = self
            .db
            .query(format!(
                "UPDATE {} SET {field} += 1 WHERE key = $key RETURN VALUE key",
                self.name
            ))
            .bind(("key", key.to_owned()))
            .await
            .context(format!("Incrementing {}.{field} of {key}", self.name))?
            .take::<Vec<String>>(0)
            .context(format!("Decoding {} keys", self.name))?;
        Ok(!touched.is_empty())
    }

    /// Deletes the row with `key`, returning it when it existed.
    pub async fn remove(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        let Some(existing) = self.find(key).await? else {
            return Ok(None);
        };
        self.remove_by("key", key).await?;
        Ok(Some(existing))
    }

    /// Deletes every row where `field` equals `value`.
    pub async fn remove_by(
        &self,
        field: &'static str,
        value: impl Into<String>,
    ) -> Result<(), DatabaseError> {
        self.db
            .query(format!("DELETE {} WHERE {field} = $value RETURN NONE", self.name))
            .bind(("value", value.into()))
            .await
            .context(format!("Deleting from {}", self.name))?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }
}
