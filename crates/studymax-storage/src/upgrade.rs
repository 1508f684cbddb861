//! Version-change transaction: the only place schema may be mutated

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

use crate::schema::{CollectionSchema, IndexSpec, index_name, table_name, validate_identifier};
use crate::{Result, StorageError};

/// Callback run when a database is opened at a higher version than stored
#[async_trait]
pub trait UpgradeHandler: Send + Sync {
    /// Apply schema changes from `change.old_version()` to `change.new_version()`.
    ///
    /// Returning an error rolls back every change made here and fails the open.
    async fn upgrade(&self, change: &mut VersionChange) -> Result<()>;
}

/// Schema-mutation handle, alive only while an upgrade is in progress
pub struct VersionChange {
    tx: Transaction<'static, Sqlite>,
    old_version: u32,
    new_version: u32,
}

impl VersionChange {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, old_version: u32, new_version: u32) -> Self {
        Self {
            tx,
            old_version,
            new_version,
        }
    }

    /// Stored version before this upgrade; 0 for a freshly created database
    pub fn old_version(&self) -> u32 {
        self.old_version
    }

    pub fn new_version(&self) -> u32 {
        self.new_version
    }

    pub async fn contains(&mut self, collection: &str) -> Result<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT name FROM _collections WHERE name = ?")
                .bind(collection)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(found.is_some())
    }

    /// Create a collection and its indexes.
    ///
    /// Returns `false` without touching anything when a collection of that
    /// name already exists.
    pub async fn define_collection(&mut self, schema: &CollectionSchema) -> Result<bool> {
        schema.validate()?;

        if self.contains(&schema.name).await? {
            tracing::info!("Collection '{}' already exists", schema.name);
            return Ok(false);
        }

        let key_column = if schema.auto_increment {
            "id INTEGER PRIMARY KEY AUTOINCREMENT"
        } else {
            "id INTEGER PRIMARY KEY"
        };
        sqlx::query(&format!(
            "CREATE TABLE {} ({key_column}, data TEXT NOT NULL)",
            table_name(&schema.name)
        ))
        .execute(&mut *self.tx)
        .await?;

        sqlx::query("INSERT INTO _collections (name, key_path, auto_increment) VALUES (?, ?, ?)")
            .bind(&schema.name)
            .bind(&schema.key_path)
            .bind(schema.auto_increment)
            .execute(&mut *self.tx)
            .await?;

        for spec in &schema.indexes {
            self.create_index(&schema.name, spec).await?;
        }

        tracing::info!(
            "Collection '{}' created with {} indexes",
            schema.name,
            schema.indexes.len()
        );
        Ok(true)
    }

    pub async fn delete_collection(&mut self, collection: &str) -> Result<()> {
        validate_identifier("collection name", collection)?;
        if !self.contains(collection).await? {
            return Err(StorageError::UnknownCollection(collection.to_string()));
        }

        sqlx::query(&format!("DROP TABLE {}", table_name(collection)))
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("DELETE FROM _indexes WHERE collection = ?")
            .bind(collection)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("DELETE FROM _collections WHERE name = ?")
            .bind(collection)
            .execute(&mut *self.tx)
            .await?;

        tracing::info!("Collection '{}' deleted", collection);
        Ok(())
    }

    /// Add an index to an existing collection.
    ///
    /// A unique index fails with `Constraint` if stored records already collide.
    pub async fn create_index(&mut self, collection: &str, spec: &IndexSpec) -> Result<()> {
        spec.validate()?;
        let Some(schema) = self.schema(collection).await? else {
            return Err(StorageError::UnknownCollection(collection.to_string()));
        };
        if schema.find_index(&spec.name).is_some() {
            return Err(StorageError::Constraint {
                collection: collection.to_string(),
                reason: format!("index '{}' already exists", spec.name),
            });
        }
        if spec.key_path == schema.key_path {
            return Err(StorageError::Schema(format!(
                "index '{}' duplicates the key path of '{}'",
                spec.name, collection
            )));
        }

        let unique = if spec.unique { "UNIQUE " } else { "" };
        sqlx::query(&format!(
            "CREATE {unique}INDEX {} ON {} (json_extract(data, '$.{}'))",
            index_name(collection, &spec.name),
            table_name(collection),
            spec.key_path
        ))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StorageError::write(collection, e))?;

        sqlx::query(
            "INSERT INTO _indexes (collection, name, key_path, is_unique) VALUES (?, ?, ?, ?)",
        )
        .bind(collection)
        .bind(&spec.name)
        .bind(&spec.key_path)
        .bind(spec.unique)
        .execute(&mut *self.tx)
        .await?;

        tracing::debug!("Index '{}' created on '{}'", spec.name, collection);
        Ok(())
    }

    pub async fn delete_index(&mut self, collection: &str, index: &str) -> Result<()> {
        validate_identifier("index name", index)?;
        let removed = sqlx::query("DELETE FROM _indexes WHERE collection = ? AND name = ?")
            .bind(collection)
            .bind(index)
            .execute(&mut *self.tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(StorageError::Schema(format!(
                "no index '{index}' on '{collection}'"
            )));
        }

        sqlx::query(&format!("DROP INDEX {}", index_name(collection, index)))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    /// Declared schema of a collection as currently recorded in this transaction
    pub async fn schema(&mut self, collection: &str) -> Result<Option<CollectionSchema>> {
        load_schema(&mut *self.tx, collection).await
    }

    /// Record the new version and commit every change made during the upgrade
    pub(crate) async fn commit(mut self, database: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO _database (name, version) VALUES (?, ?)
             ON CONFLICT(name) DO UPDATE SET version = excluded.version",
        )
        .bind(database)
        .bind(self.new_version)
        .execute(&mut *self.tx)
        .await?;
        self.tx.commit().await?;
        Ok(())
    }

    pub(crate) async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Read one collection's catalog entry and its indexes
pub(crate) async fn load_schema(
    conn: &mut sqlx::SqliteConnection,
    collection: &str,
) -> Result<Option<CollectionSchema>> {
    let row: Option<(String, String, bool)> =
        sqlx::query_as("SELECT name, key_path, auto_increment FROM _collections WHERE name = ?")
            .bind(collection)
            .fetch_optional(&mut *conn)
            .await?;
    let Some((name, key_path, auto_increment)) = row else {
        return Ok(None);
    };

    let indexes: Vec<(String, String, bool)> = sqlx::query_as(
        "SELECT name, key_path, is_unique FROM _indexes WHERE collection = ? ORDER BY rowid",
    )
    .bind(collection)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(CollectionSchema {
        name,
        key_path,
        auto_increment,
        indexes: indexes
            .into_iter()
            .map(|(name, key_path, unique)| IndexSpec {
                name,
                key_path,
                unique,
            })
            .collect(),
    }))
}
