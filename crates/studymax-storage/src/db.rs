//! Opening the local database and negotiating its version

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::schema::CollectionSchema;
use crate::upgrade::{UpgradeHandler, VersionChange, load_schema};
use crate::{Result, StorageError};

/// Bookkeeping tables shared by every database
const CATALOG_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS _database (
    name TEXT PRIMARY KEY,
    version INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS _collections (
    name TEXT PRIMARY KEY,
    key_path TEXT NOT NULL,
    auto_increment INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS _indexes (
    collection TEXT NOT NULL,
    name TEXT NOT NULL,
    key_path TEXT NOT NULL,
    is_unique INTEGER NOT NULL,
    PRIMARY KEY (collection, name)
);
"#;

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    /// Private in-memory database, gone once the handle is closed
    Memory,
}

/// Name and version to open a database at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub name: String,
    pub version: u32,
    pub location: Location,
}

impl OpenRequest {
    pub fn new(name: impl Into<String>, version: u32, location: Location) -> Self {
        Self {
            name: name.into(),
            version,
            location,
        }
    }

    pub fn file(name: impl Into<String>, version: u32, path: impl Into<PathBuf>) -> Self {
        Self::new(name, version, Location::File(path.into()))
    }

    pub fn memory(name: impl Into<String>, version: u32) -> Self {
        Self::new(name, version, Location::Memory)
    }
}

/// Default database file under the platform data directory
pub fn default_database_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("com", "studymax", "studymax") {
        dirs.data_dir().join("studymax.db")
    } else {
        PathBuf::from(".studymax/studymax.db")
    }
}

/// Live handle to an opened database.
///
/// Cloning is cheap and every clone shares the one underlying connection.
#[derive(Clone)]
pub struct Storage {
    pub(crate) pool: SqlitePool,
    name: Arc<str>,
    version: u32,
    pub(crate) catalog: Arc<BTreeMap<String, CollectionSchema>>,
}

impl Storage {
    /// Open `request.name` at `request.version`, running `handler` if the
    /// stored version is lower.
    ///
    /// Fails with a connection error when the engine cannot be opened, when
    /// the stored version is newer than requested, or when the upgrade fails.
    /// A failed upgrade leaves the stored schema and version untouched.
    pub async fn open(request: &OpenRequest, handler: &dyn UpgradeHandler) -> Result<Self> {
        let name = request.name.as_str();
        if request.version == 0 {
            return Err(StorageError::connection(name, "version must be at least 1"));
        }

        let pool = connect(request)
            .await
            .map_err(|e| StorageError::connection(name, e))?;

        let prepared = async {
            sqlx::raw_sql(CATALOG_SQL)
                .execute(&pool)
                .await
                .map_err(|e| StorageError::connection(name, e))?;

            negotiate_version(&pool, request, handler).await?;

            load_catalog(&pool)
                .await
                .map_err(|e| StorageError::connection(name, e))
        };
        let catalog = match prepared.await {
            Ok(catalog) => catalog,
            Err(err) => {
                pool.close().await;
                return Err(err);
            }
        };

        tracing::info!(
            "Database '{}' open at version {} ({} collections)",
            name,
            request.version,
            catalog.len()
        );

        Ok(Self {
            pool,
            name: Arc::from(name),
            version: request.version,
            catalog: Arc::new(catalog),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Collection names in sorted order
    pub fn collection_names(&self) -> Vec<&str> {
        self.catalog.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.catalog.contains_key(collection)
    }

    pub fn schema(&self, collection: &str) -> Option<&CollectionSchema> {
        self.catalog.get(collection)
    }

    pub(crate) fn require(&self, collection: &str) -> Result<&CollectionSchema> {
        self.catalog
            .get(collection)
            .ok_or_else(|| StorageError::UnknownCollection(collection.to_string()))
    }

    /// Close the underlying connection; clones of this handle stop working too
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Database '{}' closed", self.name);
    }
}

async fn connect(request: &OpenRequest) -> Result<SqlitePool> {
    let options = match &request.location {
        Location::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        }
        Location::Memory => SqliteConnectOptions::from_str("sqlite::memory:")?,
    };

    // One connection, never recycled: an in-memory database lives exactly as
    // long as it does.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

async fn negotiate_version(
    pool: &SqlitePool,
    request: &OpenRequest,
    handler: &dyn UpgradeHandler,
) -> Result<()> {
    let name = request.name.as_str();
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StorageError::connection(name, e))?;

    let stored: Option<u32> = sqlx::query_scalar("SELECT version FROM _database WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StorageError::connection(name, e))?;
    let old_version = stored.unwrap_or(0);

    if old_version > request.version {
        return Err(StorageError::connection(
            name,
            format!(
                "requested version {} is lower than stored version {old_version}",
                request.version
            ),
        ));
    }

    if old_version == request.version {
        tx.commit()
            .await
            .map_err(|e| StorageError::connection(name, e))?;
        return Ok(());
    }

    tracing::info!(
        "Upgrading database '{}' from version {} to {}",
        name,
        old_version,
        request.version
    );

    let mut change = VersionChange::new(tx, old_version, request.version);
    if let Err(err) = handler.upgrade(&mut change).await {
        tracing::warn!("Upgrade of '{}' failed, rolling back: {}", name, err);
        if let Err(rollback_err) = change.rollback().await {
            tracing::warn!("Rollback of '{}' failed: {}", name, rollback_err);
        }
        return Err(StorageError::connection(
            name,
            format!("upgrade aborted: {err}"),
        ));
    }

    change
        .commit(name)
        .await
        .map_err(|e| StorageError::connection(name, e))
}

async fn load_catalog(pool: &SqlitePool) -> Result<BTreeMap<String, CollectionSchema>> {
    let mut conn = pool.acquire().await?;
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM _collections ORDER BY name")
        .fetch_all(&mut *conn)
        .await?;

    let mut catalog = BTreeMap::new();
    for name in names {
        if let Some(schema) = load_schema(&mut *conn, &name).await? {
            catalog.insert(name, schema);
        }
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CollectionSchema, DefineCollections};

    fn notes() -> DefineCollections {
        DefineCollections(vec![CollectionSchema::new("Notes").unique_index("title")])
    }

    #[tokio::test]
    async fn test_open_in_memory() {
        let storage = Storage::open(&OpenRequest::memory("test", 1), &notes())
            .await
            .unwrap();

        assert_eq!(storage.name(), "test");
        assert_eq!(storage.version(), 1);
        assert_eq!(storage.collection_names(), vec!["Notes"]);
        assert!(storage.schema("Notes").unwrap().find_index("title").unwrap().unique);
    }

    #[tokio::test]
    async fn test_version_zero_rejected() {
        let err = Storage::open(&OpenRequest::memory("test", 0), &notes())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::Connection { .. }));
    }

    #[test]
    fn test_default_path_is_a_db_file() {
        let path = default_database_path();
        assert_eq!(path.file_name().unwrap(), "studymax.db");
    }
}
