//! Local persistence for studymax
//!
//! This crate provides:
//! - Versioned SQLite databases of named JSON collections
//! - Upgrade transactions, the only place schema changes happen
//! - Reads and single-transaction writes, raw and typed
//! - Inline attachment encoding
//! - A lazily opened shared connection

pub mod blob;
pub mod collection;
pub mod db;
pub mod error;
pub mod manager;
mod records;
pub mod schema;
pub mod upgrade;

pub use blob::{AttachmentCodec, DecodedBlob, MAX_FILE_SIZE};
pub use collection::Object;
pub use db::{Location, OpenRequest, Storage, default_database_path};
pub use error::{ErrorKind, Result, StorageError};
pub use manager::ConnectionManager;
pub use schema::{
    CollectionSchema, DATABASE_NAME, DefineCollections, ForeignRefPolicy, IndexSpec,
    SCHEMA_VERSION, StudyMaxSchema, studymax_schemas,
};
pub use upgrade::{UpgradeHandler, VersionChange};
