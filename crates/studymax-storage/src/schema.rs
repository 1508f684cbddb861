//! Collection and index declarations
//!
//! A [`CollectionSchema`] describes one named collection and its secondary
//! indexes. Schemas only take effect when handed to
//! [`VersionChange::define_collection`](crate::VersionChange::define_collection)
//! during a version upgrade.

use async_trait::async_trait;
use serde::Serialize;
use studymax_core::collections::{CLASSES, DOCUMENTS, TASKS, USERS};

use crate::db::Storage;
use crate::upgrade::{UpgradeHandler, VersionChange};
use crate::{Result, StorageError};

/// Application identifier the local database is opened under
pub const DATABASE_NAME: &str = "studyMax";

/// Current schema version; see [`StudyMaxSchema`] for the history
pub const SCHEMA_VERSION: u32 = 2;

/// Key path every studymax collection uses for its identity
pub const DEFAULT_KEY_PATH: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSchema {
    pub name: String,
    pub key_path: String,
    pub auto_increment: bool,
    pub indexes: Vec<IndexSpec>,
}

/// Secondary index over one top-level field of the stored records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub name: String,
    pub key_path: String,
    pub unique: bool,
}

impl CollectionSchema {
    /// Auto-incrementing collection keyed by `id`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_path: DEFAULT_KEY_PATH.to_string(),
            auto_increment: true,
            indexes: Vec::new(),
        }
    }

    /// Records must carry their own integer key
    pub fn manual_keys(mut self) -> Self {
        self.auto_increment = false;
        self
    }

    pub fn index(mut self, field: &str) -> Self {
        self.indexes.push(IndexSpec::new(field, false));
        self
    }

    pub fn unique_index(mut self, field: &str) -> Self {
        self.indexes.push(IndexSpec::new(field, true));
        self
    }

    pub fn with_index(mut self, spec: IndexSpec) -> Self {
        self.indexes.push(spec);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("collection name", &self.name)?;
        validate_identifier("key path", &self.key_path)?;
        for (i, spec) in self.indexes.iter().enumerate() {
            spec.validate()?;
            if spec.key_path == self.key_path {
                return Err(StorageError::Schema(format!(
                    "index '{}' on '{}' duplicates the key path",
                    spec.name, self.name
                )));
            }
            if self.indexes[..i].iter().any(|other| other.name == spec.name) {
                return Err(StorageError::Schema(format!(
                    "index '{}' declared twice on '{}'",
                    spec.name, self.name
                )));
            }
        }
        Ok(())
    }

    pub fn find_index(&self, name: &str) -> Option<&IndexSpec> {
        self.indexes.iter().find(|spec| spec.name == name)
    }
}

impl IndexSpec {
    /// Index named after the field it covers
    pub fn new(field: &str, unique: bool) -> Self {
        Self {
            name: field.to_string(),
            key_path: field.to_string(),
            unique,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("index name", &self.name)?;
        validate_identifier("index key path", &self.key_path)
    }
}

/// Names end up inside SQL identifiers and JSON paths, so keep them plain
pub(crate) fn validate_identifier(what: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value.len() <= 64
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::Schema(format!("invalid {what}: {value:?}")))
    }
}

pub(crate) fn table_name(collection: &str) -> String {
    format!("\"store_{collection}\"")
}

pub(crate) fn index_name(collection: &str, index: &str) -> String {
    format!("\"idx_{collection}_{index}\"")
}

/// Whether a field holding another record's title may repeat across records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForeignRefPolicy {
    /// Many tasks and documents may name the same class
    #[default]
    NonUnique,
    /// Keep the historical unique index: a second task for a class is rejected
    Unique,
}

impl ForeignRefPolicy {
    pub fn from_unique_flag(unique: bool) -> Self {
        if unique {
            ForeignRefPolicy::Unique
        } else {
            ForeignRefPolicy::NonUnique
        }
    }

    fn is_unique(self) -> bool {
        self == ForeignRefPolicy::Unique
    }
}

impl Storage {
    /// Class-reference policy the stored Tasks and Documents indexes enforce.
    ///
    /// The policy is fixed when the indexes are created, so this can differ
    /// from the one a later open asked for. `None` if either collection or its
    /// `class` index is missing, or the two disagree.
    pub fn class_reference_policy(&self) -> Option<ForeignRefPolicy> {
        let unique = [TASKS, DOCUMENTS]
            .into_iter()
            .map(|name| Some(self.schema(name)?.find_index("class")?.unique))
            .collect::<Option<Vec<bool>>>()?;
        match unique.as_slice() {
            [tasks, documents] if tasks == documents => {
                Some(ForeignRefPolicy::from_unique_flag(*tasks))
            }
            _ => None,
        }
    }
}

/// The four studymax collections with their indexes
pub fn studymax_schemas(policy: ForeignRefPolicy) -> Vec<CollectionSchema> {
    vec![
        CollectionSchema::new(CLASSES)
            .unique_index("courseTitle")
            .index("courseDescription")
            .index("days")
            .index("time"),
        CollectionSchema::new(TASKS)
            .index("taskTitle")
            .index("taskDescription")
            .index("deadline")
            .with_index(IndexSpec::new("class", policy.is_unique())),
        CollectionSchema::new(DOCUMENTS)
            .index("documentTitle")
            .index("documentType")
            .index("uploadDate")
            .with_index(IndexSpec::new("class", policy.is_unique())),
        CollectionSchema::new(USERS)
            .index("firstName")
            .index("lastName")
            .index("school")
            .index("major")
            .unique_index("email"),
    ]
}

/// Upgrade handler for the studymax database.
///
/// - v1 creates Classes, Tasks, Documents and Users.
/// - v2 replaces a unique `class` index on Tasks/Documents with a non-unique
///   one, unless the policy asks to keep it. Databases created before the
///   policy existed always had it unique.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudyMaxSchema {
    policy: ForeignRefPolicy,
}

impl StudyMaxSchema {
    pub fn new(policy: ForeignRefPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ForeignRefPolicy {
        self.policy
    }
}

#[async_trait]
impl UpgradeHandler for StudyMaxSchema {
    async fn upgrade(&self, change: &mut VersionChange) -> Result<()> {
        if change.old_version() < 1 {
            for schema in studymax_schemas(self.policy) {
                change.define_collection(&schema).await?;
            }
        }

        if change.old_version() < 2
            && change.new_version() >= 2
            && self.policy == ForeignRefPolicy::NonUnique
        {
            for collection in [TASKS, DOCUMENTS] {
                relax_unique_index(change, collection, "class").await?;
            }
        }

        Ok(())
    }
}

async fn relax_unique_index(
    change: &mut VersionChange,
    collection: &str,
    index: &str,
) -> Result<()> {
    let Some(schema) = change.schema(collection).await? else {
        return Ok(());
    };
    let Some(spec) = schema.find_index(index).filter(|spec| spec.unique).cloned() else {
        return Ok(());
    };

    change.delete_index(collection, &spec.name).await?;
    change
        .create_index(
            collection,
            &IndexSpec {
                unique: false,
                ..spec
            },
        )
        .await?;

    tracing::info!("Index '{}' on '{}' is no longer unique", index, collection);
    Ok(())
}

/// Upgrade handler that defines a fixed set of collections, skipping any that exist
#[derive(Debug, Clone, Default)]
pub struct DefineCollections(pub Vec<CollectionSchema>);

#[async_trait]
impl UpgradeHandler for DefineCollections {
    async fn upgrade(&self, change: &mut VersionChange) -> Result<()> {
        for schema in &self.0 {
            change.define_collection(schema).await?;
        }
        Ok(())
    }
}
