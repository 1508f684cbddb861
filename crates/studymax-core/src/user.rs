//! User profile model
//!
//! Declared by the schema so the collection exists, but nothing in the
//! storage layer reads or writes it yet. Credentials are never stored here.

use serde::{Deserialize, Serialize};

use crate::record::{RecordId, collections, impl_record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    /// Unique within the collection
    pub email: String,
}

impl_record!(UserRecord, collections::USERS);
