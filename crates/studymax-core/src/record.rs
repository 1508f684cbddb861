//! Record trait shared by every collection entity

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Engine-assigned identity of a record within its collection
pub type RecordId = i64;

/// Collection names, as declared by the schema
pub mod collections {
    pub const CLASSES: &str = "Classes";
    pub const TASKS: &str = "Tasks";
    pub const DOCUMENTS: &str = "Documents";
    pub const USERS: &str = "Users";
}

/// A plain data record that lives in exactly one named collection.
///
/// The identity is `None` until the store assigns one on insert; readers always
/// hand records back with it populated.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Name of the collection this record type is stored in
    const COLLECTION: &'static str;

    fn id(&self) -> Option<RecordId>;

    fn set_id(&mut self, id: RecordId);
}

/// Implements [`Record`] for a struct with an `id: Option<RecordId>` field
macro_rules! impl_record {
    ($ty:ty, $collection:expr) => {
        impl $crate::record::Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> Option<$crate::record::RecordId> {
                self.id
            }

            fn set_id(&mut self, id: $crate::record::RecordId) {
                self.id = Some(id);
            }
        }
    };
}

pub(crate) use impl_record;
