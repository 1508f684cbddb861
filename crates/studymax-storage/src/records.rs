//! Typed access for [`Record`] implementors, layered over the JSON operations

use serde_json::Value;
use studymax_core::{Record, RecordId};

use crate::collection::Object;
use crate::db::Storage;
use crate::{Result, StorageError};

impl Storage {
    pub async fn insert_record<R: Record>(&self, record: &R) -> Result<RecordId> {
        self.insert(R::COLLECTION, serde_json::to_value(record)?).await
    }

    /// Insert or overwrite; a record without an identity is inserted fresh
    pub async fn put_record<R: Record>(&self, record: &R) -> Result<RecordId> {
        self.put(R::COLLECTION, serde_json::to_value(record)?).await
    }

    pub async fn all_records<R: Record>(&self) -> Result<Vec<R>> {
        self.get_all(R::COLLECTION)
            .await?
            .into_iter()
            .map(from_object)
            .collect()
    }

    pub async fn get_record<R: Record>(&self, id: RecordId) -> Result<Option<R>> {
        self.get(R::COLLECTION, id).await?.map(from_object).transpose()
    }

    /// Records matching `predicate`, evaluated after a full scan
    pub async fn find_records<R, P>(&self, predicate: P) -> Result<Vec<R>>
    where
        R: Record,
        P: Fn(&R) -> bool,
    {
        let mut records = self.all_records::<R>().await?;
        records.retain(|record| predicate(record));
        Ok(records)
    }

    /// Read-modify-write of one record; see [`Storage::update`].
    ///
    /// Only the fields `R` models are written back. Stored fields it does not
    /// model are kept as they were.
    pub async fn update_record<R, F>(&self, id: RecordId, mutator: F) -> Result<R>
    where
        R: Record,
        F: FnOnce(&mut R) + Send,
    {
        let updated = self
            .update_with(R::COLLECTION, id, |object| {
                let mut record: R = from_object(object.clone())?;
                let before = to_object::<R>(&record)?;
                mutator(&mut record);
                let after = to_object::<R>(&record)?;

                // A modelled field that no longer serializes was cleared
                for key in before.keys() {
                    if !after.contains_key(key) {
                        object.remove(key);
                    }
                }
                object.extend(after);
                Ok(())
            })
            .await?;
        from_object(updated)
    }

    pub async fn remove_record<R: Record>(&self, id: RecordId) -> Result<()> {
        self.remove(R::COLLECTION, id).await
    }
}

fn from_object<R: Record>(object: Object) -> Result<R> {
    Ok(serde_json::from_value(Value::Object(object))?)
}

fn to_object<R: Record>(record: &R) -> Result<Object> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::invalid_record(
            R::COLLECTION,
            format!("record serialized to {other}"),
        )),
    }
}
