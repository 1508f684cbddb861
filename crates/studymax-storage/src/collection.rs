//! Reads and writes against a single collection
//!
//! Records are plain JSON objects. The collection's key path is held in the
//! row id rather than inside the stored object, and put back on every read.
//! Every write runs in its own transaction and only reports success after
//! that transaction commits.

use serde_json::{Map, Value};
use studymax_core::RecordId;

use crate::db::Storage;
use crate::schema::{CollectionSchema, table_name};
use crate::{Result, StorageError};

/// A record as stored: a JSON object including its identity field
pub type Object = Map<String, Value>;

impl Storage {
    /// Every record in the collection, in identity order
    pub async fn get_all(&self, collection: &str) -> Result<Vec<Object>> {
        let schema = self.require(collection)?;
        let rows: Vec<(i64, String)> = sqlx::query_as(&format!(
            "SELECT id, data FROM {} ORDER BY id",
            table_name(collection)
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::read(collection, e))?;

        tracing::debug!("Read {} records from '{}'", rows.len(), collection);
        rows.into_iter()
            .map(|(id, data)| decode_row(schema, id, &data))
            .collect()
    }

    pub async fn get(&self, collection: &str, id: RecordId) -> Result<Option<Object>> {
        let schema = self.require(collection)?;
        let data: Option<String> = sqlx::query_scalar(&format!(
            "SELECT data FROM {} WHERE id = ?",
            table_name(collection)
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::read(collection, e))?;

        data.map(|data| decode_row(schema, id, &data)).transpose()
    }

    /// Full scan filtered by `predicate` in application code
    pub async fn query<P>(&self, collection: &str, predicate: P) -> Result<Vec<Object>>
    where
        P: Fn(&Object) -> bool,
    {
        let mut records = self.get_all(collection).await?;
        records.retain(|record| predicate(record));
        Ok(records)
    }

    /// Records whose top-level `field` equals `value`
    pub async fn find_by(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Object>> {
        self.query(collection, |record| record.get(field) == Some(value))
            .await
    }

    pub async fn count(&self, collection: &str) -> Result<u64> {
        self.require(collection)?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table_name(collection)))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::read(collection, e))?;
        Ok(count.max(0) as u64)
    }

    /// Add a new record and return the identity the store assigned.
    ///
    /// An integer identity already present on the record is kept. Fails with
    /// `Constraint` if that identity or any unique-indexed field collides.
    pub async fn insert(&self, collection: &str, record: Value) -> Result<RecordId> {
        let schema = self.require(collection)?;
        let (key, data) = split_key(schema, record)?;
        if key.is_none() && !schema.auto_increment {
            return Err(StorageError::invalid_record(
                collection,
                format!("missing '{}' and the collection does not generate keys", schema.key_path),
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::write(collection, e))?;
        let result = sqlx::query(&format!(
            "INSERT INTO {} (id, data) VALUES (?, ?)",
            table_name(collection)
        ))
        .bind(key)
        .bind(&data)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::write(collection, e))?;
        tx.commit()
            .await
            .map_err(|e| StorageError::write(collection, e))?;

        let id = result.last_insert_rowid();
        tracing::debug!("Inserted record {} into '{}'", id, collection);
        Ok(id)
    }

    /// Insert or overwrite the whole record at its identity
    pub async fn put(&self, collection: &str, record: Value) -> Result<RecordId> {
        let schema = self.require(collection)?;
        let (key, data) = split_key(schema, record)?;
        let Some(id) = key else {
            return self.insert(collection, Value::Object(parse_object(collection, &data)?)).await;
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::write(collection, e))?;
        sqlx::query(&format!(
            "INSERT INTO {} (id, data) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            table_name(collection)
        ))
        .bind(id)
        .bind(&data)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::write(collection, e))?;
        tx.commit()
            .await
            .map_err(|e| StorageError::write(collection, e))?;

        tracing::debug!("Put record {} into '{}'", id, collection);
        Ok(id)
    }

    /// Read the full record, let `mutator` change it, and write it back.
    ///
    /// Read and write share one transaction. Changing the identity field has
    /// no effect. Returns the record as written.
    pub async fn update<F>(&self, collection: &str, id: RecordId, mutator: F) -> Result<Object>
    where
        F: FnOnce(&mut Object) + Send,
    {
        self.update_with(collection, id, |record| {
            mutator(record);
            Ok(())
        })
        .await
    }

    pub(crate) async fn update_with<F>(
        &self,
        collection: &str,
        id: RecordId,
        mutator: F,
    ) -> Result<Object>
    where
        F: FnOnce(&mut Object) -> Result<()> + Send,
    {
        let schema = self.require(collection)?;
        let table = table_name(collection);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::write(collection, e))?;
        let existing: Option<String> =
            sqlx::query_scalar(&format!("SELECT data FROM {table} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| StorageError::write(collection, e))?;
        let Some(existing) = existing else {
            return Err(StorageError::NotFound {
                collection: collection.to_string(),
                id,
            });
        };

        let mut record = decode_row(schema, id, &existing)?;
        mutator(&mut record)?;
        record.insert(schema.key_path.clone(), Value::from(id));
        let (_, data) = split_key(schema, Value::Object(record.clone()))?;

        sqlx::query(&format!("UPDATE {table} SET data = ? WHERE id = ?"))
            .bind(&data)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::write(collection, e))?;
        tx.commit()
            .await
            .map_err(|e| StorageError::write(collection, e))?;

        tracing::debug!("Updated record {} in '{}'", id, collection);
        Ok(record)
    }

    /// Delete by identity; deleting an absent identity succeeds
    pub async fn remove(&self, collection: &str, id: RecordId) -> Result<()> {
        self.delete_rows(collection, Some(id)).await.map(|_| ())
    }

    /// Delete by identity, failing with `NotFound` if nothing was there
    pub async fn remove_existing(&self, collection: &str, id: RecordId) -> Result<()> {
        if self.delete_rows(collection, Some(id)).await? == 0 {
            return Err(StorageError::NotFound {
                collection: collection.to_string(),
                id,
            });
        }
        Ok(())
    }

    /// Delete every record; identities already handed out are not reused
    pub async fn clear(&self, collection: &str) -> Result<u64> {
        self.delete_rows(collection, None).await
    }

    async fn delete_rows(&self, collection: &str, id: Option<RecordId>) -> Result<u64> {
        self.require(collection)?;
        let table = table_name(collection);
        let sql = match id {
            Some(_) => format!("DELETE FROM {table} WHERE id = ?"),
            None => format!("DELETE FROM {table}"),
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::write(collection, e))?;
        let mut query = sqlx::query(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        let result = query
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::write(collection, e))?;
        tx.commit()
            .await
            .map_err(|e| StorageError::write(collection, e))?;

        tracing::debug!(
            "Deleted {} records from '{}'",
            result.rows_affected(),
            collection
        );
        Ok(result.rows_affected())
    }
}

/// Separate the identity from the body that gets stored
fn split_key(schema: &CollectionSchema, record: Value) -> Result<(Option<RecordId>, String)> {
    let Value::Object(mut object) = record else {
        return Err(StorageError::invalid_record(&schema.name, "record must be a JSON object"));
    };

    let key = match object.remove(&schema.key_path) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) if n.is_i64() => n.as_i64(),
        Some(other) => {
            return Err(StorageError::invalid_record(
                &schema.name,
                format!("'{}' must be an integer, got {other}", schema.key_path),
            ));
        }
    };

    Ok((key, serde_json::to_string(&object)?))
}

fn parse_object(collection: &str, data: &str) -> Result<Object> {
    match serde_json::from_str(data)? {
        Value::Object(object) => Ok(object),
        _ => Err(StorageError::invalid_record(collection, "stored data is not an object")),
    }
}

fn decode_row(schema: &CollectionSchema, id: RecordId, data: &str) -> Result<Object> {
    let mut object = parse_object(&schema.name, data)?;
    object.insert(schema.key_path.clone(), Value::from(id));
    Ok(object)
}
