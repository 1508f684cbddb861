//! Lazily opened, shared database handle

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::Result;
use crate::db::{OpenRequest, Storage};
use crate::schema::{ForeignRefPolicy, StudyMaxSchema};
use crate::upgrade::UpgradeHandler;

/// Opens the database on first use and hands the same [`Storage`] to every
/// caller afterwards.
///
/// Callers racing on the first [`handle`](Self::handle) wait on a single open
/// attempt. A failed attempt is not cached; the next call tries again.
pub struct ConnectionManager {
    request: OpenRequest,
    handler: Arc<dyn UpgradeHandler>,
    storage: OnceCell<Storage>,
}

impl ConnectionManager {
    pub fn new(request: OpenRequest, handler: Arc<dyn UpgradeHandler>) -> Self {
        Self {
            request,
            handler,
            storage: OnceCell::new(),
        }
    }

    /// Manager for the studymax collections under the given class-reference policy
    pub fn studymax(request: OpenRequest, policy: ForeignRefPolicy) -> Self {
        Self::new(request, Arc::new(StudyMaxSchema::new(policy)))
    }

    pub fn request(&self) -> &OpenRequest {
        &self.request
    }

    /// The open database, opening it first if needed
    pub async fn handle(&self) -> Result<&Storage> {
        self.storage
            .get_or_try_init(|| async {
                tracing::debug!("Opening database '{}'", self.request.name);
                Storage::open(&self.request, self.handler.as_ref()).await
            })
            .await
    }

    pub fn is_open(&self) -> bool {
        self.storage.initialized()
    }

    /// Close the database if it was opened. A later [`handle`](Self::handle) reopens it.
    pub async fn close(&mut self) {
        if let Some(storage) = self.storage.take() {
            storage.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CollectionSchema, DefineCollections};

    fn manager() -> ConnectionManager {
        ConnectionManager::new(
            OpenRequest::memory("test", 1),
            Arc::new(DefineCollections(vec![CollectionSchema::new("Notes")])),
        )
    }

    #[tokio::test]
    async fn test_opens_lazily() {
        let manager = manager();
        assert!(!manager.is_open());

        let storage = manager.handle().await.unwrap();
        assert!(storage.contains("Notes"));
        assert!(manager.is_open());
    }

    #[tokio::test]
    async fn test_same_handle_returned() {
        let manager = manager();
        let first = manager.handle().await.unwrap();
        first.insert("Notes", serde_json::json!({"title": "a"})).await.unwrap();

        let second = manager.handle().await.unwrap();
        assert_eq!(second.count("Notes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_open_not_cached() {
        let manager = ConnectionManager::new(
            OpenRequest::memory("test", 0),
            Arc::new(DefineCollections::default()),
        );
        assert!(manager.handle().await.is_err());
        assert!(!manager.is_open());
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let mut manager = manager();
        manager.handle().await.unwrap();
        manager.close().await;
        assert!(!manager.is_open());

        // In-memory data does not survive a close
        let storage = manager.handle().await.unwrap();
        assert_eq!(storage.count("Notes").await.unwrap(), 0);
    }
}
