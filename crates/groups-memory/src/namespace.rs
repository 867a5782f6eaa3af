//! In-memory namespace store

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use proven_groups::{CollaboratorResult, NamespaceDescriptor, NamespaceStore};
use tokio::sync::RwLock;

/// In-memory namespace store.
#[derive(Clone, Debug, Default)]
pub struct MemoryNamespaceStore {
    namespaces: Arc<RwLock<BTreeMap<String, NamespaceDescriptor>>>,
}

impl MemoryNamespaceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a namespace.
    pub async fn put_namespace(&self, namespace: NamespaceDescriptor) {
        self.namespaces
            .write()
            .await
            .insert(namespace.name.clone(), namespace);
    }

    /// Removes a namespace.
    pub async fn remove_namespace(&self, name: &str) {
        self.namespaces.write().await.remove(name);
    }
}

#[async_trait]
impl NamespaceStore for MemoryNamespaceStore {
    async fn list_namespaces(&self) -> CollaboratorResult<Vec<NamespaceDescriptor>> {
        Ok(self.namespaces.read().await.values().cloned().collect())
    }

    async fn get_namespace(&self, name: &str) -> CollaboratorResult<Option<NamespaceDescriptor>> {
        Ok(self.namespaces.read().await.get(name).cloned())
    }
}
