use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorResult;

/// Namespace configuration key naming the group new tables are placed in.
pub const NAMESPACE_GROUP_PROPERTY: &str = "group";

/// A namespace and its configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDescriptor {
    /// Namespace name.
    pub name: String,

    /// Free-form configuration values.
    pub configuration: BTreeMap<String, String>,
}

impl NamespaceDescriptor {
    /// Creates a namespace with no configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configuration: BTreeMap::new(),
        }
    }

    /// Sets the default group for tables of this namespace.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.configuration
            .insert(NAMESPACE_GROUP_PROPERTY.to_string(), group.into());
        self
    }

    /// The configured default group, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.configuration
            .get(NAMESPACE_GROUP_PROPERTY)
            .map(String::as_str)
    }
}

/// Read access to namespace descriptors.
#[async_trait]
pub trait NamespaceStore: Send + Sync + 'static {
    /// Lists every namespace.
    async fn list_namespaces(&self) -> CollaboratorResult<Vec<NamespaceDescriptor>>;

    /// Gets a namespace by name.
    async fn get_namespace(&self, name: &str) -> CollaboratorResult<Option<NamespaceDescriptor>>;
}
