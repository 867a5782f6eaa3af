//! Creating and removing groups

use proven_groups::{GroupInfo, NAMESPACE_GROUP_PROPERTY};
use tracing::info;

use crate::coordinator::GroupCoordinator;
use crate::error::{Error, GroupResult};

impl GroupCoordinator {
    /// Create an empty group.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the name is empty or already taken.
    pub async fn add_group(&self, name: &str) -> GroupResult<()> {
        if let Some(observer) = self.observer() {
            observer.pre_add_group(name).await?;
        }

        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "Group name cannot be empty".to_string(),
            ));
        }

        {
            let _membership = self.membership_lock.lock().await;

            if self.registry.get_group(name).await?.is_some() {
                return Err(Error::InvalidArgument(format!(
                    "Group already exists: {name}"
                )));
            }

            self.registry.add_group(GroupInfo::new(name)).await?;
        }
        info!("Added group {name}");

        if let Some(observer) = self.observer() {
            observer.post_add_group(name).await?;
        }

        Ok(())
    }

    /// Delete a group that owns no tables and no servers and that no
    /// namespace names as its group.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for the default group
    /// - `NotFound` if the group does not exist
    /// - `InvalidState` if the group is still in use
    pub async fn remove_group(&self, name: &str) -> GroupResult<()> {
        let _membership = self.membership_lock.lock().await;

        if let Some(observer) = self.observer() {
            observer.pre_remove_group(name).await?;
        }

        let group = self
            .registry
            .get_group(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Group {name} does not exist")))?;

        if group.is_default() {
            return Err(Error::InvalidArgument(
                "The default group cannot be removed".to_string(),
            ));
        }

        if !group.tables().is_empty() {
            return Err(Error::InvalidState(format!(
                "Group {name} must have no associated tables: {}",
                group.tables().len()
            )));
        }

        if !group.servers().is_empty() {
            return Err(Error::InvalidState(format!(
                "Group {name} has {} servers; you must remove these servers from the group before the group can be removed",
                group.servers().len()
            )));
        }

        for namespace in self.namespaces.list_namespaces().await? {
            if namespace.group() == Some(name) {
                return Err(Error::InvalidState(format!(
                    "Group {name} is referenced by namespace: {} ({NAMESPACE_GROUP_PROPERTY})",
                    namespace.name
                )));
            }
        }

        self.registry.remove_group(name).await?;
        info!("Removed group {name}");

        if let Some(observer) = self.observer() {
            observer.post_remove_group(name).await?;
        }

        Ok(())
    }
}
