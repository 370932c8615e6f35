use std::sync::Arc;

use crate::application::errors::StorageError;
use crate::domain::traits::Store;

/// Named member lists persisted as space-joined strings
#[derive(Clone)]
pub struct GroupRegistry {
    store: Arc<dyn Store>,
}

impl GroupRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn key(name: &str) -> String {
        format!("[group::{}]", name)
    }

    pub async fn get_group(&self, name: &str) -> Result<Vec<String>, StorageError> {
        let raw = self
            .store
            .get(&Self::key(name))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("group {}", name)))?;
        Ok(raw.split_whitespace().map(str::to_string).collect())
    }

    /// Overwrite the group; also used for `create`
    pub async fn set_group(&self, name: &str, members: &[String]) -> Result<(), StorageError> {
        let mut unique: Vec<String> = Vec::with_capacity(members.len());
        for m in members {
            if !unique.contains(m) {
                unique.push(m.clone());
            }
        }
        self.write(name, &unique).await
    }

    /// Union `members` into the group, creating it when absent
    pub async fn add_to_group(&self, name: &str, members: &[String]) -> Result<(), StorageError> {
        let mut current = match self.get_group(name).await {
            Ok(existing) => existing,
            Err(StorageError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        for m in members {
            if !current.contains(m) {
                current.push(m.clone());
            }
        }
        self.write(name, &current).await
    }

    /// Drop `members` from an existing group, keeping everyone else in order
    pub async fn remove_from_group(&self, name: &str, members: &[String]) -> Result<(), StorageError> {
        let current = self.get_group(name).await?;
        let kept: Vec<String> = current.into_iter().filter(|m| !members.contains(m)).collect();
        self.write(name, &kept).await
    }

    async fn write(&self, name: &str, members: &[String]) -> Result<(), StorageError> {
        let value = members.join(" ");
        tracing::debug!("group {} -> [{}]", name, value);
        self.store.set(&Self::key(name), value.trim()).await
    }
}
