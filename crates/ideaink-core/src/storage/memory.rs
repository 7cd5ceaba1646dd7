//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult, Workspace};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    workspaces: RwLock<HashMap<String, Workspace>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, workspace: &Workspace) -> BoxFuture<'_, StorageResult<()>> {
        let workspace = workspace.clone();
        Box::pin(async move {
            let mut all = self.workspaces.write().map_err(lock_error)?;
            all.insert(workspace.id.clone(), workspace);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Workspace>> {
        let id = id.to_string();
        Box::pin(async move {
            let all = self.workspaces.read().map_err(lock_error)?;
            all.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut all = self.workspaces.write().map_err(lock_error)?;
            all.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let all = self.workspaces.read().map_err(lock_error)?;
            Ok(all.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let all = self.workspaces.read().map_err(lock_error)?;
            Ok(all.contains_key(&id))
        })
    }
}
