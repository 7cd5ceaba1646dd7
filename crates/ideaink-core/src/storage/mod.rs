//! Storage abstraction for workspace persistence.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Workspace not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A saved whiteboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub last_modified: DateTime<Utc>,
    /// Preview image as a data URL. Produced elsewhere, carried as-is.
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Opaque scene snapshot.
    #[serde(default)]
    pub data: Option<String>,
}

impl Workspace {
    /// An empty workspace stamped with the current time.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            last_modified: Utc::now(),
            thumbnail: None,
            data: None,
        }
    }

    pub fn with_data(mut self, snapshot: String) -> Self {
        self.data = Some(snapshot);
        self
    }

    /// Bump the modification time.
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// Trait for workspace storage backends.
pub trait Storage: Send + Sync {
    /// Save a workspace, replacing any record with the same id.
    fn save(&self, workspace: &Workspace) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a workspace.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Workspace>>;

    /// Delete a workspace. Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all workspace ids.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a workspace exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Poll a future to completion on the current thread.
///
/// Storage futures never wait on I/O readiness, so a no-op waker suffices.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_json_is_camel_case() {
        let ws = Workspace::new("w1", "Ideas").with_data("{}".into());
        let json = serde_json::to_value(&ws).unwrap();
        assert!(json.get("lastModified").is_some());
        assert_eq!(json["data"], "{}");

        let back: Workspace = serde_json::from_value(json).unwrap();
        assert_eq!(back, ws);
    }

    #[test]
    fn test_workspace_tolerates_missing_optionals() {
        let json = r#"{"id":"w","name":"n","lastModified":"2024-01-01T00:00:00Z"}"#;
        let ws: Workspace = serde_json::from_str(json).unwrap();
        assert!(ws.thumbnail.is_none());
        assert!(ws.data.is_none());
    }
}
