//! Tracking of generative requests in flight.
//!
//! The tracker backs the busy indicator: it is busy while at least one
//! [`ActivityGuard`] is alive. Guards release on drop, so a request that
//! fails, panics or is cancelled still clears its slot.

use crate::mindmap::NodeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    in_flight: usize,
    per_node: HashMap<NodeId, usize>,
}

/// Shared, cloneable counter of requests in flight.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    inner: Arc<Mutex<Inner>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a request for `node`.
    ///
    /// With `exclusive` set, a node that already has a request in flight
    /// is refused and `None` is returned.
    pub fn try_begin(&self, node: &NodeId, exclusive: bool) -> Option<ActivityGuard> {
        let mut inner = self.lock();
        let count = inner.per_node.entry(node.clone()).or_default();
        if exclusive && *count > 0 {
            log::debug!("Request for {} refused: already in flight", node);
            return None;
        }
        *count += 1;
        inner.in_flight += 1;
        Some(ActivityGuard {
            tracker: self.clone(),
            node: node.clone(),
        })
    }

    /// Whether any request is in flight.
    pub fn is_busy(&self) -> bool {
        self.lock().in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn is_node_busy(&self, node: &NodeId) -> bool {
        self.lock().per_node.get(node).is_some_and(|&n| n > 0)
    }

    fn release(&self, node: &NodeId) {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if let Some(count) = inner.per_node.get_mut(node) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                inner.per_node.remove(node);
            }
        }
    }
}

/// Holds one in-flight slot until dropped.
#[derive(Debug)]
#[must_use = "the request is considered finished as soon as the guard is dropped"]
pub struct ActivityGuard {
    tracker: ActivityTracker,
    node: NodeId,
}

impl ActivityGuard {
    pub fn node(&self) -> &NodeId {
        &self.node
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.tracker.release(&self.node);
    }
}
