//! Per-workflow serialization
//!
//! Mutations of the same workflow queue behind one async mutex; different
//! workflows never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use workflow_types::WorkflowId;

const PRUNE_THRESHOLD: usize = 1024;

/// Registry of per-workflow mutexes
#[derive(Clone, Debug, Default)]
pub struct WorkflowLocks {
    inner: Arc<Mutex<HashMap<WorkflowId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl WorkflowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a workflow
    pub async fn acquire(&self, id: &WorkflowId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if map.len() > PRUNE_THRESHOLD {
                map.retain(|_, m| Arc::strong_count(m) > 1);
            }
            map.entry(id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
