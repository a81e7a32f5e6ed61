use crate::types::RunResult;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Single-slot cache holding the most recent collection result. Absent until
/// the first run completes, then replaced wholesale after every run:
/// last-write-wins, never merged. Cloning the handle shares the slot, so the
/// cache is wired explicitly from main instead of living in a global.
#[derive(Clone, Default)]
pub struct LastRunCache {
    inner: Arc<RwLock<Option<RunResult>>>,
}

impl LastRunCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, result: RunResult) {
        let mut slot = self.inner.write().await;
        *slot = Some(result);
    }

    pub async fn last(&self) -> Option<RunResult> {
        self.inner.read().await.clone()
    }
}
