//! Canned sheet provider for tests

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::dataset::Dataset;
use super::provider::SheetProvider;
use crate::error::Result;

/// Returns the same dataset for every fetch and counts the calls
pub struct StaticProvider {
    dataset: Dataset,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SheetProvider for StaticProvider {
    async fn fetch(&self, _spreadsheet_id: &str, _sheet: &str) -> Result<Dataset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.dataset.clone())
    }
}

#[async_trait]
impl<P: SheetProvider> SheetProvider for std::sync::Arc<P> {
    async fn fetch(&self, spreadsheet_id: &str, sheet: &str) -> Result<Dataset> {
        self.as_ref().fetch(spreadsheet_id, sheet).await
    }
}
