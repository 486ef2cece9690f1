use std::path::Path;

use serde_json::Value;
use tokio::fs;

use crate::pkg::internal::{
    adaptors::jobs::spec::JobCollection,
    store::{JobStore, StoreError, StoreResult, discard},
};

pub struct JobMutator<'a> {
    store: &'a JobStore,
}

impl<'a> JobMutator<'a> {
    pub fn new(store: &'a JobStore) -> Self {
        JobMutator { store }
    }

    /// Replaces the whole collection with `candidate.rows`.
    pub async fn replace(&self, candidate: Value) -> StoreResult<usize> {
        let collection = JobCollection::from_value(candidate)?;
        warn_nonconforming(&collection);
        let count = self.store.install(collection).await;
        tracing::info!("updated jobs data with {} jobs", count);
        Ok(count)
    }

    /// Validates an uploaded file and, if it passes, makes it the backing
    /// file. A rejected file is removed.
    pub async fn adopt(&self, landed: &Path) -> StoreResult<usize> {
        let collection = match read_landed(landed).await {
            Ok(collection) => collection,
            Err(err) => {
                tracing::warn!("rejected upload {}: {}", landed.display(), err);
                discard(landed).await;
                return Err(err);
            }
        };
        warn_nonconforming(&collection);
        let count = self.store.install_file(landed, collection).await;
        tracing::info!("adopted uploaded jobs file with {} jobs", count);
        Ok(count)
    }
}

async fn read_landed(landed: &Path) -> StoreResult<JobCollection> {
    let bytes = fs::read(landed).await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::MalformedInput(format!("Invalid JSON file: {}", e)))?;
    JobCollection::from_value(value)
}

fn warn_nonconforming(collection: &JobCollection) {
    let n = collection.nonconforming();
    if n > 0 {
        tracing::warn!("{} of {} rows do not match the job record shape", n, collection.len());
    }
}
