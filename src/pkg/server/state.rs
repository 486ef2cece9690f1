use std::sync::Arc;

use standard_error::{Interpolate, StandardError};

use crate::{conf::Settings, pkg::internal::store::JobStore, prelude::Result};

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub upload_max_bytes: usize,
}

impl AppState {
    pub async fn new(conf: &Settings) -> Result<AppState> {
        tokio::fs::create_dir_all(&conf.data_dir)
            .await
            .map_err(|e| StandardError::new("ERR-STORE-001").interpolate_err(e.to_string()))?;
        let store = JobStore::open(conf.jobs_path()).await;
        tracing::debug!("job store backed by {}", store.path().display());
        Ok(AppState {
            store: Arc::new(store),
            upload_max_bytes: conf.upload_max_bytes,
        })
    }
}
