use std::path::Path;

use serde_json::Value;
use standard_error::{Interpolate, StandardError};

use crate::{
    conf::{Settings, settings},
    pkg::{internal::adaptors::jobs::mutators::JobMutator, server::state::AppState},
    prelude::Result,
};

pub async fn apply(path: &Path) -> Result<()> {
    let count = import_into(&settings, path).await?;
    println!("Imported {} jobs from {}", count, path.display());
    Ok(())
}

async fn import_into(conf: &Settings, path: &Path) -> Result<usize> {
    let state = AppState::new(conf).await?;
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| StandardError::new("ERR-IMPORT-001").interpolate_err(e.to_string()))?;
    let candidate: Value = serde_json::from_slice(&data)
        .map_err(|e| StandardError::new("ERR-IMPORT-002").interpolate_err(e.to_string()))?;
    let count = JobMutator::new(&state.store)
        .replace(candidate)
        .await
        .map_err(|e| StandardError::new("ERR-IMPORT-002").interpolate_err(e.to_string()))?;
    tracing::info!("installed {} into {}", path.display(), state.store.path().display());
    Ok(count)
}
