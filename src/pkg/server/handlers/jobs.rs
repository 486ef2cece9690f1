use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;

use crate::pkg::{
    internal::{
        adaptors::jobs::{
            mutators::JobMutator,
            selectors::JobSelector,
            spec::{INVALID_BODY, JobCollection},
        },
        store::StoreError,
    },
    server::{handlers::WriteResponse, state::AppState},
};

pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WriteResponse>, StoreError> {
    tracing::debug!("received POST request with jobs data");
    let candidate: Value = serde_json::from_slice(&body)
        .map_err(|_| StoreError::MalformedInput(INVALID_BODY.into()))?;
    let count = JobMutator::new(&state.store).replace(candidate).await?;
    Ok(Json(WriteResponse::accepted("Jobs data received", count)))
}

pub async fn list(State(state): State<AppState>) -> Json<JobCollection> {
    tracing::debug!("sending jobs data to frontend");
    Json(JobSelector::new(&state.store).get_all().await)
}
