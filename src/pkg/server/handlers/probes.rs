use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::pkg::{
    internal::adaptors::jobs::selectors::JobSelector, server::state::AppState,
};

pub async fn livez() -> StatusCode {
    tracing::debug!("service is live");
    StatusCode::OK
}

pub async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let dir = state.store.path().parent().filter(|p| !p.as_os_str().is_empty());
    let reachable = match dir {
        Some(dir) => tokio::fs::metadata(dir).await.is_ok_and(|m| m.is_dir()),
        None => true,
    };
    if !reachable {
        tracing::warn!("data directory for {} is gone", state.store.path().display());
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "unavailable"})),
        );
    }
    let rows = JobSelector::new(&state.store).count().await;
    tracing::debug!("service is healthy");
    (StatusCode::OK, Json(json!({"status": "ok", "rows": rows})))
}
