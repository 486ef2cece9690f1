use std::path::Path;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use tokio::fs;

use crate::pkg::{
    internal::{
        adaptors::jobs::mutators::JobMutator,
        store::{StoreError, discard},
    },
    server::{handlers::WriteResponse, state::AppState},
};

fn is_json(file_name: &str, content_type: &str) -> bool {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    let essence = content_type.split(';').next().unwrap_or("").trim();
    extension == "json" || essence.eq_ignore_ascii_case("application/json")
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<WriteResponse>, StoreError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("upload is not multipart: {}", e.body_text());
        StoreError::MalformedInput(format!("Invalid upload: {}", e.body_text()))
    })?;
    let mut landed = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StoreError::MalformedInput(format!("Invalid upload: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        if !is_json(&file_name, &content_type) {
            tracing::warn!("refusing upload {} ({})", &file_name, &content_type);
            return Err(StoreError::MalformedInput("Only JSON files are allowed".into()));
        }
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                StoreError::MalformedInput("File too large".into())
            } else {
                StoreError::MalformedInput(format!("Invalid upload: {}", e.body_text()))
            }
        })?;
        if data.len() > state.upload_max_bytes {
            return Err(StoreError::MalformedInput("File too large".into()));
        }
        let path = state.store.landing_path();
        if let Err(err) = fs::write(&path, &data).await {
            discard(&path).await;
            return Err(err.into());
        }
        tracing::debug!("landed {} ({} bytes) at {}", &file_name, data.len(), path.display());
        landed = Some(path);
        break;
    }
    let Some(path) = landed else {
        return Err(StoreError::MalformedInput("No file uploaded".into()));
    };
    let count = JobMutator::new(&state.store).adopt(&path).await?;
    Ok(Json(WriteResponse::accepted("File uploaded successfully", count)))
}
