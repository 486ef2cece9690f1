use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::handlers::probes::{healthz, livez};
use super::state::AppState;
use crate::{conf::settings, prelude::Result};

// multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub async fn build_routes() -> Result<Router> {
    let state = AppState::new(&settings).await?;
    Ok(routes(state))
}

pub fn routes(state: AppState) -> Router {
    let body_limit = state.upload_max_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route("/api/jobs", post(handlers::jobs::create))
        .route("/api/jobs", get(handlers::jobs::list))
        .route("/api/upload", post(handlers::upload::upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use reqwest::{
        Client, Method, StatusCode,
        multipart::{Form, Part},
    };
    use serde_json::{Value, json};
    use tempfile::{TempDir, tempdir};
    use tracing_test::traced_test;

    use super::*;
    use crate::{conf::Settings, pkg::server::handlers::WriteResponse};

    async fn spawn(max: usize) -> (SocketAddr, TempDir) {
        let dir = tempdir().unwrap();
        let conf = Settings {
            listen_port: "0".into(),
            data_dir: dir.path().join("data").to_string_lossy().into_owned(),
            jobs_file: "jobs.json".into(),
            upload_max_bytes: max,
        };
        let state = AppState::new(&conf).await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, routes(state)).await.unwrap();
        });
        (addr, dir)
    }

    fn berlin() -> Value {
        json!({
            "location": "Berlin",
            "website": "https://x.com",
            "websiteToJobs": "https://x.com/careers",
            "hasJob": true
        })
    }

    async fn upload(addr: SocketAddr, part: Part) -> (StatusCode, WriteResponse) {
        let res = Client::new()
            .post(format!("http://{addr}/api/upload"))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .unwrap();
        (res.status(), res.json().await.unwrap())
    }

    async fn get_jobs(addr: SocketAddr) -> Value {
        reqwest::get(format!("http://{addr}/api/jobs"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_post_then_get() {
        let (addr, _dir) = spawn(1024 * 1024).await;
        assert_eq!(get_jobs(addr).await, json!({"rows": []}));

        let res = Client::new()
            .post(format!("http://{addr}/api/jobs"))
            .json(&json!({"rows": [berlin()]}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": true, "message": "Jobs data received", "count": 1})
        );
        assert_eq!(get_jobs(addr).await, json!({"rows": [berlin()]}));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_post_without_rows() {
        let (addr, _dir) = spawn(1024 * 1024).await;
        let res = Client::new()
            .post(format!("http://{addr}/api/jobs"))
            .json(&json!({"foo": "bar"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Request body must contain a \"rows\" array"})
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_post_garbage_body() {
        let (addr, _dir) = spawn(1024 * 1024).await;
        let res = Client::new()
            .post(format!("http://{addr}/api/jobs"))
            .body("rows=1")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: WriteResponse = res.json().await.unwrap();
        assert_eq!(body, WriteResponse::rejected("Invalid request body"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_upload_replaces_collection() {
        let (addr, dir) = spawn(1024 * 1024).await;
        let file = serde_json::to_vec(&json!({"rows": [berlin(), berlin()]})).unwrap();
        let part = Part::bytes(file).file_name("jobs.json");
        let (status, body) = upload(addr, part).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, WriteResponse::accepted("File uploaded successfully", 2));
        assert_eq!(get_jobs(addr).await, json!({"rows": [berlin(), berlin()]}));
        assert!(dir.path().join("data").join("jobs.json").exists());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_upload_rejects_non_json_file() {
        let (addr, dir) = spawn(1024 * 1024).await;
        let part = Part::bytes(b"location,website\n".to_vec())
            .file_name("jobs.csv")
            .mime_str("text/csv")
            .unwrap();
        let (status, body) = upload(addr, part).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, WriteResponse::rejected("Only JSON files are allowed"));
        let landed = std::fs::read_dir(dir.path().join("data")).unwrap().count();
        assert_eq!(landed, 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_invalid_upload_keeps_previous_collection() {
        let (addr, dir) = spawn(1024 * 1024).await;
        Client::new()
            .post(format!("http://{addr}/api/jobs"))
            .json(&json!({"rows": [berlin()]}))
            .send()
            .await
            .unwrap();

        let part = Part::bytes(br#"{"rows": "nope"}"#.to_vec()).file_name("jobs.json");
        let (status, body) = upload(addr, part).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(get_jobs(addr).await, json!({"rows": [berlin()]}));

        let names: Vec<String> = std::fs::read_dir(dir.path().join("data"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["jobs.json".to_string()]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_upload_without_multipart_body() {
        let (addr, _dir) = spawn(1024 * 1024).await;
        let res = Client::new()
            .post(format!("http://{addr}/api/upload"))
            .json(&json!({"rows": [berlin()]}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: WriteResponse = res.json().await.unwrap();
        assert!(!body.success);
        assert!(body.message.starts_with("Invalid upload"), "{}", body.message);
        assert_eq!(body.count, None);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_cors_preflight() {
        let (addr, _dir) = spawn(1024).await;
        let res = Client::new()
            .request(Method::OPTIONS, format!("http://{addr}/api/jobs"))
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );

        let res = Client::new()
            .get(format!("http://{addr}/api/jobs"))
            .header("origin", "http://localhost:5173")
            .send()
            .await
            .unwrap();
        assert!(res.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_upload_landing_write_failure() {
        let (addr, dir) = spawn(1024 * 1024).await;
        std::fs::remove_dir_all(dir.path().join("data")).unwrap();
        let file = serde_json::to_vec(&json!({"rows": [berlin()]})).unwrap();
        let (status, body) = upload(addr, Part::bytes(file).file_name("jobs.json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, WriteResponse::rejected("Failed to process uploaded file"));
        assert!(!dir.path().join("data").exists());
        assert_eq!(get_jobs(addr).await, json!({"rows": []}));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_upload_without_file_field() {
        let (addr, _dir) = spawn(1024 * 1024).await;
        let res = Client::new()
            .post(format!("http://{addr}/api/upload"))
            .multipart(Form::new().text("note", "hello"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: WriteResponse = res.json().await.unwrap();
        assert_eq!(body.message, "No file uploaded");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_upload_too_large() {
        let (addr, _dir) = spawn(16).await;
        let file = serde_json::to_vec(&json!({"rows": [berlin()]})).unwrap();
        let (status, body) = upload(addr, Part::bytes(file).file_name("jobs.json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "File too large");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_probes() {
        let (addr, _dir) = spawn(1024).await;
        let live = reqwest::get(format!("http://{addr}/livez")).await.unwrap();
        assert_eq!(live.status(), StatusCode::OK);
        let health: Value = reqwest::get(format!("http://{addr}/healthz"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health, json!({"status": "ok", "rows": 0}));
    }
}
