use std::{path::Path, sync::Arc};

use super::*;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, Default)]
struct ReceivedField {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    len: usize,
}

#[derive(Clone, Default)]
struct ServerState {
    fields: Arc<Mutex<Vec<ReceivedField>>>,
}

async fn handle_analyze(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    let mut filename = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default();
        if let Some(file_name) = &file_name {
            filename = file_name.clone();
        }
        state.fields.lock().await.push(ReceivedField {
            name,
            file_name,
            content_type,
            len: bytes.len(),
        });
    }

    Json(json!({
        "filename": filename,
        "analysis": {
            "summary": "Mutual NDA with a two-year term.",
            "key_clauses": ["Confidentiality obligations survive termination"],
            "risks": ["Unlimited liability for disclosure"],
            "next_steps": ["Negotiate a liability cap"]
        }
    }))
}

async fn handle_failure() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn handle_garbage() -> &'static str {
    "<html>not json</html>"
}

async fn handle_stalled() -> StatusCode {
    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    StatusCode::OK
}

async fn handle_missing_fields() -> Json<serde_json::Value> {
    Json(json!({ "filename": "nda.pdf", "analysis": { "summary": "S" } }))
}

async fn spawn_analysis_server() -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/analyze/", post(handle_analyze))
        .route("/failing/analyze/", post(handle_failure))
        .route("/garbage/analyze/", post(handle_garbage))
        .route("/partial/analyze/", post(handle_missing_fields))
        .route("/stalled/analyze/", post(handle_stalled))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn write_document(dir: &Path, name: &str, len: usize) -> UploadedFile {
    let path = dir.join(name);
    std::fs::write(&path, vec![b'%'; len]).expect("write document");
    UploadedFile::from_path(&path).expect("uploaded file")
}

#[tokio::test]
async fn posts_single_multipart_file_field_and_decodes_result() {
    let (server_url, state) = spawn_analysis_server().await.expect("spawn server");
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_document(dir.path(), "nda.pdf", 2048);

    let client = AnalysisClient::new(format!("{server_url}/"));
    let result = client.analyze(&file).await.expect("analysis");

    assert_eq!(result.filename, "nda.pdf");
    assert_eq!(result.analysis.summary, "Mutual NDA with a two-year term.");
    assert_eq!(
        result.analysis.key_clauses,
        vec!["Confidentiality obligations survive termination".to_string()]
    );
    assert_eq!(result.analysis.risks.len(), 1);
    assert_eq!(result.analysis.next_steps.len(), 1);

    let fields = state.fields.lock().await.clone();
    assert_eq!(fields.len(), 1, "exactly one multipart field: {fields:?}");
    assert_eq!(fields[0].name.as_deref(), Some("file"));
    assert_eq!(fields[0].file_name.as_deref(), Some("nda.pdf"));
    assert_eq!(fields[0].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(fields[0].len, 2048);
}

#[tokio::test]
async fn non_success_status_surfaces_as_remote_error() {
    let (server_url, _state) = spawn_analysis_server().await.expect("spawn server");
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_document(dir.path(), "nda.pdf", 16);

    let client = AnalysisClient::new(format!("{server_url}/failing"));
    let err = client.analyze(&file).await.expect_err("must fail");

    assert_eq!(
        err,
        AnalysisError::Remote {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        }
    );
    assert_eq!(err.user_message(), "Analysis failed: Internal Server Error");
}

#[tokio::test]
async fn unreadable_body_surfaces_as_malformed_response() {
    let (server_url, _state) = spawn_analysis_server().await.expect("spawn server");
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_document(dir.path(), "nda.pdf", 16);

    let client = AnalysisClient::new(format!("{server_url}/garbage"));
    let err = client.analyze(&file).await.expect_err("must fail");
    assert!(matches!(err, AnalysisError::MalformedResponse(_)), "{err:?}");

    let client = AnalysisClient::new(format!("{server_url}/partial"));
    let err = client.analyze(&file).await.expect_err("must fail");
    assert!(matches!(err, AnalysisError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn refused_connection_surfaces_as_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_document(dir.path(), "nda.pdf", 16);

    let client = AnalysisClient::new(format!("http://{addr}"));
    let err = client.analyze(&file).await.expect_err("must fail");
    assert!(matches!(err, AnalysisError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn configured_request_timeout_bounds_a_stalled_service() {
    let (server_url, _state) = spawn_analysis_server().await.expect("spawn server");
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_document(dir.path(), "nda.pdf", 16);

    let settings = ClientSettings {
        api_base_url: format!("{server_url}/stalled"),
        request_timeout_secs: 1,
        ..ClientSettings::default()
    };
    let client = AnalysisClient::from_settings(&settings).expect("client");
    let started = std::time::Instant::now();
    let err = client.analyze(&file).await.expect_err("must time out");
    assert!(matches!(err, AnalysisError::Network(_)), "{err:?}");
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[tokio::test]
async fn missing_local_file_fails_before_any_request() {
    let (server_url, state) = spawn_analysis_server().await.expect("spawn server");
    let file = UploadedFile {
        name: "gone.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        size_bytes: 10,
        path: std::env::temp_dir().join("legaldocs-missing-file-for-test.pdf"),
    };

    let client = AnalysisClient::new(server_url);
    let err = client.analyze(&file).await.expect_err("must fail");
    assert!(matches!(err, AnalysisError::ReadFile { .. }), "{err:?}");
    assert!(state.fields.lock().await.is_empty());
}

#[tokio::test]
async fn unparseable_media_type_is_a_local_failure() {
    let (server_url, state) = spawn_analysis_server().await.expect("spawn server");
    let dir = tempfile::tempdir().expect("tempdir");
    let mut file = write_document(dir.path(), "nda.pdf", 16);
    file.mime_type = "not a media type".to_string();

    let client = AnalysisClient::new(server_url);
    let err = client.analyze(&file).await.expect_err("must fail");
    assert!(
        matches!(&err, AnalysisError::ReadFile { file_name, .. } if file_name == "nda.pdf"),
        "{err:?}"
    );
    assert!(state.fields.lock().await.is_empty());
}

#[test]
fn endpoint_joins_base_url_and_analyze_path() {
    let client = AnalysisClient::new("https://legaldocs-backend.onrender.com/");
    assert_eq!(
        client.endpoint(),
        "https://legaldocs-backend.onrender.com/analyze/"
    );
}

#[test]
fn from_settings_rejects_relative_base_url() {
    let settings = ClientSettings {
        api_base_url: "not a url".to_string(),
        ..ClientSettings::default()
    };
    let err = AnalysisClient::from_settings(&settings).expect_err("invalid");
    assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
}
