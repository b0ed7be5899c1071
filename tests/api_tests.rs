mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use common::mocks::{StubKnowledge, StubReasoner};
use common::{pipeline, wait_for_terminal};
use lore::api::routes::create_router;
use lore::jobs::{JobCoordinator, JobState};
use lore::types::{JobFilesResponse, JobStatusResponse, SubmitResponse};
use lore::utils::toml_config::{JobsConfig, ServerConfig};
use lore::{AppState, ConfigManager, LoreConfig};
use std::sync::Arc;

// ============= Test Setup =============

struct TestApp {
    server: TestServer,
    coordinator: Arc<JobCoordinator>,
}

fn create_test_app_with(config: LoreConfig, knowledge: StubKnowledge) -> TestApp {
    let coordinator = JobCoordinator::start(
        pipeline(Arc::new(StubReasoner::new("Photosynthesis")), Arc::new(knowledge)),
        &JobsConfig {
            workers: 2,
            job_timeout_secs: 30,
        },
    );
    let state = AppState {
        config: Arc::new(ConfigManager::from_config(config)),
        coordinator: coordinator.clone(),
    };
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    TestApp {
        server,
        coordinator,
    }
}

fn create_test_app() -> TestApp {
    create_test_app_with(
        LoreConfig::default(),
        StubKnowledge::new()
            .with_article("Photosynthesis", "Plants convert light into chemical energy.")
            .with_article("Chlorophyll", "The green pigment."),
    )
}

async fn submit(app: &TestApp, form: MultipartForm) -> SubmitResponse {
    let response = app.server.post("/jobs").multipart(form).await;
    response.assert_status(StatusCode::ACCEPTED);
    response.json()
}

// ============= Health Check Tests =============

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&serde_json::json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_openapi_document_lists_job_routes() {
    let app = create_test_app();

    let response = app.server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();

    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/jobs"].is_object());
    assert!(doc["paths"]["/jobs/{id}/download/{filename}"].is_object());
}

// ============= Submission Tests =============

#[tokio::test]
async fn test_submit_returns_urls() {
    let app = create_test_app();

    let body = submit(
        &app,
        MultipartForm::new().add_text("prompt", "Explain photosynthesis"),
    )
    .await;

    assert_eq!(body.status_url, format!("/jobs/{}", body.job_id));
    assert_eq!(body.result_url, format!("/jobs/{}/files", body.job_id));
    assert!(app.coordinator.status(body.job_id).is_ok());
}

#[tokio::test]
async fn test_submit_without_prompt_is_rejected() {
    let app = create_test_app();

    let response = app
        .server
        .post("/jobs")
        .multipart(MultipartForm::new().add_text("context_text", "some notes"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.coordinator.job_count(), 0);
}

#[tokio::test]
async fn test_submit_blank_prompt_is_rejected() {
    let app = create_test_app();

    let response = app
        .server
        .post("/jobs")
        .multipart(MultipartForm::new().add_text("prompt", "   "))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("prompt"));
}

#[tokio::test]
async fn test_submit_with_image_and_context() {
    let app = create_test_app();

    let form = MultipartForm::new()
        .add_text("prompt", "What is happening in this leaf?")
        .add_text("context_text", "Lab notes: the leaf was kept in sunlight.")
        .add_part(
            "image",
            Part::bytes(vec![0x89, b'P', b'N', b'G'])
                .file_name("leaf.png")
                .mime_type("image/png"),
        );
    let body = submit(&app, form).await;

    let job = wait_for_terminal(&app.coordinator, body.job_id).await;
    assert_eq!(job.state, JobState::Finished);
    let image = job.input.image.as_ref().unwrap();
    assert_eq!(image.media_type, "image/png");
    assert_eq!(image.data_base64, "iVBORw==");
    assert!(job.input.context_text.is_some());
}

#[tokio::test]
async fn test_submit_non_image_upload_is_rejected() {
    let app = create_test_app();

    let form = MultipartForm::new()
        .add_text("prompt", "Read this")
        .add_part(
            "image",
            Part::bytes(b"hello".to_vec())
                .file_name("notes.txt")
                .mime_type("text/plain"),
        );
    let response = app.server.post("/jobs").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = LoreConfig {
        server: ServerConfig {
            max_upload_bytes: 4096,
            ..ServerConfig::default()
        },
        ..LoreConfig::default()
    };
    let app = create_test_app_with(config, StubKnowledge::new());

    let small = submit(&app, MultipartForm::new().add_text("prompt", "Explain glaciers")).await;
    assert!(app.coordinator.status(small.job_id).is_ok());

    let form = MultipartForm::new()
        .add_text("prompt", "What is in this picture?")
        .add_part(
            "image",
            Part::bytes(vec![0u8; 16 * 1024])
                .file_name("big.png")
                .mime_type("image/png"),
        );
    let response = app.server.post("/jobs").multipart(form).await;

    assert!(response.status_code().is_client_error());
    assert_eq!(app.coordinator.job_count(), 1);
}

// ============= Status and Download Tests =============

#[tokio::test]
async fn test_finished_job_status_and_downloads() {
    let app = create_test_app();
    let body = submit(
        &app,
        MultipartForm::new().add_text("prompt", "Explain photosynthesis"),
    )
    .await;
    wait_for_terminal(&app.coordinator, body.job_id).await;

    let status: JobStatusResponse = app.server.get(&body.status_url).await.json();
    assert_eq!(status.status, "finished");
    assert!(status.error.is_none());
    assert_eq!(
        status.files,
        Some(vec![
            "report.md".to_string(),
            "report.pdf".to_string(),
            "sources.json".to_string()
        ])
    );

    let files: JobFilesResponse = app.server.get(&body.result_url).await.json();
    assert_eq!(files.files.len(), 3);
    assert_eq!(
        files.download_urls[0],
        format!("/jobs/{}/download/report.md", body.job_id)
    );

    let response = app.server.get(&files.download_urls[1]).await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"report.pdf\""
    );
    assert!(response.as_bytes().starts_with(b"%PDF-1.4"));

    let again = app.server.get(&files.download_urls[1]).await;
    assert_eq!(response.as_bytes(), again.as_bytes());

    let markdown = app.server.get(&files.download_urls[0]).await.text();
    assert!(markdown.contains("[1] Photosynthesis"));
    assert!(markdown.contains("[2] Chlorophyll"));
}

#[tokio::test]
async fn test_failed_job_reports_error_and_no_files() {
    let app = create_test_app_with(
        LoreConfig::default(),
        StubKnowledge::new().with_search_error("encyclopedia offline"),
    );
    let body = submit(&app, MultipartForm::new().add_text("prompt", "Anything")).await;
    wait_for_terminal(&app.coordinator, body.job_id).await;

    let status: JobStatusResponse = app.server.get(&body.status_url).await.json();
    assert_eq!(status.status, "failed");
    assert!(status.error.unwrap().contains("encyclopedia offline"));
    assert!(status.files.is_none());

    let files: JobFilesResponse = app.server.get(&body.result_url).await.json();
    assert!(files.files.is_empty());

    app.server
        .get(&format!("/jobs/{}/download/report.md", body.job_id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = create_test_app();
    let id = uuid::Uuid::new_v4();

    app.server
        .get(&format!("/jobs/{}", id))
        .await
        .assert_status_not_found();
    app.server
        .get(&format!("/jobs/{}/files", id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_malformed_job_id_is_rejected() {
    let app = create_test_app();

    let response = app.server.get("/jobs/not-a-uuid").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_artifact_is_not_found() {
    let app = create_test_app();
    let body = submit(
        &app,
        MultipartForm::new().add_text("prompt", "Explain photosynthesis"),
    )
    .await;
    wait_for_terminal(&app.coordinator, body.job_id).await;

    app.server
        .get(&format!("/jobs/{}/download/report.docx", body.job_id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_path_traversal_filename_is_rejected() {
    let app = create_test_app();
    let body = submit(
        &app,
        MultipartForm::new().add_text("prompt", "Explain photosynthesis"),
    )
    .await;

    let response = app
        .server
        .get(&format!("/jobs/{}/download/..%5Csecrets", body.job_id))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
