use crate::AppState;
use crate::api::handlers::{health, jobs};
use crate::types::{
    JobFilesResponse, JobStatusResponse, Note, NoteKind, SubmitForm, SubmitResponse,
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        jobs::submit_job,
        jobs::get_job,
        jobs::list_files,
        jobs::download_file,
        health::health,
    ),
    components(schemas(
        SubmitForm,
        SubmitResponse,
        JobStatusResponse,
        JobFilesResponse,
        Note,
        NoteKind
    )),
    tags(
        (name = "jobs", description = "Research job submission and artifacts"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Full application router with middleware applied.
pub fn create_router(state: AppState) -> Router {
    let max_upload = state.config.config().server.max_upload_bytes;

    Router::new()
        .route("/jobs", post(jobs::submit_job))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}/files", get(jobs::list_files))
        .route("/jobs/{id}/download/{filename}", get(jobs::download_file))
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                // Enforced by the Multipart extractor
                .layer(DefaultBodyLimit::max(max_upload)),
        )
        .with_state(state)
}
