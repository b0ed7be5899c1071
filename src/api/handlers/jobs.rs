use crate::{
    AppState,
    jobs::{Job, JobInput, JobState},
    llm::ImageInput,
    types::{AppError, JobFilesResponse, JobStatusResponse, Result, SubmitForm, SubmitResponse},
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Submit a research job
#[utoipa::path(
    post,
    path = "/jobs",
    request_body(content = SubmitForm, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Job queued", body = SubmitResponse),
        (status = 400, description = "Missing or empty prompt")
    ),
    tag = "jobs"
)]
pub async fn submit_job(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let mut prompt: Option<String> = None;
    let mut image: Option<ImageInput> = None;
    let mut context_text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "prompt" => prompt = Some(read_text(field).await?),
            "context_text" => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    context_text = Some(text);
                }
            }
            "image" => {
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("could not read image: {}", e)))?;
                if !bytes.is_empty() {
                    if !media_type.starts_with("image/") {
                        return Err(AppError::InvalidInput(format!(
                            "image field must be an image, got '{}'",
                            media_type
                        )));
                    }
                    image = Some(ImageInput::from_bytes(media_type, &bytes));
                }
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let prompt = prompt.ok_or_else(|| AppError::InvalidInput("prompt is required".to_string()))?;

    let mut input = JobInput::new(prompt);
    if let Some(image) = image {
        input = input.with_image(image);
    }
    if let Some(context_text) = context_text {
        input = input.with_context(context_text);
    }

    let job_id = state.coordinator.submit(input)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            status_url: format!("/jobs/{}", job_id),
            result_url: format!("/jobs/{}/files", job_id),
        }),
    ))
}

/// Get the status of a job
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job status", body = JobStatusResponse),
        (status = 404, description = "Unknown job")
    ),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>> {
    let job = state.coordinator.status(id)?;
    Ok(Json(status_response(&job)))
}

/// List the artifacts of a finished job
#[utoipa::path(
    get,
    path = "/jobs/{id}/files",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Artifact names; empty until the job finishes", body = JobFilesResponse),
        (status = 404, description = "Unknown job")
    ),
    tag = "jobs"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobFilesResponse>> {
    let files: Vec<String> = state
        .coordinator
        .list_artifacts(id)?
        .into_iter()
        .map(|a| a.name)
        .collect();
    let download_urls = download_urls(id, &files);

    Ok(Json(JobFilesResponse {
        job_id: id,
        files,
        download_urls,
    }))
}

/// Download one artifact
#[utoipa::path(
    get,
    path = "/jobs/{id}/download/{filename}",
    params(
        ("id" = Uuid, Path, description = "Job id"),
        ("filename" = String, Path, description = "Artifact name")
    ),
    responses(
        (status = 200, description = "Artifact bytes"),
        (status = 400, description = "Invalid filename"),
        (status = 404, description = "Unknown job or artifact")
    ),
    tag = "jobs"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path((id, filename)): Path<(Uuid, String)>,
) -> Result<Response> {
    if !is_safe_filename(&filename) {
        return Err(AppError::InvalidInput(format!("invalid filename '{}'", filename)));
    }

    let artifact = state.coordinator.fetch_artifact(id, &filename)?;

    Ok((
        [
            (header::CONTENT_TYPE, artifact.media_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.name),
            ),
        ],
        artifact.content.to_vec(),
    )
        .into_response())
}

// ============= Helper Functions =============

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("could not read form field: {}", e)))
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains("..") && !name.contains('/') && !name.contains('\\')
}

fn download_urls(id: Uuid, files: &[String]) -> Vec<String> {
    files
        .iter()
        .map(|f| format!("/jobs/{}/download/{}", id, f))
        .collect()
}

fn status_response(job: &Job) -> JobStatusResponse {
    let (files, urls) = if job.state == JobState::Finished {
        let files = job.artifact_names();
        let urls = download_urls(job.id, &files);
        (Some(files), Some(urls))
    } else {
        (None, None)
    };

    JobStatusResponse {
        job_id: job.id,
        status: job.state.to_string(),
        error: job.error().map(str::to_string),
        notes: job.notes.clone(),
        created_at: job.created_at,
        started_at: job.started_at,
        ended_at: job.ended_at,
        files,
        download_urls: urls,
    }
}
