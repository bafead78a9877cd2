use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;
use tracing::info;

use super::dto::{AnimateResponse, JobStatusResponse};
use super::job::UploadedImage;
use super::service::AnimateService;
use super::validator::{validate_upload, ValidationError};
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;

const IMAGE_FIELD: &str = "image";

/// Animate an uploaded drawing
///
/// Blocks until both pipeline stages have finished. Pipeline failures still
/// answer 200, with `status: false`.
#[utoipa::path(
    post,
    path = "/animate",
    request_body(content = String, content_type = "multipart/form-data", description = "File part `image` (png, jpg, jpeg)"),
    responses(
        (status = 200, description = "Pipeline ran; `status` tells whether it succeeded", body = ApiResponse<AnimateResponse>),
        (status = 400, description = "Missing, empty or unsupported upload"),
        (status = 413, description = "Upload too large")
    ),
    tag = "Animation"
)]
pub async fn animate(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    // not a multipart body at all: nothing that could hold an image part
    let Ok(mut multipart) = multipart else {
        return ApiError(ValidationError::MissingImagePart.to_string(), StatusCode::BAD_REQUEST)
            .into_response();
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return ApiError(e.body_text(), e.status()).into_response(),
        };

        if field.name() != Some(IMAGE_FIELD) || field.file_name().is_none() {
            continue;
        }

        let file_name = match validate_upload(field.file_name(), &state.config.allowed_extensions) {
            Ok(name) => name,
            Err(e) => return ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response(),
        };

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return ApiError(e.body_text(), e.status()).into_response(),
        };

        info!("Received {} ({} bytes)", file_name, bytes.len());

        let outcome = AnimateService::animate(state, UploadedImage::new(file_name, bytes)).await;
        return ApiSuccess(ApiResponse::<AnimateResponse>::from(outcome), StatusCode::OK).into_response();
    }

    ApiError(ValidationError::MissingImagePart.to_string(), StatusCode::BAD_REQUEST).into_response()
}

/// List the files currently in a job workspace
#[utoipa::path(
    get,
    path = "/animate/{id}",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Workspace contents", body = ApiResponse<JobStatusResponse>),
        (status = 400, description = "Malformed job id"),
        (status = 404, description = "Job not found")
    ),
    tag = "Animation"
)]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match AnimateService::inspect(&state, &id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res), StatusCode::OK).into_response(),
        Err(e) => ApiError(e.to_string(), e.status_code()).into_response(),
    }
}

/// Download an artifact from a job workspace
#[utoipa::path(
    get,
    path = "/animate/{id}/{filename}",
    params(
        ("id" = String, Path, description = "Job ID"),
        ("filename" = String, Path, description = "File inside the job workspace, e.g. `portrait.gif`")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Malformed job id or file name"),
        (status = 404, description = "File not found")
    ),
    tag = "Animation"
)]
pub async fn get_artifact(
    State(state): State<AppState>,
    Path((id, filename)): Path<(String, String)>,
) -> impl IntoResponse {
    match AnimateService::open_artifact(&state, &id, &filename).await {
        Ok((file, len)) => {
            let content_type = mime_guess::from_path(&filename).first_or_octet_stream().to_string();
            let body = Body::from_stream(ReaderStream::new(file));

            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_LENGTH, len.to_string()),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            if e.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!("Failed to open {} for job {}: {}", filename, id, e);
            }
            ApiError(e.to_string(), e.status_code()).into_response()
        }
    }
}
