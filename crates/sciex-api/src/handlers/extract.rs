//! Entity extraction handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use crate::upload::validate_filename;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use sciex_core::{ContextRecord, SciexError};
use std::sync::Arc;
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart form accepted by the extraction endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// PDF document; the filename must end in `.pdf`
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// The `file` part of a multipart upload
struct FilePart {
    filename: Option<String>,
    bytes: Bytes,
}

/// Extract named entities with context from an uploaded PDF
#[utoipa::path(
    post,
    path = "/api/v1/extract",
    tag = "extraction",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Entities found in the document", body = Vec<ContextRecord>),
        (status = 400, description = "File not included or empty filename", body = crate::error::ApiError),
        (status = 413, description = "Upload exceeds the body size limit", body = crate::error::ApiError),
        (status = 415, description = "File is not a PDF", body = crate::error::ApiError),
        (status = 500, description = "Extraction failed", body = crate::error::ApiError)
    )
)]
pub async fn extract_entities(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<ContextRecord>>, AppError> {
    let span = tracing::info_span!("extract", request_id = %Uuid::new_v4());

    async move {
        let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.to_string()))?;
        let part = read_file_part(&mut multipart).await?;
        validate_filename(part.filename.as_deref())?;

        tracing::info!(
            "Received {} ({} bytes)",
            part.filename.as_deref().unwrap_or_default(),
            part.bytes.len()
        );

        let pipeline = state
            .pipeline
            .clone()
            .ok_or_else(|| SciexError::ModelUnavailable {
                path: state.config.model.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "model was not loaded at startup",
                ),
            })?;
        let uploads = state.uploads.clone();
        let blocking_span = tracing::Span::current();

        let records = tokio::task::spawn_blocking(move || {
            let _entered = blocking_span.enter();
            let file = uploads.store(&part.bytes)?;
            tracing::debug!("Stored upload at {}", file.path().display());
            pipeline.process_file(file.path())
        })
        .await
        .map_err(|e| SciexError::Internal(format!("extraction task failed: {e}")))??;

        tracing::info!("Extracted {} entities", records.len());
        Ok::<_, AppError>(Json(records))
    }
    .instrument(span)
    .await
}

/// Read the first part named `file`, skipping any other fields
async fn read_file_part(multipart: &mut Multipart) -> Result<FilePart, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(FilePart { filename, bytes });
    }

    Err(AppError::BadRequest("no file part in request".to_string()))
}

/// A stream cut off by the body limit is reported as such; anything else is a malformed request
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.to_string())
    } else {
        AppError::BadRequest(err.to_string())
    }
}
