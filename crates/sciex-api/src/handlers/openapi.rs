//! OpenAPI document
//!
//! Author: hephaex@gmail.com

use axum::{http::header, response::IntoResponse};
use sciex_core::ContextRecord;
use utoipa::OpenApi;

use super::{extract, health};
use crate::error::{ApiError, AppError};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SCIEX API",
        description = "Named entity extraction with context from scientific PDF documents"
    ),
    paths(
        extract::extract_entities,
        health::health_check,
        health::readiness_check,
        openapi_yaml,
    ),
    components(
        schemas(
            ContextRecord,
            ApiError,
            extract::UploadForm,
            health::HealthResponse,
            health::ReadinessResponse,
        )
    ),
    tags(
        (name = "extraction", description = "Entity extraction from PDF uploads"),
        (name = "health", description = "Liveness and readiness probes"),
        (name = "docs", description = "API documentation")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as YAML
#[utoipa::path(
    get,
    path = "/openapi.yaml",
    tag = "docs",
    responses(
        (status = 200, description = "OpenAPI document", content_type = "text/yaml", body = String)
    )
)]
pub async fn openapi_yaml() -> Result<impl IntoResponse, AppError> {
    let yaml = ApiDoc::openapi()
        .to_yaml()
        .map_err(|e| sciex_core::SciexError::Internal(format!("OpenAPI rendering failed: {e}")))?;

    Ok(([(header::CONTENT_TYPE, "text/yaml")], yaml))
}
