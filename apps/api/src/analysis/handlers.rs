//! Axum route handlers for the Analysis API.

use anyhow::Context;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::models::AnalysisResult;
use crate::analysis::pipeline::ResumePipeline;
use crate::errors::AppError;
use crate::extraction::staging::StagedUpload;
use crate::extraction::{DocumentKind, ExtractionError};
use crate::state::AppState;

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "resume";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

/// POST /api/upload
///
/// Accepts one PDF or image in the `resume` field. Unsupported types are
/// rejected before anything is written to disk or sent to the model.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request_id = Uuid::new_v4();
    analyze_upload(state, multipart)
        .instrument(info_span!("analyze_upload", %request_id))
        .await
}

async fn analyze_upload(
    state: AppState,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let (kind, bytes) = read_document(multipart).await?;
    info!("Received {} upload ({} bytes)", kind, bytes.len());

    let upload = StagedUpload::stage(&state.config.upload_dir, kind, bytes)
        .await
        .context("Failed to stage upload")?;

    let result = ResumePipeline::new(state.extractor.as_ref(), state.gateway.as_ref())
        .run(upload)
        .await?;

    info!(
        "Analysis complete: {} skills, {} job results",
        result.profile.skills.len(),
        result.job_results.len()
    );
    Ok(Json(AnalyzeResponse {
        message: "Resume analyzed successfully",
        result,
    }))
}

/// Pulls the document field out of the multipart body and classifies it.
async fn read_document(mut multipart: Multipart) -> Result<(DocumentKind, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_rejection("Invalid multipart body", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let kind = DocumentKind::from_file_name(&file_name)
            .ok_or_else(|| ExtractionError::UnsupportedType(file_name.clone()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_rejection("Failed to read upload", e))?;
        return Ok((kind, bytes));
    }

    Err(AppError::Validation(format!(
        "No file uploaded. Expected multipart field '{UPLOAD_FIELD}'."
    )))
}

/// Keeps the body-limit rejection distinct from a malformed body.
fn multipart_rejection(what: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{what}: {e}"))
    } else {
        AppError::Validation(format!("{what}: {e}"))
    }
}
