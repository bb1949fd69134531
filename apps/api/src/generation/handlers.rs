//! Axum route handlers for the resume generation API.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::ingest::pdf::extract_cv_text;
use crate::llm::prompts::build_tailoring_prompt;
use crate::state::AppState;

/// CV text shorter than this usually means a scanned or empty PDF.
const MIN_CV_CHARS: usize = 100;
/// Extracted descriptions shorter than this are almost always consent walls
/// or error pages, not the posting itself.
const MIN_JOB_DESCRIPTION_CHARS: usize = 50;

#[derive(Debug, Serialize)]
pub struct GenerateResumeResponse {
    pub success: bool,
    pub latex_code: String,
    pub provider: String,
    pub message: String,
}

/// POST /api/v1/resumes/generate
///
/// Multipart form: `cv_file` (PDF upload) + `job_url` (posting URL).
/// Extracts both texts, validates them, and runs the provider fallback chain.
pub async fn handle_generate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResumeResponse>, AppError> {
    let mut cv_file: Option<(String, Bytes)> = None;
    let mut job_url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart request: {e}")))?
    {
        // Copy the metadata out first; reading the body consumes the field.
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();

        match name.as_str() {
            "cv_file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read cv_file: {e}")))?;
                cv_file = Some((filename, data));
            }
            "job_url" => {
                job_url = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read job_url: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let (filename, data) =
        cv_file.ok_or_else(|| AppError::Validation("cv_file is required".to_string()))?;
    let job_url = job_url.ok_or_else(|| AppError::Validation("job_url is required".to_string()))?;

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::Validation("Only PDF files are supported".to_string()));
    }

    let cv_text = extract_cv_text(data).await?;
    if cv_text.trim().chars().count() < MIN_CV_CHARS {
        return Err(AppError::Validation(
            "Could not extract sufficient text from PDF".to_string(),
        ));
    }

    let job_description = state.fetcher.fetch_job_description(&job_url).await?;
    if job_description.trim().chars().count() < MIN_JOB_DESCRIPTION_CHARS {
        return Err(AppError::Validation(
            "Could not extract sufficient job description".to_string(),
        ));
    }

    info!(
        "generating resume (cv: {} chars, jd: {} chars)",
        cv_text.len(),
        job_description.len()
    );

    let prompt = build_tailoring_prompt(&cv_text, &job_description);
    let generated = state.engine.generate(&prompt).await?;

    for failure in &generated.failed {
        info!(
            "provider {} did not produce a usable result before {} answered: {}",
            failure.provider, generated.provider, failure.error
        );
    }

    Ok(Json(GenerateResumeResponse {
        success: true,
        latex_code: generated.text,
        provider: generated.provider.to_string(),
        message: "Resume generated successfully".to_string(),
    }))
}
