//! CV text extraction from uploaded PDF bytes.

use anyhow::Context;
use bytes::Bytes;

use crate::errors::AppError;

/// Extracts text from an uploaded PDF. Parsing is CPU-bound and runs on a
/// blocking thread so it cannot stall the runtime.
pub async fn extract_cv_text(data: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .context("PDF extraction task panicked")?
        .map_err(|e| AppError::Validation(format!("Could not extract text from PDF: {e}")))?;

    Ok(text)
}
