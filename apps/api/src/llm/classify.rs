//! Transient-error classification.
//!
//! KNOWN IMPRECISION: providers encode transience differently — an HTTP
//! status, a JSON error body, or a free-text message — so classification is
//! substring matching on the rendered error, not protocol-typed inspection.
//! The marker table below is the entire contract; anything it misses is
//! treated as fatal.

use super::LlmError;

/// Upper-cased substrings whose presence marks an error as retryable:
/// rate limiting (429/RATE/QUOTA), temporary overload (503), and the
/// Hugging Face cold-start messages.
const TRANSIENT_MARKERS: &[&str] = &[
    "429",
    "503",
    "RATE",
    "QUOTA",
    "MODEL IS CURRENTLY LOADING",
    "PLEASE TRY AGAIN",
];

/// Returns true if the error looks like a condition that may clear on retry.
/// Network timeouts, auth failures, and malformed responses stay fatal.
pub fn is_transient(error: &LlmError) -> bool {
    let rendered = error.to_string().to_uppercase();
    TRANSIENT_MARKERS
        .iter()
        .any(|marker| rendered.contains(marker))
}
