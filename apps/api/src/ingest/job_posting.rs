//! Job-posting retrieval and content extraction.
//!
//! Posting pages bury the description in markup, so extraction tries a
//! prioritized list of known description containers before falling back to
//! whole-page text. LinkedIn-style pages also reject non-browser user
//! agents, hence the browser UA on every fetch.

use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::errors::AppError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Description containers in priority order.
const CONTENT_SELECTORS: &[&str] = &[
    "div.description__text",
    "div.show-more-less-html__markup",
    "section.description",
    r#"div[class*="description"]"#,
    r#"div[class*="job-description"]"#,
];

/// Fetches and extracts a job description from a posting URL.
#[derive(Clone)]
pub struct JobFetcher {
    client: Client,
}

impl JobFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(BROWSER_USER_AGENT)
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    pub async fn fetch_job_description(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to fetch job description: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Validation(format!(
                "Failed to fetch job description: HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read job posting page: {e}")))?;

        let text = extract_job_text(&body);
        if text.is_empty() {
            return Err(AppError::Validation(
                "Could not extract job description. Please check the URL.".to_string(),
            ));
        }

        Ok(text)
    }
}

impl Default for JobFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls description text out of posting HTML: the first matching known
/// container wins, else all of `<main>` (or `<body>`) as a last resort.
fn extract_job_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for raw in CONTENT_SELECTORS {
        let selector = Selector::parse(raw).expect("valid content selector");
        if let Some(element) = document.select(&selector).next() {
            let text = collect_text(element);
            if !text.is_empty() {
                debug!("job description matched selector {raw}");
                return text;
            }
        }
    }

    for fallback in ["main", "body"] {
        let selector = Selector::parse(fallback).expect("valid fallback selector");
        if let Some(element) = document.select(&selector).next() {
            let text = collect_text(element);
            if !text.is_empty() {
                debug!("job description fell back to whole-page <{fallback}> text");
                return text;
            }
        }
    }

    String::new()
}

fn collect_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
