// Request boundary for resume generation: multipart intake, input
// validation, and the handler driving ingest → prompt → provider fallback.
// All LLM calls go through the llm module — no direct provider calls here.

pub mod handlers;
