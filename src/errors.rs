use crate::extraction::ExtractionError;
use crate::pipeline::Stage;
use crate::upstream::UpstreamError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Body returned for every failed extraction request.
pub const INTERNAL_SERVER_ERROR_BODY: &str = "Internal Server Error";

/// Everything that can go wrong while serving `POST /api/extract`.
///
/// Callers see the same 500 response for every variant; the variant and its [`Stage`] only
/// show up in the server-side logs.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid request payload: {0}")]
    Payload(String),
    #[error("file is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("file is not a parseable PDF: {0}")]
    Parse(String),
    #[error("entity extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("secondary completion failed: {0}")]
    CompletionTransport(#[source] UpstreamError),
}

impl ExtractError {
    /// The pipeline stage the request failed in.
    pub fn stage(&self) -> Stage {
        match self {
            ExtractError::Payload(_) | ExtractError::Decode(_) => Stage::Decode,
            ExtractError::Parse(_) => Stage::Parse,
            ExtractError::Extraction(_) => Stage::Extract,
            ExtractError::CompletionTransport(_) => Stage::Complete,
        }
    }
}

impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": INTERNAL_SERVER_ERROR_BODY })),
        )
            .into_response()
    }
}
