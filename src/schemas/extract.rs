//! Request and response bodies of `POST /api/extract`

use serde::{Deserialize, Serialize};

/// Inbound payload: a base64-encoded PDF document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub file: String,
}

/// Merged result of both upstream calls.
///
/// The wire field names are fixed; existing clients read `langchain` and `openai`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResponse {
    /// Tool calls returned by the extraction model, passed through verbatim.
    #[serde(rename = "langchain")]
    pub entities: serde_json::Value,

    /// Text of the first completion choice. Omitted when the completion returned no choices.
    #[serde(rename = "openai", default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
}
