//! Legacy text completion schemas
//!
//! See: https://platform.openai.com/docs/api-reference/completions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for the legacy completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Only required by `/v1/completions`; the engine-scoped endpoint takes the model from the path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// The prompt to complete
    pub prompt: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// Response from the legacy completions endpoint
///
/// Only the first choice's `text` is ever read, so choices stay untyped: a `null` entry or an
/// odd type in an unread field must not fail the whole reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<Value>>,
}

impl CompletionResponse {
    /// Text of the first choice, if there is one.
    pub fn first_text(&self) -> Option<String> {
        self.choices
            .as_ref()?
            .first()?
            .get("text")?
            .as_str()
            .map(str::to_string)
    }
}
