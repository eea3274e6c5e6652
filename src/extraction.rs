//! Entity extraction through a chat completion model
//!
//! The model is offered a single open-ended `entity` function tool and asked to call it once per
//! entity it finds. Each tool call becomes `{"type": <function name>, "args": <arguments>}`; the
//! ordered list of those objects is the extraction result. Nothing about the arguments is
//! validated beyond being JSON.
use crate::client::HttpClient;
use crate::prompt;
use crate::schemas::chat_completions::{
    ChatCompletionRequest, ChatCompletionResponse, FunctionDefinition, Tool, ToolChoice,
};
use crate::upstream::{Upstream, UpstreamError};
use bon::Builder;
use serde_json::{Value, json};
use tracing::{debug, instrument};

pub const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-3.5-turbo-1106";

const ENTITY_TOOL_NAME: &str = "entity";

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("model response contained no choices")]
    NoChoices,
    #[error("model response contained no tool calls")]
    NoToolCalls,
    #[error("arguments of tool call '{name}' are not valid JSON: {source}")]
    InvalidArguments {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings for the extraction call.
#[derive(Debug, Clone, Builder)]
pub struct EntityExtractor {
    #[builder(into, default = DEFAULT_EXTRACTION_MODEL.to_string())]
    model: String,
    #[builder(default = 0.0)]
    temperature: f32,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EntityExtractor {
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The chat completion request sent for a document's text.
    pub fn request(&self, text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: prompt::compose(text),
            temperature: Some(self.temperature),
            tools: Some(vec![entity_tool()]),
            tool_choice: Some(ToolChoice::Required),
        }
    }

    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn extract<T: HttpClient + Sync + ?Sized>(
        &self,
        upstream: &Upstream,
        client: &T,
        text: &str,
    ) -> Result<Value, ExtractionError> {
        let response: ChatCompletionResponse = upstream
            .post_json(client, CHAT_COMPLETIONS_PATH, &self.request(text))
            .await?;
        let entities = parse_tool_calls(response)?;
        debug!(
            "Model returned {} tool calls",
            entities.as_array().map_or(0, Vec::len)
        );
        Ok(entities)
    }
}

/// The function tool offered to the model. Its parameters are an open object so the model
/// decides which properties each entity carries.
pub fn entity_tool() -> Tool {
    Tool {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: ENTITY_TOOL_NAME.to_string(),
            description: Some(
                "Save one entity mentioned in the passage together with its properties."
                    .to_string(),
            ),
            parameters: Some(json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "The name of the entity"
                    }
                },
                "required": ["name"],
                "additionalProperties": true
            })),
        },
    }
}

/// Converts the tool calls of the first choice into the extraction result.
///
/// A response without tool calls is an error rather than an empty result.
pub fn parse_tool_calls(response: ChatCompletionResponse) -> Result<Value, ExtractionError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(ExtractionError::NoChoices)?;

    let tool_calls = choice
        .message
        .tool_calls
        .filter(|calls| !calls.is_empty())
        .ok_or(ExtractionError::NoToolCalls)?;

    tool_calls
        .into_iter()
        .map(|call| {
            let args: Value = serde_json::from_str(&call.function.arguments).map_err(|source| {
                ExtractionError::InvalidArguments {
                    name: call.function.name.clone(),
                    source,
                }
            })?;
            Ok(json!({ "type": call.function.name, "args": args }))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}
