//! The secondary call to the legacy text completion endpoint
//!
//! The extraction result is serialized and sent as the prompt. An answer with no choices is a
//! valid, empty result; only transport, status and decoding failures are errors.
use crate::client::HttpClient;
use crate::schemas::completions::{CompletionRequest, CompletionResponse};
use crate::upstream::{Upstream, UpstreamError};
use bon::Builder;
use serde_json::Value;
use tracing::{debug, instrument};

pub const DEFAULT_COMPLETION_PATH: &str = "v1/engines/davinci/completions";

pub const DEFAULT_MAX_TOKENS: u32 = 50;

/// Settings for the completion call.
#[derive(Debug, Clone, Builder)]
pub struct CompletionCaller {
    #[builder(into, default = DEFAULT_COMPLETION_PATH.to_string())]
    path: String,
    #[builder(into)]
    model: Option<String>,
    #[builder(default = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,
}

impl Default for CompletionCaller {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CompletionCaller {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request(&self, entities: &Value) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            prompt: entities.to_string(),
            max_tokens: self.max_tokens,
        }
    }

    /// Returns the text of the first choice, or `None` when the endpoint returned none.
    #[instrument(skip_all, fields(path = %self.path))]
    pub async fn complete<T: HttpClient + Sync + ?Sized>(
        &self,
        upstream: &Upstream,
        client: &T,
        entities: &Value,
    ) -> Result<Option<String>, UpstreamError> {
        let response: CompletionResponse = upstream
            .post_json(client, &self.path, &self.request(entities))
            .await?;
        let text = response.first_text();
        if text.is_none() {
            debug!("Completion returned no usable choice");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockHttpClient, completion_response};
    use axum::http::StatusCode;
    use serde_json::json;

    const PATH: &str = "/v1/engines/davinci/completions";

    fn upstream() -> Upstream {
        Upstream::builder()
            .url("https://api.example.com/".parse().unwrap())
            .key("sk-test".to_string().into())
            .build()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice_text() {
        let client = MockHttpClient::new().respond(
            PATH,
            StatusCode::OK,
            completion_response(&["foo", "bar"]),
        );

        let text = CompletionCaller::default()
            .complete(&upstream(), &client, &json!([]))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("foo"));
    }

    #[tokio::test]
    async fn test_complete_with_no_choices_is_not_an_error() {
        let client =
            MockHttpClient::new().respond(PATH, StatusCode::OK, completion_response(&[]));

        let text = CompletionCaller::default()
            .complete(&upstream(), &client, &json!([]))
            .await
            .unwrap();
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_complete_sends_serialized_entities_as_prompt() {
        let client =
            MockHttpClient::new().respond(PATH, StatusCode::OK, completion_response(&["ok"]));
        let entities = json!([{"type": "entity", "args": {"name": "Acme Corp"}}]);

        CompletionCaller::default()
            .complete(&upstream(), &client, &entities)
            .await
            .unwrap();

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].uri, "https://api.example.com/v1/engines/davinci/completions");
        assert_eq!(requests[0].header("authorization"), Some("Bearer sk-test"));

        let body = requests[0].json();
        assert_eq!(body["max_tokens"], 50);
        assert!(body.get("model").is_none());
        let prompt: Value = serde_json::from_str(body["prompt"].as_str().unwrap()).unwrap();
        assert_eq!(prompt, entities);
    }

    #[tokio::test]
    async fn test_complete_against_model_scoped_endpoint() {
        let client = MockHttpClient::new().respond(
            "/v1/completions",
            StatusCode::OK,
            completion_response(&["ok"]),
        );
        let caller = CompletionCaller::builder()
            .path("v1/completions")
            .model("gpt-3.5-turbo-instruct")
            .max_tokens(16)
            .build();

        caller.complete(&upstream(), &client, &json!([])).await.unwrap();

        let body = client.get_requests()[0].json();
        assert_eq!(body["model"], "gpt-3.5-turbo-instruct");
        assert_eq!(body["max_tokens"], 16);
    }

    #[rstest::rstest]
    #[case::null_choice(r#"{"choices": [null]}"#, None)]
    #[case::numeric_finish_reason(r#"{"choices": [{"text": "foo", "finish_reason": 5}]}"#, Some("foo"))]
    #[case::string_index(r#"{"choices": [{"text": "foo", "index": "0"}]}"#, Some("foo"))]
    #[tokio::test]
    async fn test_complete_tolerates_odd_choices(
        #[case] reply: &str,
        #[case] expected: Option<&str>,
    ) {
        let client = MockHttpClient::new().respond(PATH, StatusCode::OK, reply);

        let text = CompletionCaller::default()
            .complete(&upstream(), &client, &json!([]))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), expected);
    }

    #[tokio::test]
    async fn test_complete_propagates_http_failures() {
        let client = MockHttpClient::new().respond(
            PATH,
            StatusCode::NOT_FOUND,
            r#"{"error": {"message": "The model `davinci` has been deprecated"}}"#,
        );

        let err = CompletionCaller::default()
            .complete(&upstream(), &client, &json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status, .. } if status == StatusCode::NOT_FOUND));
    }
}
