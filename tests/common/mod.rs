//! Shared helpers for the integration tests

mod pdf;

use pdf::sample_pdf;

use async_trait::async_trait;
use axum::http::StatusCode;
use base64::Engine as _;
use gleaner::client::HttpClient;
use gleaner::pipeline::Pipeline;
use gleaner::upstream::Upstream;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// An upstream stand-in that answers the extraction call with one `entity` tool call per
/// document, named after the document text it was sent, and the completion call with a fixed
/// text.
#[derive(Debug, Clone, Default)]
pub struct EchoUpstream {
    pub paths: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl HttpClient for EchoUpstream {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
        let path = req.uri().path().to_string();
        self.paths.lock().unwrap().push(path.clone());

        let body = axum::body::to_bytes(req.into_body(), usize::MAX).await?;
        let body: Value = serde_json::from_slice(&body)?;

        let reply = match path.as_str() {
            "/v1/chat/completions" => {
                let text = body["messages"][1]["content"]
                    .as_str()
                    .unwrap_or_default()
                    .trim();
                let arguments = json!({ "name": text }).to_string();
                json!({
                    "choices": [{
                        "index": 0,
                        "message": {
                            "role": "assistant",
                            "tool_calls": [{
                                "id": "call_0",
                                "type": "function",
                                "function": {"name": "entity", "arguments": arguments}
                            }]
                        }
                    }]
                })
            }
            "/v1/engines/davinci/completions" => json!({ "choices": [{ "text": "echo" }] }),
            _ => {
                return Ok(axum::response::Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(axum::body::Body::empty())?);
            }
        };

        Ok(axum::response::Response::builder()
            .status(StatusCode::OK)
            .body(axum::body::Body::from(reply.to_string()))?)
    }
}

pub fn pipeline() -> Pipeline {
    Pipeline::builder()
        .upstream(
            Upstream::builder()
                .url("https://api.openai.com/".parse().unwrap())
                .key("sk-integration".to_string().into())
                .build(),
        )
        .build()
}

/// [`sample_pdf`], base64-encoded as the endpoint expects it.
pub fn encoded_pdf(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(sample_pdf(text))
}
