//! The per-request extraction pipeline
//!
//! A request moves through `Decode -> Parse -> Extract -> Complete` and then responds. Every
//! stage returns a `Result`, and the first failure ends the request: a failed extraction means
//! the completion endpoint is never called. Stages run strictly one after another because each
//! consumes the previous stage's output.
//!
//! The pipeline owns only immutable configuration. All request data lives on the stack of
//! [`Pipeline::run`], so concurrent requests share nothing but the HTTP client.
use crate::client::HttpClient;
use crate::completion::CompletionCaller;
use crate::errors::ExtractError;
use crate::extraction::EntityExtractor;
use crate::pdf;
use crate::schemas::extract::{ExtractRequest, ExtractResponse};
use crate::upstream::Upstream;
use bon::Builder;
use std::fmt;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Parse,
    Extract,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Parse => "parse",
            Stage::Extract => "extract",
            Stage::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Builder)]
pub struct Pipeline {
    upstream: Upstream,
    #[builder(default)]
    extractor: EntityExtractor,
    #[builder(default)]
    completion: CompletionCaller,
}

impl Pipeline {
    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    #[instrument(skip_all)]
    pub async fn run<T: HttpClient + Sync + ?Sized>(
        &self,
        client: &T,
        request: &ExtractRequest,
    ) -> Result<ExtractResponse, ExtractError> {
        debug!(stage = %Stage::Decode, "Decoding payload");
        let bytes = pdf::decode_payload(&request.file)?;

        debug!(stage = %Stage::Parse, "Extracting text from PDF");
        let text = pdf::extract_text(bytes).await?;

        debug!(stage = %Stage::Extract, model = self.extractor.model(), "Extracting entities");
        let entities = self.extractor.extract(&self.upstream, client, &text).await?;

        debug!(stage = %Stage::Complete, path = self.completion.path(), "Requesting completion");
        let completion = self
            .completion
            .complete(&self.upstream, client, &entities)
            .await
            .map_err(ExtractError::CompletionTransport)?;

        Ok(ExtractResponse {
            entities,
            completion,
        })
    }
}
