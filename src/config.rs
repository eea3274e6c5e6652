//! Configuration parsing and validation for the extraction server
//!
//! Everything the server needs is read once at startup, from command-line flags or the
//! matching environment variables, and handed to the pipeline's constructor.
use anyhow::anyhow;
use clap::Parser;
use gleaner::{
    DEFAULT_BODY_LIMIT,
    client::PoolSettings,
    completion::{CompletionCaller, DEFAULT_COMPLETION_PATH, DEFAULT_MAX_TOKENS},
    extraction::{DEFAULT_EXTRACTION_MODEL, EntityExtractor},
    pipeline::Pipeline,
    upstream::{ApiKey, Upstream},
};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the server will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// API key sent as a bearer token with every upstream request.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: ApiKey,

    /// Base URL of the OpenAI compatible upstream.
    #[arg(long, env = "GLEANER_UPSTREAM_URL", default_value = "https://api.openai.com/")]
    pub upstream_url: Url,

    /// Chat model used for entity extraction.
    #[arg(long, default_value = DEFAULT_EXTRACTION_MODEL)]
    pub extraction_model: String,

    /// Path of the legacy completion endpoint, relative to the upstream URL.
    #[arg(long, default_value = DEFAULT_COMPLETION_PATH)]
    pub completion_path: String,

    /// Model sent with the completion request. Only needed for `v1/completions`.
    #[arg(long)]
    pub completion_model: Option<String>,

    /// Token cap for the completion request.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub completion_max_tokens: u32,

    /// Largest accepted request body, in bytes.
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT)]
    pub body_limit_bytes: usize,

    /// How long (in seconds) to wait for each upstream call before failing the request.
    #[arg(long, default_value_t = 120)]
    pub upstream_timeout_secs: u64,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, default_value_t = true, action = clap::ArgAction::Set)]
    pub metrics: bool,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "gleaner")]
    pub metrics_prefix: String,

    /// Maximum number of idle HTTP connections to keep alive per upstream host.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

impl Config {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if self.api_key.is_empty() {
            return Err(anyhow!("API key must not be empty"));
        }
        if !matches!(self.upstream_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Upstream URL '{}' must use http or https",
                self.upstream_url
            ));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(anyhow!("Upstream timeout must be at least one second"));
        }
        if self.completion_max_tokens == 0 {
            return Err(anyhow!("Completion token cap must be positive"));
        }
        Ok(self)
    }

    pub fn pipeline(&self) -> Pipeline {
        let upstream = Upstream::builder()
            .url(self.upstream_url.clone())
            .key(self.api_key.clone())
            .timeout(Duration::from_secs(self.upstream_timeout_secs))
            .build();

        Pipeline::builder()
            .upstream(upstream)
            .extractor(
                EntityExtractor::builder()
                    .model(self.extraction_model.clone())
                    .build(),
            )
            .completion(
                CompletionCaller::builder()
                    .path(self.completion_path.clone())
                    .maybe_model(self.completion_model.clone())
                    .max_tokens(self.completion_max_tokens)
                    .build(),
            )
            .build()
    }

    pub fn pool(&self) -> PoolSettings {
        PoolSettings::builder()
            .max_idle_per_host(self.pool_max_idle_per_host)
            .idle_timeout(Duration::from_secs(self.pool_idle_timeout_secs))
            .build()
    }
}
