//! HTTP client abstraction for calls to the upstream model service
//!
//! Every outbound request goes through [`HttpClient`], so the pooled hyper client used in
//! production and the recording mock used in tests are interchangeable.
use async_trait::async_trait;
use axum::response::IntoResponse;
use bon::Builder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use std::time::Duration;

pub type HyperClient = Client<
    hyper_tls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    axum::body::Body,
>;

#[async_trait]
pub trait HttpClient: std::fmt::Debug {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
impl HttpClient for HyperClient {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
        self.request(req)
            .await
            .map(|res| res.into_response())
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}

/// Connection pool settings for the outbound client.
#[derive(Debug, Clone, Copy, Builder)]
pub struct PoolSettings {
    /// Maximum number of idle connections kept alive per upstream host.
    #[builder(default = 100)]
    pub max_idle_per_host: usize,
    /// How long idle connections are kept before being closed.
    #[builder(default = Duration::from_secs(90))]
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub fn create_hyper_client(pool: PoolSettings) -> HyperClient {
    let https = hyper_tls::HttpsConnector::new();

    tracing::debug!(
        "HTTP client pool config: idle_timeout={}s, max_idle_per_host={}",
        pool.idle_timeout.as_secs(),
        pool.max_idle_per_host
    );

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(pool.idle_timeout)
        .pool_max_idle_per_host(pool.max_idle_per_host)
        .pool_timer(hyper_util::rt::TokioTimer::new())
        .build(https)
}
