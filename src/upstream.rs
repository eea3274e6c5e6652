//! The upstream model service that both pipeline calls are sent to.
//!
//! An [`Upstream`] is the single place outbound requests are assembled: it joins endpoint
//! paths onto the base URL, attaches the bearer credential, bounds the call with the configured
//! timeout and decodes the JSON reply. The extraction and completion callers only supply a path
//! and a body.
use crate::client::HttpClient;
use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};
use bon::Builder;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// How much of a failed upstream response body is kept for the logs.
const ERROR_BODY_EXCERPT: usize = 512;

/// An API credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl ApiKey {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("failed to join '{path}' onto the upstream url: {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to build request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("request to upstream failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to read upstream response body: {0}")]
    Body(#[source] axum::Error),
    #[error("failed to decode upstream response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A base URL plus the credential and timeout applied to every call made against it.
#[derive(Debug, Clone, Builder)]
pub struct Upstream {
    url: Url,
    key: Option<ApiKey>,
    timeout: Option<Duration>,
}

impl Upstream {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resolves an endpoint path against the base URL. A base without a trailing slash is
    /// treated as a directory, so `https://host/openai` + `v1/x` becomes `https://host/openai/v1/x`.
    fn endpoint(&self, path: &str) -> Result<Url, UpstreamError> {
        let relative = path.trim_start_matches('/');
        let joined = if self.url.path().ends_with('/') {
            self.url.join(relative)
        } else {
            let mut base = self.url.clone();
            base.set_path(&format!("{}/", self.url.path()));
            base.join(relative)
        };
        joined.map_err(|source| UpstreamError::InvalidUrl {
            path: path.to_string(),
            source,
        })
    }

    /// POSTs `body` as JSON to `path` and decodes a successful JSON reply into `R`.
    ///
    /// Any status outside 2xx is an error, whatever the body says.
    #[instrument(skip(self, client, body), fields(upstream = %self.url))]
    pub async fn post_json<T, B, R>(
        &self,
        client: &T,
        path: &str,
        body: &B,
    ) -> Result<R, UpstreamError>
    where
        T: HttpClient + Sync + ?Sized,
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let uri = self.endpoint(path)?;
        let body = serde_json::to_vec(body).map_err(UpstreamError::Encode)?;

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri.as_str())
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(key) = &self.key {
            let mut value = HeaderValue::try_from(key.bearer()).map_err(axum::http::Error::from)?;
            value.set_sensitive(true);
            builder = builder.header(header::AUTHORIZATION, value);
        } else {
            debug!("No key configured for upstream {}", self.url);
        }

        let req = builder.body(Body::from(body))?;

        debug!("Sending request to {}", uri);
        let sent = client.request(req);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, sent)
                .await
                .map_err(|_| UpstreamError::Timeout(limit))?,
            None => sent.await,
        }
        .map_err(UpstreamError::Transport)?;

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(UpstreamError::Body)?;

        if !status.is_success() {
            warn!("Upstream {} returned {}", uri, status);
            let excerpt = &bytes[..bytes.len().min(ERROR_BODY_EXCERPT)];
            return Err(UpstreamError::Status {
                status,
                body: String::from_utf8_lossy(excerpt).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(UpstreamError::Decode)
    }
}
