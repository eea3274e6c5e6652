//! Gleaner - structured entity extraction from PDF documents
//!
//! This library provides a single endpoint, `POST /api/extract`, that takes a base64-encoded PDF,
//! extracts its text, asks a chat completion model to pull out the entities it mentions, and
//! feeds the result to a legacy text completion endpoint. Both model results are returned
//! together.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{info, instrument};

pub mod client;
pub mod completion;
pub mod errors;
pub mod extraction;
pub mod handlers;
pub mod pdf;
pub mod pipeline;
pub mod prompt;
pub mod schemas;
pub mod upstream;

use client::{HttpClient, HyperClient, PoolSettings};
use handlers::extract_handler;
use pipeline::Pipeline;

/// Largest request body accepted by default (50 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// The main application state containing the HTTP client and the extraction pipeline
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub http_client: T,
    pub pipeline: Arc<Pipeline>,
    pub body_limit: usize,
}

impl AppState<HyperClient> {
    /// Create a new AppState with the default Hyper client
    pub fn new(pipeline: Pipeline, pool: PoolSettings) -> Self {
        let http_client = client::create_hyper_client(pool);
        Self::with_client(pipeline, http_client)
    }
}

impl<T: HttpClient> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing)
    pub fn with_client(pipeline: Pipeline, http_client: T) -> Self {
        Self {
            http_client,
            pipeline: Arc::new(pipeline),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }
}

/// Build the main router
/// This creates routes for:
/// - `/api/extract` - Extracts entities from a base64-encoded PDF
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    let body_limit = state.body_limit;
    Router::new()
        .route("/api/extract", post(extract_handler::<T>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// `prefix` is prepended to every metric name; it must live for the whole program, hence the
/// `'static` bound on the borrowed form.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}

#[cfg(test)]
#[path = "../tests/common/pdf.rs"]
mod pdf_fixture;
