//! Axum handlers for the extraction endpoint
use crate::AppState;
use crate::client::HttpClient;
use crate::errors::ExtractError;
use crate::schemas::extract::{ExtractRequest, ExtractResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, instrument, warn};

/// Handler for POST /api/extract
///
/// Any failure is logged here, once, and answered with the uniform 500 body. A body over the
/// configured size limit keeps its 413 from the transport layer.
#[instrument(skip(state, payload))]
pub async fn extract_handler<T: HttpClient + Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("Rejected request body over the size limit");
            return rejection.into_response();
        }
        Err(rejection) => {
            return failure(ExtractError::Payload(rejection.body_text()));
        }
    };

    info!("Received document of {} base64 characters", request.file.len());

    match state.pipeline.run(&state.http_client, &request).await {
        Ok(response) => success(response),
        Err(e) => failure(e),
    }
}

fn success(response: ExtractResponse) -> Response {
    info!(
        entities = response.entities.as_array().map_or(0, Vec::len),
        completion = response.completion.is_some(),
        "Document processed"
    );
    (StatusCode::OK, Json(response)).into_response()
}

fn failure(e: ExtractError) -> Response {
    error!(stage = %e.stage(), "Error processing document: {}", e);
    e.into_response()
}
