use crate::api::{ApiResponse, state::AppState};
use agrimate_core::{GatewayError, GenerationRequest};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;

/// POST /ask - Relay a generation as a plain chunked text body
///
/// Failures before the upstream call is open become error responses. Once
/// the body has started, a broken upstream aborts the body instead: the
/// status line is already on the wire.
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Response {
    tracing::info!(
        prompt_len = request.prompt.len(),
        location = ?request.location(),
        "Ask received"
    );

    let deltas = match state.open_relay(&request).await {
        Ok(deltas) => deltas,
        Err(GatewayError::InvalidRequest(message)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(message)),
            )
                .into_response();
        }
        Err(err) => {
            let cause = if err.is_unreachable() {
                "unreachable"
            } else {
                "upstream error"
            };
            tracing::error!(error = %err, cause, "Error calling generation service");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<()>::error("Error calling generation service")),
            )
                .into_response();
        }
    };

    let body = deltas.map_ok(|delta| Bytes::from(delta.text));

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}
