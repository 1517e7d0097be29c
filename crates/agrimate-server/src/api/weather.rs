use crate::api::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
struct WeatherError {
    error: &'static str,
}

/// GET /api/weather/{city} - Provider JSON, passed through as-is
///
/// The provider's own error answers (unknown city, bad key) are still JSON
/// and are relayed with a 200 like any other payload.
pub async fn get_weather(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    match state.weather.fetch_report(&city).await {
        Ok(report) => {
            if report.status >= 400 {
                tracing::debug!(
                    city = %city,
                    status = report.status,
                    "Weather provider answered with an error"
                );
            }
            Json(report.body).into_response()
        }
        Err(err) => {
            tracing::warn!(city = %city, error = %err, "Failed to fetch weather");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WeatherError {
                    error: "Failed to fetch weather",
                }),
            )
                .into_response()
        }
    }
}
