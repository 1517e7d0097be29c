pub mod ask;
pub mod prices;
pub mod response;
pub mod state;
pub mod weather;

pub use response::ApiResponse;

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use state::AppState;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "agrimate is working!".to_string(),
    })
}

/// All gateway routes with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/weather/{city}", get(weather::get_weather))
        .route("/api/mcps/{crop}", get(prices::get_crop_price))
        .route("/ask", post(ask::ask))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
