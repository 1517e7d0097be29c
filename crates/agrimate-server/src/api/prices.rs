use crate::api::state::AppState;
use agrimate_core::PriceLookup;
use axum::{
    Json,
    extract::{Path, State},
};

/// GET /api/mcps/{crop} - Mock mandi price, or an explicit no-data answer
pub async fn get_crop_price(
    State(state): State<AppState>,
    Path(crop): Path<String>,
) -> Json<PriceLookup> {
    let lookup = state.prices.lookup(&crop);
    if lookup == PriceLookup::NoData {
        tracing::debug!(crop = %crop, "No price data for crop");
    }
    Json(lookup)
}
