use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use waypoint_core::search::{HotelSearchRequest, HotelSearchResult};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/hotels/search", get(search_hotels))
}

async fn search_hotels(
    State(state): State<AppState>,
    Query(request): Query<HotelSearchRequest>,
) -> Result<Json<HotelSearchResult>, AppError> {
    let result = state.hotels.search(request).await?;
    Ok(Json(result))
}
