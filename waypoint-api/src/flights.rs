use axum::{extract::State, routing::post, Json, Router};
use waypoint_core::search::{FlightSearchRequest, FlightSearchResult};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/flights/search", post(search_flights))
}

async fn search_flights(
    State(state): State<AppState>,
    Json(request): Json<FlightSearchRequest>,
) -> Result<Json<FlightSearchResult>, AppError> {
    let result = state.flights.search(request).await?;
    Ok(Json(result))
}
