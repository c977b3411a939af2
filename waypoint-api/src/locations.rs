use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use waypoint_core::search::RouteMap;
use waypoint_core::{CoreError, LocationCandidate, MapPoint};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct KeywordQuery {
    keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteQuery {
    origin: Option<String>,
    destination: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/locations/search", get(search_locations))
        .route("/api/locations/route-map", get(route_map))
        .route("/api/locations/{code}/coordinates", get(coordinates))
}

async fn search_locations(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Vec<LocationCandidate>>, AppError> {
    let keyword = query.keyword.unwrap_or_default();
    let result = state.resolver.search(&keyword).await?;
    Ok(Json(result.value))
}

async fn coordinates(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<MapPoint>, AppError> {
    let point = state.resolver.coordinates(&code).await?;
    Ok(Json(point))
}

async fn route_map(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteMap>, AppError> {
    let origin = query.origin.ok_or(CoreError::MissingParameter("origin"))?;
    let destination = query.destination.ok_or(CoreError::MissingParameter("destination"))?;

    let route = state.resolver.route_map(&origin, &destination).await?;
    Ok(Json(route))
}
