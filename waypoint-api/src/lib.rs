use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod flights;
pub mod health;
pub mod hotels;
pub mod locations;
pub mod state;

pub use error::AppError;
pub use state::AppState;

pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(locations::routes())
        .merge(flights::routes())
        .merge(hotels::routes())
        .fallback(|| async { AppError::RouteNotFound })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the single configured front-end origin. `*` allows any origin.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let allow_origin = match origin.trim() {
        "*" => AllowOrigin::any(),
        origin => AllowOrigin::exact(HeaderValue::from_str(origin)?),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]))
}
