//! Route definitions for the analytics API.

pub mod analytics;
pub mod health;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router. Shared by the server binary and integration tests.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config.frontend_url.as_deref());

    let api_routes = Router::new()
        .route("/property-usage", get(analytics::property_usage))
        .route("/price-by-area", get(analytics::price_by_area))
        .route("/price-trends", get(analytics::price_trends))
        .route("/price-by-property-type", get(analytics::price_by_property_type))
        .route("/market-volume", get(analytics::market_volume))
        .route(
            "/property-usage-distribution",
            get(analytics::property_usage_distribution),
        )
        .route(
            "/property-type-distribution",
            get(analytics::property_type_distribution),
        )
        .route(
            "/top-areas-property-type-distribution",
            get(analytics::top_areas_property_type_distribution),
        )
        .route("/area-price-popularity", get(analytics::area_price_popularity))
        .route("/room-types", get(analytics::room_types));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// CORS for the dashboard frontend; any origin when none is configured.
fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);
    match frontend_url.and_then(|url| url.parse::<HeaderValue>().ok()) {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    }
}
