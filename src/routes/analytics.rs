//! Analytics routes: one GET endpoint per dashboard chart.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::chart::{
    BubbleResponse, DistributionResponse, SeriesResponse, TopAreasResponse, TrendResponse,
};
use crate::services::analytics;
use crate::services::calendar::{TrendPeriod, YearRange};
use crate::AppState;

/// Query parameters for the price-by-area chart.
#[derive(Debug, Default, Deserialize)]
pub struct PriceByAreaParams {
    #[serde(rename = "propertyUsage")]
    pub property_usage: Option<String>,
}

/// Query parameters for the price trends chart.
#[derive(Debug, Default, Deserialize)]
pub struct PriceTrendsParams {
    pub period: Option<TrendPeriod>,
}

/// Query parameters for the market volume chart.
#[derive(Debug, Default, Deserialize)]
pub struct MarketVolumeParams {
    pub range: Option<YearRange>,
}

/// Turn a query-string rejection into the dashboard's error body.
fn params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// GET /api/property-usage: distinct property usages.
pub async fn property_usage(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(analytics::property_usages(&state.db).await?))
}

/// GET /api/price-by-area: average USD price for the top areas.
pub async fn price_by_area(
    State(state): State<AppState>,
    query: Result<Query<PriceByAreaParams>, QueryRejection>,
) -> Result<Json<SeriesResponse<f64>>, AppError> {
    let params = params(query)?;
    let usage = params.property_usage.as_deref().filter(|u| !u.is_empty());
    let body = analytics::price_by_area(&state.db, &state.config.analytics, usage).await?;
    Ok(Json(body))
}

/// GET /api/price-trends: average USD price per year or month.
pub async fn price_trends(
    State(state): State<AppState>,
    query: Result<Query<PriceTrendsParams>, QueryRejection>,
) -> Result<Json<TrendResponse>, AppError> {
    let period = params(query)?.period.unwrap_or_default();
    let body = analytics::price_trends(&state.db, &state.config.analytics, period).await?;
    Ok(Json(body))
}

/// GET /api/price-by-property-type: average USD price per property type.
pub async fn price_by_property_type(
    State(state): State<AppState>,
) -> Result<Json<SeriesResponse<f64>>, AppError> {
    let body = analytics::price_by_property_type(&state.db, &state.config.analytics).await?;
    Ok(Json(body))
}

/// GET /api/market-volume: transactions per year.
pub async fn market_volume(
    State(state): State<AppState>,
    query: Result<Query<MarketVolumeParams>, QueryRejection>,
) -> Result<Json<SeriesResponse<i64>>, AppError> {
    let range = params(query)?.range;
    let current_year = Utc::now().year();
    let body =
        analytics::market_volume(&state.db, &state.config.analytics, range, current_year).await?;
    Ok(Json(body))
}

/// GET /api/property-usage-distribution: transactions per property usage.
pub async fn property_usage_distribution(
    State(state): State<AppState>,
) -> Result<Json<SeriesResponse<i64>>, AppError> {
    Ok(Json(analytics::property_usage_distribution(&state.db).await?))
}

/// GET /api/property-type-distribution: property types per area.
pub async fn property_type_distribution(
    State(state): State<AppState>,
) -> Result<Json<DistributionResponse>, AppError> {
    Ok(Json(analytics::property_type_distribution(&state.db).await?))
}

/// GET /api/top-areas-property-type-distribution: property types for the busiest areas.
pub async fn top_areas_property_type_distribution(
    State(state): State<AppState>,
) -> Result<Json<TopAreasResponse>, AppError> {
    let body =
        analytics::top_areas_property_type_distribution(&state.db, &state.config.analytics)
            .await?;
    Ok(Json(body))
}

/// GET /api/area-price-popularity: areas ranked by price with listing counts.
pub async fn area_price_popularity(
    State(state): State<AppState>,
) -> Result<Json<BubbleResponse>, AppError> {
    let body = analytics::area_price_popularity(&state.db, &state.config.analytics).await?;
    Ok(Json(body))
}

/// GET /api/room-types: transactions per room layout.
pub async fn room_types(
    State(state): State<AppState>,
) -> Result<Json<SeriesResponse<i64>>, AppError> {
    Ok(Json(analytics::room_types(&state.db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_by_area_params_use_camel_case() {
        let params: PriceByAreaParams =
            serde_json::from_str(r#"{"propertyUsage":"Residential"}"#).unwrap();
        assert_eq!(params.property_usage.as_deref(), Some("Residential"));
    }

    #[test]
    fn trend_params_default_to_yearly() {
        let params = PriceTrendsParams::default();
        assert_eq!(params.period.unwrap_or_default(), TrendPeriod::Yearly);
    }

    fn query<T: serde::de::DeserializeOwned>(uri: &str) -> Result<Query<T>, QueryRejection> {
        let uri: axum::http::Uri = uri.parse().unwrap();
        Query::try_from_uri(&uri)
    }

    #[test]
    fn unknown_range_is_a_validation_error() {
        let result = params(query::<MarketVolumeParams>("/api/market-volume?range=last5"));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_period_maps_to_bad_request() {
        use axum::{http::StatusCode, response::IntoResponse};

        let err = params(query::<PriceTrendsParams>("/api/price-trends?period=weekly")).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn known_params_pass_through() {
        let windowed = params(query::<MarketVolumeParams>("/api/market-volume?range=since2010")).unwrap();
        assert_eq!(windowed.range, Some(YearRange::Since2010));
        let absent = params(query::<MarketVolumeParams>("/api/market-volume")).unwrap();
        assert!(absent.range.is_none());
    }
}
