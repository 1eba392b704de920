//! Metric catalogue: one function per dashboard chart.
//!
//! Each metric declares its [`MetricRequest`] (grouping, filters, ordering,
//! limit, and missing-category policy) in a `*_request` constructor, runs it
//! through the query layer, and reshapes the rows with the pivot transform.
//! Currency conversion happens here, after aggregation.

use sqlx::PgPool;

use crate::config::AnalyticsConfig;
use crate::errors::AppError;
use crate::models::chart::{
    datasets, BubbleResponse, DistributionResponse, SeriesResponse, TopAreasResponse,
    TrendResponse,
};
use crate::models::metric::{
    Dimension, GroupedRow, Measure, MetricRequest, MissingCategory, OrderBy,
};
use crate::services::calendar::{month_label, TrendPeriod, YearRange};
use crate::services::currency::aed_to_usd;
use crate::services::pivot::{self, OuterOrder, PairedOptions};
use crate::services::query;

// -- Request definitions ------------------------------------------------------

/// Top areas by average worth, optionally for one property usage.
pub fn price_by_area_request(cfg: &AnalyticsConfig, property_usage: Option<&str>) -> MetricRequest {
    let req = MetricRequest::new("price_by_area", Measure::AverageWorth, &[Dimension::Area])
        .order(OrderBy::MetricDesc)
        .limit(cfg.price_by_area_limit)
        .on_missing(MissingCategory::Exclude);
    match property_usage {
        Some(usage) => req.filter(Dimension::PropertyUsage, usage),
        None => req,
    }
}

/// Average worth per year, or per (year, month).
pub fn price_trends_request(period: TrendPeriod) -> MetricRequest {
    let dimensions: &[Dimension] = match period {
        TrendPeriod::Yearly => &[Dimension::Year],
        TrendPeriod::Monthly => &[Dimension::Year, Dimension::Month],
    };
    MetricRequest::new("price_trends", Measure::AverageWorth, dimensions).order(OrderBy::KeysAsc)
}

/// Average worth per property type.
pub fn price_by_property_type_request() -> MetricRequest {
    MetricRequest::new(
        "price_by_property_type",
        Measure::AverageWorth,
        &[Dimension::PropertyType],
    )
    .order(OrderBy::MetricDesc)
    .on_missing(MissingCategory::Exclude)
}

/// Transaction count per year after the configured floor.
pub fn market_volume_request(cfg: &AnalyticsConfig) -> MetricRequest {
    MetricRequest::new("market_volume", Measure::Count, &[Dimension::Year])
        .min_year(cfg.market_min_year)
        .order(OrderBy::KeysAsc)
}

/// Transaction count per property usage.
pub fn property_usage_distribution_request() -> MetricRequest {
    MetricRequest::new(
        "property_usage_distribution",
        Measure::Count,
        &[Dimension::PropertyUsage],
    )
    .order(OrderBy::CountDesc)
    .on_missing(MissingCategory::Exclude)
}

/// Transaction count per (area, property type); missing values grouped as "Unknown".
pub fn property_type_distribution_request() -> MetricRequest {
    MetricRequest::new(
        "property_type_distribution",
        Measure::Count,
        &[Dimension::Area, Dimension::PropertyType],
    )
    .order(OrderBy::KeysThenMetricDesc)
    .on_missing(MissingCategory::LabelAsUnknown)
}

/// Ranking query: areas with the most transactions.
pub fn top_areas_ranking_request(cfg: &AnalyticsConfig) -> MetricRequest {
    MetricRequest::new("top_areas_ranking", Measure::Count, &[Dimension::Area])
        .order(OrderBy::CountDesc)
        .limit(cfg.top_areas_limit)
        .on_missing(MissingCategory::Exclude)
}

/// Detail query: property type counts for the ranked areas.
pub fn top_areas_distribution_request(top_areas: Vec<String>) -> MetricRequest {
    MetricRequest::new(
        "top_areas_property_type_distribution",
        Measure::Count,
        &[Dimension::Area, Dimension::PropertyType],
    )
    .within(Dimension::Area, top_areas)
    .order(OrderBy::KeysThenMetricDesc)
    .on_missing(MissingCategory::LabelAsUnknown)
}

/// Average worth and listing count per area, for areas above the listing threshold.
pub fn area_price_popularity_request(cfg: &AnalyticsConfig) -> MetricRequest {
    MetricRequest::new(
        "area_price_popularity",
        Measure::ListingsWithAverageWorth,
        &[Dimension::Area],
    )
    .min_count(cfg.heat_min_listings)
    .order(OrderBy::MetricDesc)
    .on_missing(MissingCategory::LabelAsUnknown)
}

/// Transaction count per room layout.
pub fn room_types_request() -> MetricRequest {
    MetricRequest::new("room_types", Measure::Count, &[Dimension::Rooms])
        .order(OrderBy::CountDesc)
        .on_missing(MissingCategory::Exclude)
}

// -- Metrics ------------------------------------------------------------------

/// Distinct property usages, for the price-by-area filter dropdown.
pub async fn property_usages(pool: &PgPool) -> Result<Vec<String>, AppError> {
    let usages = query::fetch_distinct(pool, "property_usage", Dimension::PropertyUsage).await?;
    tracing::debug!(metric = "property_usage", rows = usages.len(), "Fetched property usages");
    Ok(usages)
}

/// Average price in USD for the top areas.
pub async fn price_by_area(
    pool: &PgPool,
    cfg: &AnalyticsConfig,
    property_usage: Option<&str>,
) -> Result<SeriesResponse<f64>, AppError> {
    let req = price_by_area_request(cfg, property_usage);
    let rows = query::fetch_grouped(pool, &req).await?;
    tracing::debug!(
        metric = req.metric,
        property_usage = property_usage.unwrap_or("All"),
        rows = rows.len(),
        "Fetched average prices by area"
    );
    Ok(usd_series(&rows, cfg).into())
}

/// Average price in USD over time.
pub async fn price_trends(
    pool: &PgPool,
    cfg: &AnalyticsConfig,
    period: TrendPeriod,
) -> Result<TrendResponse, AppError> {
    let req = price_trends_request(period);
    let rows = query::fetch_grouped(pool, &req).await?;
    tracing::debug!(metric = req.metric, ?period, rows = rows.len(), "Fetched price trends");

    let labels: Vec<String> = match period {
        TrendPeriod::Yearly => rows.iter().map(|row| row.key().to_string()).collect(),
        TrendPeriod::Monthly => rows
            .iter()
            .map(monthly_label)
            .collect::<Result<Vec<_>, _>>()?,
    };
    let data = rows
        .iter()
        .map(|row| aed_to_usd(row.average_or_zero(), cfg.aed_to_usd_rate))
        .collect();

    Ok(TrendResponse {
        labels,
        data,
        period,
    })
}

/// Average price in USD per property type.
pub async fn price_by_property_type(
    pool: &PgPool,
    cfg: &AnalyticsConfig,
) -> Result<SeriesResponse<f64>, AppError> {
    let req = price_by_property_type_request();
    let rows = query::fetch_grouped(pool, &req).await?;
    tracing::debug!(metric = req.metric, rows = rows.len(), "Fetched prices by property type");
    Ok(usd_series(&rows, cfg).into())
}

/// Transactions per year, optionally windowed to a year range.
pub async fn market_volume(
    pool: &PgPool,
    cfg: &AnalyticsConfig,
    range: Option<YearRange>,
    current_year: i32,
) -> Result<SeriesResponse<i64>, AppError> {
    let req = market_volume_request(cfg);
    let rows = query::fetch_grouped(pool, &req).await?;
    tracing::debug!(metric = req.metric, ?range, rows = rows.len(), "Fetched market volume");

    let series = pivot::count_series(&rows);
    let series = match range {
        Some(range) => window_years(series, range, current_year),
        None => series,
    };
    Ok(series.into())
}

/// Transactions per property usage.
pub async fn property_usage_distribution(pool: &PgPool) -> Result<SeriesResponse<i64>, AppError> {
    let req = property_usage_distribution_request();
    let rows = query::fetch_grouped(pool, &req).await?;
    tracing::debug!(metric = req.metric, rows = rows.len(), "Fetched property usage distribution");
    Ok(pivot::count_series(&rows).into())
}

/// Property type counts for every area, areas alphabetical.
pub async fn property_type_distribution(pool: &PgPool) -> Result<DistributionResponse, AppError> {
    let req = property_type_distribution_request();
    let rows = query::fetch_grouped(pool, &req).await?;
    let pivot = pivot::pivot_table(&rows, OuterOrder::Alphabetical);
    tracing::debug!(
        metric = req.metric,
        areas = pivot.labels.len(),
        property_types = pivot.series.len(),
        "Fetched property type distribution"
    );
    Ok(pivot.into())
}

/// Property type counts for the busiest areas, in ranking order.
///
/// The ranking query runs first; its result is the detail query's filter set.
pub async fn top_areas_property_type_distribution(
    pool: &PgPool,
    cfg: &AnalyticsConfig,
) -> Result<TopAreasResponse, AppError> {
    let ranking_req = top_areas_ranking_request(cfg);
    let ranking = query::fetch_grouped(pool, &ranking_req).await?;
    let top_areas: Vec<String> = ranking.iter().map(|row| row.key().to_string()).collect();

    if top_areas.is_empty() {
        return Ok(TopAreasResponse {
            labels: Vec::new(),
            datasets: Vec::new(),
            top_areas,
        });
    }

    let detail_req = top_areas_distribution_request(top_areas.clone());
    let rows = query::fetch_grouped(pool, &detail_req).await?;
    let pivot = pivot::pivot_table(&rows, OuterOrder::Ranked(top_areas.clone()));
    tracing::debug!(
        metric = detail_req.metric,
        areas = pivot.labels.len(),
        property_types = pivot.series.len(),
        "Fetched top areas property type distribution"
    );

    let (labels, datasets) = datasets(pivot);
    Ok(TopAreasResponse {
        labels,
        datasets,
        top_areas,
    })
}

/// Areas ranked by average price (USD) with their listing counts.
pub async fn area_price_popularity(
    pool: &PgPool,
    cfg: &AnalyticsConfig,
) -> Result<BubbleResponse, AppError> {
    let req = area_price_popularity_request(cfg);
    let rows = query::fetch_grouped(pool, &req).await?;
    let paired = heat_ranking(&rows, cfg);
    tracing::debug!(
        metric = req.metric,
        rows = rows.len(),
        kept = paired.labels.len(),
        "Fetched area price and popularity"
    );
    Ok(paired.into())
}

/// Transactions per room layout.
pub async fn room_types(pool: &PgPool) -> Result<SeriesResponse<i64>, AppError> {
    let req = room_types_request();
    let rows = query::fetch_grouped(pool, &req).await?;
    tracing::debug!(metric = req.metric, rows = rows.len(), "Fetched room types");
    Ok(pivot::count_series(&rows).into())
}

// -- Private helpers ----------------------------------------------------------

fn usd_series(rows: &[GroupedRow], cfg: &AnalyticsConfig) -> pivot::SeriesResult<f64> {
    let rate = cfg.aed_to_usd_rate;
    pivot::single_series(rows).map_values(|aed| aed_to_usd(aed, rate))
}

/// Label a (year, month) row as e.g. "Mar 2021".
fn monthly_label(row: &GroupedRow) -> Result<String, AppError> {
    let parsed = match row.keys.as_slice() {
        [year, month] => year.parse::<i32>().ok().zip(month.parse::<u32>().ok()),
        _ => None,
    };
    parsed
        .and_then(|(year, month)| month_label(year, month))
        .ok_or_else(|| AppError::Internal(format!("unexpected monthly trend key {:?}", row.keys)))
}

/// Keep the years inside `range`; non-numeric labels are dropped.
fn window_years(
    series: pivot::SeriesResult<i64>,
    range: YearRange,
    current_year: i32,
) -> pivot::SeriesResult<i64> {
    series.retain_labels(|label| {
        label
            .parse::<i32>()
            .map(|year| range.contains(year, current_year))
            .unwrap_or(false)
    })
}

/// Listing-count filter, price sort, and top-K, with prices converted to USD.
///
/// The database already applies the listing threshold; the transform applies
/// it again so the contract holds for any row source.
fn heat_ranking(rows: &[GroupedRow], cfg: &AnalyticsConfig) -> pivot::PairedResult {
    let mut paired = pivot::paired(
        rows,
        PairedOptions {
            min_count: cfg.heat_min_listings,
            top_k: cfg.heat_top_k,
        },
    );
    let rate = cfg.aed_to_usd_rate;
    for value in &mut paired.metric_a {
        *value = aed_to_usd(*value, rate);
    }
    paired
}
