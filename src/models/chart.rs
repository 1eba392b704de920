//! JSON response bodies consumed by the dashboard's chart components.

use serde::Serialize;

use crate::services::calendar::TrendPeriod;
use crate::services::palette;
use crate::services::pivot::{PairedResult, PivotResult, SeriesResult};

/// `{labels, data}` body for single-series charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesResponse<T: Serialize> {
    pub labels: Vec<String>,
    pub data: Vec<T>,
}

impl<T: Serialize> From<SeriesResult<T>> for SeriesResponse<T> {
    fn from(series: SeriesResult<T>) -> Self {
        Self {
            labels: series.labels,
            data: series.values,
        }
    }
}

/// Price trend series tagged with its period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResponse {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub period: TrendPeriod,
}

/// One stacked-bar dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<i64>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
}

/// Turn pivot series into datasets, coloring each by its index.
pub fn datasets(pivot: PivotResult) -> (Vec<String>, Vec<Dataset>) {
    let datasets = pivot
        .series
        .into_iter()
        .enumerate()
        .map(|(index, series)| {
            let color = palette::color(index);
            Dataset {
                label: series.name,
                data: series.values,
                background_color: color.background,
                border_color: color.border,
                border_width: 1,
            }
        })
        .collect();
    (pivot.labels, datasets)
}

/// Stacked distribution of property types per area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionResponse {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl From<PivotResult> for DistributionResponse {
    fn from(pivot: PivotResult) -> Self {
        let (labels, datasets) = datasets(pivot);
        Self { labels, datasets }
    }
}

/// Stacked distribution restricted to the top-ranked areas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopAreasResponse {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub top_areas: Vec<String>,
}

/// One area in the price/popularity ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BubblePoint {
    pub x: f64,
    pub y: i64,
    pub r: f64,
    pub area: String,
    pub avg_price: f64,
    pub total_listings: i64,
}

/// Areas ranked by average price, with listing counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleResponse {
    pub areas: Vec<String>,
    pub data: Vec<BubblePoint>,
}

impl From<PairedResult> for BubbleResponse {
    fn from(paired: PairedResult) -> Self {
        let data = paired
            .labels
            .iter()
            .zip(paired.metric_a.iter().zip(&paired.metric_b))
            .map(|(area, (&avg_price, &total_listings))| BubblePoint {
                x: avg_price,
                y: total_listings,
                r: (total_listings as f64).sqrt() * 2.0,
                area: area.clone(),
                avg_price,
                total_listings,
            })
            .collect();
        Self {
            areas: paired.labels,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pivot::Series;

    #[test]
    fn series_response_uses_data_key() {
        let body: SeriesResponse<i64> = SeriesResult {
            labels: vec!["2 B/R".to_string()],
            values: vec![42],
        }
        .into();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["labels"][0], "2 B/R");
        assert_eq!(json["data"][0], 42);
    }

    #[test]
    fn datasets_are_colored_by_index() {
        let pivot = PivotResult {
            labels: vec!["Business Bay".to_string()],
            series: vec![
                Series { name: "Land".to_string(), values: vec![1] },
                Series { name: "Unit".to_string(), values: vec![7] },
            ],
        };
        let body = DistributionResponse::from(pivot);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["datasets"][0]["label"], "Land");
        assert_eq!(json["datasets"][0]["backgroundColor"], "rgba(54, 162, 235, 0.8)");
        assert_eq!(json["datasets"][1]["borderColor"], "rgba(255, 99, 132, 1)");
        assert_eq!(json["datasets"][1]["borderWidth"], 1);
        assert_eq!(json["datasets"][1]["data"][0], 7);
    }

    #[test]
    fn bubble_point_radius_and_keys() {
        let body = BubbleResponse::from(PairedResult {
            labels: vec!["Jumeirah".to_string()],
            metric_a: vec![1000.0],
            metric_b: vec![16],
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["areas"][0], "Jumeirah");
        let point = &json["data"][0];
        assert_eq!(point["x"], 1000.0);
        assert_eq!(point["y"], 16);
        assert_eq!(point["r"], 8.0);
        assert_eq!(point["avgPrice"], 1000.0);
        assert_eq!(point["totalListings"], 16);
    }

    #[test]
    fn top_areas_key_is_camel_case() {
        let body = TopAreasResponse {
            labels: vec![],
            datasets: vec![],
            top_areas: vec!["A".to_string()],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["topAreas"][0], "A");
    }

    #[test]
    fn trend_response_carries_period() {
        let body = TrendResponse {
            labels: vec![],
            data: vec![],
            period: TrendPeriod::Monthly,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["period"], "monthly");
    }
}
