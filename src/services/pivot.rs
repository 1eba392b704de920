//! Series pivot transform: reshapes grouped rows into the three chart-data
//! shapes used by the dashboard.
//!
//! Every function here is pure. None of them re-sort beyond what the caller
//! asks for, and none of them know about colors.

use std::collections::{BTreeSet, HashMap};

use crate::models::metric::GroupedRow;

/// Single-series shape: one value per label.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesResult<T> {
    pub labels: Vec<String>,
    pub values: Vec<T>,
}

impl<T> SeriesResult<T> {
    /// Apply `f` to every value, keeping labels and order.
    pub fn map_values<U>(self, f: impl Fn(T) -> U) -> SeriesResult<U> {
        SeriesResult {
            labels: self.labels,
            values: self.values.into_iter().map(f).collect(),
        }
    }

    /// Keep the label/value pairs whose label satisfies `keep`.
    pub fn retain_labels(self, keep: impl Fn(&str) -> bool) -> Self {
        let (labels, values) = self
            .labels
            .into_iter()
            .zip(self.values)
            .filter(|(label, _)| keep(label))
            .unzip();
        Self { labels, values }
    }
}

/// One series of a pivot table, aligned index-for-index with its labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<i64>,
}

/// Multi-series shape: a dense label x series matrix of counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotResult {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

/// Two metrics per label: average worth and row count.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedResult {
    pub labels: Vec<String>,
    pub metric_a: Vec<f64>,
    pub metric_b: Vec<i64>,
}

/// Where the pivot's outer labels and their order come from.
#[derive(Debug, Clone, PartialEq)]
pub enum OuterOrder {
    /// Distinct outer keys found in the rows, sorted.
    Alphabetical,
    /// Externally ranked keys, used verbatim even when a key has no rows.
    Ranked(Vec<String>),
}

/// Filtering and truncation applied by [`paired`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedOptions {
    /// Rows with this many listings or fewer are dropped.
    pub min_count: i64,
    /// Number of rows kept after sorting by average descending.
    pub top_k: usize,
}

impl Default for PairedOptions {
    fn default() -> Self {
        Self {
            min_count: 3,
            top_k: 20,
        }
    }
}

/// Map each row's first key to a label and `value(row)` to its value, in row order.
pub fn single_series_by<T>(rows: &[GroupedRow], value: impl Fn(&GroupedRow) -> T) -> SeriesResult<T> {
    SeriesResult {
        labels: rows.iter().map(|row| row.key().to_string()).collect(),
        values: rows.iter().map(value).collect(),
    }
}

/// Single series of averages; a missing average becomes 0.
pub fn single_series(rows: &[GroupedRow]) -> SeriesResult<f64> {
    single_series_by(rows, GroupedRow::average_or_zero)
}

/// Single series of row counts.
pub fn count_series(rows: &[GroupedRow]) -> SeriesResult<i64> {
    single_series_by(rows, |row| row.count)
}

/// Pivot two-key count rows into a dense matrix.
///
/// Inner keys become series sorted ascending, so series order (and anything
/// derived from the series index) is stable across calls. Cells without rows
/// are 0. Under [`OuterOrder::Ranked`], rows for unranked outer keys are ignored.
pub fn pivot_table(rows: &[GroupedRow], order: OuterOrder) -> PivotResult {
    let labels: Vec<String> = match order {
        OuterOrder::Alphabetical => rows
            .iter()
            .filter(|row| row.keys.len() >= 2)
            .map(|row| row.keys[0].clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        OuterOrder::Ranked(ranking) => ranking,
    };

    let label_index: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    let mut cells: HashMap<(usize, &str), i64> = HashMap::new();
    let mut inner_keys: BTreeSet<&str> = BTreeSet::new();
    for row in rows {
        let [outer, inner] = match row.keys.as_slice() {
            [outer, inner, ..] => [outer, inner],
            _ => continue,
        };
        let Some(&idx) = label_index.get(outer.as_str()) else {
            continue;
        };
        *cells.entry((idx, inner.as_str())).or_insert(0) += row.count;
        inner_keys.insert(inner.as_str());
    }

    let series = inner_keys
        .into_iter()
        .map(|inner| Series {
            name: inner.to_string(),
            values: (0..labels.len())
                .map(|idx| cells.get(&(idx, inner)).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    PivotResult { labels, series }
}

/// Filter by listing count, sort by average descending, keep the top K.
///
/// The sort is stable, so rows with equal averages keep their input order.
pub fn paired(rows: &[GroupedRow], options: PairedOptions) -> PairedResult {
    let mut kept: Vec<(&str, f64, i64)> = rows
        .iter()
        .filter(|row| row.count > options.min_count)
        .map(|row| (row.key(), row.average_or_zero(), row.count))
        .collect();
    kept.sort_by(|a, b| b.1.total_cmp(&a.1));
    kept.truncate(options.top_k);

    let mut result = PairedResult {
        labels: Vec::with_capacity(kept.len()),
        metric_a: Vec::with_capacity(kept.len()),
        metric_b: Vec::with_capacity(kept.len()),
    };
    for (label, average, count) in kept {
        result.labels.push(label.to_string());
        result.metric_a.push(average);
        result.metric_b.push(count);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(keys: &[&str], count: i64, average: Option<f64>) -> GroupedRow {
        GroupedRow {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            count,
            average,
        }
    }

    #[test]
    fn single_series_keeps_row_order() {
        let rows = vec![
            row(&["Palm Jumeirah"], 12, Some(9_000_000.0)),
            row(&["Business Bay"], 40, Some(2_500_000.0)),
            row(&["Al Barsha First"], 7, None),
        ];
        let series = single_series(&rows);
        assert_eq!(series.labels, vec!["Palm Jumeirah", "Business Bay", "Al Barsha First"]);
        assert_eq!(series.values, vec![9_000_000.0, 2_500_000.0, 0.0]);
        assert_eq!(series.labels.len(), series.values.len());
        assert!(series.values.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn count_series_uses_counts() {
        let rows = vec![row(&["Residential"], 30, None), row(&["Commercial"], 5, None)];
        let series = count_series(&rows);
        assert_eq!(series.values, vec![30, 5]);
    }

    #[test]
    fn empty_rows_give_empty_shapes() {
        assert!(single_series(&[]).labels.is_empty());
        let pivot = pivot_table(&[], OuterOrder::Alphabetical);
        assert!(pivot.labels.is_empty());
        assert!(pivot.series.is_empty());
        let paired = paired(&[], PairedOptions::default());
        assert!(paired.labels.is_empty());
    }

    #[test]
    fn pivot_is_dense_and_alphabetical() {
        let rows = vec![
            row(&["Marsa Dubai", "Unit"], 50, None),
            row(&["Marsa Dubai", "Land"], 2, None),
            row(&["Al Warsan First", "Villa"], 9, None),
        ];
        let pivot = pivot_table(&rows, OuterOrder::Alphabetical);
        assert_eq!(pivot.labels, vec!["Al Warsan First", "Marsa Dubai"]);
        let names: Vec<&str> = pivot.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Land", "Unit", "Villa"]);
        assert_eq!(pivot.series[0].values, vec![0, 2]);
        assert_eq!(pivot.series[1].values, vec![0, 50]);
        assert_eq!(pivot.series[2].values, vec![9, 0]);
        for series in &pivot.series {
            assert_eq!(series.values.len(), pivot.labels.len());
            assert!(series.values.iter().all(|v| *v >= 0));
        }
    }

    #[test]
    fn ranked_pivot_keeps_order_and_zero_fills_missing_keys() {
        let rows = vec![
            row(&["C", "Unit"], 3, None),
            row(&["A", "Unit"], 8, None),
            row(&["A", "Villa"], 1, None),
        ];
        let ranking = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let pivot = pivot_table(&rows, OuterOrder::Ranked(ranking.clone()));
        assert_eq!(pivot.labels, ranking);
        assert_eq!(pivot.series[0].name, "Unit");
        assert_eq!(pivot.series[0].values, vec![8, 0, 3]);
        assert_eq!(pivot.series[1].values, vec![1, 0, 0]);
        assert!(pivot.series.iter().all(|s| s.values[1] == 0));
    }

    #[test]
    fn ranked_pivot_ignores_unranked_outer_keys() {
        let rows = vec![row(&["Z", "Hotel"], 4, None), row(&["A", "Unit"], 2, None)];
        let pivot = pivot_table(&rows, OuterOrder::Ranked(vec!["A".to_string()]));
        assert_eq!(pivot.series.len(), 1);
        assert_eq!(pivot.series[0].name, "Unit");
    }

    #[test]
    fn pivot_sums_repeated_cells() {
        let rows = vec![row(&["A", "Unknown"], 2, None), row(&["A", "Unknown"], 3, None)];
        let pivot = pivot_table(&rows, OuterOrder::Alphabetical);
        assert_eq!(pivot.series[0].values, vec![5]);
    }

    #[test]
    fn paired_filters_low_listing_counts() {
        let rows = vec![
            row(&["X"], 10, Some(500_000.0)),
            row(&["Y"], 2, Some(900_000.0)),
        ];
        let result = paired(&rows, PairedOptions { min_count: 3, top_k: 2 });
        assert_eq!(result.labels, vec!["X"]);
        assert_eq!(result.metric_a, vec![500_000.0]);
        assert_eq!(result.metric_b, vec![10]);
    }

    #[test]
    fn paired_sorts_and_truncates() {
        let rows = vec![
            row(&["Low"], 20, Some(100.0)),
            row(&["High"], 20, Some(300.0)),
            row(&["Mid"], 20, Some(200.0)),
            row(&["MidTwin"], 20, Some(200.0)),
        ];
        let result = paired(&rows, PairedOptions { min_count: 3, top_k: 3 });
        assert_eq!(result.labels, vec!["High", "Mid", "MidTwin"]);
    }

    #[test]
    fn retain_labels_keeps_pairs_aligned() {
        let series = SeriesResult {
            labels: vec!["2019".to_string(), "2020".to_string(), "2021".to_string()],
            values: vec![1, 2, 3],
        };
        let kept = series.retain_labels(|label| label != "2020");
        assert_eq!(kept.labels, vec!["2019", "2021"]);
        assert_eq!(kept.values, vec![1, 3]);
    }

    #[test]
    fn transforms_are_deterministic() {
        let rows = vec![
            row(&["B", "Villa"], 1, None),
            row(&["A", "Unit"], 2, None),
            row(&["A", "Land"], 3, None),
        ];
        assert_eq!(
            pivot_table(&rows, OuterOrder::Alphabetical),
            pivot_table(&rows, OuterOrder::Alphabetical)
        );
    }
}
