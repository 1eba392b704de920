//! Metric requests: which columns to group by, what to measure, and how the
//! database should filter, order, and truncate the groups.

use crate::errors::AppError;

/// Label used for rows whose categorical value is null or empty under
/// [`MissingCategory::LabelAsUnknown`].
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Allow-list of groupable columns of the `real_estate` table.
///
/// Only these ever reach SQL text; request values are always bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Area,
    PropertyType,
    PropertyUsage,
    Rooms,
    Year,
    Month,
}

impl Dimension {
    /// Source column in `real_estate`.
    pub fn column(self) -> &'static str {
        match self {
            Self::Area => "area_name_en",
            Self::PropertyType => "property_type_en",
            Self::PropertyUsage => "property_usage_en",
            Self::Rooms => "rooms_en",
            Self::Year | Self::Month => "instance_date",
        }
    }

    /// Whether the dimension is derived from the transaction date.
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Year | Self::Month)
    }

    /// Expression grouped on, honouring the missing-category policy for text columns.
    pub fn group_expr(self, on_missing: MissingCategory) -> String {
        match self {
            Self::Year => "EXTRACT(YEAR FROM instance_date)::INT".to_string(),
            Self::Month => "EXTRACT(MONTH FROM instance_date)::INT".to_string(),
            _ => match on_missing {
                MissingCategory::Exclude => self.column().to_string(),
                MissingCategory::LabelAsUnknown => format!(
                    "COALESCE(NULLIF({}, ''), '{UNKNOWN_LABEL}')",
                    self.column()
                ),
            },
        }
    }

    /// Predicate excluding rows with no value for this dimension, if the policy asks for it.
    ///
    /// Temporal dimensions always exclude undated rows.
    pub fn presence_predicate(self, on_missing: MissingCategory) -> Option<String> {
        if self.is_temporal() {
            return Some("instance_date IS NOT NULL".to_string());
        }
        match on_missing {
            MissingCategory::Exclude => {
                let col = self.column();
                Some(format!("{col} IS NOT NULL AND {col} <> ''"))
            }
            MissingCategory::LabelAsUnknown => None,
        }
    }
}

/// How a metric treats rows whose grouping column is null or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingCategory {
    /// Drop such rows in SQL.
    #[default]
    Exclude,
    /// Keep them, grouped under [`UNKNOWN_LABEL`].
    LabelAsUnknown,
}

/// What is computed per group. Every group also carries its row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Number of transactions.
    Count,
    /// Average `actual_worth` over transactions with a positive worth.
    AverageWorth,
    /// Count of every transaction with a recorded worth, plus the average
    /// over the positive ones. The average is null when none is positive.
    ListingsWithAverageWorth,
}

impl Measure {
    /// Whether the measure computes an average worth.
    pub fn averages_worth(self) -> bool {
        !matches!(self, Self::Count)
    }
}

/// Ordering requested from the database. Ties are broken by ascending keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// The measure, descending.
    #[default]
    MetricDesc,
    /// Row count, descending, regardless of the measure.
    CountDesc,
    /// Grouping keys ascending (chronological for temporal dimensions).
    KeysAsc,
    /// First key ascending, then the measure descending.
    KeysThenMetricDesc,
}

/// A single aggregate query against the transactions table.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRequest {
    /// Name used in logs and error messages.
    pub metric: &'static str,
    pub dimensions: Vec<Dimension>,
    pub measure: Measure,
    /// Equality filter on a raw column.
    pub filter: Option<(Dimension, String)>,
    /// Restrict a raw column to a set of values.
    pub within: Option<(Dimension, Vec<String>)>,
    /// Keep only groups with strictly more rows than this.
    pub min_count: Option<i64>,
    /// Keep only transactions dated strictly after this year.
    pub min_year: Option<i32>,
    pub order: OrderBy,
    pub limit: Option<i64>,
    pub on_missing: MissingCategory,
}

impl MetricRequest {
    pub fn new(metric: &'static str, measure: Measure, dimensions: &[Dimension]) -> Self {
        Self {
            metric,
            dimensions: dimensions.to_vec(),
            measure,
            filter: None,
            within: None,
            min_count: None,
            min_year: None,
            order: OrderBy::default(),
            limit: None,
            on_missing: MissingCategory::default(),
        }
    }

    pub fn filter(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.filter = Some((dimension, value.into()));
        self
    }

    pub fn within(mut self, dimension: Dimension, values: Vec<String>) -> Self {
        self.within = Some((dimension, values));
        self
    }

    pub fn min_count(mut self, min_count: i64) -> Self {
        self.min_count = Some(min_count);
        self
    }

    pub fn min_year(mut self, year: i32) -> Self {
        self.min_year = Some(year);
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn on_missing(mut self, on_missing: MissingCategory) -> Self {
        self.on_missing = on_missing;
        self
    }

    /// Check the request invariants before any SQL is built.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.dimensions.is_empty() {
            return Err(AppError::Validation(format!(
                "{}: at least one grouping column is required",
                self.metric
            )));
        }
        if self.dimensions.len() > 2 {
            return Err(AppError::Validation(format!(
                "{}: at most two grouping columns are supported",
                self.metric
            )));
        }
        if let Some(limit) = self.limit {
            if limit <= 0 {
                return Err(AppError::Validation(format!(
                    "{}: limit must be positive, got {limit}",
                    self.metric
                )));
            }
        }
        if matches!(&self.filter, Some((dim, _)) if dim.is_temporal())
            || matches!(&self.within, Some((dim, _)) if dim.is_temporal())
        {
            return Err(AppError::Validation(format!(
                "{}: filters apply to categorical columns only",
                self.metric
            )));
        }
        Ok(())
    }
}

/// One aggregated group as returned by the query layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    /// One value per grouping column, in request order.
    pub keys: Vec<String>,
    pub count: i64,
    /// `None` when the measure is a count or no row qualified for the average.
    pub average: Option<f64>,
}

impl GroupedRow {
    /// First grouping key.
    pub fn key(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or(UNKNOWN_LABEL)
    }

    /// Average as a finite number, 0 when absent.
    pub fn average_or_zero(&self) -> f64 {
        self.average.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_one_or_two_dimensions() {
        let one = MetricRequest::new("a", Measure::Count, &[Dimension::Area]);
        let two = MetricRequest::new("b", Measure::Count, &[Dimension::Area, Dimension::PropertyType]);
        assert!(one.validate().is_ok());
        assert!(two.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_dimensions() {
        let req = MetricRequest::new("empty", Measure::Count, &[]);
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn validate_rejects_three_dimensions() {
        let req = MetricRequest::new(
            "wide",
            Measure::Count,
            &[Dimension::Area, Dimension::PropertyType, Dimension::Rooms],
        );
        assert!(req.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_limit() {
        let req = MetricRequest::new("zero", Measure::Count, &[Dimension::Area]).limit(0);
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("limit must be positive"));
    }

    #[test]
    fn validate_rejects_temporal_filter() {
        let req = MetricRequest::new("bad", Measure::Count, &[Dimension::Area])
            .filter(Dimension::Year, "2020");
        assert!(req.validate().is_err());
    }

    #[test]
    fn group_expr_follows_policy() {
        assert_eq!(
            Dimension::Area.group_expr(MissingCategory::Exclude),
            "area_name_en"
        );
        assert_eq!(
            Dimension::Area.group_expr(MissingCategory::LabelAsUnknown),
            "COALESCE(NULLIF(area_name_en, ''), 'Unknown')"
        );
        assert_eq!(
            Dimension::Month.group_expr(MissingCategory::LabelAsUnknown),
            "EXTRACT(MONTH FROM instance_date)::INT"
        );
    }

    #[test]
    fn presence_predicate_follows_policy() {
        assert_eq!(
            Dimension::Rooms.presence_predicate(MissingCategory::Exclude).as_deref(),
            Some("rooms_en IS NOT NULL AND rooms_en <> ''")
        );
        assert!(Dimension::Rooms
            .presence_predicate(MissingCategory::LabelAsUnknown)
            .is_none());
        assert_eq!(
            Dimension::Year.presence_predicate(MissingCategory::LabelAsUnknown).as_deref(),
            Some("instance_date IS NOT NULL")
        );
    }

    #[test]
    fn null_average_reads_as_zero() {
        let row = GroupedRow {
            keys: vec!["Marsa Dubai".to_string()],
            count: 4,
            average: None,
        };
        assert_eq!(row.average_or_zero(), 0.0);
        let nan = GroupedRow {
            average: Some(f64::NAN),
            ..row
        };
        assert_eq!(nan.average_or_zero(), 0.0);
    }
}
