//! Aggregation queries, chart-data transforms, and the metric catalogue.

pub mod analytics;
pub mod calendar;
pub mod currency;
pub mod palette;
pub mod pivot;
pub mod query;
