//! Metric requests, grouped rows, and chart response bodies.

pub mod chart;
pub mod metric;
