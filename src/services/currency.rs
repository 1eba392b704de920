//! Conversion of stored AED amounts into the USD figures the dashboard shows.

/// Fixed AED per USD peg.
pub const AED_TO_USD_RATE: f64 = 3.67;

/// Convert an aggregated AED amount to USD.
///
/// Applied once to aggregated values, never inside SQL.
pub fn aed_to_usd(aed: f64, rate: f64) -> f64 {
    aed / rate
}
