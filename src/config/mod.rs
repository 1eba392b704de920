use std::env;
use std::str::FromStr;

use crate::services::currency::AED_TO_USD_RATE;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub frontend_url: Option<String>,
    pub analytics: AnalyticsConfig,
}

/// Tunable thresholds and limits used by the metric catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Divisor converting stored AED amounts into USD.
    pub aed_to_usd_rate: f64,
    /// Number of areas returned by the price-by-area chart.
    pub price_by_area_limit: i64,
    /// Size of the area ranking used by the top-areas distribution.
    pub top_areas_limit: i64,
    /// Areas with this many listings or fewer are left out of the heat ranking.
    pub heat_min_listings: i64,
    /// Number of areas kept in the heat ranking.
    pub heat_top_k: usize,
    /// Market volume only counts years strictly after this one.
    pub market_min_year: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            aed_to_usd_rate: AED_TO_USD_RATE,
            price_by_area_limit: 20,
            top_areas_limit: 10,
            heat_min_listings: 3,
            heat_top_k: 20,
            market_min_year: 1990,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 10),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: var_or("BACKEND_PORT", 3050),
            frontend_url: env::var("FRONTEND_URL").ok().filter(|url| !url.is_empty()),
            analytics: AnalyticsConfig::from_env(),
        })
    }
}

impl AnalyticsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let rate = var_or("AED_TO_USD_RATE", defaults.aed_to_usd_rate);
        Self {
            // A zero or negative rate would turn every price into inf/NaN.
            aed_to_usd_rate: if rate > 0.0 { rate } else { defaults.aed_to_usd_rate },
            price_by_area_limit: var_or("PRICE_BY_AREA_LIMIT", defaults.price_by_area_limit)
                .max(1),
            top_areas_limit: var_or("TOP_AREAS_LIMIT", defaults.top_areas_limit).max(1),
            heat_min_listings: var_or("HEAT_MIN_LISTINGS", defaults.heat_min_listings),
            heat_top_k: var_or("HEAT_TOP_K", defaults.heat_top_k),
            market_min_year: var_or("MARKET_MIN_YEAR", defaults.market_min_year),
        }
    }
}

/// Read an optional variable, falling back to `default` when unset or unparseable.
fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analytics_defaults() {
        let cfg = AnalyticsConfig::default();
        assert_eq!(cfg.aed_to_usd_rate, 3.67);
        assert_eq!(cfg.price_by_area_limit, 20);
        assert_eq!(cfg.top_areas_limit, 10);
        assert_eq!(cfg.heat_min_listings, 3);
        assert_eq!(cfg.heat_top_k, 20);
        assert_eq!(cfg.market_min_year, 1990);
    }

    #[test]
    fn var_or_falls_back_on_garbage() {
        env::set_var("REA_TEST_GARBAGE_PORT", "not-a-port");
        assert_eq!(var_or("REA_TEST_GARBAGE_PORT", 3050u16), 3050);
        env::remove_var("REA_TEST_GARBAGE_PORT");
    }

    #[test]
    fn var_or_parses_trimmed_values() {
        env::set_var("REA_TEST_TRIMMED_LIMIT", " 15 ");
        assert_eq!(var_or("REA_TEST_TRIMMED_LIMIT", 20i64), 15);
        env::remove_var("REA_TEST_TRIMMED_LIMIT");
    }

    #[test]
    fn var_or_unset_uses_default() {
        assert_eq!(var_or("REA_TEST_DEFINITELY_UNSET", 1990i32), 1990);
    }
}
