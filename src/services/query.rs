//! Aggregation query layer: turns a [`MetricRequest`] into one SQL aggregate
//! over `real_estate` and returns the grouped rows in database order.
//!
//! Column names come only from the [`Dimension`] allow-list. Every request
//! value (filters, sets, thresholds, limits) is bound as a positional parameter.

use sqlx::{FromRow, PgPool};

use crate::errors::AppError;
use crate::models::metric::{
    Dimension, GroupedRow, Measure, MetricRequest, OrderBy, UNKNOWN_LABEL,
};

/// A value bound to a positional parameter, in parameter order.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    TextList(Vec<String>),
    BigInt(i64),
    Int(i32),
}

/// SQL text plus its bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// Raw row shape shared by every aggregate query.
#[derive(Debug, FromRow)]
struct GroupedRecord {
    key_0: Option<String>,
    key_1: Option<String>,
    row_count: i64,
    avg_worth: Option<f64>,
}

impl GroupedRecord {
    fn into_row(self, width: usize) -> GroupedRow {
        let keys = [self.key_0, self.key_1]
            .into_iter()
            .take(width)
            .map(|key| key.unwrap_or_else(|| UNKNOWN_LABEL.to_string()))
            .collect();
        GroupedRow {
            keys,
            count: self.row_count,
            average: self.avg_worth,
        }
    }
}

/// Build the SQL for a request. Assumes the request has been validated.
pub fn build_query(req: &MetricRequest) -> BuiltQuery {
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<BindValue> = Vec::new();
    let mut param_index = 0u32;

    let group_exprs: Vec<String> = req
        .dimensions
        .iter()
        .map(|dim| dim.group_expr(req.on_missing))
        .collect();

    for dim in &req.dimensions {
        if let Some(predicate) = dim.presence_predicate(req.on_missing) {
            if !conditions.contains(&predicate) {
                conditions.push(predicate);
            }
        }
    }

    match req.measure {
        Measure::Count => {}
        Measure::AverageWorth => conditions.push("actual_worth > 0".to_string()),
        Measure::ListingsWithAverageWorth => {
            conditions.push("actual_worth IS NOT NULL".to_string())
        }
    }

    if let Some((dim, value)) = &req.filter {
        param_index += 1;
        conditions.push(format!("{} = ${param_index}", dim.column()));
        binds.push(BindValue::Text(value.clone()));
    }
    if let Some((dim, values)) = &req.within {
        param_index += 1;
        conditions.push(format!("{} = ANY(${param_index})", dim.column()));
        binds.push(BindValue::TextList(values.clone()));
    }
    if let Some(year) = req.min_year {
        param_index += 1;
        conditions.push(format!("EXTRACT(YEAR FROM instance_date)::INT > ${param_index}"));
        binds.push(BindValue::Int(year));
    }

    let mut select = Vec::with_capacity(4);
    for (i, expr) in group_exprs.iter().enumerate() {
        select.push(format!("({expr})::TEXT AS key_{i}"));
    }
    if group_exprs.len() < 2 {
        select.push("NULL::TEXT AS key_1".to_string());
    }
    select.push("COUNT(*) AS row_count".to_string());
    select.push(match req.measure {
        Measure::Count => "NULL::FLOAT8 AS avg_worth".to_string(),
        Measure::AverageWorth => "AVG(actual_worth)::FLOAT8 AS avg_worth".to_string(),
        Measure::ListingsWithAverageWorth => {
            "(AVG(actual_worth) FILTER (WHERE actual_worth > 0))::FLOAT8 AS avg_worth".to_string()
        }
    });

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let having_clause = match req.min_count {
        Some(min) => {
            param_index += 1;
            binds.push(BindValue::BigInt(min));
            format!(" HAVING COUNT(*) > ${param_index}")
        }
        None => String::new(),
    };

    let metric_desc = if req.measure.averages_worth() {
        "avg_worth DESC NULLS LAST"
    } else {
        "row_count DESC"
    };
    let keys_asc: Vec<String> = group_exprs.iter().map(|e| format!("{e} ASC")).collect();
    let order_terms: Vec<String> = match req.order {
        OrderBy::MetricDesc => {
            let mut terms = vec![metric_desc.to_string()];
            terms.extend(keys_asc);
            terms
        }
        OrderBy::CountDesc => {
            let mut terms = vec!["row_count DESC".to_string()];
            terms.extend(keys_asc);
            terms
        }
        OrderBy::KeysAsc => keys_asc,
        OrderBy::KeysThenMetricDesc => {
            let mut keys = keys_asc.into_iter();
            let mut terms: Vec<String> = keys.next().into_iter().collect();
            terms.push(metric_desc.to_string());
            terms.extend(keys);
            terms
        }
    };

    let limit_clause = match req.limit {
        Some(limit) => {
            param_index += 1;
            binds.push(BindValue::BigInt(limit));
            format!(" LIMIT ${param_index}")
        }
        None => String::new(),
    };

    let sql = format!(
        "SELECT {} FROM real_estate{where_clause} GROUP BY {}{having_clause} ORDER BY {}{limit_clause}",
        select.join(", "),
        group_exprs.join(", "),
        order_terms.join(", "),
    );

    BuiltQuery { sql, binds }
}

/// Run one aggregate request and return its groups in database order.
pub async fn fetch_grouped(
    pool: &PgPool,
    req: &MetricRequest,
) -> Result<Vec<GroupedRow>, AppError> {
    req.validate()?;
    let BuiltQuery { sql, binds } = build_query(req);
    tracing::debug!(metric = req.metric, sql = %sql, "Running aggregate query");

    let mut query = sqlx::query_as::<_, GroupedRecord>(&sql);
    for bind in binds {
        query = match bind {
            BindValue::Text(v) => query.bind(v),
            BindValue::TextList(v) => query.bind(v),
            BindValue::BigInt(v) => query.bind(v),
            BindValue::Int(v) => query.bind(v),
        };
    }

    let width = req.dimensions.len();
    let rows = query
        .fetch_all(pool)
        .await
        .map_err(AppError::query(req.metric))?;

    Ok(rows.into_iter().map(|r| r.into_row(width)).collect())
}

/// Distinct non-empty values of a categorical column, ascending.
pub async fn fetch_distinct(
    pool: &PgPool,
    metric: &'static str,
    dimension: Dimension,
) -> Result<Vec<String>, AppError> {
    if dimension.is_temporal() {
        return Err(AppError::Validation(format!(
            "{metric}: distinct values are only listed for categorical columns"
        )));
    }
    let col = dimension.column();
    let sql = format!(
        "SELECT DISTINCT {col} FROM real_estate WHERE {col} IS NOT NULL AND {col} <> '' ORDER BY {col} ASC"
    );
    let values = sqlx::query_scalar::<_, String>(&sql)
        .fetch_all(pool)
        .await
        .map_err(AppError::query(metric))?;
    Ok(values)
}
