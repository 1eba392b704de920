//! Development seed: populates a fresh database with sample transactions.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` (reads .env).

use chrono::NaiveDate;
use sqlx::PgPool;

const AREAS: [(&str, f64); 8] = [
    ("Palm Jumeirah", 9_500_000.0),
    ("Marsa Dubai", 3_200_000.0),
    ("Business Bay", 2_100_000.0),
    ("Burj Khalifa", 4_800_000.0),
    ("Al Barsha South Fourth", 1_150_000.0),
    ("Jumeirah Village Circle", 900_000.0),
    ("Al Warsan First", 650_000.0),
    ("Hadaeq Sheikh Mohammed Bin Rashid", 2_700_000.0),
];

const PROPERTY_TYPES: [&str; 4] = ["Unit", "Villa", "Land", "Building"];

const USAGES: [&str; 3] = ["Residential", "Commercial", "Hospitality"];

const ROOMS: [&str; 6] = ["Studio", "1 B/R", "2 B/R", "3 B/R", "4 B/R", "Office"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Run migrations first
    realestate_analytics::db::migrate(&pool).await?;

    println!("=== Real-Estate Analytics Seed Script ===");

    seed_transactions(&pool).await?;
    seed_incomplete_records(&pool).await?;

    println!("\n=== Seed complete! ===");

    Ok(())
}

async fn seed_transactions(pool: &PgPool) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM real_estate")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        println!("[skip] Transactions already exist ({count})");
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0u32;

    // Deterministic spread: busier areas get more transactions per month,
    // prices drift upward by year.
    for (area_idx, &(area, base_price)) in AREAS.iter().enumerate() {
        let per_month = (AREAS.len() - area_idx) as u32;
        for year in 2012..=2024 {
            for month in 1..=12u32 {
                for n in 0..per_month {
                    let seq = area_idx as u32 * 31 + month * 7 + n;
                    let property_type = PROPERTY_TYPES[(seq as usize) % PROPERTY_TYPES.len()];
                    let usage = USAGES[(seq as usize / 3) % USAGES.len()];
                    let rooms = ROOMS[(seq as usize) % ROOMS.len()];
                    let drift = 1.0 + f64::from(year - 2012) * 0.04;
                    let jitter = 0.85 + f64::from(seq % 30) / 100.0;
                    let worth = (base_price * drift * jitter).round();
                    let day = 1 + (n % 28);
                    let date = NaiveDate::from_ymd_opt(year, month, day)
                        .ok_or_else(|| anyhow::anyhow!("invalid date {year}-{month}-{day}"))?;

                    sqlx::query(
                        "INSERT INTO real_estate (transaction_id, instance_date, area_name_en,
                         property_type_en, property_usage_en, rooms_en, actual_worth)
                         VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    )
                    .bind(format!("SEED-{area_idx}-{year}-{month:02}-{n}"))
                    .bind(date)
                    .bind(area)
                    .bind(property_type)
                    .bind(usage)
                    .bind(rooms)
                    .bind(worth)
                    .execute(&mut *tx)
                    .await?;
                    inserted += 1;
                }
            }
        }
    }

    tx.commit().await?;
    println!("[done] Created {inserted} sample transactions");
    Ok(())
}

/// Rows with missing categories or worth, to exercise the missing-category policies.
async fn seed_incomplete_records(pool: &PgPool) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM real_estate WHERE transaction_id LIKE 'SEED-GAP-%'",
    )
    .fetch_one(pool)
    .await?;

    if count > 0 {
        println!("[skip] Incomplete records already exist ({count})");
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO real_estate (transaction_id, instance_date, area_name_en,
         property_type_en, property_usage_en, rooms_en, actual_worth)
         VALUES
            ('SEED-GAP-1', '2023-05-10', NULL, 'Unit', 'Residential', NULL, 1200000),
            ('SEED-GAP-2', '2023-06-02', 'Business Bay', NULL, '', '2 B/R', 0),
            ('SEED-GAP-3', NULL, 'Marsa Dubai', 'Unit', 'Residential', '1 B/R', NULL)",
    )
    .execute(pool)
    .await?;

    println!("[done] Created 3 incomplete records");
    Ok(())
}
