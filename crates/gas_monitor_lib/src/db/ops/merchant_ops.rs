use crate::db::model::*;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;

pub async fn insert_merchant(
    conn: &mut SqliteConnection,
    merchant: &MerchantDao,
) -> Result<MerchantDao, sqlx::Error> {
    let res = sqlx::query_as::<_, MerchantDao>(
        r"INSERT INTO merchants
(id, name, slug, description, status, plan, tier, website, email, country, last_active_at, is_verified, category, metadata, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) RETURNING *;
",
    )
    .bind(&merchant.id)
    .bind(&merchant.name)
    .bind(&merchant.slug)
    .bind(&merchant.description)
    .bind(&merchant.status)
    .bind(&merchant.plan)
    .bind(&merchant.tier)
    .bind(&merchant.website)
    .bind(&merchant.email)
    .bind(&merchant.country)
    .bind(merchant.last_active_at)
    .bind(merchant.is_verified)
    .bind(&merchant.category)
    .bind(&merchant.metadata)
    .bind(merchant.created_at)
    .bind(merchant.updated_at)
    .fetch_one(conn)
    .await?;
    Ok(res)
}

pub async fn get_merchant(
    conn: &mut SqliteConnection,
    merchant_id: &str,
) -> Result<MerchantDao, sqlx::Error> {
    let row = sqlx::query_as::<_, MerchantDao>(r"SELECT * FROM merchants WHERE id = $1")
        .bind(merchant_id)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn update_merchant_status(
    conn: &mut SqliteConnection,
    merchant_id: &str,
    status: &str,
) -> Result<(), sqlx::Error> {
    let _res = sqlx::query(r"UPDATE merchants SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(merchant_id)
        .bind(status)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

/// Per-merchant transaction totals in the window, busiest merchants first.
pub async fn get_merchant_analytics(
    conn: &mut SqliteConnection,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<Vec<MerchantAnalyticsRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MerchantAnalyticsRow>(
        r"SELECT m.id AS merchant_id,
m.name AS merchant_name,
m.plan AS plan,
m.status AS status,
COUNT(t.id) AS transaction_count,
SUM(t.gas_used) AS total_gas_used,
SUM(t.transaction_fee) AS total_fees,
AVG(t.gas_used) AS avg_gas_used
FROM merchants m
JOIN transactions t ON t.merchant_id = m.id
WHERE t.created_at BETWEEN $1 AND $2
GROUP BY m.id, m.name, m.plan, m.status
ORDER BY transaction_count DESC
",
    )
    .bind(start_date)
    .bind(end_date)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn get_active_merchants(
    conn: &mut SqliteConnection,
    days: i64,
) -> Result<Vec<MerchantDao>, sqlx::Error> {
    let cutoff_date = Utc::now() - Duration::days(days);
    let rows = sqlx::query_as::<_, MerchantDao>(
        r"SELECT * FROM merchants
WHERE status = 'active'
AND last_active_at >= $1
ORDER BY last_active_at DESC
",
    )
    .bind(cutoff_date)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Merchant counts over the window: total merchants existing by the end of
/// the window, merchants created inside it, and currently active ones.
pub async fn get_merchant_growth_stats(
    conn: &mut SqliteConnection,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<MerchantGrowthStats, sqlx::Error> {
    let total_merchants =
        sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM merchants WHERE created_at <= $1")
            .bind(end_date)
            .fetch_one(&mut *conn)
            .await?;

    let new_merchants = sqlx::query_scalar::<_, i64>(
        r"SELECT COUNT(*) FROM merchants WHERE created_at BETWEEN $1 AND $2",
    )
    .bind(start_date)
    .bind(end_date)
    .fetch_one(&mut *conn)
    .await?;

    let active_merchants =
        sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM merchants WHERE status = 'active'")
            .fetch_one(&mut *conn)
            .await?;

    let growth_rate = if total_merchants > 0 {
        new_merchants as f64 * 100.0 / total_merchants as f64
    } else {
        0.0
    };

    Ok(MerchantGrowthStats {
        total_merchants,
        new_merchants,
        active_merchants,
        growth_rate,
    })
}
