use crate::db::model::*;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;

/// Chains with a hundred or fewer successful transactions in the window are
/// dropped from volatility results; small samples produce meaningless
/// deviation figures.
pub const VOLATILITY_MIN_SAMPLE_SIZE: i64 = 100;

pub async fn insert_chain(
    conn: &mut SqliteConnection,
    chain: &ChainDao,
) -> Result<ChainDao, sqlx::Error> {
    let res = sqlx::query_as::<_, ChainDao>(
        r"INSERT INTO chains
(id, name, chain_id, network, status, chain_type, average_gas_price, gas_volatility, transaction_count, reliability_score, rpc_url, currency, config, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) RETURNING *;
",
    )
    .bind(&chain.id)
    .bind(&chain.name)
    .bind(&chain.chain_id)
    .bind(&chain.network)
    .bind(&chain.status)
    .bind(&chain.chain_type)
    .bind(chain.average_gas_price)
    .bind(chain.gas_volatility)
    .bind(chain.transaction_count)
    .bind(chain.reliability_score)
    .bind(&chain.rpc_url)
    .bind(&chain.currency)
    .bind(&chain.config)
    .bind(chain.created_at)
    .bind(chain.updated_at)
    .fetch_one(conn)
    .await?;
    Ok(res)
}

pub async fn get_chain_by_chain_id(
    conn: &mut SqliteConnection,
    chain_id: &str,
) -> Result<Option<ChainDao>, sqlx::Error> {
    let row = sqlx::query_as::<_, ChainDao>(r"SELECT * FROM chains WHERE chain_id = $1")
        .bind(chain_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Stored reliability data per chain together with success counters over
/// the requested window. Keyed by the business chain id so callers can
/// match rows against transaction aggregates.
pub async fn get_chain_reliability_metrics(
    conn: &mut SqliteConnection,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<Vec<ChainReliabilityRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ChainReliabilityRow>(
        r"SELECT c.chain_id AS chain_id,
c.name AS chain_name,
c.chain_type AS chain_type,
c.reliability_score AS reliability_score,
c.average_gas_price AS average_gas_price,
c.gas_volatility AS gas_volatility,
c.transaction_count AS total_transactions,
COUNT(t.id) AS recent_transactions,
COUNT(CASE WHEN t.status = 'success' THEN 1 END) * 100.0 / COUNT(t.id) AS success_rate
FROM chains c
JOIN transactions t ON t.chain_id = c.chain_id
WHERE t.created_at BETWEEN $1 AND $2
GROUP BY c.chain_id, c.name, c.chain_type, c.reliability_score, c.average_gas_price, c.gas_volatility, c.transaction_count
ORDER BY c.reliability_score DESC
",
    )
    .bind(start_date)
    .bind(end_date)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

#[derive(sqlx::FromRow, Debug, Clone)]
struct GasVolatilityScan {
    chain_id: String,
    chain_name: String,
    gas_variance: Option<f64>,
    avg_gas_used: f64,
    min_gas_used: f64,
    max_gas_used: f64,
    transaction_count: i64,
}

/// Standard deviation of successful gas usage per chain over the trailing
/// window. SQLite has no STDDEV aggregate, so the query returns the
/// population variance (ordering by it preserves the deviation order) and
/// the square root is taken here.
pub async fn get_gas_volatility_metrics(
    conn: &mut SqliteConnection,
    days: i64,
) -> Result<Vec<GasVolatilityRow>, sqlx::Error> {
    let cutoff_date = Utc::now() - Duration::days(days);
    let rows = sqlx::query_as::<_, GasVolatilityScan>(
        r"SELECT c.chain_id AS chain_id,
c.name AS chain_name,
AVG(t.gas_used * t.gas_used) - AVG(t.gas_used) * AVG(t.gas_used) AS gas_variance,
AVG(t.gas_used) AS avg_gas_used,
MIN(t.gas_used) AS min_gas_used,
MAX(t.gas_used) AS max_gas_used,
COUNT(t.id) AS transaction_count
FROM chains c
JOIN transactions t ON t.chain_id = c.chain_id
WHERE t.created_at >= $1
AND t.status = 'success'
GROUP BY c.chain_id, c.name
HAVING COUNT(t.id) > $2
ORDER BY gas_variance DESC
",
    )
    .bind(cutoff_date)
    .bind(VOLATILITY_MIN_SAMPLE_SIZE)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| GasVolatilityRow {
            chain_id: row.chain_id,
            chain_name: row.chain_name,
            gas_volatility: row.gas_variance.map(|v| v.max(0.0).sqrt()),
            avg_gas_used: row.avg_gas_used,
            min_gas_used: row.min_gas_used,
            max_gas_used: row.max_gas_used,
            transaction_count: row.transaction_count,
        })
        .collect())
}

pub async fn get_chain_performance_ranking(
    conn: &mut SqliteConnection,
) -> Result<Vec<ChainPerformanceRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ChainPerformanceRow>(
        r"SELECT chain_id AS chain_id,
name AS chain_name,
chain_type AS chain_type,
reliability_score AS reliability_score,
average_gas_price AS average_gas_price,
transaction_count AS total_transactions,
gas_volatility AS gas_volatility
FROM chains
ORDER BY reliability_score DESC, transaction_count DESC
",
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

#[derive(sqlx::FromRow, Debug, Clone)]
struct ChainMetricsScan {
    avg_gas_price: Option<f64>,
    gas_variance: Option<f64>,
    transaction_count: i64,
    success_rate: Option<f64>,
}

/// Recomputes a chain's derived metrics from its settled (success/failed)
/// transactions and writes them back. When the success rate yields no
/// value the reliability score falls back to 100. Read-then-write without
/// a transaction; concurrent refreshes of the same chain are last-write-
/// wins.
pub async fn update_chain_metrics(
    conn: &mut SqliteConnection,
    chain_id: &str,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query_as::<_, ChainMetricsScan>(
        r"SELECT AVG(gas_used) AS avg_gas_price,
AVG(gas_used * gas_used) - AVG(gas_used) * AVG(gas_used) AS gas_variance,
COUNT(id) AS transaction_count,
COUNT(CASE WHEN status = 'success' THEN 1 END) * 100.0 / COUNT(id) AS success_rate
FROM transactions
WHERE chain_id = $1
AND status IN ('success', 'failed')
GROUP BY chain_id
",
    )
    .bind(chain_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(metrics) = result {
        let _res = sqlx::query(
            r"UPDATE chains SET
average_gas_price = $2,
gas_volatility = $3,
transaction_count = $4,
reliability_score = $5,
updated_at = $6
WHERE chain_id = $1
",
        )
        .bind(chain_id)
        .bind(metrics.avg_gas_price)
        .bind(metrics.gas_variance.map(|v| v.max(0.0).sqrt()))
        .bind(metrics.transaction_count)
        .bind(metrics.success_rate.unwrap_or(100.0))
        .bind(Utc::now())
        .execute(conn)
        .await?;
    }
    Ok(())
}
