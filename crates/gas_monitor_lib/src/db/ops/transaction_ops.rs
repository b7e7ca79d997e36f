use crate::db::model::*;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

pub const TRANSACTION_FILTER_ALL: &str = "(id IS NOT NULL)";
pub const TRANSACTION_FILTER_SUCCESS: &str = "(status = 'success')";
pub const TRANSACTION_FILTER_FAILED: &str = "(status = 'failed')";
pub const TRANSACTION_FILTER_PENDING: &str = "(status = 'pending')";
pub const TRANSACTION_ORDER_BY_CREATED_DATE_DESC: &str = "created_at DESC";
pub const TRANSACTION_ORDER_BY_GAS_USED_DESC: &str = "gas_used DESC";

pub async fn insert_transaction(
    conn: &mut SqliteConnection,
    tx: &TransactionDao,
) -> Result<TransactionDao, sqlx::Error> {
    let res = sqlx::query_as::<_, TransactionDao>(
        r"INSERT INTO transactions
(id, transaction_hash, merchant_id, chain_id, contract_address, gas_used, gas_price, transaction_fee, status, transaction_type, function_name, function_params, error_message, region, user_id, retry_count, priority, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) RETURNING *;
",
    )
    .bind(&tx.id)
    .bind(&tx.transaction_hash)
    .bind(&tx.merchant_id)
    .bind(&tx.chain_id)
    .bind(&tx.contract_address)
    .bind(tx.gas_used)
    .bind(tx.gas_price)
    .bind(tx.transaction_fee)
    .bind(&tx.status)
    .bind(&tx.transaction_type)
    .bind(&tx.function_name)
    .bind(&tx.function_params)
    .bind(&tx.error_message)
    .bind(&tx.region)
    .bind(&tx.user_id)
    .bind(tx.retry_count)
    .bind(&tx.priority)
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .fetch_one(conn)
    .await?;
    Ok(res)
}

pub async fn get_transaction(
    conn: &mut SqliteConnection,
    tx_id: &str,
) -> Result<TransactionDao, sqlx::Error> {
    let row = sqlx::query_as::<_, TransactionDao>(r"SELECT * FROM transactions WHERE id = $1")
        .bind(tx_id)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn get_transactions(
    conn: &mut SqliteConnection,
    filter: Option<&str>,
    limit: Option<i64>,
    order: Option<&str>,
) -> Result<Vec<TransactionDao>, sqlx::Error> {
    let limit = limit.unwrap_or(i64::MAX);
    let filter = filter.unwrap_or(TRANSACTION_FILTER_ALL);
    let order = order.unwrap_or(TRANSACTION_ORDER_BY_CREATED_DATE_DESC);
    let rows = sqlx::query_as::<_, TransactionDao>(
        format!(
            r"SELECT * FROM transactions WHERE {} ORDER BY {} LIMIT {}",
            filter, order, limit
        )
        .as_str(),
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn get_transaction_count(
    conn: &mut SqliteConnection,
    filter: Option<&str>,
) -> Result<usize, sqlx::Error> {
    let filter = filter.unwrap_or(TRANSACTION_FILTER_ALL);
    let count = sqlx::query_scalar::<_, i64>(
        format!(r"SELECT COUNT(*) FROM transactions WHERE {}", filter).as_str(),
    )
    .fetch_one(conn)
    .await?;
    Ok(count as usize)
}

/// Corrects the mutable metadata of a recorded transaction and bumps
/// `updated_at`. The transaction fact columns (hash, amounts, status) stay
/// untouched.
pub async fn update_transaction_metadata(
    conn: &mut SqliteConnection,
    tx: &TransactionDao,
) -> Result<(), sqlx::Error> {
    let _res = sqlx::query(
        r"UPDATE transactions SET
function_name = $2,
function_params = $3,
error_message = $4,
region = $5,
user_id = $6,
retry_count = $7,
priority = $8,
updated_at = $9
WHERE id = $1
",
    )
    .bind(&tx.id)
    .bind(&tx.function_name)
    .bind(&tx.function_params)
    .bind(&tx.error_message)
    .bind(&tx.region)
    .bind(&tx.user_id)
    .bind(tx.retry_count)
    .bind(&tx.priority)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Per-day gas usage of one merchant's successful transactions.
pub async fn get_gas_usage_by_merchant(
    conn: &mut SqliteConnection,
    merchant_id: &str,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<Vec<GasUsageDay>, sqlx::Error> {
    let rows = sqlx::query_as::<_, GasUsageDay>(
        r"SELECT DATE(created_at) AS date,
SUM(gas_used) AS total_gas_used,
AVG(gas_used) AS avg_gas_used,
COUNT(id) AS transaction_count
FROM transactions
WHERE merchant_id = $1
AND created_at BETWEEN $2 AND $3
AND status = 'success'
GROUP BY DATE(created_at)
ORDER BY date ASC
",
    )
    .bind(merchant_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Success/failure counters over the filtered set. The success rate is
/// computed in SQL, where division by a zero count yields NULL instead of
/// an error, so an empty window decodes as `None`.
pub async fn get_transaction_success_metrics(
    conn: &mut SqliteConnection,
    merchant_id: Option<&str>,
    chain_id: Option<&str>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<TransactionSuccessMetrics, sqlx::Error> {
    let mut conditions: Vec<&str> = Vec::new();
    if merchant_id.is_some() {
        conditions.push("merchant_id = ?");
    }
    if chain_id.is_some() {
        conditions.push("chain_id = ?");
    }
    if start_date.is_some() && end_date.is_some() {
        conditions.push("created_at BETWEEN ? AND ?");
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        r"SELECT COUNT(id) AS total_transactions,
COUNT(CASE WHEN status = 'success' THEN 1 END) AS successful_transactions,
COUNT(CASE WHEN status = 'failed' THEN 1 END) AS failed_transactions,
AVG(gas_used) AS avg_gas_used,
SUM(transaction_fee) AS total_fees,
COUNT(CASE WHEN status = 'success' THEN 1 END) * 100.0 / COUNT(id) AS success_rate
FROM transactions{}",
        where_clause
    );

    let mut query = sqlx::query_as::<_, TransactionSuccessMetrics>(&sql);
    if let Some(merchant_id) = merchant_id {
        query = query.bind(merchant_id);
    }
    if let Some(chain_id) = chain_id {
        query = query.bind(chain_id);
    }
    if let (Some(start_date), Some(end_date)) = (start_date, end_date) {
        query = query.bind(start_date).bind(end_date);
    }

    let row = query.fetch_one(conn).await?;
    Ok(row)
}

/// Successful transactions whose gas usage exceeds the threshold
/// (strictly), hottest first.
pub async fn get_high_gas_transactions(
    conn: &mut SqliteConnection,
    limit: i64,
    threshold: f64,
) -> Result<Vec<TransactionDao>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TransactionDao>(
        r"SELECT * FROM transactions
WHERE gas_used > $1
AND status = 'success'
ORDER BY gas_used DESC
LIMIT $2
",
    )
    .bind(threshold)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn get_transaction_volume_by_chain(
    conn: &mut SqliteConnection,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<Vec<ChainVolumeRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ChainVolumeRow>(
        r"SELECT chain_id AS chain_id,
COUNT(id) AS transaction_count,
SUM(gas_used) AS total_gas_used,
AVG(gas_used) AS avg_gas_used,
SUM(transaction_fee) AS total_fees
FROM transactions
WHERE created_at BETWEEN $1 AND $2
GROUP BY chain_id
ORDER BY transaction_count DESC
",
    )
    .bind(start_date)
    .bind(end_date)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Failed transactions grouped by chain and error message; rows without an
/// error message are excluded.
pub async fn get_failed_transaction_analysis(
    conn: &mut SqliteConnection,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<Vec<FailedTransactionRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, FailedTransactionRow>(
        r"SELECT chain_id AS chain_id,
error_message AS error_message,
COUNT(id) AS count,
AVG(gas_used) AS avg_gas_used
FROM transactions
WHERE status = 'failed'
AND created_at BETWEEN $1 AND $2
AND error_message IS NOT NULL
GROUP BY chain_id, error_message
ORDER BY count DESC
LIMIT 20
",
    )
    .bind(start_date)
    .bind(end_date)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
