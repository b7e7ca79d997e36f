use crate::db::model::*;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;

pub async fn insert_analysis_result(
    conn: &mut SqliteConnection,
    analysis: &AnalysisResultDao,
) -> Result<AnalysisResultDao, sqlx::Error> {
    let res = sqlx::query_as::<_, AnalysisResultDao>(
        r"INSERT INTO analysis_results
(id, merchant_id, chain_id, contract_address, source_code, language, status, findings, violation_count, estimated_gas_savings, estimated_cost_savings, analyzer_version, priority, error_message, metadata, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) RETURNING *;
",
    )
    .bind(&analysis.id)
    .bind(&analysis.merchant_id)
    .bind(&analysis.chain_id)
    .bind(&analysis.contract_address)
    .bind(&analysis.source_code)
    .bind(&analysis.language)
    .bind(&analysis.status)
    .bind(&analysis.findings)
    .bind(analysis.violation_count)
    .bind(analysis.estimated_gas_savings)
    .bind(analysis.estimated_cost_savings)
    .bind(&analysis.analyzer_version)
    .bind(&analysis.priority)
    .bind(&analysis.error_message)
    .bind(&analysis.metadata)
    .bind(analysis.created_at)
    .bind(analysis.updated_at)
    .fetch_one(conn)
    .await?;
    Ok(res)
}

pub async fn get_analysis_result(
    conn: &mut SqliteConnection,
    analysis_id: &str,
) -> Result<AnalysisResultDao, sqlx::Error> {
    let row =
        sqlx::query_as::<_, AnalysisResultDao>(r"SELECT * FROM analysis_results WHERE id = $1")
            .bind(analysis_id)
            .fetch_one(conn)
            .await?;
    Ok(row)
}

pub async fn get_analysis_summary(
    conn: &mut SqliteConnection,
    merchant_id: Option<&str>,
    chain_id: Option<&str>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<AnalysisSummaryRow, sqlx::Error> {
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
        r"SELECT COUNT(id) AS total_analyses,
AVG(violation_count) AS avg_violations,
SUM(violation_count) AS total_violations,
AVG(estimated_gas_savings) AS avg_gas_savings,
SUM(estimated_gas_savings) AS total_gas_savings
FROM analysis_results{}",
        where_clause
    );

    let mut query = sqlx::query_as::<_, AnalysisSummaryRow>(&sql);
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

/// Unnests every result's findings array (one row per violation), groups by
/// rule name and counts occurrences. Findings without a `ruleName` key are
/// excluded. As with the source data, savings are summed once per unnested
/// violation row.
pub async fn get_top_rule_violations(
    conn: &mut SqliteConnection,
    limit: i64,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<Vec<RuleViolationRow>, sqlx::Error> {
    let date_clause = if start_date.is_some() && end_date.is_some() {
        " AND a.created_at BETWEEN ? AND ?"
    } else {
        ""
    };

    let sql = format!(
        r"SELECT json_extract(v.value, '$.ruleName') AS rule_name,
COUNT(*) AS violation_count,
SUM(a.estimated_gas_savings) AS total_gas_savings
FROM analysis_results a, json_each(a.findings) v
WHERE json_extract(v.value, '$.ruleName') IS NOT NULL{}
GROUP BY rule_name
ORDER BY violation_count DESC
LIMIT ?",
        date_clause
    );

    let mut query = sqlx::query_as::<_, RuleViolationRow>(&sql);
    if let (Some(start_date), Some(end_date)) = (start_date, end_date) {
        query = query.bind(start_date).bind(end_date);
    }
    query = query.bind(limit);

    let rows = query.fetch_all(conn).await?;
    Ok(rows)
}

pub async fn get_language_distribution(
    conn: &mut SqliteConnection,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<Vec<LanguageDistributionRow>, sqlx::Error> {
    let date_clause = if start_date.is_some() && end_date.is_some() {
        " WHERE created_at BETWEEN ? AND ?"
    } else {
        ""
    };

    let sql = format!(
        r"SELECT language AS language,
COUNT(id) AS analysis_count,
AVG(violation_count) AS avg_violations,
SUM(estimated_gas_savings) AS total_gas_savings
FROM analysis_results{}
GROUP BY language
ORDER BY analysis_count DESC",
        date_clause
    );

    let mut query = sqlx::query_as::<_, LanguageDistributionRow>(&sql);
    if let (Some(start_date), Some(end_date)) = (start_date, end_date) {
        query = query.bind(start_date).bind(end_date);
    }

    let rows = query.fetch_all(conn).await?;
    Ok(rows)
}

pub async fn get_analysis_trend(
    conn: &mut SqliteConnection,
    days: i64,
) -> Result<Vec<AnalysisTrendRow>, sqlx::Error> {
    let cutoff_date = Utc::now() - Duration::days(days);
    let rows = sqlx::query_as::<_, AnalysisTrendRow>(
        r"SELECT DATE(created_at) AS date,
COUNT(id) AS analysis_count,
AVG(violation_count) AS avg_violations,
SUM(estimated_gas_savings) AS daily_gas_savings
FROM analysis_results
WHERE created_at >= $1
GROUP BY DATE(created_at)
ORDER BY date ASC
",
    )
    .bind(cutoff_date)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
