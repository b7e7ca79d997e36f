use sqlx::SqliteConnection;

/// Provisions the secondary indexes the analytics queries rely on.
/// Every statement is `CREATE INDEX IF NOT EXISTS`, so re-running is a
/// no-op; a failing index is logged and the remaining ones are still
/// attempted.
pub async fn apply_optimized_indexes(conn: &mut SqliteConnection) {
    log::info!("Starting database index optimization");

    // Composite indexes for merchant analytics
    create_index_if_not_exists(
        conn,
        "transactions",
        "idx_merchant_chain_date",
        &["merchant_id", "chain_id", "created_at"],
    )
    .await;
    create_index_if_not_exists(
        conn,
        "transactions",
        "idx_merchant_status_date",
        &["merchant_id", "status", "created_at"],
    )
    .await;
    create_index_if_not_exists(
        conn,
        "transactions",
        "idx_merchant_gas_date",
        &["merchant_id", "gas_used", "created_at"],
    )
    .await;

    // Composite indexes for chain analytics
    create_index_if_not_exists(
        conn,
        "transactions",
        "idx_chain_status_date",
        &["chain_id", "status", "created_at"],
    )
    .await;
    create_index_if_not_exists(
        conn,
        "transactions",
        "idx_chain_gas_date",
        &["chain_id", "gas_used", "created_at"],
    )
    .await;
    create_index_if_not_exists(
        conn,
        "transactions",
        "idx_chain_merchant_date",
        &["chain_id", "merchant_id", "created_at"],
    )
    .await;

    // Partial indexes for hot, narrow query patterns. SQLite rejects
    // non-deterministic functions in partial-index predicates, so the
    // success index cannot carry a rolling created_at window.
    create_partial_index_if_not_exists(
        conn,
        "transactions",
        "idx_recent_transactions",
        &["created_at", "status"],
        "status = 'success'",
    )
    .await;
    create_partial_index_if_not_exists(
        conn,
        "transactions",
        "idx_high_gas_transactions",
        &["gas_used", "created_at"],
        "gas_used > 1000000",
    )
    .await;
    create_partial_index_if_not_exists(
        conn,
        "transactions",
        "idx_failed_transactions",
        &["created_at", "error_message"],
        "status = 'failed' AND error_message IS NOT NULL",
    )
    .await;

    // Indexes for analysis results
    create_index_if_not_exists(
        conn,
        "analysis_results",
        "idx_analysis_merchant_chain_date",
        &["merchant_id", "chain_id", "created_at"],
    )
    .await;
    create_index_if_not_exists(
        conn,
        "analysis_results",
        "idx_analysis_language_status_date",
        &["language", "status", "created_at"],
    )
    .await;
    create_index_if_not_exists(
        conn,
        "analysis_results",
        "idx_analysis_savings_date",
        &["estimated_gas_savings", "created_at"],
    )
    .await;

    // Indexes for merchant listings
    create_index_if_not_exists(
        conn,
        "merchants",
        "idx_merchant_status_plan_date",
        &["status", "plan", "created_at"],
    )
    .await;
    create_index_if_not_exists(
        conn,
        "merchants",
        "idx_merchant_last_active",
        &["last_active_at", "status"],
    )
    .await;

    // Indexes for chain listings
    create_index_if_not_exists(
        conn,
        "chains",
        "idx_chain_status_type_date",
        &["status", "chain_type", "created_at"],
    )
    .await;
    create_index_if_not_exists(
        conn,
        "chains",
        "idx_chain_reliability_date",
        &["reliability_score", "created_at"],
    )
    .await;

    // Covering indexes for the dashboard query shape
    create_covering_index_if_not_exists(
        conn,
        "transactions",
        "idx_transaction_covering",
        &["merchant_id", "chain_id", "status", "created_at"],
        &["gas_used", "transaction_fee", "contract_address"],
    )
    .await;
    create_covering_index_if_not_exists(
        conn,
        "analysis_results",
        "idx_analysis_covering",
        &["merchant_id", "chain_id", "status", "created_at"],
        &["violation_count", "estimated_gas_savings", "language"],
    )
    .await;

    log::info!("Database index optimization completed");
}

async fn create_index_if_not_exists(
    conn: &mut SqliteConnection,
    table: &str,
    name: &str,
    columns: &[&str],
) {
    let query = format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
        name,
        table,
        columns.join(", ")
    );
    match sqlx::query(&query).execute(&mut *conn).await {
        Ok(_) => log::info!("Created index: {} on {}", name, table),
        Err(err) => log::error!("Failed to create index {}: {}", name, err),
    }
}

async fn create_partial_index_if_not_exists(
    conn: &mut SqliteConnection,
    table: &str,
    name: &str,
    columns: &[&str],
    condition: &str,
) {
    let query = format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({}) WHERE {}",
        name,
        table,
        columns.join(", "),
        condition
    );
    match sqlx::query(&query).execute(&mut *conn).await {
        Ok(_) => log::info!(
            "Created partial index: {} on {} with condition: {}",
            name,
            table,
            condition
        ),
        Err(err) => log::error!("Failed to create partial index {}: {}", name, err),
    }
}

/// Attempts a covering index with an INCLUDE payload; engines without
/// covering-index support (SQLite among them) fail the first statement and
/// get a plain composite index with the payload columns appended instead.
async fn create_covering_index_if_not_exists(
    conn: &mut SqliteConnection,
    table: &str,
    name: &str,
    indexed_columns: &[&str],
    included_columns: &[&str],
) {
    let query = format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({}) INCLUDE ({})",
        name,
        table,
        indexed_columns.join(", "),
        included_columns.join(", ")
    );
    if sqlx::query(&query).execute(&mut *conn).await.is_ok() {
        log::info!("Created covering index: {} on {}", name, table);
        return;
    }

    let fallback = format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({}, {})",
        name,
        table,
        indexed_columns.join(", "),
        included_columns.join(", ")
    );
    match sqlx::query(&fallback).execute(&mut *conn).await {
        Ok(_) => log::info!("Created fallback index: {} on {}", name, table),
        Err(err) => log::error!("Failed to create covering index {}: {}", name, err),
    }
}

/// Names of user-created indexes, excluding the ones SQLite maintains for
/// UNIQUE constraints.
pub async fn list_custom_indexes(
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, sqlx::Error> {
    let names = sqlx::query_scalar::<_, String>(
        r"SELECT name FROM sqlite_master WHERE type = 'index' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(conn)
    .await?;
    Ok(names)
}

/// Advisory pass over index statistics: refreshes the planner statistics
/// and logs indexes that collected none (candidates for removal). Purely
/// diagnostic, every failure is logged and swallowed.
pub async fn analyze_index_usage(conn: &mut SqliteConnection) {
    log::info!("Analyzing index usage");

    if let Err(err) = sqlx::query("ANALYZE").execute(&mut *conn).await {
        log::warn!("Failed to refresh index statistics: {}", err);
        return;
    }

    let indexes = match list_custom_indexes(&mut *conn).await {
        Ok(indexes) => indexes,
        Err(err) => {
            log::warn!("Failed to list indexes: {}", err);
            return;
        }
    };

    let stats = sqlx::query_as::<_, (String, String, String)>(
        r"SELECT tbl, idx, stat FROM sqlite_stat1 WHERE idx IS NOT NULL",
    )
    .fetch_all(&mut *conn)
    .await
    .unwrap_or_else(|err| {
        log::warn!("Failed to read index statistics: {}", err);
        Vec::new()
    });

    for (tbl, idx, stat) in &stats {
        log::info!("Index statistics: {} on {}: {}", idx, tbl, stat);
    }

    for index in &indexes {
        if !stats.iter().any(|(_, idx, _)| idx == index) {
            log::warn!("Index without collected statistics: {}", index);
        }
    }
}
