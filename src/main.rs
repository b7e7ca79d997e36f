mod options;

use chrono::{Duration, Utc};
use sqlx::SqliteConnection;

use gas_monitor_lib::config::Config;
use gas_monitor_lib::db::connection::create_sqlite_connection;
use gas_monitor_lib::db::indexes::{analyze_index_usage, apply_optimized_indexes};
use gas_monitor_lib::db::model::{AnalysisResultDao, ChainDao, MerchantDao, TransactionDao};
use gas_monitor_lib::db::ops::{
    get_chain_by_chain_id, insert_analysis_result, insert_chain, insert_merchant,
    insert_transaction, update_chain_metrics,
};
use gas_monitor_lib::error::AnalyticsError;
use gas_monitor_lib::runtime::start_analytics_server;
use gas_monitor_lib::setup::AnalyticsSetup;

use crate::options::{validated_cli, CliOptions};

#[tokio::main]
async fn main() -> Result<(), AnalyticsError> {
    let dotenv_result = dotenv::dotenv();
    env_logger::init();
    if dotenv_result.is_err() {
        log::debug!("No .env file found");
    }

    match validated_cli()? {
        CliOptions::Serve(options) => {
            let config = Config::load(&options.config)?;
            let runtime = start_analytics_server(config).await?;
            runtime
                .server_handle
                .await
                .map_err(|e| AnalyticsError::OtherError(format!("Server loop failed: {:?}", e)))??;
        }
        CliOptions::ProvisionIndexes(options) => {
            let config = Config::load(&options.config)?;
            let setup = AnalyticsSetup::new(&config)?;
            let mut conn = create_sqlite_connection(Some(&setup.db_filename), true).await?;
            apply_optimized_indexes(&mut conn).await;
            analyze_index_usage(&mut conn).await;
        }
        CliOptions::UpdateChainMetrics(options) => {
            let config = Config::load(&options.common.config)?;
            let setup = AnalyticsSetup::new(&config)?;
            let mut conn = create_sqlite_connection(Some(&setup.db_filename), true).await?;
            update_chain_metrics(&mut conn, &options.chain_id).await?;
            match get_chain_by_chain_id(&mut conn, &options.chain_id).await? {
                Some(chain) => log::info!(
                    "Updated metrics for chain {}: reliability {:.2}, {} settled transactions",
                    chain.chain_id,
                    chain.reliability_score,
                    chain.transaction_count
                ),
                None => log::warn!("No chain found with chain id {}", options.chain_id),
            }
        }
        CliOptions::SeedDemo(options) => {
            let config = Config::load(&options.config)?;
            let setup = AnalyticsSetup::new(&config)?;
            let mut conn = create_sqlite_connection(Some(&setup.db_filename), true).await?;
            seed_demo(&mut conn).await?;
        }
    }
    Ok(())
}

/// Inserts a deterministic demo dataset: two merchants, two chains, a few
/// days of transactions and a handful of analysis results, then refreshes
/// the chain metrics from the inserted data.
async fn seed_demo(conn: &mut SqliteConnection) -> Result<(), AnalyticsError> {
    let now = Utc::now();

    let merchants = [
        ("Aurora Payments", "aurora-payments", "pro", "standard"),
        ("Nebula Checkout", "nebula-checkout", "enterprise", "premium"),
    ];
    let mut merchant_ids = Vec::new();
    for (name, slug, plan, tier) in merchants {
        let merchant = MerchantDao {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
            description: format!("Demo merchant {}", name),
            status: "active".to_string(),
            plan: plan.to_string(),
            tier: tier.to_string(),
            website: None,
            email: None,
            country: Some("US".to_string()),
            last_active_at: Some(now),
            is_verified: true,
            category: Some("payments".to_string()),
            metadata: None,
            created_at: now - Duration::days(90),
            updated_at: now,
        };
        merchant.validate()?;
        let merchant = insert_merchant(conn, &merchant).await?;
        log::info!("Seeded merchant {} ({})", merchant.name, merchant.id);
        merchant_ids.push(merchant.id);
    }

    let chains = [
        ("Stellar Mainnet", "stellar-mainnet", "soroban", "XLM"),
        ("Polygon PoS", "polygon-pos", "evm", "MATIC"),
    ];
    for (name, chain_id, chain_type, currency) in &chains {
        let chain = ChainDao {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            chain_id: chain_id.to_string(),
            network: "mainnet".to_string(),
            status: "active".to_string(),
            chain_type: chain_type.to_string(),
            average_gas_price: None,
            gas_volatility: None,
            transaction_count: 0,
            reliability_score: 100.0,
            rpc_url: None,
            currency: Some(currency.to_string()),
            config: None,
            created_at: now - Duration::days(90),
            updated_at: now,
        };
        chain.validate()?;
        let chain = insert_chain(conn, &chain).await?;
        log::info!("Seeded chain {} ({})", chain.name, chain.chain_id);
    }

    for i in 0..48i64 {
        let failed = i % 7 == 3;
        let pending = !failed && i % 11 == 10;
        let status = if failed {
            "failed"
        } else if pending {
            "pending"
        } else {
            "success"
        };
        let gas_used = 50_000.0 + (i * 13_791 % 400_000) as f64;
        let tx = TransactionDao {
            id: uuid::Uuid::new_v4().to_string(),
            transaction_hash: format!("0x{:064x}", i + 1),
            merchant_id: merchant_ids[(i % 2) as usize].clone(),
            chain_id: chains[(i % 3 % 2) as usize].1.to_string(),
            contract_address: format!("0x{:040x}", 0xc0ffee + i),
            gas_used,
            gas_price: Some(12.0 + (i % 5) as f64),
            transaction_fee: gas_used * 0.000002,
            status: status.to_string(),
            transaction_type: "function_call".to_string(),
            function_name: Some("transfer".to_string()),
            function_params: None,
            error_message: if failed {
                Some("out of gas".to_string())
            } else {
                None
            },
            region: None,
            user_id: None,
            retry_count: 0,
            priority: None,
            created_at: now - Duration::hours(i * 3),
            updated_at: now - Duration::hours(i * 3),
        };
        tx.validate()?;
        insert_transaction(conn, &tx).await?;
    }
    log::info!("Seeded 48 transactions");

    let findings = [
        r#"[{"ruleName":"unused-storage","line":14},{"ruleName":"loop-gas","line":52}]"#,
        r#"[{"ruleName":"loop-gas","line":7}]"#,
        r#"[]"#,
    ];
    for (i, finding_set) in findings.iter().enumerate() {
        let violation_count = serde_json::from_str::<serde_json::Value>(finding_set)
            .ok()
            .and_then(|v| v.as_array().map(|a| a.len() as i64))
            .unwrap_or(0);
        let analysis = AnalysisResultDao {
            id: uuid::Uuid::new_v4().to_string(),
            merchant_id: merchant_ids[i % 2].clone(),
            chain_id: chains[i % 2].1.to_string(),
            contract_address: format!("0x{:040x}", 0xbeef + i),
            source_code: "contract Demo {}".to_string(),
            language: "solidity".to_string(),
            status: "completed".to_string(),
            findings: finding_set.to_string(),
            violation_count,
            estimated_gas_savings: Some(1200.0 * (i as f64 + 1.0)),
            estimated_cost_savings: None,
            analyzer_version: Some("1.4.2".to_string()),
            priority: None,
            error_message: None,
            metadata: None,
            created_at: now - Duration::days(i as i64),
            updated_at: now - Duration::days(i as i64),
        };
        analysis.validate()?;
        insert_analysis_result(conn, &analysis).await?;
    }
    log::info!("Seeded {} analysis results", findings.len());

    for (_, chain_id, _, _) in chains {
        update_chain_metrics(conn, chain_id).await?;
    }
    log::info!("Refreshed chain metrics from seeded transactions");

    Ok(())
}
