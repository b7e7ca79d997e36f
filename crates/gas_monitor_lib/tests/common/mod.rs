#![allow(dead_code)]

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use gas_monitor_lib::db::connection::create_sqlite_pool;
use gas_monitor_lib::db::model::*;

/// Pool over a throwaway sqlite file; in-memory databases are per
/// connection, so pooled tests need a real file.
pub async fn temp_pool() -> SqlitePool {
    let path = std::env::temp_dir().join(format!("gas_monitor_test_{}.sqlite", Uuid::new_v4()));
    create_sqlite_pool(Some(path.to_str().unwrap()), 5, 1000, true)
        .await
        .unwrap()
}

pub fn transaction(
    merchant_id: &str,
    chain_id: &str,
    gas_used: f64,
    status: &str,
    created_at: DateTime<Utc>,
) -> TransactionDao {
    TransactionDao {
        id: Uuid::new_v4().to_string(),
        transaction_hash: format!("0x{}", Uuid::new_v4().simple()),
        merchant_id: merchant_id.to_string(),
        chain_id: chain_id.to_string(),
        contract_address: "0x00000000000000000000000000000000c0ffee00".to_string(),
        gas_used,
        gas_price: Some(15.0),
        transaction_fee: gas_used * 0.000002,
        status: status.to_string(),
        transaction_type: "function_call".to_string(),
        function_name: Some("transfer".to_string()),
        function_params: None,
        error_message: if status == "failed" {
            Some("out of gas".to_string())
        } else {
            None
        },
        region: None,
        user_id: None,
        retry_count: 0,
        priority: None,
        created_at,
        updated_at: created_at,
    }
}

pub fn merchant(name: &str, slug: &str, created_at: DateTime<Utc>) -> MerchantDao {
    MerchantDao {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        slug: slug.to_string(),
        description: format!("{} test merchant", name),
        status: "active".to_string(),
        plan: "pro".to_string(),
        tier: "standard".to_string(),
        website: None,
        email: None,
        country: None,
        last_active_at: None,
        is_verified: false,
        category: None,
        metadata: None,
        created_at,
        updated_at: created_at,
    }
}

pub fn chain(name: &str, chain_id: &str, reliability_score: f64) -> ChainDao {
    let now = Utc::now();
    ChainDao {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        chain_id: chain_id.to_string(),
        network: "mainnet".to_string(),
        status: "active".to_string(),
        chain_type: "evm".to_string(),
        average_gas_price: None,
        gas_volatility: None,
        transaction_count: 0,
        reliability_score,
        rpc_url: None,
        currency: None,
        config: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn analysis(
    merchant_id: &str,
    chain_id: &str,
    findings: &str,
    estimated_gas_savings: Option<f64>,
    created_at: DateTime<Utc>,
) -> AnalysisResultDao {
    let violation_count = serde_json::from_str::<serde_json::Value>(findings)
        .ok()
        .and_then(|value| value.as_array().map(|array| array.len() as i64))
        .unwrap_or(0);
    AnalysisResultDao {
        id: Uuid::new_v4().to_string(),
        merchant_id: merchant_id.to_string(),
        chain_id: chain_id.to_string(),
        contract_address: "0x00000000000000000000000000000000beef0000".to_string(),
        source_code: "contract Fixture {}".to_string(),
        language: "solidity".to_string(),
        status: "completed".to_string(),
        findings: findings.to_string(),
        violation_count,
        estimated_gas_savings,
        estimated_cost_savings: None,
        analyzer_version: Some("1.4.2".to_string()),
        priority: None,
        error_message: None,
        metadata: None,
        created_at,
        updated_at: created_at,
    }
}
