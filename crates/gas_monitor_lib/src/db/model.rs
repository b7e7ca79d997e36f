use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AnalyticsError;

pub const TRANSACTION_STATUSES: [&str; 3] = ["success", "failed", "pending"];
pub const TRANSACTION_TYPES: [&str; 3] = ["deployment", "function_call", "transfer"];
pub const TRANSACTION_PRIORITIES: [&str; 4] = ["low", "medium", "high", "critical"];
pub const MERCHANT_STATUSES: [&str; 3] = ["active", "inactive", "suspended"];
pub const MERCHANT_PLANS: [&str; 3] = ["free", "pro", "enterprise"];
pub const MERCHANT_TIERS: [&str; 3] = ["basic", "standard", "premium"];
pub const CHAIN_NETWORKS: [&str; 3] = ["mainnet", "testnet", "devnet"];
pub const CHAIN_STATUSES: [&str; 3] = ["active", "inactive", "maintenance"];
pub const CHAIN_TYPES: [&str; 4] = ["evm", "soroban", "cosmos", "other"];
pub const ANALYSIS_LANGUAGES: [&str; 3] = ["solidity", "rust", "vyper"];
pub const ANALYSIS_STATUSES: [&str; 3] = ["completed", "failed", "pending"];

fn check_token(field: &str, value: &str, allowed: &[&str]) -> Result<(), AnalyticsError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AnalyticsError::ValidationError(format!(
            "Invalid {}: {}",
            field, value
        )))
    }
}

/// One recorded blockchain transaction. Rows are immutable facts once
/// written, updates only touch metadata columns.
#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDao {
    pub id: String,
    pub transaction_hash: String,
    pub merchant_id: String,
    pub chain_id: String,
    pub contract_address: String,
    pub gas_used: f64,
    pub gas_price: Option<f64>,
    pub transaction_fee: f64,
    pub status: String,
    pub transaction_type: String,
    pub function_name: Option<String>,
    pub function_params: Option<String>,
    pub error_message: Option<String>,
    pub region: Option<String>,
    pub user_id: Option<String>,
    pub retry_count: i64,
    pub priority: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionDao {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        check_token("status", &self.status, &TRANSACTION_STATUSES)?;
        check_token(
            "transaction type",
            &self.transaction_type,
            &TRANSACTION_TYPES,
        )?;
        if let Some(priority) = &self.priority {
            check_token("priority", priority, &TRANSACTION_PRIORITIES)?;
        }
        if self.gas_used < 0.0 {
            return Err(AnalyticsError::ValidationError(format!(
                "Negative gas used: {}",
                self.gas_used
            )));
        }
        if self.transaction_fee < 0.0 {
            return Err(AnalyticsError::ValidationError(format!(
                "Negative transaction fee: {}",
                self.transaction_fee
            )));
        }
        if self.retry_count < 0 {
            return Err(AnalyticsError::ValidationError(format!(
                "Negative retry count: {}",
                self.retry_count
            )));
        }
        Ok(())
    }
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MerchantDao {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub status: String,
    pub plan: String,
    pub tier: String,
    pub website: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub category: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MerchantDao {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.name.is_empty() {
            return Err(AnalyticsError::ValidationError(
                "Merchant name cannot be empty".to_string(),
            ));
        }
        if self.slug.is_empty() {
            return Err(AnalyticsError::ValidationError(
                "Merchant slug cannot be empty".to_string(),
            ));
        }
        check_token("status", &self.status, &MERCHANT_STATUSES)?;
        check_token("plan", &self.plan, &MERCHANT_PLANS)?;
        check_token("tier", &self.tier, &MERCHANT_TIERS)?;
        Ok(())
    }
}

/// A tracked blockchain network. The `average_gas_price`, `gas_volatility`,
/// `transaction_count` and `reliability_score` columns are derived from
/// transaction aggregates and only written by `update_chain_metrics`.
#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChainDao {
    pub id: String,
    pub name: String,
    pub chain_id: String,
    pub network: String,
    pub status: String,
    pub chain_type: String,
    pub average_gas_price: Option<f64>,
    pub gas_volatility: Option<f64>,
    pub transaction_count: i64,
    pub reliability_score: f64,
    pub rpc_url: Option<String>,
    pub currency: Option<String>,
    pub config: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChainDao {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.name.is_empty() {
            return Err(AnalyticsError::ValidationError(
                "Chain name cannot be empty".to_string(),
            ));
        }
        if self.chain_id.is_empty() {
            return Err(AnalyticsError::ValidationError(
                "Chain id cannot be empty".to_string(),
            ));
        }
        check_token("network", &self.network, &CHAIN_NETWORKS)?;
        check_token("status", &self.status, &CHAIN_STATUSES)?;
        check_token("chain type", &self.chain_type, &CHAIN_TYPES)?;
        if !(0.0..=100.0).contains(&self.reliability_score) {
            return Err(AnalyticsError::ValidationError(format!(
                "Reliability score out of range: {}",
                self.reliability_score
            )));
        }
        Ok(())
    }
}

/// Outcome of one static-analysis run. `findings` holds the JSON array of
/// violation records; immutable once status is terminal.
#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResultDao {
    pub id: String,
    pub merchant_id: String,
    pub chain_id: String,
    pub contract_address: String,
    pub source_code: String,
    pub language: String,
    pub status: String,
    pub findings: String,
    pub violation_count: i64,
    pub estimated_gas_savings: Option<f64>,
    pub estimated_cost_savings: Option<f64>,
    pub analyzer_version: Option<String>,
    pub priority: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisResultDao {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        check_token("language", &self.language, &ANALYSIS_LANGUAGES)?;
        check_token("status", &self.status, &ANALYSIS_STATUSES)?;

        let findings: serde_json::Value = serde_json::from_str(&self.findings)
            .map_err(|e| AnalyticsError::ValidationError(format!("Invalid findings: {}", e)))?;
        let findings_len = findings
            .as_array()
            .ok_or_else(|| {
                AnalyticsError::ValidationError("Findings must be an array".to_string())
            })?
            .len();
        if self.violation_count != findings_len as i64 {
            return Err(AnalyticsError::ValidationError(format!(
                "Violation count {} does not match findings length {}",
                self.violation_count, findings_len
            )));
        }

        if (self.status == "failed") != self.error_message.is_some() {
            return Err(AnalyticsError::ValidationError(
                "Error message must be set exactly when status is failed".to_string(),
            ));
        }
        Ok(())
    }
}

// Aggregate read-model rows. Column aliases in the repository queries line
// up with the snake_case field names; serialization is camelCase like the
// entity DAOs.

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSuccessMetrics {
    pub total_transactions: i64,
    pub successful_transactions: i64,
    pub failed_transactions: i64,
    pub avg_gas_used: Option<f64>,
    pub total_fees: Option<f64>,
    pub success_rate: Option<f64>,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GasUsageDay {
    pub date: String,
    pub total_gas_used: f64,
    pub avg_gas_used: f64,
    pub transaction_count: i64,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChainVolumeRow {
    pub chain_id: String,
    pub transaction_count: i64,
    pub total_gas_used: f64,
    pub avg_gas_used: f64,
    pub total_fees: f64,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FailedTransactionRow {
    pub chain_id: String,
    pub error_message: String,
    pub count: i64,
    pub avg_gas_used: f64,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MerchantAnalyticsRow {
    pub merchant_id: String,
    pub merchant_name: String,
    pub plan: String,
    pub status: String,
    pub transaction_count: i64,
    pub total_gas_used: f64,
    pub total_fees: f64,
    pub avg_gas_used: f64,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MerchantGrowthStats {
    pub total_merchants: i64,
    pub new_merchants: i64,
    pub active_merchants: i64,
    pub growth_rate: f64,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChainReliabilityRow {
    pub chain_id: String,
    pub chain_name: String,
    pub chain_type: String,
    pub reliability_score: f64,
    pub average_gas_price: Option<f64>,
    pub gas_volatility: Option<f64>,
    pub total_transactions: i64,
    pub recent_transactions: i64,
    pub success_rate: Option<f64>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GasVolatilityRow {
    pub chain_id: String,
    pub chain_name: String,
    pub gas_volatility: Option<f64>,
    pub avg_gas_used: f64,
    pub min_gas_used: f64,
    pub max_gas_used: f64,
    pub transaction_count: i64,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChainPerformanceRow {
    pub chain_id: String,
    pub chain_name: String,
    pub chain_type: String,
    pub reliability_score: f64,
    pub average_gas_price: Option<f64>,
    pub total_transactions: i64,
    pub gas_volatility: Option<f64>,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummaryRow {
    pub total_analyses: i64,
    pub avg_violations: Option<f64>,
    pub total_violations: Option<i64>,
    pub avg_gas_savings: Option<f64>,
    pub total_gas_savings: Option<f64>,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolationRow {
    pub rule_name: String,
    pub violation_count: i64,
    pub total_gas_savings: Option<f64>,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDistributionRow {
    pub language: String,
    pub analysis_count: i64,
    pub avg_violations: Option<f64>,
    pub total_gas_savings: Option<f64>,
}

#[derive(Serialize, sqlx::FromRow, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTrendRow {
    pub date: String,
    pub analysis_count: i64,
    pub avg_violations: Option<f64>,
    pub daily_gas_savings: Option<f64>,
}
