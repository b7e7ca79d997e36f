use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::db::model::*;
use crate::db::ops::*;
use crate::error::AnalyticsError;

pub const DASHBOARD_TOP_LIMIT: usize = 10;
pub const TREND_WINDOW_DAYS: i64 = 30;
pub const ACTIVE_MERCHANT_WINDOW_DAYS: i64 = 7;
pub const MONITORING_HIGH_GAS_LIMIT: i64 = 20;

/// Lookback window token anchored at the request's evaluation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Last24h,
    Last7d,
    Last30d,
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Last7d
    }
}

impl FromStr for TimeRange {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(TimeRange::Last24h),
            "7d" => Ok(TimeRange::Last7d),
            "30d" => Ok(TimeRange::Last30d),
            other => Err(AnalyticsError::ParsingError(format!(
                "Invalid time range: {}",
                other
            ))),
        }
    }
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last24h => "24h",
            TimeRange::Last7d => "7d",
            TimeRange::Last30d => "30d",
        }
    }

    pub fn start_date(&self, end_date: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Last24h => end_date - Duration::hours(24),
            TimeRange::Last7d => end_date - Duration::days(7),
            TimeRange::Last30d => end_date - Duration::days(30),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub time_range: String,
    pub period: Period,
    pub transaction_metrics: TransactionSuccessMetrics,
    pub top_merchants: Vec<MerchantAnalyticsRow>,
    pub chain_metrics: Vec<ChainReliabilityRow>,
    pub analysis_summary: AnalysisSummaryRow,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MerchantAnalytics {
    pub merchant_id: String,
    pub time_range: String,
    pub period: Period,
    pub gas_usage_trend: Vec<GasUsageDay>,
    pub transaction_metrics: TransactionSuccessMetrics,
    pub analysis_summary: AnalysisSummaryRow,
    pub high_gas_transactions: Vec<TransactionDao>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChainAnalytics {
    pub chain_id: String,
    pub time_range: String,
    pub period: Period,
    pub transaction_metrics: Option<ChainVolumeRow>,
    pub reliability_metrics: Option<ChainReliabilityRow>,
    pub gas_volatility: Option<GasVolatilityRow>,
    pub failed_transaction_analysis: Vec<FailedTransactionRow>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetrics {
    pub time_range: String,
    pub period: Period,
    pub summary: AnalysisSummaryRow,
    pub top_rule_violations: Vec<RuleViolationRow>,
    pub language_distribution: Vec<LanguageDistributionRow>,
    pub trend_data: Vec<AnalysisTrendRow>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringCounters {
    pub high_gas_transactions: usize,
    pub active_merchants: usize,
    pub total_chains: usize,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceIndicators {
    pub avg_chain_reliability: Option<f64>,
    pub top_performing_chain: Option<String>,
    pub lowest_reliability_chain: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub monitoring: MonitoringCounters,
    pub performance_indicators: PerformanceIndicators,
    pub updated_at: DateTime<Utc>,
}

/// Assembles the composite dashboard read-models. Each composite fans its
/// sub-queries out on separate pooled connections and joins on all of them;
/// one failing branch fails the whole response.
#[derive(Clone)]
pub struct AnalyticsService {
    pool: SqlitePool,
    high_gas_threshold: f64,
}

impl AnalyticsService {
    pub fn new(pool: SqlitePool, high_gas_threshold: f64) -> Self {
        AnalyticsService {
            pool,
            high_gas_threshold,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get_dashboard_analytics(
        &self,
        time_range: TimeRange,
    ) -> Result<DashboardAnalytics, AnalyticsError> {
        let end_date = Utc::now();
        let start_date = time_range.start_date(end_date);

        let res = tokio::try_join!(
            async {
                let mut conn = self.pool.acquire().await?;
                get_transaction_success_metrics(&mut conn, None, None, Some(start_date), Some(end_date))
                    .await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_merchant_analytics(&mut conn, start_date, end_date).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_chain_reliability_metrics(&mut conn, start_date, end_date).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_analysis_summary(&mut conn, None, None, Some(start_date), Some(end_date)).await
            },
        );
        let (transaction_metrics, mut top_merchants, mut chain_metrics, analysis_summary) = res
            .map_err(|err| {
                log::error!("Failed to get dashboard analytics: {}", err);
                AnalyticsError::from(err)
            })?;

        top_merchants.truncate(DASHBOARD_TOP_LIMIT);
        chain_metrics.truncate(DASHBOARD_TOP_LIMIT);

        Ok(DashboardAnalytics {
            time_range: time_range.as_str().to_string(),
            period: Period {
                start_date,
                end_date,
            },
            transaction_metrics,
            top_merchants,
            chain_metrics,
            analysis_summary,
            updated_at: Utc::now(),
        })
    }

    pub async fn get_merchant_analytics(
        &self,
        merchant_id: &str,
        time_range: TimeRange,
    ) -> Result<MerchantAnalytics, AnalyticsError> {
        let end_date = Utc::now();
        let start_date = time_range.start_date(end_date);

        let res = tokio::try_join!(
            async {
                let mut conn = self.pool.acquire().await?;
                get_gas_usage_by_merchant(&mut conn, merchant_id, start_date, end_date).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_transaction_success_metrics(
                    &mut conn,
                    Some(merchant_id),
                    None,
                    Some(start_date),
                    Some(end_date),
                )
                .await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_analysis_summary(
                    &mut conn,
                    Some(merchant_id),
                    None,
                    Some(start_date),
                    Some(end_date),
                )
                .await
            },
            // Deliberately unscoped: the platform-wide gas hogs are shown on
            // every merchant page.
            async {
                let mut conn = self.pool.acquire().await?;
                get_high_gas_transactions(&mut conn, DASHBOARD_TOP_LIMIT as i64, self.high_gas_threshold)
                    .await
            },
        );
        let (gas_usage_trend, transaction_metrics, analysis_summary, high_gas_transactions) = res
            .map_err(|err| {
                log::error!(
                    "Failed to get merchant analytics for {}: {}",
                    merchant_id,
                    err
                );
                AnalyticsError::from(err)
            })?;

        Ok(MerchantAnalytics {
            merchant_id: merchant_id.to_string(),
            time_range: time_range.as_str().to_string(),
            period: Period {
                start_date,
                end_date,
            },
            gas_usage_trend,
            transaction_metrics,
            analysis_summary,
            high_gas_transactions,
            updated_at: Utc::now(),
        })
    }

    pub async fn get_chain_analytics(
        &self,
        chain_id: &str,
        time_range: TimeRange,
    ) -> Result<ChainAnalytics, AnalyticsError> {
        let end_date = Utc::now();
        let start_date = time_range.start_date(end_date);

        let res = tokio::try_join!(
            async {
                let mut conn = self.pool.acquire().await?;
                get_transaction_volume_by_chain(&mut conn, start_date, end_date).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_chain_reliability_metrics(&mut conn, start_date, end_date).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_gas_volatility_metrics(&mut conn, TREND_WINDOW_DAYS).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_failed_transaction_analysis(&mut conn, start_date, end_date).await
            },
        );
        let (transaction_volume, reliability_metrics, gas_volatility, failed_analysis) = res
            .map_err(|err| {
                log::error!("Failed to get chain analytics for {}: {}", chain_id, err);
                AnalyticsError::from(err)
            })?;

        Ok(ChainAnalytics {
            chain_id: chain_id.to_string(),
            time_range: time_range.as_str().to_string(),
            period: Period {
                start_date,
                end_date,
            },
            transaction_metrics: transaction_volume
                .into_iter()
                .find(|row| row.chain_id == chain_id),
            reliability_metrics: reliability_metrics
                .into_iter()
                .find(|row| row.chain_id == chain_id),
            gas_volatility: gas_volatility
                .into_iter()
                .find(|row| row.chain_id == chain_id),
            failed_transaction_analysis: failed_analysis
                .into_iter()
                .filter(|row| row.chain_id == chain_id)
                .collect(),
            updated_at: Utc::now(),
        })
    }

    pub async fn get_analysis_metrics(
        &self,
        time_range: TimeRange,
    ) -> Result<AnalysisMetrics, AnalyticsError> {
        let end_date = Utc::now();
        let start_date = time_range.start_date(end_date);

        let res = tokio::try_join!(
            async {
                let mut conn = self.pool.acquire().await?;
                get_analysis_summary(&mut conn, None, None, Some(start_date), Some(end_date)).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_top_rule_violations(
                    &mut conn,
                    DASHBOARD_TOP_LIMIT as i64,
                    Some(start_date),
                    Some(end_date),
                )
                .await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_language_distribution(&mut conn, Some(start_date), Some(end_date)).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_analysis_trend(&mut conn, TREND_WINDOW_DAYS).await
            },
        );
        let (summary, top_rule_violations, language_distribution, trend_data) =
            res.map_err(|err| {
                log::error!("Failed to get analysis metrics: {}", err);
                AnalyticsError::from(err)
            })?;

        Ok(AnalysisMetrics {
            time_range: time_range.as_str().to_string(),
            period: Period {
                start_date,
                end_date,
            },
            summary,
            top_rule_violations,
            language_distribution,
            trend_data,
            updated_at: Utc::now(),
        })
    }

    pub async fn get_performance_metrics(&self) -> Result<PerformanceMetrics, AnalyticsError> {
        let res = tokio::try_join!(
            async {
                let mut conn = self.pool.acquire().await?;
                get_high_gas_transactions(&mut conn, MONITORING_HIGH_GAS_LIMIT, self.high_gas_threshold)
                    .await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_active_merchants(&mut conn, ACTIVE_MERCHANT_WINDOW_DAYS).await
            },
            async {
                let mut conn = self.pool.acquire().await?;
                get_chain_performance_ranking(&mut conn).await
            },
        );
        let (high_gas_transactions, active_merchants, chain_performance) = res.map_err(|err| {
            log::error!("Failed to get performance metrics: {}", err);
            AnalyticsError::from(err)
        })?;

        let avg_chain_reliability = if chain_performance.is_empty() {
            None
        } else {
            Some(
                chain_performance
                    .iter()
                    .map(|chain| chain.reliability_score)
                    .sum::<f64>()
                    / chain_performance.len() as f64,
            )
        };

        Ok(PerformanceMetrics {
            monitoring: MonitoringCounters {
                high_gas_transactions: high_gas_transactions.len(),
                active_merchants: active_merchants.len(),
                total_chains: chain_performance.len(),
            },
            performance_indicators: PerformanceIndicators {
                avg_chain_reliability,
                top_performing_chain: chain_performance
                    .first()
                    .map(|chain| chain.chain_name.clone()),
                lowest_reliability_chain: chain_performance
                    .last()
                    .map(|chain| chain.chain_name.clone()),
            },
            updated_at: Utc::now(),
        })
    }

    // Validated ingestion paths. Uniqueness and check constraints are
    // enforced by the schema; everything else is rejected here before the
    // row is written.

    pub async fn record_transaction(
        &self,
        tx: &TransactionDao,
    ) -> Result<TransactionDao, AnalyticsError> {
        tx.validate()?;
        let mut conn = self.pool.acquire().await?;
        Ok(insert_transaction(&mut conn, tx).await?)
    }

    pub async fn record_merchant(
        &self,
        merchant: &MerchantDao,
    ) -> Result<MerchantDao, AnalyticsError> {
        merchant.validate()?;
        let mut conn = self.pool.acquire().await?;
        Ok(insert_merchant(&mut conn, merchant).await?)
    }

    pub async fn record_chain(&self, chain: &ChainDao) -> Result<ChainDao, AnalyticsError> {
        chain.validate()?;
        let mut conn = self.pool.acquire().await?;
        Ok(insert_chain(&mut conn, chain).await?)
    }

    pub async fn record_analysis_result(
        &self,
        analysis: &AnalysisResultDao,
    ) -> Result<AnalysisResultDao, AnalyticsError> {
        analysis.validate()?;
        let mut conn = self.pool.acquire().await?;
        Ok(insert_analysis_result(&mut conn, analysis).await?)
    }

    pub async fn refresh_chain_metrics(&self, chain_id: &str) -> Result<(), AnalyticsError> {
        let mut conn = self.pool.acquire().await?;
        update_chain_metrics(&mut conn, chain_id)
            .await
            .map_err(|err| {
                log::error!("Failed to refresh metrics for chain {}: {}", chain_id, err);
                AnalyticsError::from(err)
            })
    }
}
