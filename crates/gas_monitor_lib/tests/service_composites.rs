mod common;

use chrono::{Duration, Utc};

use common::*;
use gas_monitor_lib::db::ops::{
    get_transaction_count, insert_analysis_result, insert_chain, insert_merchant,
    insert_transaction,
};
use gas_monitor_lib::error::AnalyticsError;
use gas_monitor_lib::service::{AnalyticsService, TimeRange};

const HIGH_GAS_THRESHOLD: f64 = 1_000_000.0;

#[tokio::test]
async fn dashboard_composite_assembles_all_branches() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool.clone(), HIGH_GAS_THRESHOLD);

    let recent = Utc::now() - Duration::hours(3);
    {
        let mut conn = pool.acquire().await.unwrap();
        let busy = insert_merchant(&mut conn, &merchant("Busy", "busy", recent))
            .await
            .unwrap();
        let quiet = insert_merchant(&mut conn, &merchant("Quiet", "quiet", recent))
            .await
            .unwrap();
        insert_chain(&mut conn, &chain("Main", "c1", 95.0)).await.unwrap();

        for _ in 0..3 {
            insert_transaction(
                &mut conn,
                &transaction(&busy.id, "c1", 120_000.0, "success", recent),
            )
            .await
            .unwrap();
        }
        insert_transaction(
            &mut conn,
            &transaction(&quiet.id, "c1", 80_000.0, "failed", recent),
        )
        .await
        .unwrap();
        insert_analysis_result(
            &mut conn,
            &analysis(&busy.id, "c1", r#"[{"ruleName":"A"}]"#, Some(42.0), recent),
        )
        .await
        .unwrap();
    }

    let dashboard = service
        .get_dashboard_analytics(TimeRange::Last7d)
        .await
        .unwrap();

    assert_eq!(dashboard.time_range, "7d");
    assert_eq!(
        dashboard.period.end_date - dashboard.period.start_date,
        Duration::days(7)
    );
    assert_eq!(dashboard.transaction_metrics.total_transactions, 4);
    assert_eq!(dashboard.transaction_metrics.successful_transactions, 3);
    assert_eq!(dashboard.transaction_metrics.success_rate, Some(75.0));
    assert_eq!(dashboard.top_merchants.len(), 2);
    assert_eq!(dashboard.top_merchants[0].merchant_name, "Busy");
    assert_eq!(dashboard.top_merchants[0].transaction_count, 3);
    assert_eq!(dashboard.chain_metrics.len(), 1);
    assert_eq!(dashboard.chain_metrics[0].chain_id, "c1");
    assert_eq!(dashboard.analysis_summary.total_analyses, 1);
}

#[tokio::test]
async fn dashboard_truncates_top_lists_to_ten() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool.clone(), HIGH_GAS_THRESHOLD);

    let recent = Utc::now() - Duration::hours(3);
    {
        let mut conn = pool.acquire().await.unwrap();
        for i in 0..12 {
            let m = insert_merchant(
                &mut conn,
                &merchant(&format!("Merchant {}", i), &format!("merchant-{}", i), recent),
            )
            .await
            .unwrap();
            insert_transaction(
                &mut conn,
                &transaction(&m.id, "c1", 10_000.0, "success", recent),
            )
            .await
            .unwrap();
        }
    }

    let dashboard = service
        .get_dashboard_analytics(TimeRange::Last24h)
        .await
        .unwrap();
    assert_eq!(dashboard.top_merchants.len(), 10);
    assert_eq!(dashboard.transaction_metrics.total_transactions, 12);
}

#[tokio::test]
async fn merchant_composite_keeps_high_gas_list_global() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool.clone(), HIGH_GAS_THRESHOLD);

    let recent = Utc::now() - Duration::hours(3);
    let (mine, other) = {
        let mut conn = pool.acquire().await.unwrap();
        let mine = insert_merchant(&mut conn, &merchant("Mine", "mine", recent))
            .await
            .unwrap();
        let other = insert_merchant(&mut conn, &merchant("Other", "other", recent))
            .await
            .unwrap();
        for gas in [100.0, 200.0, 300.0] {
            insert_transaction(&mut conn, &transaction(&mine.id, "c1", gas, "success", recent))
                .await
                .unwrap();
        }
        // The platform-wide gas hog belongs to the other merchant.
        insert_transaction(
            &mut conn,
            &transaction(&other.id, "c1", 2_000_000.0, "success", recent),
        )
        .await
        .unwrap();
        (mine, other)
    };

    let analytics = service
        .get_merchant_analytics(&mine.id, TimeRange::Last7d)
        .await
        .unwrap();

    assert_eq!(analytics.merchant_id, mine.id);
    assert_eq!(analytics.transaction_metrics.total_transactions, 3);
    assert_eq!(analytics.transaction_metrics.avg_gas_used, Some(200.0));
    assert_eq!(analytics.gas_usage_trend.len(), 1);
    assert_eq!(analytics.gas_usage_trend[0].total_gas_used, 600.0);
    assert_eq!(analytics.high_gas_transactions.len(), 1);
    assert_eq!(analytics.high_gas_transactions[0].merchant_id, other.id);
}

#[tokio::test]
async fn chain_composite_filters_full_lists_to_requested_chain() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool.clone(), HIGH_GAS_THRESHOLD);

    let recent = Utc::now() - Duration::hours(3);
    {
        let mut conn = pool.acquire().await.unwrap();
        insert_chain(&mut conn, &chain("First", "c1", 90.0)).await.unwrap();
        insert_chain(&mut conn, &chain("Second", "c2", 80.0)).await.unwrap();

        for _ in 0..2 {
            insert_transaction(
                &mut conn,
                &transaction("m1", "c1", 50_000.0, "success", recent),
            )
            .await
            .unwrap();
            insert_transaction(
                &mut conn,
                &transaction("m1", "c2", 70_000.0, "success", recent),
            )
            .await
            .unwrap();
        }
        insert_transaction(&mut conn, &transaction("m1", "c1", 60_000.0, "failed", recent))
            .await
            .unwrap();
        insert_transaction(&mut conn, &transaction("m1", "c2", 80_000.0, "failed", recent))
            .await
            .unwrap();
    }

    let analytics = service
        .get_chain_analytics("c1", TimeRange::Last7d)
        .await
        .unwrap();

    assert_eq!(analytics.chain_id, "c1");
    let volume = analytics.transaction_metrics.unwrap();
    assert_eq!(volume.chain_id, "c1");
    assert_eq!(volume.transaction_count, 3);
    let reliability = analytics.reliability_metrics.unwrap();
    assert_eq!(reliability.chain_id, "c1");
    assert_eq!(reliability.reliability_score, 90.0);
    // Far below the volatility sample gate.
    assert!(analytics.gas_volatility.is_none());
    assert_eq!(analytics.failed_transaction_analysis.len(), 1);
    assert_eq!(analytics.failed_transaction_analysis[0].chain_id, "c1");

    let unknown = service
        .get_chain_analytics("c999", TimeRange::Last7d)
        .await
        .unwrap();
    assert!(unknown.transaction_metrics.is_none());
    assert!(unknown.reliability_metrics.is_none());
    assert!(unknown.failed_transaction_analysis.is_empty());
}

#[tokio::test]
async fn analysis_composite_reports_violations_languages_and_trend() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool.clone(), HIGH_GAS_THRESHOLD);

    let recent = Utc::now() - Duration::hours(3);
    {
        let mut conn = pool.acquire().await.unwrap();
        insert_analysis_result(
            &mut conn,
            &analysis(
                "m1",
                "c1",
                r#"[{"ruleName":"loop-gas"},{"ruleName":"loop-gas"},{"ruleName":"unused-storage"}]"#,
                Some(90.0),
                recent,
            ),
        )
        .await
        .unwrap();
        let mut rust_analysis =
            analysis("m2", "c1", r#"[{"ruleName":"clone-heavy"}]"#, Some(10.0), recent);
        rust_analysis.language = "rust".to_string();
        insert_analysis_result(&mut conn, &rust_analysis).await.unwrap();
    }

    let metrics = service
        .get_analysis_metrics(TimeRange::Last7d)
        .await
        .unwrap();

    assert_eq!(metrics.summary.total_analyses, 2);
    assert_eq!(metrics.summary.total_violations, Some(4));
    assert_eq!(metrics.top_rule_violations[0].rule_name, "loop-gas");
    assert_eq!(metrics.top_rule_violations[0].violation_count, 2);
    assert_eq!(metrics.language_distribution.len(), 2);
    assert_eq!(metrics.trend_data.len(), 1);
    assert_eq!(metrics.trend_data[0].analysis_count, 2);
}

#[tokio::test]
async fn performance_indicators_follow_reliability_ranking() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool.clone(), HIGH_GAS_THRESHOLD);

    {
        let mut conn = pool.acquire().await.unwrap();
        insert_chain(&mut conn, &chain("Alpha", "c-alpha", 90.0)).await.unwrap();
        insert_chain(&mut conn, &chain("Beta", "c-beta", 80.0)).await.unwrap();
        insert_chain(&mut conn, &chain("Gamma", "c-gamma", 70.0)).await.unwrap();

        let mut active = merchant("Active", "active", Utc::now() - Duration::days(30));
        active.last_active_at = Some(Utc::now() - Duration::days(1));
        insert_merchant(&mut conn, &active).await.unwrap();

        insert_transaction(
            &mut conn,
            &transaction(
                "m1",
                "c-alpha",
                2_000_000.0,
                "success",
                Utc::now() - Duration::hours(1),
            ),
        )
        .await
        .unwrap();
    }

    let metrics = service.get_performance_metrics().await.unwrap();

    assert_eq!(metrics.monitoring.total_chains, 3);
    assert_eq!(metrics.monitoring.active_merchants, 1);
    assert_eq!(metrics.monitoring.high_gas_transactions, 1);
    assert_eq!(
        metrics.performance_indicators.avg_chain_reliability,
        Some(80.0)
    );
    assert_eq!(
        metrics.performance_indicators.top_performing_chain.as_deref(),
        Some("Alpha")
    );
    assert_eq!(
        metrics
            .performance_indicators
            .lowest_reliability_chain
            .as_deref(),
        Some("Gamma")
    );
}

#[tokio::test]
async fn performance_metrics_degrade_gracefully_when_empty() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool, HIGH_GAS_THRESHOLD);

    let metrics = service.get_performance_metrics().await.unwrap();

    assert_eq!(metrics.monitoring.total_chains, 0);
    assert_eq!(metrics.monitoring.active_merchants, 0);
    assert_eq!(metrics.monitoring.high_gas_transactions, 0);
    assert_eq!(metrics.performance_indicators.avg_chain_reliability, None);
    assert_eq!(metrics.performance_indicators.top_performing_chain, None);
    assert_eq!(metrics.performance_indicators.lowest_reliability_chain, None);
}

#[tokio::test]
async fn record_transaction_rejects_invalid_rows() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool.clone(), HIGH_GAS_THRESHOLD);

    let mut tx = transaction("m1", "c1", -5.0, "success", Utc::now());
    let err = service.record_transaction(&tx).await.unwrap_err();
    assert!(matches!(err, AnalyticsError::ValidationError(_)));

    tx.gas_used = 5.0;
    tx.status = "weird".to_string();
    assert!(service.record_transaction(&tx).await.is_err());

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(get_transaction_count(&mut conn, None).await.unwrap(), 0);
}

#[tokio::test]
async fn composite_fails_whole_when_any_branch_fails() {
    let pool = temp_pool().await;
    let service = AnalyticsService::new(pool.clone(), HIGH_GAS_THRESHOLD);

    sqlx::query("DROP TABLE analysis_results")
        .execute(&pool)
        .await
        .unwrap();

    // Transaction and chain branches could still answer; the composite
    // must not return a partial response.
    assert!(service
        .get_dashboard_analytics(TimeRange::Last7d)
        .await
        .is_err());
    assert!(service
        .get_analysis_metrics(TimeRange::Last7d)
        .await
        .is_err());
}
