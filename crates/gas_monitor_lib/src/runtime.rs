use actix_cors::Cors;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::db::connection::create_sqlite_pool;
use crate::db::indexes::{analyze_index_usage, apply_optimized_indexes};
use crate::error::AnalyticsError;
use crate::server::*;
use crate::service::AnalyticsService;
use crate::setup::AnalyticsSetup;

pub struct AnalyticsRuntime {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
    pub setup: AnalyticsSetup,
    pub service: AnalyticsService,
}

/// Connects the database, runs migrations, provisions the analytics index
/// set and binds the HTTP server.
pub async fn start_analytics_server(config: Config) -> Result<AnalyticsRuntime, AnalyticsError> {
    let setup = AnalyticsSetup::new(&config)?;
    log::info!("connecting to sqlite file db: {}", setup.db_filename);
    let pool = create_sqlite_pool(
        Some(&setup.db_filename),
        setup.max_pool_size,
        setup.slow_query_threshold_ms,
        true,
    )
    .await?;

    {
        let mut conn = pool.acquire().await?;
        apply_optimized_indexes(&mut conn).await;
        analyze_index_usage(&mut conn).await;
    }

    let service = AnalyticsService::new(pool, setup.high_gas_threshold);
    let server_data = Data::new(Box::new(ServerData {
        analytics: service.clone(),
    }));

    log::info!("starting analytics server on {}", setup.listen_addr);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(server_data.clone())
            .route("/analytics/dashboard", web::get().to(dashboard_analytics))
            .route(
                "/analytics/merchants/{merchant_id}",
                web::get().to(merchant_analytics),
            )
            .route(
                "/analytics/chains/{chain_id}",
                web::get().to(chain_analytics),
            )
            .route("/analytics/analysis", web::get().to(analysis_metrics))
            .route("/analytics/performance", web::get().to(performance_metrics))
            .route("/transactions", web::get().to(transactions))
            .route("/transactions", web::post().to(create_transaction))
            .route("/transactions/count", web::get().to(transactions_count))
            .route("/transactions/{tx_id}", web::get().to(tx_details))
            .route("/merchants", web::post().to(create_merchant))
            .route(
                "/merchants/{merchant_id}/status",
                web::post().to(merchant_status),
            )
            .route("/chains", web::post().to(create_chain))
            .route(
                "/chains/{chain_id}/refresh-metrics",
                web::post().to(refresh_chain_metrics),
            )
            .route("/analysis-results", web::post().to(create_analysis_result))
    })
    .workers(setup.http_workers)
    .bind(setup.listen_addr.clone())?
    .run();

    let server_handle = tokio::spawn(server);

    Ok(AnalyticsRuntime {
        server_handle,
        setup,
        service,
    })
}
