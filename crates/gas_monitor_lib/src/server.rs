use actix_web::web::Data;
use actix_web::{web, HttpRequest, Responder};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::db::model::*;
use crate::db::ops::*;
use crate::error::AnalyticsError;
use crate::service::{AnalyticsService, TimeRange};

pub struct ServerData {
    pub analytics: AnalyticsService,
}

macro_rules! return_on_error {
    ( $e:expr ) => {
        match $e {
            Ok(x) => x,
            Err(err) => {
                return web::Json(json!({
                    "error": err.to_string()
                }))
            },
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct TimeRangeQuery {
    #[serde(rename = "timeRange")]
    pub time_range: Option<String>,
}

fn requested_time_range(query: &TimeRangeQuery) -> Result<TimeRange, AnalyticsError> {
    match &query.time_range {
        Some(token) => token.parse(),
        None => Ok(TimeRange::default()),
    }
}

pub async fn dashboard_analytics(
    data: Data<Box<ServerData>>,
    query: web::Query<TimeRangeQuery>,
) -> impl Responder {
    let time_range = return_on_error!(requested_time_range(&query));
    let dashboard = return_on_error!(data.analytics.get_dashboard_analytics(time_range).await);
    web::Json(json!(dashboard))
}

pub async fn merchant_analytics(
    data: Data<Box<ServerData>>,
    req: HttpRequest,
    query: web::Query<TimeRangeQuery>,
) -> impl Responder {
    let merchant_id = return_on_error!(req
        .match_info()
        .get("merchant_id")
        .ok_or("No merchant id provided"));
    let time_range = return_on_error!(requested_time_range(&query));
    let analytics = return_on_error!(
        data.analytics
            .get_merchant_analytics(merchant_id, time_range)
            .await
    );
    web::Json(json!(analytics))
}

pub async fn chain_analytics(
    data: Data<Box<ServerData>>,
    req: HttpRequest,
    query: web::Query<TimeRangeQuery>,
) -> impl Responder {
    let chain_id = return_on_error!(req
        .match_info()
        .get("chain_id")
        .ok_or("No chain id provided"));
    let time_range = return_on_error!(requested_time_range(&query));
    let analytics = return_on_error!(
        data.analytics
            .get_chain_analytics(chain_id, time_range)
            .await
    );
    web::Json(json!(analytics))
}

pub async fn analysis_metrics(
    data: Data<Box<ServerData>>,
    query: web::Query<TimeRangeQuery>,
) -> impl Responder {
    let time_range = return_on_error!(requested_time_range(&query));
    let metrics = return_on_error!(data.analytics.get_analysis_metrics(time_range).await);
    web::Json(json!(metrics))
}

pub async fn performance_metrics(data: Data<Box<ServerData>>) -> impl Responder {
    let metrics = return_on_error!(data.analytics.get_performance_metrics().await);
    web::Json(json!(metrics))
}

#[derive(Deserialize, Debug)]
pub struct TransactionListQuery {
    pub limit: Option<i64>,
    pub status: Option<String>,
}

pub async fn transactions(
    data: Data<Box<ServerData>>,
    query: web::Query<TransactionListQuery>,
) -> impl Responder {
    let filter = match query.status.as_deref() {
        None => None,
        Some("success") => Some(TRANSACTION_FILTER_SUCCESS),
        Some("failed") => Some(TRANSACTION_FILTER_FAILED),
        Some("pending") => Some(TRANSACTION_FILTER_PENDING),
        Some(other) => {
            return web::Json(json!({
                "error": format!("Invalid status filter: {}", other)
            }))
        }
    };

    let txs = {
        let mut conn = return_on_error!(data.analytics.pool().acquire().await);
        return_on_error!(
            get_transactions(&mut conn, filter, Some(query.limit.unwrap_or(100)), None).await
        )
    };
    web::Json(json!({
        "txs": txs,
    }))
}

pub async fn transactions_count(data: Data<Box<ServerData>>) -> impl Responder {
    let mut conn = return_on_error!(data.analytics.pool().acquire().await);
    let success_count =
        return_on_error!(get_transaction_count(&mut conn, Some(TRANSACTION_FILTER_SUCCESS)).await);
    let failed_count =
        return_on_error!(get_transaction_count(&mut conn, Some(TRANSACTION_FILTER_FAILED)).await);
    let pending_count =
        return_on_error!(get_transaction_count(&mut conn, Some(TRANSACTION_FILTER_PENDING)).await);
    let total_count = return_on_error!(get_transaction_count(&mut conn, None).await);

    web::Json(json!({
        "txSuccess": success_count,
        "txFailed": failed_count,
        "txPending": pending_count,
        "txTotal": total_count,
    }))
}

pub async fn tx_details(data: Data<Box<ServerData>>, req: HttpRequest) -> impl Responder {
    let tx_id = return_on_error!(req.match_info().get("tx_id").ok_or("No tx id provided"));

    let tx = {
        let mut conn = return_on_error!(data.analytics.pool().acquire().await);
        return_on_error!(get_transaction(&mut conn, tx_id).await)
    };
    web::Json(json!({
        "tx": tx,
    }))
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
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
    pub function_params: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub region: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub retry_count: i64,
    pub priority: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

pub async fn create_transaction(
    data: Data<Box<ServerData>>,
    body: web::Json<CreateTransactionRequest>,
) -> impl Responder {
    let request = body.into_inner();
    let now = Utc::now();
    let tx = TransactionDao {
        id: uuid::Uuid::new_v4().to_string(),
        transaction_hash: request.transaction_hash,
        merchant_id: request.merchant_id,
        chain_id: request.chain_id,
        contract_address: request.contract_address,
        gas_used: request.gas_used,
        gas_price: request.gas_price,
        transaction_fee: request.transaction_fee,
        status: request.status,
        transaction_type: request.transaction_type,
        function_name: request.function_name,
        function_params: request.function_params.map(|params| params.to_string()),
        error_message: request.error_message,
        region: request.region,
        user_id: request.user_id,
        retry_count: request.retry_count,
        priority: request.priority,
        created_at: request.created_at.unwrap_or(now),
        updated_at: now,
    };

    let tx = return_on_error!(data.analytics.record_transaction(&tx).await);
    web::Json(json!({
        "transaction": tx,
    }))
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateMerchantRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub status: String,
    pub plan: String,
    pub tier: String,
    pub website: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    pub category: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub async fn create_merchant(
    data: Data<Box<ServerData>>,
    body: web::Json<CreateMerchantRequest>,
) -> impl Responder {
    let request = body.into_inner();
    let now = Utc::now();
    let merchant = MerchantDao {
        id: uuid::Uuid::new_v4().to_string(),
        name: request.name,
        slug: request.slug,
        description: request.description,
        status: request.status,
        plan: request.plan,
        tier: request.tier,
        website: request.website,
        email: request.email,
        country: request.country,
        last_active_at: None,
        is_verified: request.is_verified,
        category: request.category,
        metadata: request.metadata.map(|metadata| metadata.to_string()),
        created_at: now,
        updated_at: now,
    };

    let merchant = return_on_error!(data.analytics.record_merchant(&merchant).await);
    web::Json(json!({
        "merchant": merchant,
    }))
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMerchantStatusRequest {
    pub status: String,
}

pub async fn merchant_status(
    data: Data<Box<ServerData>>,
    req: HttpRequest,
    body: web::Json<UpdateMerchantStatusRequest>,
) -> impl Responder {
    let merchant_id = return_on_error!(req
        .match_info()
        .get("merchant_id")
        .ok_or("No merchant id provided"));
    if !MERCHANT_STATUSES.contains(&body.status.as_str()) {
        return web::Json(json!({
            "error": format!("Invalid status: {}", body.status)
        }));
    }

    let merchant = {
        let mut conn = return_on_error!(data.analytics.pool().acquire().await);
        return_on_error!(update_merchant_status(&mut conn, merchant_id, &body.status).await);
        return_on_error!(get_merchant(&mut conn, merchant_id).await)
    };
    web::Json(json!({
        "merchant": merchant,
    }))
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateChainRequest {
    pub name: String,
    pub chain_id: String,
    pub network: String,
    pub status: String,
    pub chain_type: String,
    pub rpc_url: Option<String>,
    pub currency: Option<String>,
    pub config: Option<serde_json::Value>,
}

pub async fn create_chain(
    data: Data<Box<ServerData>>,
    body: web::Json<CreateChainRequest>,
) -> impl Responder {
    let request = body.into_inner();
    let now = Utc::now();
    let chain = ChainDao {
        id: uuid::Uuid::new_v4().to_string(),
        name: request.name,
        chain_id: request.chain_id,
        network: request.network,
        status: request.status,
        chain_type: request.chain_type,
        average_gas_price: None,
        gas_volatility: None,
        transaction_count: 0,
        reliability_score: 100.0,
        rpc_url: request.rpc_url,
        currency: request.currency,
        config: request.config.map(|config| config.to_string()),
        created_at: now,
        updated_at: now,
    };

    let chain = return_on_error!(data.analytics.record_chain(&chain).await);
    web::Json(json!({
        "chain": chain,
    }))
}

pub async fn refresh_chain_metrics(
    data: Data<Box<ServerData>>,
    req: HttpRequest,
) -> impl Responder {
    let chain_id = return_on_error!(req
        .match_info()
        .get("chain_id")
        .ok_or("No chain id provided"));

    return_on_error!(data.analytics.refresh_chain_metrics(chain_id).await);
    let chain = {
        let mut conn = return_on_error!(data.analytics.pool().acquire().await);
        return_on_error!(get_chain_by_chain_id(&mut conn, chain_id).await)
    };
    web::Json(json!({
        "chain": chain,
    }))
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysisResultRequest {
    pub merchant_id: String,
    pub chain_id: String,
    pub contract_address: String,
    pub source_code: String,
    pub language: String,
    pub status: String,
    pub findings: serde_json::Value,
    pub violation_count: Option<i64>,
    pub estimated_gas_savings: Option<f64>,
    pub estimated_cost_savings: Option<f64>,
    pub analyzer_version: Option<String>,
    pub priority: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub async fn create_analysis_result(
    data: Data<Box<ServerData>>,
    body: web::Json<CreateAnalysisResultRequest>,
) -> impl Responder {
    let request = body.into_inner();
    let now = Utc::now();
    let violation_count = request.violation_count.unwrap_or_else(|| {
        request
            .findings
            .as_array()
            .map(|findings| findings.len() as i64)
            .unwrap_or(0)
    });
    let analysis = AnalysisResultDao {
        id: uuid::Uuid::new_v4().to_string(),
        merchant_id: request.merchant_id,
        chain_id: request.chain_id,
        contract_address: request.contract_address,
        source_code: request.source_code,
        language: request.language,
        status: request.status,
        findings: request.findings.to_string(),
        violation_count,
        estimated_gas_savings: request.estimated_gas_savings,
        estimated_cost_savings: request.estimated_cost_savings,
        analyzer_version: request.analyzer_version,
        priority: request.priority,
        error_message: request.error_message,
        metadata: request.metadata.map(|metadata| metadata.to_string()),
        created_at: now,
        updated_at: now,
    };

    let analysis = return_on_error!(data.analytics.record_analysis_result(&analysis).await);
    web::Json(json!({
        "analysisResult": analysis,
    }))
}
