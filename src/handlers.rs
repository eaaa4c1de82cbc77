//! HTTP request handlers
//!
//! Implements the REST API of the air quality index service.

use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::{DateTime, Timelike, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::engine::compute_aggregate;
use crate::error::AppError;
use crate::models::{
    AggregateResult, AirIndexCalcInput, AirIndexRecord, ApiResponse, CalcQuery, GenerateQuery,
    HealthCheck, PollutantReadings, RecordQuery, StatsQuery,
};
use crate::state::AppState;
use crate::synthetic::{generate_synthetic, DEFAULT_MISSING_PROBABILITY};
use crate::validation::{
    validate_aggregate, validate_calc_input, validate_generate_query, validate_record_query,
    validate_stats_query,
};

/// Handler-side defaults taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct ApiSettings {
    pub missing_probability: f64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            missing_probability: DEFAULT_MISSING_PROBABILITY,
        }
    }
}

/// Configure all application routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::ValidationError(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::ValidationError(err.to_string()).into()
            }))
            // Health check
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/airindex")
                    .route("/calc", web::post().to(calculate_air_index))
                    .route("/generate", web::get().to(generate_data))
                    .route("/stats", web::get().to(get_statistics))
                    .route("/{id}", web::get().to(get_record_by_id))
                    .route("", web::get().to(get_all_records)),
            ),
    );
}

/// Health check endpoint
///
/// GET /api/health
pub async fn health_check(
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, AppError> {
    let state = state.read().await;

    let health = HealthCheck {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        total_records: state.total_records(),
    };

    Ok(HttpResponse::Ok().json(health))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalcResponse {
    station_id: String,
    datetime: DateTime<Utc>,
    pollutants: PollutantReadings,
    #[serde(flatten)]
    result: AggregateResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<bool>,
}

/// Calculate air quality index
///
/// POST /api/airindex/calc?save=true
///
/// Computes sub-indices, the aggregate index and its category. With
/// `save=true` the calculation is also stored.
pub async fn calculate_air_index(
    state: web::Data<Arc<RwLock<AppState>>>,
    query: web::Query<CalcQuery>,
    body: web::Json<AirIndexCalcInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);

    info!(
        correlation_id = %correlation_id,
        "Received air index calculation request"
    );

    let request = validate_calc_input(body.into_inner())?;
    let result = compute_aggregate(&request.pollutants, request.limits.as_ref())?;
    validate_aggregate(&result)?;

    let mut response = CalcResponse {
        station_id: request.station_id.clone(),
        datetime: request.datetime,
        pollutants: request.pollutants,
        result,
        id: None,
        saved: None,
    };

    if query.save.unwrap_or(false) {
        let record = AirIndexRecord::new(
            request.station_id,
            request.datetime,
            request.pollutants,
            &response.result,
        );
        response.id = Some(record.id);
        response.saved = Some(true);

        let mut state = state.write().await;
        state.add_record(record);
    }

    info!(
        correlation_id = %correlation_id,
        index = response.result.index,
        category = %response.result.category,
        saved = response.saved.unwrap_or(false),
        "Air index calculated"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::ok(response)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    station_id: String,
    datetime: DateTime<Utc>,
    pollutants: PollutantReadings,
    hour: u8,
    include_missing: bool,
    missing_probability: f64,
}

/// Generate synthetic pollutant data
///
/// GET /api/airindex/generate?hour=8&includeMissing=true&missingProbability=0.2
pub async fn generate_data(
    settings: web::Data<ApiSettings>,
    query: web::Query<GenerateQuery>,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let options =
        validate_generate_query(&query, now.hour() as u8, settings.missing_probability)?;

    let mut rng = rand::thread_rng();
    let pollutants = generate_synthetic(&mut rng, &options);
    let station_id = format!("station-{}", rng.gen_range(1..=10));

    Ok(HttpResponse::Ok().json(ApiResponse::ok(GenerateResponse {
        station_id,
        datetime: now,
        pollutants,
        hour: options.hour,
        include_missing: options.include_missing,
        missing_probability: options.missing_probability,
    })))
}

/// Get index statistics
///
/// GET /api/airindex/stats?stationId=station-001&startDate=...&endDate=...
pub async fn get_statistics(
    state: web::Data<Arc<RwLock<AppState>>>,
    query: web::Query<StatsQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = validate_stats_query(&query)?;

    let state = state.read().await;
    let stats = state.statistics(&filter);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

/// Get record by ID
///
/// GET /api/airindex/{id}
pub async fn get_record_by_id(
    state: web::Data<Arc<RwLock<AppState>>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    let id = Uuid::parse_str(&raw_id)
        .map_err(|_| AppError::BadRequest(format!("Invalid record id: {}", raw_id)))?;

    let state = state.read().await;
    let record = state
        .get(id)
        .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(record)))
}

/// List stored records
///
/// GET /api/airindex?stationId=&category=&startDate=&endDate=&limit=50&skip=0&sort=-datetime
pub async fn get_all_records(
    state: web::Data<Arc<RwLock<AppState>>>,
    query: web::Query<RecordQuery>,
) -> Result<HttpResponse, AppError> {
    let (filter, sort, skip, limit) = validate_record_query(&query)?;

    let state = state.read().await;
    let page = state.query(&filter, sort, skip, limit);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

/// Extract or generate correlation ID from request headers
fn extract_correlation_id(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Correlation-ID")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
