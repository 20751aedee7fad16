use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    intake::{BatchReceipt, IntakeRequest, ScanOutcome},
    projection::{labels::Label, summary::DailySummary},
    skid::SkidRecord,
    vendor::Vendor,
};

use super::{AppState, error::ApiError, extract::ApiJson};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/today", get(today))
        .route("/api/vendors/{code}", get(vendor))
        .route("/api/intake", post(intake))
        .route("/api/scan", post(scan))
        .route("/api/records/{serial}", get(record))
        .route("/api/labels", get(labels))
        .route("/export.csv", get(export))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "skidlog",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<NaiveDate>,
}

async fn today(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<DailySummary>, ApiError> {
    Ok(Json(state.handle().daily_summary(q.date).await?))
}

async fn vendor(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vendor>, ApiError> {
    state
        .handle()
        .vendor(&code)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("unknown_vendor", format!("vendor {code:?} is not in the directory")))
}

async fn intake(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<IntakeRequest>,
) -> Result<(StatusCode, Json<BatchReceipt>), ApiError> {
    let receipt = state.handle().intake(req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    code: String,
}

async fn scan(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ScanRequest>,
) -> Result<Json<ScanOutcome>, ApiError> {
    let outcome = state.handle().scan(req.code).await?;
    info!(?outcome, "scan handled");
    Ok(Json(outcome))
}

async fn record(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<SkidRecord>, ApiError> {
    state
        .handle()
        .find_by_serial(serial.as_str())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("record_not_found", format!("no skid with serial {serial}")))
}

#[derive(Debug, Deserialize)]
struct LabelQuery {
    #[serde(rename = "vendorCode")]
    vendor_code: Option<String>,
}

async fn labels(
    State(state): State<AppState>,
    Query(q): Query<LabelQuery>,
) -> Result<Json<Vec<Label>>, ApiError> {
    let vendor_code = q.vendor_code.filter(|c| !c.trim().is_empty());
    Ok(Json(state.handle().labels(vendor_code).await?))
}

async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.handle().export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"skids.csv\""),
        ],
        body,
    ))
}
