//! HTTP handlers for the quoting API.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::queries;
use super::requests::{CommissionQuery, EvaluateQuotationRequest, SaveQuotationRequest, UnitsQuery};
use super::responses::{
    BreakdownResponse, CommissionResponse, IndicatorResponse, QuotationResponse,
    SavedQuotationResponse, UnitsResponse,
};
use super::services;

/// Routes mounted under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects))
        .route("/units", get(units))
        .route("/brokers/:broker_id/commission", get(commission))
        .route("/indicators/uf", get(uf_value))
        .route("/quotations/evaluate", post(evaluate))
        .route("/quotations", post(save))
}

async fn projects(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(queries::list_projects(&state.db).await?))
}

async fn units(
    State(state): State<AppState>,
    Query(query): Query<UnitsQuery>,
) -> Result<Json<UnitsResponse>> {
    let units = services::list_units(&state.db, &state.cache, &query.project, query.kind).await?;
    Ok(Json(UnitsResponse {
        project: query.project,
        units,
    }))
}

async fn commission(
    State(state): State<AppState>,
    Path(broker_id): Path<Uuid>,
    Query(query): Query<CommissionQuery>,
) -> Result<Json<CommissionResponse>> {
    let commission_rate =
        services::commission_rate(&state.db, &state.cache, broker_id, &query.project).await?;
    Ok(Json(CommissionResponse {
        broker_id,
        project: query.project,
        commission_rate,
    }))
}

async fn uf_value(State(state): State<AppState>) -> Result<Json<IndicatorResponse>> {
    let value = state.indicators.current(&state.cache).await?;
    Ok(Json(IndicatorResponse {
        indicator: state.indicators.indicator().to_string(),
        value,
    }))
}

/// Apply the edits, then price. Nothing is stored.
async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateQuotationRequest>,
) -> Result<Json<QuotationResponse>> {
    let quotation = request.state.apply_all(request.edits);
    let quotation = services::hydrate_state(
        quotation,
        &state.indicators,
        &state.cache,
        state.config.reservation_pesos,
    )
    .await;

    let breakdown = BreakdownResponse::from(&quotation.breakdown());
    Ok(Json(QuotationResponse {
        state: quotation,
        breakdown,
    }))
}

async fn save(
    State(state): State<AppState>,
    Json(request): Json<SaveQuotationRequest>,
) -> Result<Json<SavedQuotationResponse>> {
    let (id, breakdown) = services::save_quotation(
        &state.db,
        &state.cache,
        request,
        state.config.reservation_pesos,
    )
    .await?;
    Ok(Json(SavedQuotationResponse {
        id,
        breakdown: BreakdownResponse::from(&breakdown),
    }))
}
