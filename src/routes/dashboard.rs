//! Dashboard summary handler

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::dashboard::{self, DashboardSummary};
use crate::db;
use crate::error::{AppError, Result};
use crate::models::ActivityEvent;
use crate::AppState;

const TOP_N: usize = 5;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// GET /api/dashboard?year=
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardSummary>> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let (from, to) = dashboard::year_bounds(year)
        .ok_or_else(|| AppError::BadRequest(format!("invalid year {}", year)))?;

    let (reservations, commissions, quotations) = tokio::try_join!(
        db::get_reservations(&state.db, from, to),
        db::get_commission_flows(&state.db, from, to),
        db::get_quotation_activity(&state.db, from, to),
    )?;

    let reservations: Vec<ActivityEvent> = reservations.into_iter().map(Into::into).collect();
    let commissions: Vec<ActivityEvent> = commissions.into_iter().map(Into::into).collect();
    let quotations: Vec<ActivityEvent> = quotations.into_iter().map(Into::into).collect();

    Ok(Json(dashboard::summarize(
        year,
        &reservations,
        &commissions,
        &quotations,
        TOP_N,
    )))
}
