//! Activity rows feeding the dashboard

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Label used when a row has no broker or project
pub const UNASSIGNED: &str = "Sin asignar";

/// Reservation from reservations
#[derive(Debug, Clone, FromRow)]
pub struct ReservationRow {
    pub created_at: DateTime<Utc>,
    pub project_name: Option<String>,
    pub broker_name: Option<String>,
    pub total_uf: Option<Decimal>,
}

/// Commission payment from commission_flows
#[derive(Debug, Clone, FromRow)]
pub struct CommissionFlowRow {
    pub created_at: DateTime<Utc>,
    pub project_name: Option<String>,
    pub broker_name: Option<String>,
    pub amount_uf: Option<Decimal>,
}

/// Quotation header from quotations
#[derive(Debug, Clone, FromRow)]
pub struct QuotationActivityRow {
    pub created_at: DateTime<Utc>,
    pub project_name: Option<String>,
    pub broker_name: Option<String>,
    pub total_deed_uf: Option<Decimal>,
}

/// Row of any activity kind, normalized for aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEvent {
    pub occurred_at: DateTime<Utc>,
    pub project: String,
    pub broker: String,
    pub amount_uf: Decimal,
}

fn label(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNASSIGNED.to_string())
}

impl From<ReservationRow> for ActivityEvent {
    fn from(row: ReservationRow) -> Self {
        Self {
            occurred_at: row.created_at,
            project: label(row.project_name),
            broker: label(row.broker_name),
            amount_uf: row.total_uf.unwrap_or(Decimal::ZERO),
        }
    }
}

impl From<CommissionFlowRow> for ActivityEvent {
    fn from(row: CommissionFlowRow) -> Self {
        Self {
            occurred_at: row.created_at,
            project: label(row.project_name),
            broker: label(row.broker_name),
            amount_uf: row.amount_uf.unwrap_or(Decimal::ZERO),
        }
    }
}

impl From<QuotationActivityRow> for ActivityEvent {
    fn from(row: QuotationActivityRow) -> Self {
        Self {
            occurred_at: row.created_at,
            project: label(row.project_name),
            broker: label(row.broker_name),
            amount_uf: row.total_deed_uf.unwrap_or(Decimal::ZERO),
        }
    }
}

/// Audit row for a rendered e-mail
#[derive(Debug, Clone)]
pub struct EmailLogEntry {
    pub template: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: String,
}
