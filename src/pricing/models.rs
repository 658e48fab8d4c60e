//! Database models for quotation queries.
//!
//! Stock and commission tables are loosely typed (nullable numerics, free
//! text kinds), so rows land in `*Row` structs through sqlx's FromRow and are
//! converted into typed records with `TryFrom` before any pricing happens.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reason a database row could not be turned into a typed record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Whether a unit can be quoted on its own or only attached to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Main,
    Secondary,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Main => "main",
            UnitKind::Secondary => "secondary",
        }
    }
}

impl std::str::FromStr for UnitKind {
    type Err = RowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" | "principal" | "departamento" | "casa" | "oficina" => Ok(UnitKind::Main),
            "secondary" | "secundario" | "estacionamiento" | "bodega" => Ok(UnitKind::Secondary),
            other => Err(RowError::InvalidValue {
                field: "kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Normalize a rate column to a fraction.
///
/// Some projects store `10` meaning 10 %; values in `(1, 100]` are divided by
/// 100. Negative rates and rates above 100 are rejected.
pub fn normalize_rate(field: &'static str, rate: Decimal) -> Result<Decimal, RowError> {
    if (rate.is_sign_negative() && !rate.is_zero()) || rate > Decimal::ONE_HUNDRED {
        return Err(RowError::InvalidValue {
            field,
            value: rate.to_string(),
        });
    }
    if rate > Decimal::ONE {
        return Ok(rate / Decimal::ONE_HUNDRED);
    }
    Ok(rate)
}

/// Stock row as stored
#[derive(Debug, Clone, Default, FromRow)]
pub struct UnitRow {
    pub project_name: Option<String>,
    pub unit_code: Option<String>,
    pub typology: Option<String>,
    pub floor: Option<String>,
    pub useful_area: Option<Decimal>,
    pub terrace_area: Option<Decimal>,
    pub total_area: Option<Decimal>,
    pub list_price: Option<Decimal>,
    pub base_discount: Option<Decimal>,
    pub status: Option<String>,
    pub kind: Option<String>,
}

/// A unit ready for pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub project_name: String,
    pub unit_code: String,
    #[serde(default)]
    pub typology: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub useful_area: Decimal,
    #[serde(default)]
    pub terrace_area: Decimal,
    #[serde(default)]
    pub total_area: Decimal,
    pub list_price: Decimal,
    /// Fraction of list price
    #[serde(default)]
    pub base_discount_rate: Decimal,
    #[serde(default)]
    pub status: String,
    pub kind: UnitKind,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<UnitRow> for Unit {
    type Error = RowError;

    fn try_from(row: UnitRow) -> Result<Self, Self::Error> {
        let project_name = non_empty(row.project_name).ok_or(RowError::MissingField("project_name"))?;
        let unit_code = non_empty(row.unit_code).ok_or(RowError::MissingField("unit_code"))?;

        let list_price = row.list_price.ok_or(RowError::MissingField("list_price"))?;
        if list_price.is_sign_negative() && !list_price.is_zero() {
            return Err(RowError::InvalidValue {
                field: "list_price",
                value: list_price.to_string(),
            });
        }

        let base_discount_rate =
            normalize_rate("base_discount", row.base_discount.unwrap_or(Decimal::ZERO))?;

        let kind = non_empty(row.kind)
            .ok_or(RowError::MissingField("kind"))?
            .parse::<UnitKind>()?;

        let useful_area = row.useful_area.unwrap_or(Decimal::ZERO);
        let terrace_area = row.terrace_area.unwrap_or(Decimal::ZERO);
        let total_area = row.total_area.unwrap_or(useful_area + terrace_area);

        Ok(Unit {
            project_name,
            unit_code,
            typology: non_empty(row.typology),
            floor: non_empty(row.floor),
            useful_area,
            terrace_area,
            total_area,
            list_price,
            base_discount_rate,
            status: non_empty(row.status).unwrap_or_default(),
            kind,
        })
    }
}

/// Commission agreed between a broker and a project
#[derive(Debug, Clone, FromRow)]
pub struct BrokerCommissionRow {
    pub broker_id: Uuid,
    pub project_name: String,
    pub commission_rate: Option<Decimal>,
}

impl BrokerCommissionRow {
    /// Commission as a fraction; a missing rate means no commission.
    pub fn rate(&self) -> Result<Decimal, RowError> {
        normalize_rate("commission_rate", self.commission_rate.unwrap_or(Decimal::ZERO))
    }
}

/// Stored quotation
#[derive(Debug, Clone, FromRow)]
pub struct QuotationRecord {
    pub id: Uuid,
    pub broker_id: Option<Uuid>,
    pub client_name: String,
    pub client_rut: Option<String>,
    pub client_email: Option<String>,
    pub project_name: String,
    pub unit_code: String,
    pub mode: String,
    pub total_deed_uf: Decimal,
    pub state: serde_json::Value,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client details captured on the quoting form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Quotation about to be inserted
#[derive(Debug, Clone)]
pub struct NewQuotation {
    pub broker_id: Option<Uuid>,
    pub client: ClientInfo,
    pub project_name: String,
    pub unit_code: String,
    pub mode: String,
    pub total_deed_uf: Decimal,
    pub state: serde_json::Value,
    pub breakdown: serde_json::Value,
    pub notes: Option<String>,
}
