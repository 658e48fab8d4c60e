//! Request DTOs for quotation API endpoints.

use serde::Deserialize;
use uuid::Uuid;

use super::models::{ClientInfo, UnitKind};
use super::state::{QuotationEdit, QuotationState};

/// Query for the stock listing
#[derive(Debug, Deserialize)]
pub struct UnitsQuery {
    pub project: String,
    #[serde(default)]
    pub kind: Option<UnitKind>,
}

/// Query for a broker's commission on a project
#[derive(Debug, Deserialize)]
pub struct CommissionQuery {
    pub project: String,
}

/// Apply edits to a quotation state and price the result
#[derive(Debug, Deserialize)]
pub struct EvaluateQuotationRequest {
    #[serde(default)]
    pub state: QuotationState,
    #[serde(default)]
    pub edits: Vec<QuotationEdit>,
}

/// Persist a finished quotation
#[derive(Debug, Deserialize)]
pub struct SaveQuotationRequest {
    #[serde(default)]
    pub broker_id: Option<Uuid>,
    pub client: ClientInfo,
    pub state: QuotationState,
    #[serde(default)]
    pub notes: Option<String>,
}
