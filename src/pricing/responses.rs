//! Response DTOs for quotation API endpoints.
//!
//! Money is rounded to 2 places here, at the edge, and serialized as strings.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::calculators::{round_money, DiscountCeiling, PaymentConcept, PaymentLine, QuoteMode};
use super::models::Unit;
use super::state::{PriceBreakdown, QuotationState};

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    /// UF amount, always with 2 decimals
    pub fn uf(amount: Decimal) -> Self {
        let mut amount = round_money(amount, 2);
        amount.rescale(2);
        Self {
            amount,
            currency: "UF".to_string(),
        }
    }

    /// Whole pesos
    pub fn clp(amount: Decimal) -> Self {
        let mut amount = round_money(amount, 0);
        amount.rescale(0);
        Self {
            amount,
            currency: "CLP".to_string(),
        }
    }
}

/// Percentage with exactly 2 decimals
fn percent(value: Decimal) -> Decimal {
    let mut value = round_money(value, 2);
    value.rescale(2);
    value
}

/// Adjusted-discount derivation, shown so brokers can see where the ceiling comes from
#[derive(Debug, Serialize)]
pub struct CeilingResponse {
    pub net_at_nominal_discount: MoneyResponse,
    pub broker_commission: MoneyResponse,
    pub price_after_commission: MoneyResponse,
    pub available_discount: MoneyResponse,
    #[serde(with = "rust_decimal::serde::str")]
    pub adjusted_discount_percent: Decimal,
    pub max_incentive_pool: MoneyResponse,
}

impl From<&DiscountCeiling> for CeilingResponse {
    fn from(ceiling: &DiscountCeiling) -> Self {
        Self {
            net_at_nominal_discount: MoneyResponse::uf(ceiling.net_at_nominal_discount),
            broker_commission: MoneyResponse::uf(ceiling.broker_commission_uf),
            price_after_commission: MoneyResponse::uf(ceiling.price_after_commission),
            available_discount: MoneyResponse::uf(ceiling.available_discount_uf),
            adjusted_discount_percent: percent(ceiling.adjusted_discount_rate * Decimal::ONE_HUNDRED),
            max_incentive_pool: MoneyResponse::uf(ceiling.max_incentive_pool_uf),
        }
    }
}

/// One payment schedule line
#[derive(Debug, Serialize)]
pub struct PaymentLineResponse {
    pub concept: PaymentConcept,
    pub label: &'static str,
    pub uf: MoneyResponse,
    #[serde(with = "rust_decimal::serde::str")]
    pub percent: Decimal,
    pub pesos: MoneyResponse,
}

impl From<&PaymentLine> for PaymentLineResponse {
    fn from(line: &PaymentLine) -> Self {
        Self {
            concept: line.concept,
            label: line.concept.label(),
            uf: MoneyResponse::uf(line.uf),
            percent: percent(line.percent),
            pesos: MoneyResponse::clp(line.pesos),
        }
    }
}

/// Response for a priced quotation
#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub mode: QuoteMode,
    pub list_price: MoneyResponse,
    pub ceiling: CeilingResponse,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_percent: Decimal,
    pub discount: MoneyResponse,
    pub incentive: MoneyResponse,
    #[serde(with = "rust_decimal::serde::str")]
    pub incentive_percent: Decimal,
    pub net_unit_price: MoneyResponse,
    pub secondary_total: MoneyResponse,
    pub total_deed_price: MoneyResponse,
    pub payment: Vec<PaymentLineResponse>,
    pub total_payment: MoneyResponse,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_payment_percent: Decimal,
    pub total_payment_pesos: MoneyResponse,
}

impl From<&PriceBreakdown> for BreakdownResponse {
    fn from(breakdown: &PriceBreakdown) -> Self {
        Self {
            mode: breakdown.mode,
            list_price: MoneyResponse::uf(breakdown.list_price),
            ceiling: CeilingResponse::from(&breakdown.ceiling),
            discount_percent: percent(breakdown.discount_percent),
            discount: MoneyResponse::uf(breakdown.discount_uf),
            incentive: MoneyResponse::uf(breakdown.incentive_uf),
            incentive_percent: percent(breakdown.incentive_percent),
            net_unit_price: MoneyResponse::uf(breakdown.net_unit_price),
            secondary_total: MoneyResponse::uf(breakdown.secondary_total),
            total_deed_price: MoneyResponse::uf(breakdown.total_deed_price),
            payment: breakdown
                .payment
                .lines
                .iter()
                .map(PaymentLineResponse::from)
                .collect(),
            total_payment: MoneyResponse::uf(breakdown.payment.total_uf),
            total_payment_percent: percent(breakdown.payment.total_percent),
            total_payment_pesos: MoneyResponse::clp(breakdown.payment.total_pesos),
        }
    }
}

/// Response for evaluate: the updated state and what it prices to
#[derive(Debug, Serialize)]
pub struct QuotationResponse {
    pub state: QuotationState,
    pub breakdown: BreakdownResponse,
}

/// Response for a saved quotation
#[derive(Debug, Serialize)]
pub struct SavedQuotationResponse {
    pub id: Uuid,
    pub breakdown: BreakdownResponse,
}

/// Response for the stock listing
#[derive(Debug, Serialize)]
pub struct UnitsResponse {
    pub project: String,
    pub units: Vec<Unit>,
}

/// Response for a commission lookup
#[derive(Debug, Serialize)]
pub struct CommissionResponse {
    pub broker_id: Uuid,
    pub project: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub commission_rate: Decimal,
}

/// Response for the UF indicator
#[derive(Debug, Serialize)]
pub struct IndicatorResponse {
    pub indicator: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{Unit, UnitKind};
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_response_fixed_scale() {
        assert_eq!(MoneyResponse::uf(dec!(2835)).amount.to_string(), "2835.00");
        assert_eq!(MoneyResponse::uf(dec!(1.666)).amount.to_string(), "1.67");
        assert_eq!(MoneyResponse::clp(dec!(99.5)).amount.to_string(), "100");
    }

    #[test]
    fn test_breakdown_response_json_shape() {
        let unit = Unit {
            project_name: "Edificio Mirador".to_string(),
            unit_code: "1204".to_string(),
            typology: None,
            floor: None,
            useful_area: dec!(0),
            terrace_area: dec!(0),
            total_area: dec!(0),
            list_price: dec!(3000),
            base_discount_rate: dec!(0.10),
            status: String::new(),
            kind: UnitKind::Main,
        };
        let breakdown = QuotationState::for_unit(unit, dec!(0.05)).breakdown();
        let json = serde_json::to_value(BreakdownResponse::from(&breakdown)).unwrap();

        assert_eq!(json["mode"], "discount");
        assert_eq!(json["ceiling"]["adjusted_discount_percent"], "5.50");
        assert_eq!(json["total_deed_price"]["amount"], "2835.00");
        assert_eq!(json["total_deed_price"]["currency"], "UF");
        assert_eq!(json["payment"].as_array().unwrap().len(), 5);
        assert_eq!(json["payment"][3]["concept"], "mortgage_credit");
        assert_eq!(json["payment"][3]["label"], "Crédito hipotecario");
        assert_eq!(json["payment"][3]["percent"], "100.00");
        assert_eq!(json["discount_percent"], "5.50");
    }
}
