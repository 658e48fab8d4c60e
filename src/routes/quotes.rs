//! Printable quotation sheet

use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::format::{format_area, format_pesos, format_percent, format_uf};
use crate::pricing::calculators::uf_to_pesos;
use crate::pricing::services::{self, StoredQuotation};
use crate::pricing::QuoteMode;
use crate::AppState;

/// One row of the price or payment table, already formatted
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub label: String,
    pub percent: String,
    pub uf: String,
    pub pesos: String,
}

#[derive(Debug, Clone)]
pub struct SecondaryRow {
    pub code: String,
    pub kind: String,
    pub price: String,
}

#[derive(Template)]
#[template(path = "quotes/sheet.html")]
pub struct QuotationSheetTemplate {
    pub quotation_id: String,
    pub created_at: String,
    pub client_name: String,
    pub client_rut: String,
    pub client_email: String,
    pub project_name: String,
    pub unit_code: String,
    pub typology: String,
    pub floor: String,
    pub useful_area: String,
    pub terrace_area: String,
    pub total_area: String,
    pub mode_label: String,
    pub uf_value: String,
    pub price_rows: Vec<SheetRow>,
    pub secondary_rows: Vec<SecondaryRow>,
    pub payment_rows: Vec<SheetRow>,
    pub payment_total: SheetRow,
    pub notes: String,
    pub has_secondaries: bool,
    pub has_notes: bool,
}

fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

fn price_row(label: &str, percent: Option<Decimal>, uf: Decimal, uf_value: Decimal) -> SheetRow {
    SheetRow {
        label: label.to_string(),
        percent: percent.map(format_percent).unwrap_or_default(),
        uf: format_uf(uf),
        pesos: format_pesos(uf_to_pesos(uf, uf_value)),
    }
}

impl From<&StoredQuotation> for QuotationSheetTemplate {
    fn from(stored: &StoredQuotation) -> Self {
        let record = &stored.record;
        let breakdown = &stored.breakdown;
        let uf_value = stored.state.uf_value;
        let unit = stored.state.unit.as_ref();

        let mut price_rows = vec![price_row("Precio lista", None, breakdown.list_price, uf_value)];
        if !breakdown.discount_uf.is_zero() {
            price_rows.push(price_row(
                "Descuento",
                Some(breakdown.discount_percent),
                -breakdown.discount_uf,
                uf_value,
            ));
        }
        price_rows.push(price_row(
            "Precio neto unidad",
            None,
            breakdown.net_unit_price,
            uf_value,
        ));
        if !breakdown.secondary_total.is_zero() {
            price_rows.push(price_row(
                "Unidades secundarias",
                None,
                breakdown.secondary_total,
                uf_value,
            ));
        }
        price_rows.push(price_row(
            "Total escritura",
            None,
            breakdown.total_deed_price,
            uf_value,
        ));
        if breakdown.mode != QuoteMode::Discount && !breakdown.incentive_uf.is_zero() {
            price_rows.push(price_row(
                "Bono pie",
                Some(breakdown.incentive_percent),
                breakdown.incentive_uf,
                uf_value,
            ));
        }

        let secondary_rows: Vec<SecondaryRow> = stored
            .state
            .secondary_units
            .iter()
            .map(|u| SecondaryRow {
                code: u.unit_code.clone(),
                kind: or_dash(u.typology.as_deref()),
                price: format_uf(u.list_price),
            })
            .collect();

        let payment_rows = breakdown
            .payment
            .lines
            .iter()
            .map(|line| SheetRow {
                label: line.concept.label().to_string(),
                percent: format_percent(line.percent),
                uf: format_uf(line.uf),
                pesos: format_pesos(line.pesos),
            })
            .collect();

        let payment_total = SheetRow {
            label: "Total".to_string(),
            percent: format_percent(breakdown.payment.total_percent),
            uf: format_uf(breakdown.payment.total_uf),
            pesos: format_pesos(breakdown.payment.total_pesos),
        };

        let notes = record.notes.clone().unwrap_or_default();

        Self {
            quotation_id: record.id.to_string(),
            created_at: record.created_at.format("%d-%m-%Y").to_string(),
            client_name: record.client_name.clone(),
            client_rut: or_dash(record.client_rut.as_deref()),
            client_email: or_dash(record.client_email.as_deref()),
            project_name: record.project_name.clone(),
            unit_code: record.unit_code.clone(),
            typology: or_dash(unit.and_then(|u| u.typology.as_deref())),
            floor: or_dash(unit.and_then(|u| u.floor.as_deref())),
            useful_area: format_area(unit.map(|u| u.useful_area).unwrap_or_default()),
            terrace_area: format_area(unit.map(|u| u.terrace_area).unwrap_or_default()),
            total_area: format_area(unit.map(|u| u.total_area).unwrap_or_default()),
            mode_label: breakdown.mode.label().to_string(),
            uf_value: format_pesos(uf_value),
            price_rows,
            has_secondaries: !secondary_rows.is_empty(),
            secondary_rows,
            payment_rows,
            payment_total,
            has_notes: !notes.trim().is_empty(),
            notes,
        }
    }
}

/// GET /quotations/:id/sheet
pub async fn sheet(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Html<String>> {
    let stored = services::load_quotation(&state.db, id).await?;
    let template = QuotationSheetTemplate::from(&stored);
    Ok(Html(template.render()?))
}
