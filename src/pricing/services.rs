//! Quotation service functions with database access.
//!
//! These functions sit between the HTTP handlers and the pure engine: they
//! load and cache stock, commissions and the UF value, and persist finished
//! quotations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::AppError;
use crate::indicators::IndicatorClient;

use super::models::{NewQuotation, QuotationRecord, Unit, UnitKind, UnitRow};
use super::queries;
use super::requests::SaveQuotationRequest;
use super::state::{PriceBreakdown, QuotationEdit, QuotationState};

/// A stored quotation with its state re-priced
#[derive(Debug, Clone)]
pub struct StoredQuotation {
    pub record: QuotationRecord,
    pub state: QuotationState,
    pub breakdown: PriceBreakdown,
}

/// Turn stock rows into units, dropping the ones that fail validation.
pub fn parse_units(rows: Vec<UnitRow>) -> Vec<Unit> {
    rows.into_iter()
        .filter_map(|row| {
            let code = row.unit_code.clone().unwrap_or_default();
            match Unit::try_from(row) {
                Ok(unit) => Some(unit),
                Err(e) => {
                    warn!("Skipping stock row '{}': {}", code, e);
                    None
                }
            }
        })
        .collect()
}

/// Units of a project, optionally only one kind.
pub async fn list_units(
    pool: &PgPool,
    cache: &AppCache,
    project: &str,
    kind: Option<UnitKind>,
) -> Result<Vec<Unit>, AppError> {
    let units = if let Some(cached) = cache.units.get(project).await {
        debug!("Cache HIT for stock: {}", project);
        cached
    } else {
        debug!("Cache MISS for stock: {}", project);
        let rows = queries::find_units(pool, project).await?;
        let units = Arc::new(parse_units(rows));
        cache.units.insert(project.to_string(), units.clone()).await;
        units
    };

    Ok(units
        .iter()
        .filter(|unit| kind.map_or(true, |k| unit.kind == k))
        .cloned()
        .collect())
}

/// Commission rate of a broker on a project; zero when none is agreed.
pub async fn commission_rate(
    pool: &PgPool,
    cache: &AppCache,
    broker_id: Uuid,
    project: &str,
) -> Result<Decimal, AppError> {
    let key = AppCache::commission_key(broker_id, project);
    if let Some(rate) = cache.commissions.get(&key).await {
        return Ok(rate);
    }

    let rate = match queries::find_broker_commission(pool, broker_id, project).await? {
        Some(row) => row.rate().unwrap_or_else(|e| {
            warn!(
                "Ignoring commission for broker {} on {}: {}",
                broker_id, project, e
            );
            Decimal::ZERO
        }),
        None => Decimal::ZERO,
    };

    cache.commissions.insert(key, rate).await;
    Ok(rate)
}

/// Fill in the UF value when the client left it blank and pin the
/// reservation to the configured amount.
///
/// A failing indicator API leaves the UF value at zero; peso amounts then
/// read as zero instead of failing the whole evaluation.
pub async fn hydrate_state(
    state: QuotationState,
    indicators: &IndicatorClient,
    cache: &AppCache,
    reservation_pesos: Decimal,
) -> QuotationState {
    let mut state = state;

    if state.uf_value.is_zero() {
        match indicators.current(cache).await {
            Ok(uf_value) => state = state.apply(QuotationEdit::SetUfValue { uf_value }),
            Err(e) => warn!("Pricing without UF value: {}", e),
        }
    }

    state.apply(QuotationEdit::SetReservationPesos {
        pesos: reservation_pesos,
    })
}

/// Swap the client's copy of every pricing input for the server's own.
///
/// The main and secondary units are taken from `stock`, the commission from
/// the broker/project agreement and the reservation from configuration, so
/// a saved quotation never prices a larger pool than the broker is allowed.
pub fn reconcile_with_stock(
    state: QuotationState,
    stock: &[Unit],
    commission_rate: Decimal,
    reservation_pesos: Decimal,
) -> Result<QuotationState, AppError> {
    let mut state = state;

    let find = |code: &str, kind: UnitKind| {
        stock
            .iter()
            .find(|u| u.unit_code == code && u.kind == kind)
            .cloned()
            .ok_or_else(|| {
                AppError::BadRequest(format!("unit '{}' is not in stock as {}", code, kind.as_str()))
            })
    };

    let code = state
        .unit
        .as_ref()
        .map(|u| u.unit_code.clone())
        .ok_or_else(|| AppError::BadRequest("quotation has no unit selected".to_string()))?;
    state.unit = Some(find(&code, UnitKind::Main)?);

    state.secondary_units = state
        .secondary_units
        .iter()
        .map(|u| find(&u.unit_code, UnitKind::Secondary))
        .collect::<Result<Vec<_>, _>>()?;

    state.commission_rate = commission_rate.max(Decimal::ZERO).min(Decimal::ONE);
    state = state.apply(QuotationEdit::SetReservationPesos {
        pesos: reservation_pesos,
    });

    Ok(state)
}

/// Project and broker of a save request, checked before any query runs.
fn save_target(request: &SaveQuotationRequest) -> Result<(String, Uuid), AppError> {
    let project = request
        .state
        .unit
        .as_ref()
        .map(|u| u.project_name.clone())
        .ok_or_else(|| AppError::BadRequest("quotation has no unit selected".to_string()))?;

    if request.client.name.trim().is_empty() {
        return Err(AppError::BadRequest("client name is required".to_string()));
    }

    let broker_id = request
        .broker_id
        .ok_or_else(|| AppError::BadRequest("broker is required".to_string()))?;

    Ok((project, broker_id))
}

/// Build the row to insert for a save request.
pub fn new_quotation(request: SaveQuotationRequest) -> Result<(NewQuotation, PriceBreakdown), AppError> {
    let unit = request
        .state
        .unit
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("quotation has no unit selected".to_string()))?;

    if request.client.name.trim().is_empty() {
        return Err(AppError::BadRequest("client name is required".to_string()));
    }

    let breakdown = request.state.breakdown();
    let state = serde_json::to_value(&request.state)
        .map_err(|e| AppError::Internal(format!("serializing quotation state: {}", e)))?;
    let breakdown_json =
        serde_json::to_value(super::responses::BreakdownResponse::from(&breakdown))
            .map_err(|e| AppError::Internal(format!("serializing breakdown: {}", e)))?;

    let quotation = NewQuotation {
        broker_id: request.broker_id,
        project_name: unit.project_name.clone(),
        unit_code: unit.unit_code.clone(),
        mode: request.state.mode.as_str().to_string(),
        total_deed_uf: super::calculators::round_money(breakdown.total_deed_price, 2),
        state,
        breakdown: breakdown_json,
        notes: request.notes.filter(|n| !n.trim().is_empty()),
        client: request.client,
    };

    Ok((quotation, breakdown))
}

/// Re-price a quotation from stock and persist it, returning its id with
/// the breakdown that was stored.
pub async fn save_quotation(
    pool: &PgPool,
    cache: &AppCache,
    request: SaveQuotationRequest,
    reservation_pesos: Decimal,
) -> Result<(Uuid, PriceBreakdown), AppError> {
    let mut request = request;
    let (project, broker_id) = save_target(&request)?;

    let stock = list_units(pool, cache, &project, None).await?;
    let rate = commission_rate(pool, cache, broker_id, &project).await?;
    request.state = reconcile_with_stock(request.state, &stock, rate, reservation_pesos)?;

    let (quotation, breakdown) = new_quotation(request)?;
    let id = queries::insert_quotation(pool, &quotation).await?;
    info!(
        "Saved quotation {} for {} {} ({} UF)",
        id, quotation.project_name, quotation.unit_code, quotation.total_deed_uf
    );
    Ok((id, breakdown))
}

/// Load a quotation and re-price its stored state.
pub async fn load_quotation(pool: &PgPool, id: Uuid) -> Result<StoredQuotation, AppError> {
    let record = queries::get_quotation(pool, id).await?;
    let state: QuotationState = serde_json::from_value(record.state.clone())
        .map_err(|e| AppError::Internal(format!("quotation {} has unreadable state: {}", id, e)))?;
    let breakdown = state.breakdown();

    Ok(StoredQuotation {
        record,
        state,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::ClientInfo;
    use rust_decimal_macros::dec;

    fn stock_row(code: &str, price: Option<Decimal>, kind: &str) -> UnitRow {
        UnitRow {
            project_name: Some("Edificio Mirador".to_string()),
            unit_code: Some(code.to_string()),
            list_price: price,
            base_discount: Some(dec!(0.08)),
            kind: Some(kind.to_string()),
            ..UnitRow::default()
        }
    }

    fn unit() -> Unit {
        Unit::try_from(stock_row("1204", Some(dec!(3000)), "main")).unwrap()
    }

    #[test]
    fn test_parse_units_skips_invalid_rows() {
        let units = parse_units(vec![
            stock_row("1204", Some(dec!(3000)), "main"),
            stock_row("1205", None, "main"),
            stock_row("E-1", Some(dec!(250)), "estacionamiento"),
            stock_row("X-1", Some(dec!(10)), "helipuerto"),
        ]);
        let codes: Vec<&str> = units.iter().map(|u| u.unit_code.as_str()).collect();
        assert_eq!(codes, vec!["1204", "E-1"]);
    }

    fn parking() -> Unit {
        Unit::try_from(stock_row("E-1", Some(dec!(250)), "estacionamiento")).unwrap()
    }

    fn save_request(state: QuotationState) -> SaveQuotationRequest {
        SaveQuotationRequest {
            broker_id: Some(Uuid::nil()),
            client: ClientInfo {
                name: "Ana Rojas".to_string(),
                ..ClientInfo::default()
            },
            state,
            notes: None,
        }
    }

    // ==================== reconcile_with_stock tests ====================

    #[test]
    fn test_forged_inputs_do_not_change_stored_breakdown() {
        let stock = vec![unit(), parking()];
        let forged_unit = Unit {
            list_price: dec!(2000),
            base_discount_rate: dec!(0.30),
            ..unit()
        };
        let forged = QuotationState::for_unit(forged_unit, dec!(0))
            .apply(QuotationEdit::SetMode {
                mode: crate::pricing::QuoteMode::Bono,
            })
            .apply(QuotationEdit::AddSecondaryUnit {
                unit: Unit {
                    list_price: dec!(1),
                    ..parking()
                },
            })
            .apply(QuotationEdit::SetReservationPesos { pesos: dec!(1) });

        let state = reconcile_with_stock(forged, &stock, dec!(0.05), dec!(100000)).unwrap();
        let (quotation, breakdown) = new_quotation(save_request(state)).unwrap();

        // 3000 * 0.92 = 2760; commission 138; pool 3000 - 2898 = 102
        assert_eq!(breakdown.ceiling.max_incentive_pool_uf, dec!(102));
        assert_eq!(breakdown.incentive_uf, dec!(102));
        assert_eq!(breakdown.total_deed_price, dec!(3250));
        assert_eq!(quotation.state["commission_rate"], "0.05");
        assert_eq!(quotation.state["reservation_pesos"], "100000");
    }

    #[test]
    fn test_reconcile_rejects_units_missing_from_stock() {
        let stock = vec![unit(), parking()];

        let unknown = QuotationState::for_unit(
            Unit {
                unit_code: "9999".to_string(),
                ..unit()
            },
            dec!(0),
        );
        assert!(matches!(
            reconcile_with_stock(unknown, &stock, dec!(0.05), dec!(100000)),
            Err(AppError::BadRequest(_))
        ));

        let mut wrong_kind = QuotationState::for_unit(unit(), dec!(0));
        wrong_kind.unit = Some(Unit {
            kind: UnitKind::Main,
            ..parking()
        });
        assert!(matches!(
            reconcile_with_stock(wrong_kind, &stock, dec!(0.05), dec!(100000)),
            Err(AppError::BadRequest(_))
        ));

        let extra = QuotationState::for_unit(unit(), dec!(0)).apply(QuotationEdit::AddSecondaryUnit {
            unit: Unit {
                unit_code: "B-7".to_string(),
                ..parking()
            },
        });
        assert!(matches!(
            reconcile_with_stock(extra, &stock, dec!(0.05), dec!(100000)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_save_target_requires_broker() {
        let mut request = save_request(QuotationState::for_unit(unit(), dec!(0)));
        assert_eq!(
            save_target(&request).unwrap(),
            ("Edificio Mirador".to_string(), Uuid::nil())
        );

        request.broker_id = None;
        assert!(matches!(save_target(&request), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_new_quotation_requires_unit() {
        let request = SaveQuotationRequest {
            broker_id: None,
            client: ClientInfo {
                name: "Ana Rojas".to_string(),
                ..ClientInfo::default()
            },
            state: QuotationState::default(),
            notes: None,
        };
        assert!(matches!(new_quotation(request), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_new_quotation_requires_client_name() {
        let request = SaveQuotationRequest {
            broker_id: None,
            client: ClientInfo::default(),
            state: QuotationState::for_unit(unit(), dec!(0)),
            notes: None,
        };
        assert!(matches!(new_quotation(request), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_new_quotation_captures_state_and_totals() {
        let request = SaveQuotationRequest {
            broker_id: Some(Uuid::nil()),
            client: ClientInfo {
                name: "Ana Rojas".to_string(),
                email: Some("ana@example.com".to_string()),
                ..ClientInfo::default()
            },
            state: QuotationState::for_unit(unit(), dec!(0.02)),
            notes: Some("   ".to_string()),
        };

        let (quotation, breakdown) = new_quotation(request).unwrap();
        // 3000 * 0.92 = 2760; * 1.02 = 2815.2; discount 184.8
        assert_eq!(breakdown.total_deed_price, dec!(2815.2));
        assert_eq!(quotation.total_deed_uf, dec!(2815.2));
        assert_eq!(quotation.unit_code, "1204");
        assert_eq!(quotation.mode, "discount");
        assert!(quotation.notes.is_none());
        assert_eq!(quotation.state["unit"]["unit_code"], "1204");
        assert_eq!(quotation.breakdown["total_deed_price"]["amount"], "2815.20");
    }
}
