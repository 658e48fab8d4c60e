//! Quotation form state and its reducer.
//!
//! The quoting form is one serializable [`QuotationState`]. Every user action
//! is a [`QuotationEdit`] folded in with [`QuotationState::apply`], and every
//! displayed number comes out of [`QuotationState::breakdown`]. Derived
//! values are never stored, so two-way bound fields cannot drift apart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculators::{
    adjusted_discount, bounded_input, parse_amount, payment_schedule, percent_of, reservation_uf, round_money,
    split_pool, DiscountCeiling, LineInput, MixInput, PaymentSchedule, QuoteMode,
};
use super::models::{Unit, UnitKind};

/// Everything the user has chosen or typed on the quoting form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotationState {
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub secondary_units: Vec<Unit>,
    /// Broker commission for the unit's project, as a fraction
    #[serde(default)]
    pub commission_rate: Decimal,
    /// Pesos per UF
    #[serde(default)]
    pub uf_value: Decimal,
    /// Fixed reservation amount in pesos
    #[serde(default)]
    pub reservation_pesos: Decimal,
    #[serde(default)]
    pub mode: QuoteMode,
    #[serde(default)]
    pub mix: MixInput,
    #[serde(default)]
    pub promise: LineInput,
    #[serde(default)]
    pub down_payment: LineInput,
}

/// A single user action on the quoting form.
///
/// Numeric fields carry the raw text typed by the user; it is coerced with
/// [`parse_amount`], so bad input reads as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuotationEdit {
    SelectUnit {
        unit: Unit,
        #[serde(default)]
        commission_rate: Decimal,
    },
    AddSecondaryUnit {
        unit: Unit,
    },
    RemoveSecondaryUnit {
        unit_code: String,
    },
    SetMode {
        mode: QuoteMode,
    },
    SetUfValue {
        uf_value: Decimal,
    },
    SetReservationPesos {
        pesos: Decimal,
    },
    SetIncentivePercent {
        value: String,
    },
    SetIncentiveUf {
        value: String,
    },
    SetDiscountPercent {
        value: String,
    },
    SetPromiseUf {
        value: String,
    },
    SetPromisePercent {
        value: String,
    },
    SetDownPaymentUf {
        value: String,
    },
    SetDownPaymentPercent {
        value: String,
    },
}

/// Every value shown on the quoting form, derived from a [`QuotationState`]
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub mode: QuoteMode,
    pub list_price: Decimal,
    pub ceiling: DiscountCeiling,
    /// Discount as a percentage of list price
    pub discount_percent: Decimal,
    pub discount_uf: Decimal,
    pub incentive_uf: Decimal,
    /// Incentive as a percentage of total deed price
    pub incentive_percent: Decimal,
    pub net_unit_price: Decimal,
    pub secondary_total: Decimal,
    pub total_deed_price: Decimal,
    pub payment: PaymentSchedule,
}

impl QuotationState {
    /// Fresh form for a unit
    pub fn for_unit(unit: Unit, commission_rate: Decimal) -> Self {
        Self::default().apply(QuotationEdit::SelectUnit {
            unit,
            commission_rate,
        })
    }

    /// Fold one edit into the state.
    ///
    /// Edits that make no sense in the current mode (a discount percentage
    /// in `bono` mode, an incentive in `discount` mode) leave the state as is.
    pub fn apply(mut self, edit: QuotationEdit) -> Self {
        match edit {
            QuotationEdit::SelectUnit {
                unit,
                commission_rate,
            } => {
                let same_project = self
                    .unit
                    .as_ref()
                    .map(|current| current.project_name == unit.project_name)
                    .unwrap_or(false);
                if !same_project {
                    self.secondary_units.clear();
                }
                self.commission_rate = commission_rate.max(Decimal::ZERO).min(Decimal::ONE);
                self.mix = MixInput::default();
                self.unit = Some(unit);
            }
            QuotationEdit::AddSecondaryUnit { unit } => {
                let duplicate = self
                    .secondary_units
                    .iter()
                    .any(|existing| existing.unit_code == unit.unit_code);
                if unit.kind == UnitKind::Secondary && !duplicate {
                    self.secondary_units.push(unit);
                }
            }
            QuotationEdit::RemoveSecondaryUnit { unit_code } => {
                self.secondary_units.retain(|u| u.unit_code != unit_code);
            }
            QuotationEdit::SetMode { mode } => {
                if mode != self.mode {
                    self.mix = MixInput::default();
                }
                self.mode = mode;
            }
            QuotationEdit::SetUfValue { uf_value } => {
                self.uf_value = bounded_input(uf_value);
            }
            QuotationEdit::SetReservationPesos { pesos } => {
                self.reservation_pesos = bounded_input(pesos);
            }
            QuotationEdit::SetIncentivePercent { value } if self.mode == QuoteMode::Mix => {
                self.mix = MixInput::IncentivePercent(parse_amount(&value));
            }
            QuotationEdit::SetIncentiveUf { value } if self.mode == QuoteMode::Mix => {
                self.mix = MixInput::IncentiveUf(parse_amount(&value));
            }
            QuotationEdit::SetDiscountPercent { value } if self.mode == QuoteMode::Mix => {
                self.mix = MixInput::DiscountPercent(parse_amount(&value));
            }
            QuotationEdit::SetIncentivePercent { .. }
            | QuotationEdit::SetIncentiveUf { .. }
            | QuotationEdit::SetDiscountPercent { .. } => {
                tracing::debug!("Ignoring pool edit in {} mode", self.mode);
            }
            QuotationEdit::SetPromiseUf { value } => {
                self.promise = LineInput::Uf(parse_amount(&value));
            }
            QuotationEdit::SetPromisePercent { value } => {
                self.promise = LineInput::Percent(parse_amount(&value));
            }
            QuotationEdit::SetDownPaymentUf { value } => {
                self.down_payment = LineInput::Uf(parse_amount(&value));
            }
            QuotationEdit::SetDownPaymentPercent { value } => {
                self.down_payment = LineInput::Percent(parse_amount(&value));
            }
        }
        self
    }

    /// Fold a sequence of edits, oldest first.
    pub fn apply_all<I>(self, edits: I) -> Self
    where
        I: IntoIterator<Item = QuotationEdit>,
    {
        edits.into_iter().fold(self, QuotationState::apply)
    }

    /// Sum of list prices of the attached secondary units
    pub fn secondary_total(&self) -> Decimal {
        self.secondary_units
            .iter()
            .map(|u| bounded_input(u.list_price))
            .sum()
    }

    /// Derive the full price breakdown and payment schedule.
    pub fn breakdown(&self) -> PriceBreakdown {
        let (list_price, base_discount_rate) = self
            .unit
            .as_ref()
            .map(|u| (bounded_input(u.list_price), u.base_discount_rate))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));

        let ceiling = adjusted_discount(list_price, base_discount_rate, self.commission_rate);
        let secondary_total = self.secondary_total();
        let split = split_pool(self.mode, &ceiling, self.mix, list_price, secondary_total);

        let discount_percent = match self.mode {
            QuoteMode::Discount => {
                round_money(ceiling.adjusted_discount_rate * Decimal::ONE_HUNDRED, 2)
            }
            QuoteMode::Bono => Decimal::ZERO,
            QuoteMode::Mix => percent_of(split.discount_uf, list_price),
        };

        let net_unit_price = list_price - split.discount_uf;
        let total_deed_price = net_unit_price + secondary_total;

        let payment = payment_schedule(
            total_deed_price,
            reservation_uf(self.reservation_pesos, self.uf_value),
            self.promise.resolve(total_deed_price),
            self.down_payment.resolve(total_deed_price),
            split.incentive_uf,
            self.uf_value,
        );

        PriceBreakdown {
            mode: self.mode,
            list_price,
            ceiling,
            discount_percent,
            discount_uf: split.discount_uf,
            incentive_uf: split.incentive_uf,
            incentive_percent: percent_of(split.incentive_uf, total_deed_price),
            net_unit_price,
            secondary_total,
            total_deed_price,
            payment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculators::PaymentConcept;
    use rust_decimal_macros::dec;

    fn unit(code: &str, list_price: Decimal, kind: UnitKind) -> Unit {
        Unit {
            project_name: "Edificio Mirador".to_string(),
            unit_code: code.to_string(),
            typology: None,
            floor: None,
            useful_area: dec!(0),
            terrace_area: dec!(0),
            total_area: dec!(0),
            list_price,
            base_discount_rate: dec!(0.10),
            status: "Disponible".to_string(),
            kind,
        }
    }

    fn reference_state() -> QuotationState {
        QuotationState::for_unit(unit("1204", dec!(3000), UnitKind::Main), dec!(0.05))
    }

    fn edit_value(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn test_discount_mode_uses_adjusted_rate() {
        let breakdown = reference_state().breakdown();
        assert_eq!(breakdown.discount_percent, dec!(5.5));
        assert_eq!(breakdown.discount_uf, dec!(165));
        assert_eq!(breakdown.incentive_uf, dec!(0));
        assert_eq!(breakdown.net_unit_price, dec!(2835));
        assert_eq!(breakdown.total_deed_price, dec!(2835));
    }

    #[test]
    fn test_bono_mode_gives_whole_pool_as_incentive() {
        let breakdown = reference_state()
            .apply(QuotationEdit::SetMode { mode: QuoteMode::Bono })
            .breakdown();
        assert_eq!(breakdown.discount_percent, dec!(0));
        assert_eq!(breakdown.incentive_uf, dec!(165));
        assert_eq!(breakdown.net_unit_price, dec!(3000));
        assert_eq!(breakdown.total_deed_price, dec!(3000));
        assert_eq!(breakdown.incentive_percent, dec!(5.5));
        assert_eq!(breakdown.payment.uf(PaymentConcept::IncentiveDownPayment), dec!(165));
    }

    #[test]
    fn test_pool_edits_ignored_outside_mix() {
        let state = reference_state().apply(QuotationEdit::SetDiscountPercent {
            value: edit_value("1"),
        });
        assert_eq!(state.mix, MixInput::default());
        assert_eq!(state.breakdown().discount_percent, dec!(5.5));
    }

    #[test]
    fn test_mix_mode_leaving_fifty_uf_of_discount() {
        let breakdown = reference_state()
            .apply(QuotationEdit::SetMode { mode: QuoteMode::Mix })
            .apply(QuotationEdit::SetIncentiveUf { value: edit_value("115") })
            .breakdown();
        assert_eq!(breakdown.discount_uf, dec!(50));
        assert_eq!(breakdown.discount_percent, dec!(1.67));
        assert_eq!(breakdown.total_deed_price, dec!(2950));
    }

    #[test]
    fn test_mix_mode_last_edit_wins() {
        let state = reference_state()
            .apply(QuotationEdit::SetMode { mode: QuoteMode::Mix })
            .apply(QuotationEdit::SetIncentivePercent { value: edit_value("3") })
            .apply(QuotationEdit::SetDiscountPercent { value: edit_value("4") });
        assert_eq!(state.mix, MixInput::DiscountPercent(dec!(4)));

        let breakdown = state.breakdown();
        assert_eq!(breakdown.discount_uf, dec!(120));
        assert_eq!(breakdown.incentive_uf, dec!(45));
    }

    #[test]
    fn test_mode_change_resets_mix_driver() {
        let state = reference_state()
            .apply(QuotationEdit::SetMode { mode: QuoteMode::Mix })
            .apply(QuotationEdit::SetIncentiveUf { value: edit_value("100") })
            .apply(QuotationEdit::SetMode { mode: QuoteMode::Bono })
            .apply(QuotationEdit::SetMode { mode: QuoteMode::Mix });
        assert_eq!(state.mix, MixInput::default());
        assert_eq!(state.breakdown().incentive_uf, dec!(0));
    }

    #[test]
    fn test_secondary_units_add_to_deed_price() {
        let breakdown = reference_state()
            .apply(QuotationEdit::AddSecondaryUnit {
                unit: unit("E-12", dec!(250), UnitKind::Secondary),
            })
            .apply(QuotationEdit::AddSecondaryUnit {
                unit: unit("B-3", dec!(90), UnitKind::Secondary),
            })
            .breakdown();
        assert_eq!(breakdown.secondary_total, dec!(340));
        assert_eq!(breakdown.total_deed_price, dec!(3175));
    }

    #[test]
    fn test_secondary_units_deduplicated_and_removable() {
        let state = reference_state()
            .apply(QuotationEdit::AddSecondaryUnit {
                unit: unit("E-12", dec!(250), UnitKind::Secondary),
            })
            .apply(QuotationEdit::AddSecondaryUnit {
                unit: unit("E-12", dec!(250), UnitKind::Secondary),
            })
            .apply(QuotationEdit::AddSecondaryUnit {
                unit: unit("1301", dec!(3100), UnitKind::Main),
            });
        assert_eq!(state.secondary_units.len(), 1);

        let state = state.apply(QuotationEdit::RemoveSecondaryUnit {
            unit_code: "E-12".to_string(),
        });
        assert!(state.secondary_units.is_empty());
    }

    #[test]
    fn test_selecting_unit_in_other_project_drops_secondaries() {
        let mut other = unit("A-1", dec!(5000), UnitKind::Main);
        other.project_name = "Parque Sur".to_string();

        let state = reference_state()
            .apply(QuotationEdit::AddSecondaryUnit {
                unit: unit("E-12", dec!(250), UnitKind::Secondary),
            })
            .apply(QuotationEdit::SelectUnit {
                unit: other,
                commission_rate: dec!(0),
            });
        assert!(state.secondary_units.is_empty());
        assert_eq!(state.breakdown().list_price, dec!(5000));
    }

    #[test]
    fn test_payment_lines_follow_total_when_entered_as_percent() {
        let state = reference_state()
            .apply(QuotationEdit::SetUfValue { uf_value: dec!(40000) })
            .apply(QuotationEdit::SetReservationPesos { pesos: dec!(100000) })
            .apply(QuotationEdit::SetPromisePercent { value: edit_value("10") })
            .apply(QuotationEdit::SetDownPaymentUf { value: edit_value("141,75") });

        let breakdown = state.breakdown();
        let payment = &breakdown.payment;
        assert_eq!(payment.uf(PaymentConcept::Reservation), dec!(2.5));
        assert_eq!(payment.uf(PaymentConcept::Promise), dec!(283.5));
        assert_eq!(payment.line(PaymentConcept::DownPayment).unwrap().percent, dec!(5));
        assert_eq!(payment.uf(PaymentConcept::MortgageCredit), dec!(2407.25));
        assert_eq!(payment.total_uf, breakdown.total_deed_price);

        // Switching to bono raises the total; the promise keeps its 10 %
        let breakdown = state
            .apply(QuotationEdit::SetMode { mode: QuoteMode::Bono })
            .breakdown();
        assert_eq!(breakdown.payment.uf(PaymentConcept::Promise), dec!(300));
        assert_eq!(breakdown.payment.total_uf, dec!(3000));
    }

    #[test]
    fn test_garbage_edits_read_as_zero() {
        let breakdown = reference_state()
            .apply(QuotationEdit::SetPromiseUf { value: edit_value("abc") })
            .apply(QuotationEdit::SetDownPaymentPercent { value: edit_value("") })
            .breakdown();
        assert_eq!(breakdown.payment.uf(PaymentConcept::Promise), dec!(0));
        assert_eq!(breakdown.payment.uf(PaymentConcept::DownPayment), dec!(0));
        assert_eq!(breakdown.payment.uf(PaymentConcept::MortgageCredit), dec!(2835));
    }

    #[test]
    fn test_oversized_numbers_read_as_zero() {
        let huge = dec!(1000000000000000);
        let breakdown = QuotationState::for_unit(unit("1204", huge, UnitKind::Main), dec!(0.05))
            .apply(QuotationEdit::SetUfValue { uf_value: huge })
            .apply(QuotationEdit::SetReservationPesos { pesos: huge })
            .apply(QuotationEdit::AddSecondaryUnit {
                unit: unit("E-1", huge, UnitKind::Secondary),
            })
            .breakdown();

        assert_eq!(breakdown.total_deed_price, dec!(0));
        assert_eq!(breakdown.payment.total_pesos, dec!(0));
    }

    #[test]
    fn test_oversized_numbers_in_stored_state_do_not_panic() {
        // Values deserialized straight into the state skip the reducer.
        let mut state = reference_state();
        state.uf_value = Decimal::MAX;
        state.reservation_pesos = Decimal::MAX;
        state.promise = LineInput::Percent(Decimal::MAX);
        state.mix = MixInput::DiscountPercent(Decimal::MAX);
        state.mode = QuoteMode::Mix;

        let breakdown = state.breakdown();
        assert_eq!(breakdown.total_deed_price, dec!(3000));
        assert_eq!(breakdown.payment.uf(PaymentConcept::Promise), dec!(0));
        assert_eq!(breakdown.payment.total_pesos, dec!(0));
        assert_eq!(breakdown.payment.total_uf, dec!(3000));
    }

    #[test]
    fn test_empty_state_is_all_zero() {
        let breakdown = QuotationState::default()
            .apply(QuotationEdit::SetPromiseUf { value: edit_value("100") })
            .breakdown();
        assert_eq!(breakdown.total_deed_price, dec!(0));
        assert_eq!(breakdown.incentive_percent, dec!(0));
        for line in &breakdown.payment.lines {
            assert_eq!(line.percent, dec!(0));
        }
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let state = reference_state()
            .apply(QuotationEdit::SetMode { mode: QuoteMode::Mix })
            .apply(QuotationEdit::SetIncentivePercent { value: edit_value("2,5") })
            .apply(QuotationEdit::SetPromisePercent { value: edit_value("10") });

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mix"]["driver"], "incentive_percent");
        assert_eq!(json["promise"]["entered"], "percent");

        let restored: QuotationState = serde_json::from_value(json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_edit_deserializes_from_tagged_json() {
        let edit: QuotationEdit = serde_json::from_str(
            r#"{"type": "set_promise_percent", "value": "15"}"#,
        )
        .unwrap();
        assert_eq!(edit, QuotationEdit::SetPromisePercent { value: edit_value("15") });
    }
}
