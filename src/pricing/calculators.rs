//! Core pricing calculation functions.
//!
//! Pure functions for quotation math - no database access. Every function
//! here is total: zero denominators and unusable input collapse to zero
//! instead of producing an error.

use std::str::FromStr;

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Round to specified decimal places, halves away from zero.
///
/// This is the rounding users see on the quoting form, so `1.665` shows as
/// `1.67` and not `1.66`.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use inverapp_web::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(3));
/// assert_eq!(round_money(dec!(1.665), 2), dec!(1.67));
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Divide, yielding zero when the denominator is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// `part` as a percentage of `whole`, rounded to 2 places. Zero when `whole` is zero.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    let ratio = safe_div(part, whole);
    round_money(ratio.checked_mul(Decimal::ONE_HUNDRED).unwrap_or(Decimal::ZERO), 2)
}

/// Amount corresponding to `percent` of `whole`, rounded to 2 places.
pub fn amount_from_percent(percent: Decimal, whole: Decimal) -> Decimal {
    let amount = (percent / Decimal::ONE_HUNDRED).checked_mul(whole);
    round_money(amount.unwrap_or(Decimal::ZERO), 2)
}

/// Largest magnitude accepted for any price, amount or percentage input.
fn max_input() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

/// Keep an input inside `[0, 10^12]`; anything outside reads as zero.
///
/// Every value that reaches the engine from a client passes through here,
/// which keeps all products far from `Decimal`'s overflow point.
pub fn bounded_input(value: Decimal) -> Decimal {
    if value.is_sign_negative() || value > max_input() {
        Decimal::ZERO
    } else {
        value
    }
}

/// Coerce a free-text numeric edit into a non-negative decimal.
///
/// Accepts `1234.5`, `1.234,5`, `3.000.000`, `$ 1.100.000`, `12,5 %` and
/// `4.000,00 UF`. Anything unparseable, negative or absurdly large becomes zero.
pub fn parse_amount(input: &str) -> Decimal {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let normalized = if cleaned.contains(',') {
        // Chilean notation: dots group thousands, the comma is the decimal mark
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() > 1 {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    Decimal::from_str(&normalized)
        .map(bounded_input)
        .unwrap_or(Decimal::ZERO)
}

/// Convert a float coming from JSON or an external API, mapping NaN and
/// infinities to zero.
pub fn decimal_or_zero(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn clamp_unit_interval(rate: Decimal) -> Decimal {
    rate.max(Decimal::ZERO).min(Decimal::ONE)
}

/// How a quotation spends its discount pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteMode {
    /// Whole pool taken as a list-price discount.
    #[default]
    Discount,
    /// Whole pool given as a down-payment incentive (bono pie).
    Bono,
    /// Pool shared between discount and incentive.
    Mix,
}

impl QuoteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteMode::Discount => "discount",
            QuoteMode::Bono => "bono",
            QuoteMode::Mix => "mix",
        }
    }

    /// Label printed on the quotation sheet.
    pub fn label(&self) -> &'static str {
        match self {
            QuoteMode::Discount => "Descuento",
            QuoteMode::Bono => "Bono pie",
            QuoteMode::Mix => "Descuento + bono pie",
        }
    }
}

impl std::fmt::Display for QuoteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discount still available on a unit once the broker commission is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountCeiling {
    pub net_at_nominal_discount: Decimal,
    pub broker_commission_uf: Decimal,
    pub price_after_commission: Decimal,
    pub available_discount_uf: Decimal,
    /// Fraction of list price, clamped to `[0, 1]`.
    pub adjusted_discount_rate: Decimal,
    pub max_incentive_pool_uf: Decimal,
}

/// Reduce the nominal discount of a unit so the seller's net price survives
/// the broker commission.
///
/// The adjusted rate caps the discount in `discount` mode and the shared
/// discount + incentive pool in `mix` and `bono` modes.
pub fn adjusted_discount(
    list_price: Decimal,
    base_discount_rate: Decimal,
    commission_rate: Decimal,
) -> DiscountCeiling {
    let list_price = bounded_input(list_price);
    let base_discount_rate = clamp_unit_interval(base_discount_rate);
    let commission_rate = clamp_unit_interval(commission_rate);

    let net_at_nominal_discount = list_price * (Decimal::ONE - base_discount_rate);
    let broker_commission_uf = net_at_nominal_discount * commission_rate;
    let price_after_commission = net_at_nominal_discount + broker_commission_uf;
    let available_discount_uf = list_price - price_after_commission;
    let adjusted_discount_rate =
        clamp_unit_interval(safe_div(available_discount_uf, list_price));

    DiscountCeiling {
        net_at_nominal_discount,
        broker_commission_uf,
        price_after_commission,
        available_discount_uf,
        adjusted_discount_rate,
        max_incentive_pool_uf: list_price * adjusted_discount_rate,
    }
}

/// The one value driving a `mix` quotation; the rest of the pool is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "driver", content = "value", rename_all = "snake_case")]
pub enum MixInput {
    /// Incentive as a percentage of the resulting total deed price.
    IncentivePercent(Decimal),
    /// Incentive in UF.
    IncentiveUf(Decimal),
    /// Discount as a percentage of list price.
    DiscountPercent(Decimal),
}

impl Default for MixInput {
    fn default() -> Self {
        MixInput::IncentiveUf(Decimal::ZERO)
    }
}

/// Discount and incentive portions of the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolSplit {
    pub discount_uf: Decimal,
    pub incentive_uf: Decimal,
}

/// Split the discount pool between discount and incentive for a mode.
///
/// In `mix` mode the incentive percentage refers to the total deed price,
/// which itself moves with the discount. The fixed point is solved directly:
/// with pool `P`, list price `L`, secondary units `S` and percentage `p`,
/// `I = p (L - P + S) / (100 - p)`.
pub fn split_pool(
    mode: QuoteMode,
    ceiling: &DiscountCeiling,
    mix: MixInput,
    list_price: Decimal,
    secondary_total: Decimal,
) -> PoolSplit {
    let pool = ceiling.max_incentive_pool_uf;

    match mode {
        QuoteMode::Discount => PoolSplit {
            discount_uf: pool,
            incentive_uf: Decimal::ZERO,
        },
        QuoteMode::Bono => PoolSplit {
            discount_uf: Decimal::ZERO,
            incentive_uf: pool,
        },
        QuoteMode::Mix => {
            let list_price = bounded_input(list_price);
            let incentive = match mix {
                MixInput::IncentiveUf(uf) => bounded_input(uf),
                MixInput::DiscountPercent(percent) => {
                    let discount = (list_price * bounded_input(percent) / Decimal::ONE_HUNDRED)
                        .max(Decimal::ZERO)
                        .min(pool);
                    pool - discount
                }
                MixInput::IncentivePercent(percent) => {
                    if percent >= Decimal::ONE_HUNDRED {
                        pool
                    } else {
                        let percent = percent.max(Decimal::ZERO);
                        safe_div(
                            percent * (list_price - pool + secondary_total),
                            Decimal::ONE_HUNDRED - percent,
                        )
                    }
                }
            };

            let incentive_uf = round_money(incentive, 2).max(Decimal::ZERO).min(pool);
            PoolSplit {
                discount_uf: pool - incentive_uf,
                incentive_uf,
            }
        }
    }
}

/// A payment line remembers which of its two fields the user typed last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entered", content = "value", rename_all = "snake_case")]
pub enum LineInput {
    Uf(Decimal),
    Percent(Decimal),
}

impl Default for LineInput {
    fn default() -> Self {
        LineInput::Uf(Decimal::ZERO)
    }
}

/// UF amount and percentage of a payment line after syncing both fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineAmount {
    pub uf: Decimal,
    pub percent: Decimal,
}

impl LineInput {
    /// Derive the untyped field from the typed one against the current total.
    pub fn resolve(&self, total_deed_price: Decimal) -> LineAmount {
        match *self {
            LineInput::Uf(uf) => {
                let uf = round_money(bounded_input(uf), 2);
                LineAmount {
                    uf,
                    percent: percent_of(uf, total_deed_price),
                }
            }
            LineInput::Percent(percent) => {
                let percent = round_money(bounded_input(percent), 2);
                LineAmount {
                    uf: amount_from_percent(percent, total_deed_price),
                    percent,
                }
            }
        }
    }
}

/// Reservation line in UF: a fixed peso amount at today's UF value.
pub fn reservation_uf(reservation_pesos: Decimal, uf_value: Decimal) -> Decimal {
    let uf = safe_div(bounded_input(reservation_pesos), bounded_input(uf_value));
    bounded_input(round_money(uf, 2))
}

/// Peso equivalent of a UF amount, whole pesos.
pub fn uf_to_pesos(uf: Decimal, uf_value: Decimal) -> Decimal {
    let pesos = uf.checked_mul(bounded_input(uf_value));
    round_money(pesos.unwrap_or(Decimal::ZERO), 0)
}

/// Named lines of a payment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentConcept {
    Reservation,
    Promise,
    DownPayment,
    MortgageCredit,
    IncentiveDownPayment,
}

impl PaymentConcept {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentConcept::Reservation => "Reserva",
            PaymentConcept::Promise => "Promesa",
            PaymentConcept::DownPayment => "Pie",
            PaymentConcept::MortgageCredit => "Crédito hipotecario",
            PaymentConcept::IncentiveDownPayment => "Bono pie",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentLine {
    pub concept: PaymentConcept,
    pub uf: Decimal,
    pub percent: Decimal,
    pub pesos: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSchedule {
    pub lines: Vec<PaymentLine>,
    pub total_uf: Decimal,
    pub total_percent: Decimal,
    pub total_pesos: Decimal,
}

impl PaymentSchedule {
    pub fn line(&self, concept: PaymentConcept) -> Option<&PaymentLine> {
        self.lines.iter().find(|line| line.concept == concept)
    }

    /// UF amount of a line, zero when absent.
    pub fn uf(&self, concept: PaymentConcept) -> Decimal {
        self.line(concept).map(|line| line.uf).unwrap_or(Decimal::ZERO)
    }
}

/// Build the payment schedule for a total deed price.
///
/// Mortgage credit is the balancing line, so the schedule always adds up to
/// `total_deed_price`. It goes negative when the other lines over-allocate.
pub fn payment_schedule(
    total_deed_price: Decimal,
    reservation_uf: Decimal,
    promise: LineAmount,
    down_payment: LineAmount,
    incentive_uf: Decimal,
    uf_value: Decimal,
) -> PaymentSchedule {
    let mortgage_credit_uf =
        total_deed_price - (reservation_uf + promise.uf + down_payment.uf + incentive_uf);

    let line = |concept: PaymentConcept, uf: Decimal, percent: Option<Decimal>| PaymentLine {
        concept,
        uf,
        percent: percent.unwrap_or_else(|| percent_of(uf, total_deed_price)),
        pesos: uf_to_pesos(uf, uf_value),
    };

    let lines = vec![
        line(PaymentConcept::Reservation, reservation_uf, None),
        line(PaymentConcept::Promise, promise.uf, Some(promise.percent)),
        line(
            PaymentConcept::DownPayment,
            down_payment.uf,
            Some(down_payment.percent),
        ),
        line(PaymentConcept::MortgageCredit, mortgage_credit_uf, None),
        line(PaymentConcept::IncentiveDownPayment, incentive_uf, None),
    ];

    let total_uf: Decimal = lines.iter().map(|l| l.uf).sum();

    PaymentSchedule {
        total_percent: percent_of(total_uf, total_deed_price),
        total_pesos: uf_to_pesos(total_uf, uf_value),
        total_uf,
        lines,
    }
}
