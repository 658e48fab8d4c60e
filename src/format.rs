//! Chilean display formatting for UF, pesos, percentages and areas.
//!
//! Dots group thousands and the comma is the decimal mark. Values arriving
//! as floats go through [`decimal_or_zero`] first, so NaN and infinities
//! print as zero.

use rust_decimal::Decimal;

use crate::pricing::calculators::round_money;
pub use crate::pricing::calculators::decimal_or_zero;

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Format with a fixed number of decimals, es-CL style. A value that rounds
/// to zero never carries a minus sign.
pub fn format_number(value: Decimal, places: u32) -> String {
    let rounded = round_money(value, places);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", places as usize, rounded.abs());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// `1.234,56 UF`
pub fn format_uf(value: Decimal) -> String {
    format!("{} UF", format_number(value, 2))
}

/// `$1.234.567`, whole pesos
pub fn format_pesos(value: Decimal) -> String {
    let rounded = round_money(value, 0);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${}", format_number(rounded.abs(), 0))
    } else {
        format!("${}", format_number(rounded, 0))
    }
}

/// `5,50%`
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_number(value, 2))
}

/// `54,30 m²`
pub fn format_area(value: Decimal) -> String {
    format!("{} m²", format_number(value, 2))
}
