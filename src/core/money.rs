//! Currency helpers shared by the calculator, the entities and the reports.
//!
//! Amounts live in the database as integer paise and in the domain as exact
//! `Decimal` rupees. Every currency value shown on an invoice goes through
//! [`round2`], which rounds half-up to two places.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to 2 decimal places, half-up.
///
/// Inputs are non-negative in practice, where midpoint-away-from-zero is exactly
/// round-half-up.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a stored paise value back to rupees.
#[must_use]
pub fn from_paise(paise: i64) -> Decimal {
    Decimal::new(paise, 2)
}

/// Converts rupees to paise, rounding half-up to the nearest paisa first.
///
/// # Errors
/// Returns `Error::InvalidAmount` if the value does not fit in an `i64` of paise.
pub fn to_paise(amount: Decimal) -> Result<i64> {
    let mut rounded = round2(amount);
    rounded.rescale(2);
    i64::try_from(rounded.mantissa()).map_err(|_| Error::InvalidAmount {
        amount: amount.to_string(),
    })
}

/// Formats an amount for invoices with thousands grouping, e.g. `₹19,200.00`.
#[must_use]
pub fn format_rupees(amount: Decimal) -> String {
    let mut rounded = round2(amount);
    rounded.rescale(2);
    let text = rounded.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}₹{grouped}.{fraction}")
}
