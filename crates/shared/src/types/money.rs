//! Shilling amount helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the lending core is a `rust_decimal::Decimal` in KES.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount to whole shillings, half away from zero.
///
/// The mobile-money provider only accepts integral amounts.
#[must_use]
pub fn round_to_shillings(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount for borrower-facing messages, e.g. `12,500`.
///
/// Fractional shillings are rounded away before grouping.
#[must_use]
pub fn format_kes(amount: Decimal) -> String {
    let rounded = round_to_shillings(amount);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}
