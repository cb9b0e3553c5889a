//! Common utility functions for tax calculations.
//!
//! This module provides shared functionality used across the scenario
//! calculators, including currency and ratio rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Midpoints are rounded toward positive infinity, matching scaled
/// `round(x * 100) / 100` semantics: `0.005` becomes `0.01` and `-0.005`
/// becomes `-0.00`. This is not banker's rounding.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(123.456)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.45)); // Toward +infinity
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    round_dp_half_up(value, 2)
}

/// Rounds a rate or ratio to four decimal places using half-up rounding.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::calculations::common::round_rate;
///
/// assert_eq!(round_rate(dec!(0.07690)), dec!(0.0769));
/// assert_eq!(round_rate(dec!(0.123456)), dec!(0.1235));
/// ```
pub fn round_rate(value: Decimal) -> Decimal {
    round_dp_half_up(value, 4)
}

/// Rounds to the nearest whole ringgit using half-up rounding.
///
/// Used for crossover and target profits, which are reported in whole
/// ringgit.
///
/// # Arguments
///
/// * `value` - The amount to round
///
/// # Returns
///
/// The amount with no fractional part. Midpoints go toward positive
/// infinity, so `-0.5` becomes zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::calculations::common::round_whole;
///
/// assert_eq!(round_whole(dec!(1234.5)), dec!(1235));
/// assert_eq!(round_whole(dec!(1234.49)), dec!(1234));
/// assert_eq!(round_whole(dec!(-0.5)), dec!(0));
/// ```
pub fn round_whole(value: Decimal) -> Decimal {
    round_dp_half_up(value, 0)
}

fn round_dp_half_up(
    value: Decimal,
    dp: u32,
) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(dp, strategy)
}

/// Returns the maximum of two decimal values.
///
/// # Arguments
///
/// * `a` - First decimal value
/// * `b` - Second decimal value
///
/// # Returns
///
/// The larger of the two values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Divides `part` by `whole` as a rate.
///
/// # Arguments
///
/// * `part` - The numerator, such as tax paid
/// * `whole` - The denominator, such as total income
///
/// # Returns
///
/// `part / whole` rounded to four decimal places, or zero when `whole` is
/// zero or negative.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use bizstruct_core::calculations::common::ratio;
///
/// assert_eq!(ratio(dec!(7690), dec!(100000)), dec!(0.0769));
/// assert_eq!(ratio(dec!(100), dec!(0)), Decimal::ZERO);
/// ```
pub fn ratio(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_rate(part / whole)
}

/// Applies a percentage expressed on a 0-100 scale.
///
/// # Arguments
///
/// * `amount` - The base amount
/// * `percent` - The percentage, where `60` means sixty percent
///
/// # Returns
///
/// `amount × percent / 100`, unrounded.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::calculations::common::percent_of;
///
/// assert_eq!(percent_of(dec!(200000), dec!(60)), dec!(120000));
/// assert_eq!(percent_of(dec!(702856), dec!(100)), dec!(702856));
/// ```
pub fn percent_of(
    amount: Decimal,
    percent: Decimal,
) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// Formats an amount as ringgit with thousands separators, e.g.
/// `RM1,234.50`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::calculations::common::format_ringgit;
///
/// assert_eq!(format_ringgit(dec!(1234.5)), "RM1,234.50");
/// assert_eq!(format_ringgit(dec!(-98765432.1)), "-RM98,765,432.10");
/// ```
pub fn format_ringgit(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}RM{grouped}.{cents}")
}
