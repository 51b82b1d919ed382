//! Rounding and clamping helpers shared by the modeling engine and the
//! export/display layer.
//!
//! Arithmetic inside the engine runs at full decimal precision; these
//! rounding functions are only meant for display and export boundaries.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to cents using half-up (away from zero) rounding.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use lgdf_core::calculations::common::round_cents;
///
/// assert_eq!(round_cents(dec!(1739130.434782)), dec!(1739130.43));
/// assert_eq!(round_cents(dec!(0.005)), dec!(0.01));
/// ```
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to whole currency units, as shown in tables and chart axes.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use lgdf_core::calculations::common::round_whole_units;
///
/// assert_eq!(round_whole_units(dec!(739130.43)), dec!(739130));
/// assert_eq!(round_whole_units(dec!(2.5)), dec!(3));
/// ```
pub fn round_whole_units(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to whole currency units with ties to the even neighbour, the
/// convention of the fiscal-year table download.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use lgdf_core::calculations::common::round_whole_units_even;
///
/// assert_eq!(round_whole_units_even(dec!(2.5)), dec!(2));
/// assert_eq!(round_whole_units_even(dec!(3.5)), dec!(4));
/// ```
pub fn round_whole_units_even(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Clamps negative values to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn round_cents_rounds_down_below_midpoint() {
        assert_eq!(round_cents(dec!(739130.434)), dec!(739130.43));
    }

    #[test]
    fn round_cents_rounds_up_at_midpoint() {
        assert_eq!(round_cents(dec!(739130.435)), dec!(739130.44));
    }

    #[test]
    fn round_cents_keeps_whole_amounts() {
        assert_eq!(round_cents(dec!(1000000)), dec!(1000000));
    }

    #[test]
    fn round_whole_units_handles_large_amounts() {
        assert_eq!(round_whole_units(dec!(999999999.5)), dec!(1000000000));
    }

    #[test]
    fn round_whole_units_rounds_below_midpoint_down() {
        assert_eq!(round_whole_units(dec!(1739130.43)), dec!(1739130));
    }

    #[test]
    fn round_whole_units_even_breaks_ties_to_even() {
        assert_eq!(round_whole_units_even(dec!(2.5)), dec!(2));
        assert_eq!(round_whole_units_even(dec!(3.5)), dec!(4));
        assert_eq!(round_whole_units_even(dec!(-2.5)), dec!(-2));
        assert_eq!(round_whole_units_even(dec!(2.51)), dec!(3));
    }

    #[test]
    fn non_negative_clamps_negative_to_zero() {
        assert_eq!(non_negative(dec!(-12.50)), Decimal::ZERO);
    }

    #[test]
    fn non_negative_passes_positive_through() {
        assert_eq!(non_negative(dec!(12.50)), dec!(12.50));
    }
}
