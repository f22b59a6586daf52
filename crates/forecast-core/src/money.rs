//! Currency rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a floating-point amount to cents, half up.
///
/// A machine epsilon is added before scaling so values like `1.005`, which
/// sit just below the cent boundary in binary, still round up. Non-finite and
/// out-of-range amounts saturate at the decimal bounds; NaN becomes zero.
///
/// Example:
/// assert_eq!(round_money(1.005), Decimal::new(101, 2));
pub fn round_money(value: f64) -> Decimal {
    if value.is_nan() {
        return Decimal::ZERO;
    }
    let cents = ((value + f64::EPSILON) * 100.0 + 0.5).floor();
    // `as` saturates, so infinities land outside the 96-bit mantissa and fall
    // through to the bound below.
    Decimal::try_from_i128_with_scale(cents as i128, 2).unwrap_or(if cents > 0.0 {
        Decimal::MAX
    } else {
        Decimal::MIN
    })
}

/// Round an exact decimal to cents, keeping a two-digit scale.
pub fn round_cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounds_half_up_at_cent_boundary() {
        assert_eq!(round_money(1.005), Decimal::new(101, 2));
        assert_eq!(round_money(0.125), Decimal::new(13, 2));
        assert_eq!(round_money(0.004), Decimal::ZERO);
    }

    #[test]
    fn keeps_two_digit_scale() {
        let m = round_money(1000.0);
        assert_eq!(m, Decimal::new(1000, 0));
        assert_eq!(m.to_string(), "1000.00");
    }

    #[test]
    fn negative_amounts_round_toward_positive_on_ties() {
        assert_eq!(round_money(-200.0), Decimal::new(-200, 0));
        assert_eq!(round_money(-0.125), Decimal::new(-12, 2));
    }

    #[test]
    fn non_finite_saturates() {
        assert_eq!(round_money(f64::NAN), Decimal::ZERO);
        assert_eq!(round_money(f64::INFINITY), Decimal::MAX);
        assert_eq!(round_money(f64::NEG_INFINITY), Decimal::MIN);
        assert_eq!(round_money(1e40), Decimal::MAX);
    }

    #[test]
    fn round_cents_rescales() {
        assert_eq!(round_cents(Decimal::new(12345, 3)).to_string(), "12.35");
        assert_eq!(round_cents(Decimal::new(7, 0)).to_string(), "7.00");
    }

    proptest! {
        #[test]
        fn whole_cents_are_exact(cents in -10_000_000i64..10_000_000) {
            let value = cents as f64 / 100.0;
            prop_assert_eq!(round_money(value), Decimal::new(cents, 2));
        }
    }
}
