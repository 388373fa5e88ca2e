//! Comprehensive unit tests for the Money module
//!
//! Tests cover money creation, arithmetic operations, ordering,
//! currency handling, and edge cases.

use core_kernel::{Currency, Money, MoneyError};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_creates_money_with_correct_amount() {
        let m = Money::new(dec!(100.50), Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::USD);
    }

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_from_minor_handles_jpy_no_decimals() {
        let m = Money::from_minor(10000, Currency::JPY);
        assert_eq!(m.amount(), dec!(10000));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::EUR);
        assert!(m.is_zero());
        assert_eq!(m.currency(), Currency::EUR);
    }

    #[test]
    fn test_negative_amount_creation() {
        let m = Money::new(dec!(-100.00), Currency::USD);
        assert!(m.is_negative());
        assert_eq!(m.amount(), dec!(-100.00));
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_is_zero_true_for_zero_amount() {
        let m = Money::zero(Currency::USD);
        assert!(m.is_zero());
    }

    #[test]
    fn test_is_positive_true_for_positive_amount() {
        let m = Money::new(dec!(100.00), Currency::USD);
        assert!(m.is_positive());
    }

    #[test]
    fn test_is_positive_false_for_zero() {
        let m = Money::zero(Currency::USD);
        assert!(!m.is_positive());
    }

    #[test]
    fn test_is_negative_false_for_zero() {
        let m = Money::zero(Currency::USD);
        assert!(!m.is_negative());
    }

    #[test]
    fn test_abs_of_negative_amount() {
        let m = Money::new(dec!(-42.00), Currency::USD);
        assert_eq!(m.abs().amount(), dec!(42.00));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_addition_within_currency() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(55.25), Currency::USD);
        assert_eq!((a + b).amount(), dec!(155.25));
    }

    #[test]
    fn test_subtraction_can_go_negative() {
        let a = Money::new(dec!(50.00), Currency::USD);
        let b = Money::new(dec!(75.00), Currency::USD);
        assert_eq!((a - b).amount(), dec!(-25.00));
    }

    #[test]
    fn test_negation() {
        let m = Money::new(dec!(10.00), Currency::USD);
        assert_eq!((-m).amount(), dec!(-10.00));
    }

    #[test]
    fn test_checked_add_rejects_currency_mismatch() {
        let usd = Money::new(dec!(1.00), Currency::USD);
        let gbp = Money::new(dec!(1.00), Currency::GBP);
        assert!(matches!(
            usd.checked_add(&gbp),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_checked_sub_rejects_currency_mismatch() {
        let usd = Money::new(dec!(1.00), Currency::USD);
        let eur = Money::new(dec!(1.00), Currency::EUR);
        assert!(usd.checked_sub(&eur).is_err());
    }
}

mod clamping {
    use super::*;

    #[test]
    fn test_clamp_non_negative_floors_at_zero() {
        let m = Money::new(dec!(-0.01), Currency::USD);
        assert_eq!(m.clamp_non_negative(), Money::zero(Currency::USD));
    }

    #[test]
    fn test_clamp_non_negative_keeps_positive_amounts() {
        let m = Money::new(dec!(12.34), Currency::USD);
        assert_eq!(m.clamp_non_negative(), m);
    }

    #[test]
    fn test_clamp_non_negative_keeps_zero() {
        let m = Money::zero(Currency::USD);
        assert_eq!(m.clamp_non_negative(), m);
    }
}

mod display {
    use super::*;

    #[test]
    fn test_usd_display_uses_symbol_and_two_places() {
        let m = Money::new(dec!(1234.5), Currency::USD);
        assert_eq!(m.to_string(), "$ 1234.50");
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::new(dec!(10.129), Currency::USD).round_to_currency();
        assert_eq!(m.amount(), dec!(10.13));
    }
}
