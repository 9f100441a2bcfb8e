//! Pure arithmetic behind service order totals.
//!
//! Quantities and prices come from callers, so every product and sum is
//! checked. `None` means the result does not fit in a `Decimal`.

use rust_decimal::Decimal;

/// Total of one line, computed from the caller's quantity and unit price.
pub fn checked_line_total(quantity: Decimal, unit_price: Decimal) -> Option<Decimal> {
    quantity.checked_mul(unit_price)
}

/// Full re-sum of an order's line totals.
pub fn checked_sum<I>(totals: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    totals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t))
}

/// Stock left after consuming `requested` units. Never negative.
pub fn clamped_balance(on_hand: Decimal, requested: Decimal) -> Decimal {
    if requested >= on_hand {
        Decimal::ZERO
    } else {
        on_hand - requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn part_and_labor_lines_sum_to_order_total() {
        let part = checked_line_total(dec!(4), dec!(85.00)).unwrap();
        let labor = checked_line_total(dec!(1), dec!(800)).unwrap();
        assert_eq!(part, dec!(340.00));
        assert_eq!(checked_sum([part, labor]), Some(dec!(1140.00)));
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(checked_sum(Vec::new()), Some(Decimal::ZERO));
    }

    #[test]
    fn fractional_labor_hours() {
        assert_eq!(
            checked_line_total(dec!(2.5), dec!(120.00)),
            Some(dec!(300.000))
        );
    }

    #[test]
    fn oversized_line_does_not_fit() {
        assert_eq!(
            checked_line_total(dec!(10000000000000000), dec!(10000000000000000)),
            None
        );
    }

    #[test]
    fn sum_past_the_decimal_range_does_not_fit() {
        assert_eq!(checked_sum([Decimal::MAX, Decimal::ONE]), None);
        assert_eq!(checked_sum([Decimal::MAX, Decimal::ZERO]), Some(Decimal::MAX));
    }

    #[test]
    fn balance_clamps_at_zero() {
        assert_eq!(clamped_balance(dec!(5), dec!(4)), dec!(1));
        assert_eq!(clamped_balance(dec!(2), dec!(4)), dec!(0));
        assert_eq!(clamped_balance(dec!(0), dec!(1)), dec!(0));
    }

    fn money() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn quantity() -> impl Strategy<Value = Decimal> {
        (1i64..10_000).prop_map(|milli| Decimal::new(milli, 3))
    }

    proptest! {
        #[test]
        fn resum_after_each_insert_matches_sum_of_lines(
            lines in prop::collection::vec((quantity(), money()), 0..20)
        ) {
            let mut stored = Vec::new();
            for (qty, price) in &lines {
                stored.push(checked_line_total(*qty, *price).unwrap());
                let total = checked_sum(stored.iter().copied()).unwrap();
                let expected: Decimal = lines[..stored.len()]
                    .iter()
                    .map(|(q, p)| *q * *p)
                    .sum();
                prop_assert_eq!(total, expected);
            }
        }

        #[test]
        fn resum_after_removal_drops_exactly_that_line(
            lines in prop::collection::vec((quantity(), money()), 1..20),
            pick in any::<prop::sample::Index>()
        ) {
            let mut totals: Vec<Decimal> = lines
                .iter()
                .map(|(q, p)| checked_line_total(*q, *p).unwrap())
                .collect();
            let before = checked_sum(totals.iter().copied()).unwrap();
            let removed = totals.remove(pick.index(totals.len()));
            prop_assert_eq!(checked_sum(totals).unwrap(), before - removed);
        }

        #[test]
        fn clamped_balance_is_never_negative(on_hand in money(), requested in money()) {
            let left = clamped_balance(on_hand, requested);
            prop_assert!(left >= Decimal::ZERO);
            prop_assert!(left <= on_hand);
        }
    }
}
