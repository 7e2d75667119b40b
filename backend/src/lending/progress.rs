use rust_decimal::Decimal;

/// `part / whole` as a percentage in `[0, 100]`, rounded to 2 dp.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let pct = part / whole * Decimal::ONE_HUNDRED;
    pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(dec!(34000), dec!(136000)), dec!(25));
        assert_eq!(percentage(dec!(1), dec!(3)), dec!(33.33));
        assert_eq!(percentage(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percentage(dec!(200), dec!(100)), dec!(100));
        assert_eq!(percentage(dec!(-5), dec!(100)), Decimal::ZERO);
    }
}
