use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Points awarded for completing an order: floor(cost * rate), never
/// negative.
pub fn reward_points(cost: Decimal, rate: Decimal) -> i64 {
    (cost * rate)
        .floor()
        .to_i64()
        .unwrap_or(i64::MAX)
        .max(0)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::reward_points;

    fn rate_10_percent() -> Decimal {
        Decimal::new(10, 2)
    }

    #[test]
    fn ten_percent_of_100_is_10() {
        assert_eq!(reward_points(Decimal::new(100, 0), rate_10_percent()), 10);
    }

    #[test]
    fn fractional_rewards_round_down() {
        assert_eq!(reward_points(Decimal::new(1999, 2), rate_10_percent()), 1);
        assert_eq!(reward_points(Decimal::new(99, 1), rate_10_percent()), 0);
    }

    #[test]
    fn zero_rate_awards_nothing() {
        assert_eq!(reward_points(Decimal::new(100, 0), Decimal::ZERO), 0);
    }
}
