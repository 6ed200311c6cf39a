use rust_decimal::Decimal;

/// Predict a chain's APY after moving `fund_movement` dollars into (positive) or
/// out of (negative) it.
///
/// The movement shifts utilization by `fund_movement / total_liquidity` percent and
/// the APY moves by that amount times the chain's elasticity factor. Rates never go
/// below zero. A chain with no liquidity keeps its current APY, and so does one whose
/// liquidity is too small for the shift to be representable.
pub fn predict_apy(
    current_apy: Decimal,
    total_liquidity: Decimal,
    fund_movement: Decimal,
    elasticity_factor: Decimal,
) -> Decimal {
    if total_liquidity <= Decimal::ZERO {
        return current_apy;
    }

    let predicted = fund_movement
        .checked_div(total_liquidity)
        .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|utilization_change_pct| utilization_change_pct.checked_mul(elasticity_factor))
        .and_then(|apy_change| current_apy.checked_add(apy_change));

    match predicted {
        Some(apy) => apy.max(Decimal::ZERO),
        None => current_apy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_inflow_raises_apy() {
        let apy = predict_apy(dec!(6.5), dec!(10_000_000), dec!(1_000_000), dec!(0.1));
        assert!((apy - dec!(7.5)).abs() < dec!(0.001));
    }

    #[test]
    fn test_outflow_lowers_apy() {
        let apy = predict_apy(dec!(7.8), dec!(5_000_000), dec!(-1_000_000), dec!(0.2));
        assert!((apy - dec!(3.8)).abs() < dec!(0.001));
    }

    #[test]
    fn test_zero_liquidity_keeps_apy() {
        let apy = predict_apy(dec!(5.25), Decimal::ZERO, dec!(1_000_000), dec!(0.5));
        assert_eq!(apy, dec!(5.25));
    }

    #[test]
    fn test_never_negative() {
        // -5M out of 1M liquidity would push the rate to -9995%
        let apy = predict_apy(dec!(4.0), dec!(1_000_000), dec!(-5_000_000), dec!(2));
        assert_eq!(apy, Decimal::ZERO);

        for movement in [dec!(-1), dec!(-1_000), dec!(-10_000_000), dec!(-1_000_000_000)] {
            assert!(predict_apy(dec!(0.01), dec!(50_000), movement, dec!(0.3)) >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_dust_liquidity_keeps_apy() {
        let tiny = Decimal::new(1, 28);
        assert_eq!(predict_apy(dec!(5), tiny, dec!(-100_000), dec!(0.1)), dec!(5));
        assert_eq!(predict_apy(dec!(5), tiny, dec!(100_000), dec!(0.1)), dec!(5));
    }

    #[test]
    fn test_zero_movement_is_identity() {
        let apy = predict_apy(dec!(3.3), dec!(42_000_000), Decimal::ZERO, dec!(0.7));
        assert_eq!(apy, dec!(3.3));
    }
}
