//! Property-based tests for the annualization and breakeven helpers.

use anr_optimizer::breakeven::breakeven_price;
use anr_optimizer::finance::{capital_recovery_factor, itc_adjusted_capex};
use proptest::prelude::*;

proptest! {
    /// CRF is positive and no smaller than straight-line recovery.
    #[test]
    fn crf_positive_and_above_straight_line(
        wacc in 0.001f64..0.25,
        life in 1.0f64..80.0,
    ) {
        let crf = capital_recovery_factor(wacc, life).unwrap();
        prop_assert!(crf > 0.0);
        prop_assert!(crf >= 1.0 / life - 1e-12);
        prop_assert!(crf.is_finite());
    }

    /// A higher discount rate never lowers the annual charge.
    #[test]
    fn crf_increases_with_wacc(
        wacc in 0.001f64..0.2,
        step in 0.001f64..0.05,
        life in 1.0f64..80.0,
    ) {
        let low = capital_recovery_factor(wacc, life).unwrap();
        let high = capital_recovery_factor(wacc + step, life).unwrap();
        prop_assert!(high > low);
    }

    /// ITC scales capital cost into (0, capex].
    #[test]
    fn itc_keeps_capex_within_bounds(
        capex in 0.0f64..1.0e8,
        itc in 0.0f64..0.99,
    ) {
        let adjusted = itc_adjusted_capex(capex, itc).unwrap();
        prop_assert!(adjusted >= 0.0);
        prop_assert!(adjusted <= capex + 1e-6);
        prop_assert!((adjusted - capex * (1.0 - itc)).abs() <= 1e-6 * capex.max(1.0));
    }

    /// Breakeven is inversely proportional to demand.
    #[test]
    fn breakeven_scales_inversely(
        cost in 1.0f64..1.0e9,
        demand in 1.0f64..1.0e8,
        factor in 1.1f64..10.0,
    ) {
        let base = breakeven_price(-cost, demand).unwrap();
        let scaled = breakeven_price(-cost, demand * factor).unwrap();
        prop_assert!(base > 0.0);
        prop_assert!((base - scaled * factor).abs() <= 1e-9 * base);
    }
}

#[test]
fn itc_of_one_is_rejected() {
    assert!(itc_adjusted_capex(1.0e6, 1.0).is_err());
    assert!(itc_adjusted_capex(1.0e6, -0.1).is_err());
}
