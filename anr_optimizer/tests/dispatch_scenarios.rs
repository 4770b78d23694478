use anr_optimizer::models::ReactorTechnology;
use anr_optimizer::{
    DispatchOptions, EconomicDispatch, FleetSpec, InitialState, OptimizerConfig, OptimizerError, PriceSeries,
    TechnologyCatalog,
};

fn microreactor(vom_per_mwh: f64) -> ReactorTechnology {
    ReactorTechnology {
        name: "Micro".to_string(),
        power_mwe: 10.0,
        power_mwt: 30.0,
        capex_per_mwe: 7_000_000.0,
        fom_per_mwe_year: 150_000.0,
        vom_per_mwh,
        life_years: 20.0,
        ramp_rate: 0.05,
        msl_mwe: 3.0,
    }
}

fn catalog(vom_per_mwh: f64) -> TechnologyCatalog {
    TechnologyCatalog::new(vec![microreactor(vom_per_mwh)], vec![]).unwrap()
}

fn fleet(modules: u32) -> FleetSpec {
    FleetSpec {
        facility_id: "PLANT_7".to_string(),
        reactor: "Micro".to_string(),
        modules,
    }
}

fn dispatcher() -> EconomicDispatch {
    let options = DispatchOptions {
        initial_state: InitialState::MinimumStableLoad,
        keep_schedule: true,
    };
    EconomicDispatch::new(OptimizerConfig::default(), options).unwrap()
}

fn check_bounds_and_ramps(schedule: &[f64], msl: f64, capacity: f64, ramp: f64) {
    for g in schedule {
        assert!(*g >= msl - 1e-6 && *g <= capacity + 1e-6, "generation {} outside bounds", g);
    }
    for pair in schedule.windows(2) {
        assert!((pair[1] - pair[0]).abs() <= ramp + 1e-6);
    }
}

#[test]
fn test_zero_prices_full_year_loses_fixed_costs() {
    let prices = PriceSeries::flat(0.0, 8760).unwrap();
    let result = dispatcher()
        .dispatch(&catalog(0.0), &fleet(2), &prices)
        .unwrap()
        .unwrap();

    assert!(result.fixed_costs > 0.0);
    assert!((result.net_revenue + result.fixed_costs).abs() < 1e-6);
    assert_eq!(result.electricity_sales, 0.0);

    let schedule = result.schedule.unwrap();
    assert_eq!(schedule.len(), 8760);
    assert!((schedule[0] - 6.0).abs() < 1e-6);
    check_bounds_and_ramps(&schedule, 6.0, 20.0, 1.0);
}

#[test]
fn test_costly_generation_stays_at_minimum() {
    let prices = PriceSeries::flat(0.0, 168).unwrap();
    let result = dispatcher()
        .dispatch(&catalog(4.0), &fleet(1), &prices)
        .unwrap()
        .unwrap();

    let schedule = result.schedule.unwrap();
    for g in &schedule {
        assert!((g - 3.0).abs() < 1e-6);
    }
    assert!((result.variable_om - 4.0 * 3.0 * 168.0).abs() < 1e-6);
    assert!((result.net_revenue + result.variable_om + result.fixed_costs).abs() < 1e-6);
}

#[test]
fn test_high_prices_ramp_up_at_the_ramp_limit() {
    let prices = PriceSeries::flat(80.0, 24).unwrap();
    let result = dispatcher()
        .dispatch(&catalog(2.0), &fleet(1), &prices)
        .unwrap()
        .unwrap();

    let schedule = result.schedule.clone().unwrap();
    // 0.05 x 10 MWe per hour from 3 MW reaches 10 MW after 14 hours
    assert!((schedule[1] - 3.5).abs() < 1e-6);
    assert!((schedule[14] - 10.0).abs() < 1e-6);
    assert!((schedule[23] - 10.0).abs() < 1e-6);
    check_bounds_and_ramps(&schedule, 3.0, 10.0, 0.5);
    assert!(result.capacity_factor(24) > 0.8);
}

#[test]
fn test_empty_fleet_rejected() {
    let prices = PriceSeries::flat(10.0, 24).unwrap();
    assert!(matches!(
        dispatcher().dispatch(&catalog(0.0), &fleet(0), &prices),
        Err(OptimizerError::InvalidParameter { .. })
    ));
}
