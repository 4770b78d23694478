use crate::config::OptimizerConfig;
use crate::error::{OptimizerError, OptimizerResult};
use crate::models::DemandProfile;

/// Fossil energy displaced per year, in MMBtu.
///
/// Hydrogen sites are measured against the natural gas an SMR would burn to
/// make the same hydrogen; process-heat sites against their heat demand.
pub fn annual_demand_mmbtu(demand: &DemandProfile, config: &OptimizerConfig) -> f64 {
    match *demand {
        DemandProfile::Hydrogen { kg_per_day } => {
            config.smr_heat_rate_mj_per_kg * config.mmbtu_per_mj() * kg_per_day * config.days_per_year()
        }
        DemandProfile::ProcessHeat {
            heat_mj_per_year, ..
        } => heat_mj_per_year * config.mmbtu_per_mj(),
    }
}

/// Fuel price at which the site is indifferent between fossil supply and the
/// optimal nuclear configuration, $/MMBtu
pub fn breakeven_price(net_annual_revenue: f64, demand_mmbtu: f64) -> OptimizerResult<f64> {
    if !(demand_mmbtu > 0.0) || !demand_mmbtu.is_finite() {
        return Err(OptimizerError::invalid(
            "demand_mmbtu",
            demand_mmbtu,
            "breakeven price needs a positive energy demand",
        ));
    }
    Ok(-net_annual_revenue / demand_mmbtu)
}

pub fn facility_breakeven_price(
    net_annual_revenue: f64,
    demand: &DemandProfile,
    config: &OptimizerConfig,
) -> OptimizerResult<f64> {
    breakeven_price(net_annual_revenue, annual_demand_mmbtu(demand, config))
}
