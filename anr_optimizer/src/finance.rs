//! Annualization of capital and operating costs.
//!
//! Every coefficient here is a pure function of the scenario settings and a
//! catalog entry, so the optimizer recomputes nothing per decision variable.

use crate::config::OptimizerConfig;
use crate::error::{OptimizerError, OptimizerResult};
use crate::models::{HydrogenTechnology, ReactorTechnology};

/// Capital recovery factor: `wacc / (1 - (1 + wacc)^-life)`
pub fn capital_recovery_factor(wacc: f64, life_years: f64) -> OptimizerResult<f64> {
    if !(life_years > 0.0) || !life_years.is_finite() {
        return Err(OptimizerError::invalid("life_years", life_years, "must be positive"));
    }
    if !(wacc > 0.0) || !wacc.is_finite() {
        return Err(OptimizerError::invalid("wacc", wacc, "must be positive"));
    }
    Ok(wacc / (1.0 - (1.0 + wacc).powf(-life_years)))
}

/// CAPEX net of an investment tax credit
pub fn itc_adjusted_capex(capex: f64, itc: f64) -> OptimizerResult<f64> {
    if !(0.0..1.0).contains(&itc) {
        return Err(OptimizerError::invalid("itc", itc, "must lie in [0, 1)"));
    }
    Ok(capex * (1.0 - itc))
}

/// Reactor coefficients per MWe of rated capacity
#[derive(Debug, Clone)]
pub struct ResolvedReactor {
    pub technology: ReactorTechnology,
    pub crf: f64,
    pub thermal_efficiency: f64,
    /// Annualized CAPEX after ITC, $/MWe-year
    pub annual_capex_per_mwe: f64,
    pub annual_fom_per_mwe: f64,
    /// VOM at full output for a whole year, $/MWe-year
    pub annual_vom_per_mwe: f64,
}

impl ResolvedReactor {
    pub fn resolve(technology: &ReactorTechnology, config: &OptimizerConfig) -> OptimizerResult<Self> {
        let crf = capital_recovery_factor(config.wacc, technology.life_years)?;
        let capex = itc_adjusted_capex(technology.capex_per_mwe, config.itc_reactor)?;
        Ok(Self {
            technology: technology.clone(),
            crf,
            thermal_efficiency: technology.thermal_efficiency(),
            annual_capex_per_mwe: capex * crf,
            annual_fom_per_mwe: technology.fom_per_mwe_year,
            annual_vom_per_mwe: technology.vom_per_mwh * config.hours_per_year,
        })
    }

    /// Annual cost of one built module
    pub fn module_cost(&self) -> f64 {
        self.technology.power_mwe * self.per_mwe_cost()
    }

    pub fn module_capex(&self) -> f64 {
        self.technology.power_mwe * self.annual_capex_per_mwe
    }

    pub fn module_om(&self) -> f64 {
        self.technology.power_mwe * (self.annual_fom_per_mwe + self.annual_vom_per_mwe)
    }

    /// Fixed part only (annualized CAPEX plus FOM), $/MWe-year
    pub fn fixed_cost_per_mwe(&self) -> f64 {
        self.annual_capex_per_mwe + self.annual_fom_per_mwe
    }

    fn per_mwe_cost(&self) -> f64 {
        self.annual_capex_per_mwe + self.annual_fom_per_mwe + self.annual_vom_per_mwe
    }
}

/// Hydrogen module coefficients for one reactor pairing
#[derive(Debug, Clone)]
pub struct ResolvedHydrogen {
    pub technology: HydrogenTechnology,
    pub crf: f64,
    pub annual_capex_per_mwe: f64,
    pub annual_fom_per_mwe: f64,
    pub annual_vom_per_mwe: f64,
    /// Production, kgH2 per year at full output
    pub annual_production_kg: f64,
}

impl ResolvedHydrogen {
    pub fn resolve(technology: &HydrogenTechnology, config: &OptimizerConfig) -> OptimizerResult<Self> {
        let crf = capital_recovery_factor(config.wacc, technology.life_years)?;
        let capex = itc_adjusted_capex(technology.capex_per_mwe, config.itc_hydrogen)?;
        Ok(Self {
            technology: technology.clone(),
            crf,
            annual_capex_per_mwe: capex * crf,
            annual_fom_per_mwe: technology.fom_per_mwe_year,
            annual_vom_per_mwe: technology.vom_per_mwh * config.hours_per_year,
            annual_production_kg: technology.capacity_kg_per_hour * config.hours_per_year,
        })
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_capex() + self.unit_om()
    }

    pub fn unit_capex(&self) -> f64 {
        self.technology.capacity_mwe * self.annual_capex_per_mwe
    }

    pub fn unit_om(&self) -> f64 {
        self.technology.capacity_mwe * (self.annual_fom_per_mwe + self.annual_vom_per_mwe)
    }

    pub fn unit_emissions_kg(&self) -> f64 {
        self.technology.carbon_intensity * self.annual_production_kg
    }
}

/// Annualized cost of a hydrogen-fired furnace sized to the average heat load
pub fn furnace_retrofit_cost(heat_mj_per_year: f64, config: &OptimizerConfig) -> OptimizerResult<f64> {
    if heat_mj_per_year < 0.0 {
        return Err(OptimizerError::invalid(
            "heat_mj_per_year",
            heat_mj_per_year,
            "must not be negative",
        ));
    }
    let crf = capital_recovery_factor(config.wacc, config.furnace.life_years)?;
    let capex = itc_adjusted_capex(config.furnace.capex_per_mwt, config.itc_hydrogen)?;
    let heat_power_mwt = heat_mj_per_year / (config.mj_per_mwh * config.hours_per_year);
    Ok(heat_power_mwt * capex * crf)
}
