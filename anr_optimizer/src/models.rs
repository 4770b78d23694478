use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reactor catalog entry, one per reactor type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactorTechnology {
    pub name: String,
    pub power_mwe: f64,
    pub power_mwt: f64,
    pub capex_per_mwe: f64,
    pub fom_per_mwe_year: f64,
    pub vom_per_mwh: f64,
    pub life_years: f64,
    /// Fraction of capacity per hour
    pub ramp_rate: f64,
    pub msl_mwe: f64,
}

impl ReactorTechnology {
    pub fn thermal_efficiency(&self) -> f64 {
        self.power_mwe / self.power_mwt
    }
}

/// Hydrogen production module, keyed by (technology, reactor pairing).
///
/// Electric rating and consumption depend on the reactor it is coupled to;
/// costs are per MWe of module rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HydrogenTechnology {
    pub name: String,
    pub reactor: String,
    pub capacity_kg_per_hour: f64,
    pub capacity_mwe: f64,
    pub elec_mwh_per_kg: f64,
    pub heat_mwh_per_kg: f64,
    pub capex_per_mwe: f64,
    pub fom_per_mwe_year: f64,
    pub vom_per_mwh: f64,
    pub life_years: f64,
    /// kgCO2eq per kg H2
    pub carbon_intensity: f64,
}

impl HydrogenTechnology {
    pub fn daily_capacity_kg(&self) -> f64 {
        self.capacity_kg_per_hour * 24.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum DemandProfile {
    /// Refineries, ammonia and steel plants: hydrogen only
    Hydrogen { kg_per_day: f64 },
    /// Process-heat sites: hydrogen burnt in a retrofitted furnace
    ProcessHeat {
        hydrogen_kg_per_day: f64,
        heat_mj_per_year: f64,
    },
}

impl DemandProfile {
    pub fn hydrogen_kg_per_day(&self) -> f64 {
        match *self {
            DemandProfile::Hydrogen { kg_per_day } => kg_per_day,
            DemandProfile::ProcessHeat {
                hydrogen_kg_per_day,
                ..
            } => hydrogen_kg_per_day,
        }
    }

    pub fn heat_mj_per_year(&self) -> Option<f64> {
        match *self {
            DemandProfile::Hydrogen { .. } => None,
            DemandProfile::ProcessHeat {
                heat_mj_per_year, ..
            } => Some(heat_mj_per_year),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Facility {
    pub id: String,
    pub state: String,
    pub demand: DemandProfile,
}

impl Facility {
    pub fn hydrogen(id: &str, state: &str, kg_per_day: f64) -> Self {
        Self {
            id: id.to_string(),
            state: state.to_string(),
            demand: DemandProfile::Hydrogen { kg_per_day },
        }
    }

    pub fn process_heat(id: &str, state: &str, hydrogen_kg_per_day: f64, heat_mj_per_year: f64) -> Self {
        Self {
            id: id.to_string(),
            state: state.to_string(),
            demand: DemandProfile::ProcessHeat {
                hydrogen_kg_per_day,
                heat_mj_per_year,
            },
        }
    }
}

/// Hydrogen units attached to one built reactor module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleAllocation {
    pub slot: usize,
    pub hydrogen_units: BTreeMap<String, u32>,
    pub electric_draw_mwe: f64,
}

/// Annualized cost components, $/year
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub reactor_capex: f64,
    pub reactor_om: f64,
    pub hydrogen_capex: f64,
    pub hydrogen_om: f64,
    pub furnace_capex: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.reactor_capex + self.reactor_om + self.hydrogen_capex + self.hydrogen_om + self.furnace_capex
    }
}

/// Optimal deployment at one facility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub facility_id: String,
    pub state: String,
    pub hydrogen_demand_kg_per_day: f64,
    pub heat_demand_mj_per_year: Option<f64>,

    // Technology choice
    pub reactor: Option<String>,
    pub reactor_modules: u32,
    pub deployed_capacity_mwe: f64,
    pub reactor_crf: f64,
    pub hydrogen_units: BTreeMap<String, u32>,
    pub modules: Vec<ModuleAllocation>,
    pub hydrogen_capacity_kg_per_day: f64,

    // Economics
    pub net_annual_revenue: f64,
    pub breakeven_price: f64,
    pub annual_co2_kg: f64,
    pub costs: CostBreakdown,
}

impl DeploymentResult {
    /// Fleet to hand to the dispatch sub-model, if any reactor was built
    pub fn fleet(&self) -> Option<FleetSpec> {
        let reactor = self.reactor.as_ref()?;
        if self.reactor_modules == 0 {
            return None;
        }
        Some(FleetSpec {
            facility_id: self.facility_id.clone(),
            reactor: reactor.clone(),
            modules: self.reactor_modules,
        })
    }
}

/// Already-sized reactor fleet at one site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetSpec {
    pub facility_id: String,
    pub reactor: String,
    pub modules: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub facility_id: String,
    pub reactor: String,
    pub modules: u32,
    pub capacity_mwe: f64,
    pub msl_mwe: f64,

    pub electricity_sales: f64,
    pub variable_om: f64,
    pub fixed_costs: f64,
    pub net_revenue: f64,
    pub generation_mwh: f64,

    /// Hourly generation, kept only when requested
    pub schedule: Option<Vec<f64>>,
}

impl DispatchResult {
    pub fn capacity_factor(&self, hours: usize) -> f64 {
        if self.capacity_mwe > 0.0 && hours > 0 {
            self.generation_mwh / (self.capacity_mwe * hours as f64)
        } else {
            0.0
        }
    }
}
