//! Hourly economic dispatch of an already-sized reactor fleet.
//!
//! Linear program over the horizon of the price series: generation stays
//! between fleet minimum stable load and capacity, and moves by at most
//! `ramp_rate * capacity` from one hour to the next. The horizon is not
//! cyclic; the first hour is governed by [`InitialState`] instead.

use crate::catalog::TechnologyCatalog;
use crate::config::OptimizerConfig;
use crate::error::{OptimizerError, OptimizerResult};
use crate::finance::ResolvedReactor;
use crate::models::{DispatchResult, FleetSpec};
use crate::prices::PriceSeries;
use good_lp::solvers::microlp::microlp;
use good_lp::{constraint, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Boundary condition on the first hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitialState {
    /// Fleet starts the year at minimum stable load
    #[default]
    MinimumStableLoad,
    /// Fleet may start anywhere between minimum stable load and capacity
    Free,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    pub initial_state: InitialState,
    pub keep_schedule: bool,
}

/// Fleet totals the dispatch model works with
#[derive(Debug, Clone)]
struct FleetLimits {
    capacity_mwe: f64,
    msl_mwe: f64,
    ramp_mw_per_hour: f64,
    vom_per_mwh: f64,
    annual_fixed_cost: f64,
}

pub struct EconomicDispatch {
    config: OptimizerConfig,
    options: DispatchOptions,
}

impl EconomicDispatch {
    pub fn new(config: OptimizerConfig, options: DispatchOptions) -> OptimizerResult<Self> {
        config.validate()?;
        Ok(Self { config, options })
    }

    /// Dispatch `fleet` against `prices`. `Ok(None)` on non-optimal termination.
    pub fn dispatch(
        &self,
        catalog: &TechnologyCatalog,
        fleet: &FleetSpec,
        prices: &PriceSeries,
    ) -> OptimizerResult<Option<DispatchResult>> {
        let limits = self.fleet_limits(catalog, fleet)?;
        info!(
            "Plant {}: dispatching {} x {} over {} hours",
            fleet.facility_id,
            fleet.modules,
            fleet.reactor,
            prices.hours()
        );

        let schedule = match self.solve_schedule(&limits, prices) {
            Some(schedule) => schedule,
            None => {
                warn!("Plant {}: dispatch not solvable", fleet.facility_id);
                return Ok(None);
            }
        };

        let electricity_sales: f64 = schedule.iter().zip(prices.values()).map(|(g, p)| g * p).sum();
        let generation_mwh: f64 = schedule.iter().sum();
        let variable_om = generation_mwh * limits.vom_per_mwh;
        let net_revenue = electricity_sales - variable_om - limits.annual_fixed_cost;

        Ok(Some(DispatchResult {
            facility_id: fleet.facility_id.clone(),
            reactor: fleet.reactor.clone(),
            modules: fleet.modules,
            capacity_mwe: limits.capacity_mwe,
            msl_mwe: limits.msl_mwe,
            electricity_sales,
            variable_om,
            fixed_costs: limits.annual_fixed_cost,
            net_revenue,
            generation_mwh,
            schedule: self.options.keep_schedule.then_some(schedule),
        }))
    }

    fn fleet_limits(&self, catalog: &TechnologyCatalog, fleet: &FleetSpec) -> OptimizerResult<FleetLimits> {
        if fleet.modules == 0 {
            return Err(OptimizerError::invalid("modules", 0.0, "fleet needs at least one module"));
        }
        let technology = catalog.reactor(&fleet.reactor)?;
        let resolved = ResolvedReactor::resolve(technology, &self.config)?;

        let modules = fleet.modules as f64;
        let capacity_mwe = modules * technology.power_mwe;
        let msl_mwe = modules * technology.msl_mwe;
        if msl_mwe > capacity_mwe {
            return Err(OptimizerError::invalid("msl_mwe", msl_mwe, "exceeds fleet capacity"));
        }

        Ok(FleetLimits {
            capacity_mwe,
            msl_mwe,
            ramp_mw_per_hour: technology.ramp_rate * capacity_mwe,
            vom_per_mwh: technology.vom_per_mwh,
            annual_fixed_cost: resolved.fixed_cost_per_mwe() * capacity_mwe,
        })
    }

    fn solve_schedule(&self, limits: &FleetLimits, prices: &PriceSeries) -> Option<Vec<f64>> {
        let mut vars = ProblemVariables::new();
        let generation: Vec<Variable> = prices
            .values()
            .iter()
            .map(|_| vars.add(variable().min(limits.msl_mwe).max(limits.capacity_mwe)))
            .collect();

        let margin: Expression = generation
            .iter()
            .zip(prices.values())
            .map(|(&g, &price)| (price - limits.vom_per_mwh) * g)
            .sum();

        let mut problem = vars.maximise(margin).using(microlp);

        let first = generation[0];
        match self.options.initial_state {
            InitialState::MinimumStableLoad => {
                problem.add_constraint(constraint!(first == limits.msl_mwe));
            }
            InitialState::Free => {}
        }

        let ramp = limits.ramp_mw_per_hour;
        for pair in generation.windows(2) {
            let (previous, current) = (pair[0], pair[1]);
            problem.add_constraint(constraint!(current - previous <= ramp));
            problem.add_constraint(constraint!(previous - current <= ramp));
        }
        debug!("Dispatch model: {} hours, ramp {:.2} MW/h", generation.len(), ramp);

        match problem.solve() {
            Ok(solution) => Some(generation.iter().map(|&g| solution.value(g)).collect()),
            Err(err) => {
                debug!("Dispatch solver status: {}", err);
                None
            }
        }
    }
}
