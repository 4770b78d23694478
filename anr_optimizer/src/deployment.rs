//! Per-facility deployment of reactor modules and hydrogen units.
//!
//! Mixed-integer program over a fixed number of reactor module slots:
//! one binary per reactor technology (at most one selected per site), one
//! binary per (slot, reactor) for "module built", and one integer per
//! (slot, hydrogen pairing) for the number of hydrogen units coupled to that
//! module. Annualized cost is minimized, which maximizes the annual net value.

use crate::breakeven::{annual_demand_mmbtu, facility_breakeven_price};
use crate::catalog::TechnologyCatalog;
use crate::config::OptimizerConfig;
use crate::error::{OptimizerError, OptimizerResult};
use crate::finance::{furnace_retrofit_cost, ResolvedHydrogen, ResolvedReactor};
use crate::models::{CostBreakdown, DemandProfile, DeploymentResult, Facility, ModuleAllocation};
use good_lp::solvers::microlp::microlp;
use good_lp::{constraint, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Decision variables of one reactor module slot
struct SlotVars {
    built: Variable,
    /// (index into the resolved hydrogen table, unit count)
    units: Vec<(usize, Variable)>,
}

struct ReactorVars {
    selected: Variable,
    slots: Vec<SlotVars>,
}

/// Integer assignment read back from the solver
#[derive(Debug, Clone, Default)]
pub(crate) struct DeploymentSolution {
    /// (reactor index, slot) of every built module
    pub built: Vec<(usize, usize)>,
    /// (reactor index, slot, hydrogen index, units)
    pub units: Vec<(usize, usize, usize, u32)>,
}

impl DeploymentSolution {
    fn reactor(&self) -> Option<usize> {
        self.built.first().map(|&(g, _)| g)
    }
}

pub struct DeploymentOptimizer {
    config: OptimizerConfig,
    reactors: Vec<ResolvedReactor>,
    hydrogen: Vec<ResolvedHydrogen>,
}

impl DeploymentOptimizer {
    pub fn new(catalog: &TechnologyCatalog, config: OptimizerConfig) -> OptimizerResult<Self> {
        config.validate()?;
        let reactors = catalog
            .reactors()
            .map(|r| ResolvedReactor::resolve(r, &config))
            .collect::<OptimizerResult<Vec<_>>>()?;
        let hydrogen = catalog
            .hydrogen_technologies()
            .map(|h| ResolvedHydrogen::resolve(h, &config))
            .collect::<OptimizerResult<Vec<_>>>()?;

        Ok(Self {
            config,
            reactors,
            hydrogen,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimal deployment for one facility.
    ///
    /// `Ok(None)` means the solver stopped without an optimal solution (for
    /// instance the demand exceeds what the module cap can supply). Input
    /// errors are returned before the solver is called.
    pub fn solve_facility(&self, facility: &Facility) -> OptimizerResult<Option<DeploymentResult>> {
        self.validate_demand(facility)?;
        info!("Start solve for {}", facility.id);

        let furnace_capex = match facility.demand.heat_mj_per_year() {
            Some(heat) => furnace_retrofit_cost(heat, &self.config)?,
            None => 0.0,
        };

        let solution = match self.solve_model(facility.demand.hydrogen_kg_per_day()) {
            Some(solution) => solution,
            None => return Ok(None),
        };

        let result = self.summarize(facility, &solution, furnace_capex)?;
        info!(
            "Facility {} solved: {} x {}, breakeven {:.2} $/MMBtu",
            facility.id,
            result.reactor_modules,
            result.reactor.as_deref().unwrap_or("none"),
            result.breakeven_price
        );
        Ok(Some(result))
    }

    fn validate_demand(&self, facility: &Facility) -> OptimizerResult<()> {
        let hydrogen = facility.demand.hydrogen_kg_per_day();
        if !(hydrogen >= 0.0) || !hydrogen.is_finite() {
            return Err(OptimizerError::invalid(
                "hydrogen_kg_per_day",
                hydrogen,
                "must be a finite non-negative demand",
            ));
        }
        if let DemandProfile::Hydrogen { kg_per_day } = facility.demand {
            if kg_per_day <= 0.0 {
                return Err(OptimizerError::invalid(
                    "hydrogen_kg_per_day",
                    kg_per_day,
                    "hydrogen sites need a positive demand",
                ));
            }
        }
        let basis = annual_demand_mmbtu(&facility.demand, &self.config);
        if !(basis > 0.0) || !basis.is_finite() {
            return Err(OptimizerError::invalid(
                "demand_mmbtu",
                basis,
                "breakeven price needs a positive energy demand",
            ));
        }
        Ok(())
    }

    /// Largest number of units of `h` a single module of reactor `g` can power
    fn max_units(&self, g: usize, h: usize) -> u32 {
        let reactor = &self.reactors[g].technology;
        let module = &self.hydrogen[h].technology;
        (reactor.power_mwe / module.capacity_mwe + 1e-9).floor().max(0.0) as u32
    }

    pub(crate) fn solve_model(&self, demand_kg_per_day: f64) -> Option<DeploymentSolution> {
        let slots = self.config.max_modules;
        let mut vars = ProblemVariables::new();

        let mut reactor_vars = Vec::with_capacity(self.reactors.len());
        for (g, reactor) in self.reactors.iter().enumerate() {
            let selected = vars.add(variable().binary());
            let mut slot_vars = Vec::with_capacity(slots);
            for _ in 0..slots {
                let built = vars.add(variable().binary());
                let mut units = Vec::new();
                for (h, hydrogen) in self.hydrogen.iter().enumerate() {
                    if hydrogen.technology.reactor != reactor.technology.name {
                        continue;
                    }
                    let cap = self.max_units(g, h);
                    if cap == 0 {
                        continue;
                    }
                    units.push((h, vars.add(variable().integer().min(0).max(cap as f64))));
                }
                slot_vars.push(SlotVars { built, units });
            }
            reactor_vars.push(ReactorVars {
                selected,
                slots: slot_vars,
            });
        }

        // Annualized cost of every module and unit
        let mut cost_terms: Vec<Expression> = Vec::new();
        let mut production_terms: Vec<Expression> = Vec::new();
        for (g, rv) in reactor_vars.iter().enumerate() {
            let module_cost = self.reactors[g].module_cost();
            for slot in &rv.slots {
                cost_terms.push(module_cost * slot.built);
                for &(h, units) in &slot.units {
                    cost_terms.push(self.hydrogen[h].unit_cost() * units);
                    production_terms.push(self.hydrogen[h].technology.daily_capacity_kg() * units);
                }
            }
        }
        let cost: Expression = cost_terms.into_iter().sum();
        let production: Expression = production_terms.into_iter().sum();

        let mut problem = vars.minimise(cost).using(microlp);
        let mut n_constraints = 0usize;

        problem.add_constraint(constraint!(production >= demand_kg_per_day));

        let selection: Expression = reactor_vars.iter().map(|rv| rv.selected).sum();
        problem.add_constraint(constraint!(selection <= 1.0));
        n_constraints += 2;

        for (g, rv) in reactor_vars.iter().enumerate() {
            let reactor = &self.reactors[g];
            let thermal_capacity = reactor.technology.power_mwe / reactor.thermal_efficiency;

            for (n, slot) in rv.slots.iter().enumerate() {
                problem.add_constraint(constraint!(slot.built <= rv.selected));

                // Slots fill in order
                if n > 0 {
                    let previous = rv.slots[n - 1].built;
                    problem.add_constraint(constraint!(slot.built <= previous));
                    n_constraints += 1;
                }

                // Thermal-equivalent draw of the coupled units within module rating
                let draw: Expression = slot
                    .units
                    .iter()
                    .map(|&(h, units)| {
                        (self.hydrogen[h].technology.capacity_mwe / reactor.thermal_efficiency) * units
                    })
                    .sum();
                problem.add_constraint(constraint!(draw <= thermal_capacity * slot.built));
                n_constraints += 2;
            }
        }
        debug!(
            "Deployment model: {} reactors x {} slots, {} constraints",
            reactor_vars.len(),
            slots,
            n_constraints
        );

        let solution = match problem.solve() {
            Ok(solution) => solution,
            Err(err) => {
                warn!("Not feasible: {}", err);
                return None;
            }
        };

        let mut result = DeploymentSolution::default();
        for (g, rv) in reactor_vars.iter().enumerate() {
            for (n, slot) in rv.slots.iter().enumerate() {
                if solution.value(slot.built) < 0.5 {
                    continue;
                }
                result.built.push((g, n));
                for &(h, units) in &slot.units {
                    let count = solution.value(units).round().max(0.0) as u32;
                    if count > 0 {
                        result.units.push((g, n, h, count));
                    }
                }
            }
        }
        Some(result)
    }

    fn summarize(
        &self,
        facility: &Facility,
        solution: &DeploymentSolution,
        furnace_capex: f64,
    ) -> OptimizerResult<DeploymentResult> {
        let reactor = solution.reactor().map(|g| &self.reactors[g]);
        let reactor_modules = solution.built.len() as u32;

        let mut costs = CostBreakdown {
            furnace_capex,
            ..CostBreakdown::default()
        };
        if let Some(r) = reactor {
            costs.reactor_capex = reactor_modules as f64 * r.module_capex();
            costs.reactor_om = reactor_modules as f64 * r.module_om();
        }

        let mut modules: Vec<ModuleAllocation> = solution
            .built
            .iter()
            .map(|&(_, n)| ModuleAllocation {
                slot: n,
                hydrogen_units: BTreeMap::new(),
                electric_draw_mwe: 0.0,
            })
            .collect();

        let mut hydrogen_units: BTreeMap<String, u32> = BTreeMap::new();
        let mut hydrogen_capacity = 0.0;
        let mut annual_co2_kg = 0.0;
        for &(_, n, h, count) in &solution.units {
            let tech = &self.hydrogen[h];
            let units = count as f64;
            *hydrogen_units.entry(tech.technology.name.clone()).or_insert(0) += count;
            hydrogen_capacity += units * tech.technology.daily_capacity_kg();
            annual_co2_kg += units * tech.unit_emissions_kg();
            costs.hydrogen_capex += units * tech.unit_capex();
            costs.hydrogen_om += units * tech.unit_om();

            if let Some(module) = modules.iter_mut().find(|m| m.slot == n) {
                *module
                    .hydrogen_units
                    .entry(tech.technology.name.clone())
                    .or_insert(0) += count;
                module.electric_draw_mwe += units * tech.technology.capacity_mwe;
            }
        }

        let net_annual_revenue = -costs.total();
        let breakeven_price = facility_breakeven_price(net_annual_revenue, &facility.demand, &self.config)?;

        Ok(DeploymentResult {
            facility_id: facility.id.clone(),
            state: facility.state.clone(),
            hydrogen_demand_kg_per_day: facility.demand.hydrogen_kg_per_day(),
            heat_demand_mj_per_year: facility.demand.heat_mj_per_year(),
            reactor: reactor.map(|r| r.technology.name.clone()),
            reactor_modules,
            deployed_capacity_mwe: reactor
                .map(|r| reactor_modules as f64 * r.technology.power_mwe)
                .unwrap_or(0.0),
            reactor_crf: reactor.map(|r| r.crf).unwrap_or(0.0),
            hydrogen_units,
            modules,
            hydrogen_capacity_kg_per_day: hydrogen_capacity,
            net_annual_revenue,
            breakeven_price,
            annual_co2_kg,
            costs,
        })
    }
}
