use crate::batch_processor::FacilityRun;
use anr_optimizer::{
    DispatchOptions, DispatchResult, EconomicDispatch, FleetSpec, OptimizerConfig, PriceSource,
    TechnologyCatalog,
};
use anyhow::Result;
use log::{error, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Dispatched(DispatchResult),
    /// No fleet was sized for the facility
    NotDeployed,
    Infeasible,
    Failed(String),
}

/// Dispatch row of one facility, kept even when there is nothing to report
#[derive(Debug, Clone)]
pub struct DispatchRun {
    pub facility_id: String,
    pub outcome: DispatchOutcome,
}

impl DispatchRun {
    pub fn result(&self) -> Option<&DispatchResult> {
        match &self.outcome {
            DispatchOutcome::Dispatched(result) => Some(result),
            _ => None,
        }
    }
}

/// Hourly dispatch of every fleet sized by the deployment batch
pub struct DispatchProcessor<'a> {
    catalog: &'a TechnologyCatalog,
    prices: &'a dyn PriceSource,
    dispatch: EconomicDispatch,
    hours: usize,
}

impl<'a> DispatchProcessor<'a> {
    pub fn new(catalog: &'a TechnologyCatalog, prices: &'a dyn PriceSource, config: OptimizerConfig) -> Result<Self> {
        let hours = config.hours_per_year as usize;
        let dispatch = EconomicDispatch::new(config, DispatchOptions::default())?;
        Ok(Self {
            catalog,
            prices,
            dispatch,
            hours,
        })
    }

    pub fn hours(&self) -> usize {
        self.hours
    }

    /// Dispatch the fleets of the solved facilities. Returns one run per
    /// deployment run, in the same order, so the tables join on facility id.
    pub fn run(&self, pool: &ThreadPool, industry: &str, runs: &[FacilityRun]) -> Vec<DispatchRun> {
        let fleets = runs.iter().filter(|r| r.result().is_some()).count();
        println!("\n⚡ {}: dispatching {} fleets over {} hours", industry, fleets, self.hours);

        pool.install(|| {
            runs.par_iter()
                .map(|run| DispatchRun {
                    facility_id: run.id.clone(),
                    outcome: self.dispatch_run(run),
                })
                .collect()
        })
    }

    fn dispatch_run(&self, run: &FacilityRun) -> DispatchOutcome {
        let fleet = match run.result().and_then(|result| result.fleet()) {
            Some(fleet) => fleet,
            None => return DispatchOutcome::NotDeployed,
        };
        match self.dispatch_one(&run.state, &fleet) {
            Ok(Some(dispatch)) => DispatchOutcome::Dispatched(dispatch),
            Ok(None) => {
                warn!("Facility {}: dispatch not solvable", fleet.facility_id);
                DispatchOutcome::Infeasible
            }
            Err(err) => {
                error!("Facility {}: {}", fleet.facility_id, err);
                DispatchOutcome::Failed(err.to_string())
            }
        }
    }

    fn dispatch_one(&self, state: &str, fleet: &FleetSpec) -> Result<Option<DispatchResult>> {
        let prices = self.prices.hourly_prices(state)?;
        if prices.hours() != self.hours {
            anyhow::bail!(
                "price series for {} has {} hours, expected {}",
                state,
                prices.hours(),
                self.hours
            );
        }
        Ok(self.dispatch.dispatch(self.catalog, fleet, &prices)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch_processor::tests::{catalog, processor, rows};
    use anr_optimizer::{Facility, FlatPriceSource};

    #[test]
    fn test_dispatch_keeps_row_per_facility() {
        let batch = processor(2);
        let facilities = rows(vec![
            Facility::hydrogen("REF_1", "TX", 1000.0),
            Facility::hydrogen("REF_HUGE", "LA", 500_000.0),
        ]);
        let runs = batch.run("refining", &facilities).unwrap();

        let catalog = catalog();
        let prices = FlatPriceSource {
            price: 0.0,
            hours: 8760,
        };
        let processor = DispatchProcessor::new(&catalog, &prices, OptimizerConfig::default()).unwrap();
        let results = processor.run(batch.pool(), "refining", &runs);

        let ids: Vec<&str> = results.iter().map(|r| r.facility_id.as_str()).collect();
        assert_eq!(ids, vec!["REF_1", "REF_HUGE"]);
        assert!(matches!(results[1].outcome, DispatchOutcome::NotDeployed));

        let plant = results[0].result().unwrap();
        assert_eq!(plant.facility_id, "REF_1");
        assert_eq!(plant.modules, 1);
        // Zero prices with positive VOM: the fleet sits at minimum stable load
        assert!((plant.generation_mwh - 20.0 * 8760.0).abs() < 1e-3);
        assert!(plant.net_revenue < 0.0);
    }

    #[test]
    fn test_short_price_series_rejected() {
        let batch = processor(1);
        let runs = batch
            .run("refining", &rows(vec![Facility::hydrogen("REF_1", "TX", 1000.0)]))
            .unwrap();

        let catalog = catalog();
        let prices = FlatPriceSource { price: 30.0, hours: 24 };
        let processor = DispatchProcessor::new(&catalog, &prices, OptimizerConfig::default()).unwrap();
        let results = processor.run(batch.pool(), "refining", &runs);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].facility_id, "REF_1");
        assert!(matches!(results[0].outcome, DispatchOutcome::Failed(_)));
    }
}
