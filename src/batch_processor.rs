use anr_optimizer::{DeploymentOptimizer, DeploymentResult, Facility, FacilityRow};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

/// What happened to one facility of the batch
#[derive(Debug, Clone)]
pub enum FacilityOutcome {
    Solved(DeploymentResult),
    /// Solver stopped without an optimal solution
    Infeasible,
    /// Input error raised before the solver ran
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FacilityRun {
    pub id: String,
    pub state: String,
    /// None when the input row could not be read
    pub facility: Option<Facility>,
    pub outcome: FacilityOutcome,
}

impl FacilityRun {
    pub fn result(&self) -> Option<&DeploymentResult> {
        match &self.outcome {
            FacilityOutcome::Solved(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchCounts {
    pub solved: usize,
    pub infeasible: usize,
    pub failed: usize,
}

impl BatchCounts {
    pub fn from_runs(runs: &[FacilityRun]) -> Self {
        let mut counts = Self::default();
        for run in runs {
            match run.outcome {
                FacilityOutcome::Solved(_) => counts.solved += 1,
                FacilityOutcome::Infeasible => counts.infeasible += 1,
                FacilityOutcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }
}

/// Runs independent facility solves on a fixed-size worker pool
pub struct BatchProcessor {
    optimizer: DeploymentOptimizer,
    pool: ThreadPool,
}

impl BatchProcessor {
    pub fn new(optimizer: DeploymentOptimizer, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("anr-solver-{}", i))
            .build()?;
        Ok(Self { optimizer, pool })
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Solve every facility of one industry. Returns once all workers are
    /// done, one run per input row in input order.
    pub fn run(&self, industry: &str, rows: &[FacilityRow]) -> Result<Vec<FacilityRun>> {
        println!("\n🏭 {}: solving {} facilities on {} workers", industry, rows.len(), self.workers());

        let pb = ProgressBar::new(rows.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?,
        );

        let runs: Vec<FacilityRun> = self.pool.install(|| {
            rows.par_iter()
                .map(|row| {
                    let run = self.run_row(row);
                    pb.inc(1);
                    run
                })
                .collect()
        });

        let counts = BatchCounts::from_runs(&runs);
        pb.finish_with_message(format!("{} solved", counts.solved));
        println!(
            "  ✅ {} solved, ⚠️  {} infeasible, ❌ {} failed",
            counts.solved, counts.infeasible, counts.failed
        );

        Ok(runs)
    }

    fn run_row(&self, row: &FacilityRow) -> FacilityRun {
        let (facility, outcome) = match &row.facility {
            Ok(facility) => (Some(facility.clone()), self.solve_one(facility)),
            Err(err) => {
                error!("Facility {}: {}", row.id, err);
                (None, FacilityOutcome::Failed(err.to_string()))
            }
        };
        FacilityRun {
            id: row.id.clone(),
            state: row.state.clone(),
            facility,
            outcome,
        }
    }

    fn solve_one(&self, facility: &Facility) -> FacilityOutcome {
        match self.optimizer.solve_facility(facility) {
            Ok(Some(result)) => FacilityOutcome::Solved(result),
            Ok(None) => {
                warn!("Facility {}: no optimal deployment", facility.id);
                FacilityOutcome::Infeasible
            }
            Err(err) => {
                error!("Facility {}: {}", facility.id, err);
                FacilityOutcome::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anr_optimizer::models::{HydrogenTechnology, ReactorTechnology};
    use anr_optimizer::{DataLoader, OptimizerConfig, TechnologyCatalog};

    pub(crate) fn catalog() -> TechnologyCatalog {
        let reactor = ReactorTechnology {
            name: "iPWR".to_string(),
            power_mwe: 77.0,
            power_mwt: 250.0,
            capex_per_mwe: 5_000_000.0,
            fom_per_mwe_year: 150_000.0,
            vom_per_mwh: 2.5,
            life_years: 60.0,
            ramp_rate: 0.1,
            msl_mwe: 20.0,
        };
        let pem = HydrogenTechnology {
            name: "PEM".to_string(),
            reactor: "iPWR".to_string(),
            capacity_kg_per_hour: 50.0,
            capacity_mwe: 2.5,
            elec_mwh_per_kg: 0.05,
            heat_mwh_per_kg: 0.0,
            capex_per_mwe: 1_500_000.0,
            fom_per_mwe_year: 30_000.0,
            vom_per_mwh: 1.0,
            life_years: 20.0,
            carbon_intensity: 0.4,
        };
        TechnologyCatalog::new(vec![reactor], vec![pem]).unwrap()
    }

    pub(crate) fn processor(max_modules: usize) -> BatchProcessor {
        let config = OptimizerConfig::default().with_max_modules(max_modules);
        let optimizer = DeploymentOptimizer::new(&catalog(), config).unwrap();
        BatchProcessor::new(optimizer, 2).unwrap()
    }

    pub(crate) fn rows(facilities: Vec<Facility>) -> Vec<FacilityRow> {
        facilities.into_iter().map(FacilityRow::from).collect()
    }

    #[test]
    fn test_bad_facility_does_not_stop_batch() {
        let facilities = rows(vec![
            Facility::hydrogen("REF_1", "TX", 1000.0),
            Facility::hydrogen("REF_ZERO", "TX", 0.0),
            Facility::hydrogen("REF_HUGE", "LA", 500_000.0),
            Facility::hydrogen("REF_2", "LA", 30_000.0),
        ]);

        let runs = processor(2).run("refining", &facilities).unwrap();

        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["REF_1", "REF_ZERO", "REF_HUGE", "REF_2"]);
        assert!(runs[0].result().is_some());
        assert!(matches!(runs[1].outcome, FacilityOutcome::Failed(_)));
        assert!(matches!(runs[2].outcome, FacilityOutcome::Infeasible));
        assert_eq!(runs[3].result().unwrap().reactor_modules, 1);

        assert_eq!(
            BatchCounts::from_runs(&runs),
            BatchCounts {
                solved: 2,
                infeasible: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn test_unreadable_row_is_failed_in_place() {
        let data = "\
id,state,H2 demand (kg/day)
REF_1,TX,1000
REF_BAD,CA,
REF_2,LA,2400
";
        let facilities = DataLoader::facility_rows_from_reader(data.as_bytes()).unwrap();
        let runs = processor(2).run("refining", &facilities).unwrap();

        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["REF_1", "REF_BAD", "REF_2"]);
        assert!(runs[0].result().is_some());
        assert!(runs[1].facility.is_none());
        assert_eq!(runs[1].state, "CA");
        assert!(matches!(runs[1].outcome, FacilityOutcome::Failed(_)));
        assert!(runs[2].result().is_some());
        assert_eq!(BatchCounts::from_runs(&runs).failed, 1);
    }

    #[test]
    fn test_pool_size_is_fixed() {
        let config = OptimizerConfig::default().with_max_modules(1);
        let optimizer = DeploymentOptimizer::new(&catalog(), config).unwrap();
        assert_eq!(BatchProcessor::new(optimizer, 3).unwrap().workers(), 3);
    }
}
