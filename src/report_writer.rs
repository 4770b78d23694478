use crate::batch_processor::{BatchCounts, FacilityOutcome, FacilityRun};
use crate::dispatch_processor::{DispatchOutcome, DispatchRun};
use anr_optimizer::DispatchResult;
use anyhow::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const BREAKEVEN_COLUMN: &str = "Breakeven price ($/MMBtu)";

/// One row of the run summary
#[derive(Debug, Clone)]
pub struct IndustrySummary {
    pub industry: String,
    pub facilities: usize,
    pub counts: BatchCounts,
    pub median_breakeven: Option<f64>,
}

/// Result table of one industry, one row per facility. Facilities without an
/// optimal deployment keep their row with null result columns.
pub fn deployment_frame(runs: &[FacilityRun], hydrogen_names: &[String]) -> Result<DataFrame> {
    let mut ids = Vec::with_capacity(runs.len());
    let mut states = Vec::with_capacity(runs.len());
    let mut h2_demand: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut heat_demand: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut status = Vec::with_capacity(runs.len());
    let mut reactor: Vec<Option<String>> = Vec::with_capacity(runs.len());
    let mut modules: Vec<Option<u32>> = Vec::with_capacity(runs.len());
    let mut capacity: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut crf: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut h2_capacity: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut reactor_capex: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut reactor_om: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut h2_capex: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut h2_om: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut furnace: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut net_revenue: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut breakeven: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut co2: Vec<Option<f64>> = Vec::with_capacity(runs.len());
    let mut units: Vec<Vec<Option<u32>>> = vec![Vec::with_capacity(runs.len()); hydrogen_names.len()];

    for run in runs {
        ids.push(run.id.clone());
        states.push(run.state.clone());
        h2_demand.push(run.facility.as_ref().map(|f| f.demand.hydrogen_kg_per_day()));
        heat_demand.push(run.facility.as_ref().and_then(|f| f.demand.heat_mj_per_year()));
        status.push(match &run.outcome {
            FacilityOutcome::Solved(_) => "optimal".to_string(),
            FacilityOutcome::Infeasible => "infeasible".to_string(),
            FacilityOutcome::Failed(reason) => format!("error: {}", reason),
        });

        let result = run.result();
        reactor.push(result.and_then(|r| r.reactor.clone()));
        modules.push(result.map(|r| r.reactor_modules));
        capacity.push(result.map(|r| r.deployed_capacity_mwe));
        crf.push(result.map(|r| r.reactor_crf));
        h2_capacity.push(result.map(|r| r.hydrogen_capacity_kg_per_day));
        reactor_capex.push(result.map(|r| r.costs.reactor_capex));
        reactor_om.push(result.map(|r| r.costs.reactor_om));
        h2_capex.push(result.map(|r| r.costs.hydrogen_capex));
        h2_om.push(result.map(|r| r.costs.hydrogen_om));
        furnace.push(result.map(|r| r.costs.furnace_capex));
        net_revenue.push(result.map(|r| r.net_annual_revenue));
        breakeven.push(result.map(|r| r.breakeven_price));
        co2.push(result.map(|r| r.annual_co2_kg));

        for (column, name) in units.iter_mut().zip(hydrogen_names) {
            column.push(result.map(|r| r.hydrogen_units.get(name).copied().unwrap_or(0)));
        }
    }

    let mut columns = vec![
        Series::new("id", ids),
        Series::new("state", states),
        Series::new("H2 demand (kg/day)", h2_demand),
        Series::new("Heat demand (MJ/year)", heat_demand),
        Series::new("Status", status),
        Series::new("ANR type", reactor),
        Series::new("# ANR modules", modules),
        Series::new("Deployed capacity (MWe)", capacity),
        Series::new("ANR CRF", crf),
    ];
    for (column, name) in units.into_iter().zip(hydrogen_names) {
        columns.push(Series::new(&format!("{} units", name), column));
    }
    columns.extend([
        Series::new("H2 capacity (kg/day)", h2_capacity),
        Series::new("ANR CAPEX ($/year)", reactor_capex),
        Series::new("ANR O&M ($/year)", reactor_om),
        Series::new("H2 CAPEX ($/year)", h2_capex),
        Series::new("H2 O&M ($/year)", h2_om),
        Series::new("Furnace CAPEX ($/year)", furnace),
        Series::new("Net Revenues ($/year)", net_revenue),
        Series::new(BREAKEVEN_COLUMN, breakeven),
        Series::new("Ann. CO2 emissions (kgCO2eq/year)", co2),
    ]);

    Ok(DataFrame::new(columns)?)
}

/// Dispatch table of one industry, one row per facility of the deployment
/// table. Facilities without a dispatched fleet keep null result columns.
pub fn dispatch_frame(runs: &[DispatchRun], hours: usize) -> Result<DataFrame> {
    let status: Vec<String> = runs
        .iter()
        .map(|r| match &r.outcome {
            DispatchOutcome::Dispatched(_) => "optimal".to_string(),
            DispatchOutcome::NotDeployed => "not deployed".to_string(),
            DispatchOutcome::Infeasible => "infeasible".to_string(),
            DispatchOutcome::Failed(reason) => format!("error: {}", reason),
        })
        .collect();
    let column = |f: &dyn Fn(&DispatchResult) -> f64| -> Vec<Option<f64>> {
        runs.iter().map(|r| r.result().map(f)).collect()
    };

    let df = DataFrame::new(vec![
        Series::new("id", runs.iter().map(|r| r.facility_id.clone()).collect::<Vec<_>>()),
        Series::new("Status", status),
        Series::new(
            "ANR type",
            runs.iter().map(|r| r.result().map(|d| d.reactor.clone())).collect::<Vec<_>>(),
        ),
        Series::new(
            "# ANR modules",
            runs.iter().map(|r| r.result().map(|d| d.modules)).collect::<Vec<_>>(),
        ),
        Series::new("Capacity (MWe)", column(&|d| d.capacity_mwe)),
        Series::new("MSL (MWe)", column(&|d| d.msl_mwe)),
        Series::new("Generation (MWh)", column(&|d| d.generation_mwh)),
        Series::new("Capacity factor", column(&|d| d.capacity_factor(hours))),
        Series::new("Electricity sales ($/year)", column(&|d| d.electricity_sales)),
        Series::new("Variable O&M ($/year)", column(&|d| d.variable_om)),
        Series::new("Fixed costs ($/year)", column(&|d| d.fixed_costs)),
        Series::new("Net Revenues ($/year)", column(&|d| d.net_revenue)),
    ])?;
    Ok(df)
}

/// Median breakeven over solved facilities; nulls are skipped
pub fn median_breakeven(df: &DataFrame) -> Result<Option<f64>> {
    Ok(df.column(BREAKEVEN_COLUMN)?.median())
}

/// Write `<stem>.csv` and `<stem>.parquet` into `output_dir`
pub fn write_table(df: &mut DataFrame, output_dir: &Path, stem: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let csv_path = output_dir.join(format!("{}.csv", stem));
    CsvWriter::new(File::create(&csv_path)?).finish(df)?;

    let parquet_path = output_dir.join(format!("{}.parquet", stem));
    ParquetWriter::new(File::create(&parquet_path)?).finish(df)?;

    println!("  💾 Saved {} rows to {}", df.height(), csv_path.display());
    Ok(csv_path)
}

pub fn write_run_summary(summaries: &[IndustrySummary], output_dir: &Path) -> Result<PathBuf> {
    let mut df = DataFrame::new(vec![
        Series::new("Industry", summaries.iter().map(|s| s.industry.clone()).collect::<Vec<_>>()),
        Series::new("Facilities", summaries.iter().map(|s| s.facilities as u32).collect::<Vec<_>>()),
        Series::new("Solved", summaries.iter().map(|s| s.counts.solved as u32).collect::<Vec<_>>()),
        Series::new("Infeasible", summaries.iter().map(|s| s.counts.infeasible as u32).collect::<Vec<_>>()),
        Series::new("Failed", summaries.iter().map(|s| s.counts.failed as u32).collect::<Vec<_>>()),
        Series::new(
            "Median breakeven price ($/MMBtu)",
            summaries.iter().map(|s| s.median_breakeven).collect::<Vec<_>>(),
        ),
    ])?;

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join("run_summary.csv");
    CsvWriter::new(File::create(&path)?).finish(&mut df)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch_processor::tests::{catalog, processor, rows};
    use crate::dispatch_processor::DispatchProcessor;
    use anr_optimizer::{DataLoader, Facility, FlatPriceSource, OptimizerConfig};

    fn runs() -> Vec<FacilityRun> {
        let facilities = rows(vec![
            Facility::hydrogen("REF_1", "TX", 1000.0),
            Facility::hydrogen("REF_HUGE", "LA", 500_000.0),
            Facility::hydrogen("REF_2", "LA", 12_000.0),
            Facility::hydrogen("REF_3", "CA", 24_000.0),
        ]);
        processor(2).run("refining", &facilities).unwrap()
    }

    #[test]
    fn test_frame_keeps_infeasible_rows_as_nulls() {
        let runs = runs();
        let df = deployment_frame(&runs, &["PEM".to_string()]).unwrap();

        assert_eq!(df.height(), 4);
        assert_eq!(df.column("ANR type").unwrap().null_count(), 1);
        assert_eq!(df.column(BREAKEVEN_COLUMN).unwrap().null_count(), 1);
        assert_eq!(df.column("PEM units").unwrap().null_count(), 1);
    }

    #[test]
    fn test_unreadable_row_keeps_null_report_row() {
        let data = "\
id,state,H2 demand (kg/day)
REF_1,TX,1000
REF_BAD,CA,
REF_2,LA,2400
";
        let facilities = DataLoader::facility_rows_from_reader(data.as_bytes()).unwrap();
        let runs = processor(2).run("refining", &facilities).unwrap();
        let df = deployment_frame(&runs, &["PEM".to_string()]).unwrap();

        assert_eq!(df.height(), 3);
        let ids: Vec<Option<&str>> = df.column("id").unwrap().utf8().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some("REF_1"), Some("REF_BAD"), Some("REF_2")]);
        assert_eq!(df.column("H2 demand (kg/day)").unwrap().null_count(), 1);
        assert_eq!(df.column(BREAKEVEN_COLUMN).unwrap().null_count(), 1);

        let status = df.column("Status").unwrap().utf8().unwrap();
        assert!(status.get(1).unwrap().starts_with("error:"));
    }

    #[test]
    fn test_dispatch_frame_has_row_per_facility() {
        let batch = processor(2);
        let facilities = rows(vec![
            Facility::hydrogen("REF_1", "TX", 1000.0),
            Facility::hydrogen("REF_HUGE", "LA", 500_000.0),
            Facility::hydrogen("REF_ZERO", "CA", 0.0),
        ]);
        let runs = batch.run("refining", &facilities).unwrap();

        let catalog = catalog();
        let prices = FlatPriceSource {
            price: 40.0,
            hours: 8760,
        };
        let dispatcher = DispatchProcessor::new(&catalog, &prices, OptimizerConfig::default()).unwrap();
        let dispatched = dispatcher.run(batch.pool(), "refining", &runs);
        let df = dispatch_frame(&dispatched, dispatcher.hours()).unwrap();

        let deployment = deployment_frame(&runs, &["PEM".to_string()]).unwrap();
        assert_eq!(df.height(), deployment.height());
        assert!(df.column("id").unwrap().series_equal(deployment.column("id").unwrap()));
        assert_eq!(df.column("Net Revenues ($/year)").unwrap().null_count(), 2);
        assert_eq!(df.column("ANR type").unwrap().null_count(), 2);
    }

    #[test]
    fn test_median_breakeven_over_solved_facilities() {
        let runs = runs();
        let df = deployment_frame(&runs, &["PEM".to_string()]).unwrap();

        let mut prices: Vec<f64> = runs
            .iter()
            .filter_map(|r| r.result())
            .map(|r| r.breakeven_price)
            .collect();
        prices.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(prices.len(), 3);

        let median = median_breakeven(&df).unwrap().unwrap();
        assert!((median - prices[1]).abs() < 1e-9);
    }

    #[test]
    fn test_writes_csv_and_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let mut df = deployment_frame(&runs(), &["PEM".to_string()]).unwrap();

        let csv_path = write_table(&mut df, dir.path(), "refining_deployment").unwrap();
        assert!(csv_path.exists());
        assert!(dir.path().join("refining_deployment.parquet").exists());

        let header = std::fs::read_to_string(&csv_path).unwrap();
        assert!(header.lines().next().unwrap().starts_with("id,state,"));

        let summary = IndustrySummary {
            industry: "refining".to_string(),
            facilities: 4,
            counts: BatchCounts {
                solved: 3,
                infeasible: 1,
                failed: 0,
            },
            median_breakeven: median_breakeven(&df).unwrap(),
        };
        let summary_path = write_run_summary(&[summary], dir.path()).unwrap();
        let content = std::fs::read_to_string(summary_path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
