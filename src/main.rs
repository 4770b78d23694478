use anr_optimizer::{
    CsvPriceDirectory, DeploymentOptimizer, FlatPriceSource, OptimizerConfig, PriceSource, TechnologyCatalog,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;

mod batch_processor;
mod dispatch_processor;
mod facility_loader;
mod report_writer;

use batch_processor::{BatchCounts, BatchProcessor};
use dispatch_processor::DispatchProcessor;
use report_writer::IndustrySummary;

/// Value following `flag`, if present
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn print_usage() {
    println!("Usage: anr_site_processor [--deploy | --dispatch] [options]");
    println!();
    println!("  --deploy               Optimal ANR-H2 deployment for every facility table (default)");
    println!("  --dispatch             Deployment followed by hourly dispatch of the sized fleets");
    println!("  --input <dir>          anr_catalog.csv, h2_catalog.csv and facilities/*.csv (default: input)");
    println!("  --output <dir>         Result directory (default: results)");
    println!("  --config <file.json>   Scenario settings");
    println!("  --workers <n>          Solver threads (default: all cores)");
    println!("  --prices <dir>         Hourly prices per state, <STATE>.csv or default.csv");
    println!("  --flat-price <$/MWh>   Same price for every hour");
}

fn load_config(args: &[String]) -> Result<OptimizerConfig> {
    let config = match flag_value(args, "--config") {
        Some(path) => OptimizerConfig::from_json_file(Path::new(path))?,
        None => OptimizerConfig::default(),
    };
    Ok(config)
}

fn price_source(args: &[String], config: &OptimizerConfig) -> Result<Box<dyn PriceSource>> {
    if let Some(dir) = flag_value(args, "--prices") {
        return Ok(Box::new(CsvPriceDirectory::new(dir)));
    }
    if let Some(price) = flag_value(args, "--flat-price") {
        return Ok(Box::new(FlatPriceSource {
            price: price.parse()?,
            hours: config.hours_per_year as usize,
        }));
    }
    anyhow::bail!("--dispatch needs --prices <dir> or --flat-price <value>")
}

fn run(args: &[String], with_dispatch: bool) -> Result<()> {
    let start = Instant::now();
    let input_dir = PathBuf::from(flag_value(args, "--input").unwrap_or("input"));
    let output_dir = PathBuf::from(flag_value(args, "--output").unwrap_or("results"));
    let workers = match flag_value(args, "--workers") {
        Some(n) => n.parse()?,
        None => num_cpus::get(),
    };

    let config = load_config(args)?;
    let prices = if with_dispatch {
        Some(price_source(args, &config)?)
    } else {
        None
    };

    println!("🚀 ANR-H2 Site Deployment Processor");
    println!("Using {} solver threads", workers);
    println!(
        "Module cap {}, WACC {:.3}, ITC {:.0}% / {:.0}%",
        config.max_modules,
        config.wacc,
        config.itc_reactor * 100.0,
        config.itc_hydrogen * 100.0
    );
    println!("{}", "=".repeat(60));

    let catalog = TechnologyCatalog::from_csv_files(
        &input_dir.join("anr_catalog.csv"),
        &input_dir.join("h2_catalog.csv"),
    )?;
    let hydrogen_names = catalog.hydrogen_names();

    println!("\n📁 Loading facility tables from {}", input_dir.display());
    let industries = facility_loader::discover_industries(&input_dir)?;
    if industries.is_empty() {
        println!("⚠️  No facility tables found in {}", input_dir.join("facilities").display());
        return Ok(());
    }

    let optimizer = DeploymentOptimizer::new(&catalog, config.clone())?;
    let batch = BatchProcessor::new(optimizer, workers)?;
    let dispatcher = match &prices {
        Some(source) => Some(DispatchProcessor::new(&catalog, source.as_ref(), config.clone())?),
        None => None,
    };

    let mut summaries = Vec::with_capacity(industries.len());
    for table in &industries {
        let runs = batch.run(&table.industry, &table.facilities)?;

        let mut df = report_writer::deployment_frame(&runs, &hydrogen_names)?;
        report_writer::write_table(&mut df, &output_dir, &format!("{}_deployment", table.industry))?;

        let median_breakeven = report_writer::median_breakeven(&df)?;
        if let Some(median) = median_breakeven {
            println!("  📊 Median breakeven price: ${:.2}/MMBtu", median);
        }
        summaries.push(IndustrySummary {
            industry: table.industry.clone(),
            facilities: table.facilities.len(),
            counts: BatchCounts::from_runs(&runs),
            median_breakeven,
        });

        if let Some(dispatcher) = &dispatcher {
            let dispatched = dispatcher.run(batch.pool(), &table.industry, &runs);
            let mut df = report_writer::dispatch_frame(&dispatched, dispatcher.hours())?;
            report_writer::write_table(&mut df, &output_dir, &format!("{}_dispatch", table.industry))?;
        }
    }

    let summary_path = report_writer::write_run_summary(&summaries, &output_dir)?;

    println!("\n{}", "=".repeat(60));
    println!("✅ Processed {} industries in {:.1}s", summaries.len(), start.elapsed().as_secs_f64());
    println!("Run summary: {}", summary_path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
    } else if args.len() > 1 && args[1] == "--dispatch" {
        run(&args, true)?;
    } else {
        run(&args, false)?;
    }

    Ok(())
}
