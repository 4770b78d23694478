use anyhow::Result;
use anr_optimizer::{
    DataLoader, DeploymentOptimizer, DeploymentResult, DispatchOptions, EconomicDispatch, FacilityRow,
    FleetSpec, InitialState, OptimizerConfig, PriceSeries, TechnologyCatalog,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "anr_optimizer")]
#[command(about = "Size reactor + hydrogen deployments at industrial sites and dispatch reactor fleets")]
struct Args {
    /// Reactor catalog CSV
    #[arg(long, default_value = "input/anr_catalog.csv")]
    reactors: PathBuf,

    /// Hydrogen technology catalog CSV
    #[arg(long, default_value = "input/h2_catalog.csv")]
    hydrogen: PathBuf,

    /// Scenario settings (JSON); defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the discount rate
    #[arg(long)]
    wacc: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimal deployment for the facilities of one demand table
    Solve {
        /// Facility demand CSV
        facilities: PathBuf,

        /// Only solve this facility id
        #[arg(short, long)]
        facility: Option<String>,

        /// Reactor module slots per facility
        #[arg(long)]
        max_modules: Option<usize>,

        #[arg(short, long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
    /// Hourly dispatch of a sized fleet
    Dispatch {
        #[arg(long)]
        reactor: String,

        #[arg(long)]
        modules: u32,

        /// Hourly price CSV (t,price)
        #[arg(long, conflicts_with = "flat_price")]
        prices: Option<PathBuf>,

        /// Flat $/MWh price for every hour
        #[arg(long)]
        flat_price: Option<f64>,

        /// Let the first hour start anywhere above minimum stable load
        #[arg(long)]
        free_start: bool,

        #[arg(short, long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Summary,
}

/// Solve each row on its own; bad rows and infeasible sites become notices
fn solve_sites(optimizer: &DeploymentOptimizer, rows: Vec<FacilityRow>) -> (Vec<DeploymentResult>, Vec<String>) {
    let mut results = Vec::new();
    let mut notices = Vec::new();
    for row in rows {
        let site = match row.facility {
            Ok(site) => site,
            Err(err) => {
                error!("Facility {}: {}", row.id, err);
                notices.push(format!("{}: error: {}", row.id, err));
                continue;
            }
        };
        match optimizer.solve_facility(&site) {
            Ok(Some(result)) => results.push(result),
            Ok(None) => notices.push(format!("{}: not feasible", site.id)),
            Err(err) => {
                error!("Facility {}: {}", site.id, err);
                notices.push(format!("{}: error: {}", site.id, err));
            }
        }
    }
    (results, notices)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => OptimizerConfig::from_json_file(path)?,
        None => OptimizerConfig::default(),
    };
    if let Some(wacc) = args.wacc {
        config = config.with_wacc(wacc);
    }

    let catalog = TechnologyCatalog::from_csv_files(&args.reactors, &args.hydrogen)?;

    match args.command {
        Command::Solve {
            facilities,
            facility,
            max_modules,
            output,
        } => {
            if let Some(max_modules) = max_modules {
                config = config.with_max_modules(max_modules);
            }
            let mut sites = DataLoader::load_facility_rows(&facilities)?;
            if let Some(id) = &facility {
                sites.retain(|f| &f.id == id);
                if sites.is_empty() {
                    anyhow::bail!("No facility found matching '{}'", id);
                }
            }

            let optimizer = DeploymentOptimizer::new(&catalog, config)?;
            let total = sites.len();
            let (results, notices) = solve_sites(&optimizer, sites);
            for notice in &notices {
                println!("{}", notice);
            }
            info!("{} of {} facilities solved", results.len(), total);

            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                OutputFormat::Csv => {
                    println!("id,state,ANR type,# ANR modules,Net Revenues ($/year),Breakeven price ($/MMBtu),Ann. CO2 emissions (kgCO2eq/year)");
                    for r in &results {
                        println!(
                            "{},{},{},{},{:.2},{:.4},{:.1}",
                            r.facility_id,
                            r.state,
                            r.reactor.as_deref().unwrap_or(""),
                            r.reactor_modules,
                            r.net_annual_revenue,
                            r.breakeven_price,
                            r.annual_co2_kg
                        );
                    }
                }
                OutputFormat::Summary => {
                    println!("Deployment Summary");
                    println!("==================");
                    for r in &results {
                        let units: Vec<String> = r
                            .hydrogen_units
                            .iter()
                            .map(|(name, count)| format!("{} x {}", count, name))
                            .collect();
                        println!(
                            "  {}: {} x {} ({:.0} MWe), {} -> breakeven ${:.2}/MMBtu",
                            r.facility_id,
                            r.reactor_modules,
                            r.reactor.as_deref().unwrap_or("none"),
                            r.deployed_capacity_mwe,
                            units.join(", "),
                            r.breakeven_price
                        );
                    }
                }
            }
        }
        Command::Dispatch {
            reactor,
            modules,
            prices,
            flat_price,
            free_start,
            output,
        } => {
            let hours = config.hours_per_year as usize;
            let series = match (prices, flat_price) {
                (Some(path), _) => PriceSeries::new(DataLoader::load_prices(&path)?)?,
                (None, Some(price)) => PriceSeries::flat(price, hours)?,
                (None, None) => anyhow::bail!("Either --prices or --flat-price is required"),
            };

            let options = DispatchOptions {
                initial_state: if free_start {
                    InitialState::Free
                } else {
                    InitialState::MinimumStableLoad
                },
                keep_schedule: matches!(output, OutputFormat::Csv),
            };
            let fleet = FleetSpec {
                facility_id: "cli".to_string(),
                reactor,
                modules,
            };

            let dispatcher = EconomicDispatch::new(config, options)?;
            let result = match dispatcher.dispatch(&catalog, &fleet, &series)? {
                Some(result) => result,
                None => anyhow::bail!("Dispatch not solvable"),
            };

            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Csv => {
                    println!("t,generation_mwh,price");
                    if let Some(schedule) = &result.schedule {
                        for (t, (g, p)) in schedule.iter().zip(series.values()).enumerate() {
                            println!("{},{:.3},{:.2}", t, g, p);
                        }
                    }
                }
                OutputFormat::Summary => {
                    println!("Dispatch Summary");
                    println!("================");
                    println!("Fleet: {} x {} ({:.0} MWe, MSL {:.0} MWe)", result.modules, result.reactor, result.capacity_mwe, result.msl_mwe);
                    println!("Electricity sales: ${:.2}", result.electricity_sales);
                    println!("Variable O&M: ${:.2}", result.variable_om);
                    println!("Fixed costs: ${:.2}", result.fixed_costs);
                    println!("Net revenue: ${:.2}", result.net_revenue);
                    println!("Capacity factor: {:.1}%", result.capacity_factor(series.hours()) * 100.0);
                }
            }
        }
    }

    Ok(())
}
