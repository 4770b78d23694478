use anr_optimizer::models::{HydrogenTechnology, ReactorTechnology};
use anr_optimizer::{DeploymentOptimizer, Facility, OptimizerConfig, TechnologyCatalog};

fn main() -> anyhow::Result<()> {
    // One 77 MWe light-water module type and a 50 kg/h PEM stack
    let reactors = vec![ReactorTechnology {
        name: "iPWR".to_string(),
        power_mwe: 77.0,
        power_mwt: 250.0,
        capex_per_mwe: 4_844_000.0,
        fom_per_mwe_year: 155_000.0,
        vom_per_mwh: 2.5,
        life_years: 60.0,
        ramp_rate: 0.4,
        msl_mwe: 30.0,
    }];
    let hydrogen = vec![HydrogenTechnology {
        name: "PEM".to_string(),
        reactor: "iPWR".to_string(),
        capacity_kg_per_hour: 50.0,
        capacity_mwe: 2.6,
        elec_mwh_per_kg: 0.052,
        heat_mwh_per_kg: 0.0,
        capex_per_mwe: 1_800_000.0,
        fom_per_mwe_year: 40_000.0,
        vom_per_mwh: 1.5,
        life_years: 20.0,
        carbon_intensity: 0.44,
    }];
    let catalog = TechnologyCatalog::new(reactors, hydrogen)?;

    let config = OptimizerConfig::default().with_max_modules(5);
    let optimizer = DeploymentOptimizer::new(&catalog, config)?;

    let refinery = Facility::hydrogen("EXAMPLE_REFINERY", "TX", 25_000.0);
    let result = match optimizer.solve_facility(&refinery)? {
        Some(result) => result,
        None => {
            println!("No feasible deployment for {}", refinery.id);
            return Ok(());
        }
    };

    println!("Deployment Results");
    println!("==================");
    println!("Facility: {} ({})", result.facility_id, result.state);
    println!("Demand: {:.0} kg H2/day", result.hydrogen_demand_kg_per_day);
    println!(
        "Reactor: {} x {} ({:.0} MWe)",
        result.reactor_modules,
        result.reactor.as_deref().unwrap_or("none"),
        result.deployed_capacity_mwe
    );
    for module in &result.modules {
        println!(
            "  Module {}: {:?}, {:.1} MWe drawn",
            module.slot, module.hydrogen_units, module.electric_draw_mwe
        );
    }
    println!();
    println!("Reactor CAPEX: ${:.0}/year", result.costs.reactor_capex);
    println!("Reactor O&M: ${:.0}/year", result.costs.reactor_om);
    println!("H2 CAPEX: ${:.0}/year", result.costs.hydrogen_capex);
    println!("H2 O&M: ${:.0}/year", result.costs.hydrogen_om);
    println!("Net revenue: ${:.0}/year", result.net_annual_revenue);
    println!("Breakeven NG price: ${:.2}/MMBtu", result.breakeven_price);
    println!("CO2: {:.0} t/year", result.annual_co2_kg / 1000.0);

    Ok(())
}
