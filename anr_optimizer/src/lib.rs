pub mod breakeven;
pub mod catalog;
pub mod config;
pub mod data_loader;
pub mod deployment;
pub mod dispatch;
pub mod error;
pub mod finance;
pub mod models;
pub mod prices;

pub use breakeven::{annual_demand_mmbtu, breakeven_price};
pub use catalog::TechnologyCatalog;
pub use config::OptimizerConfig;
pub use data_loader::{DataLoader, FacilityRow};
pub use deployment::DeploymentOptimizer;
pub use dispatch::{DispatchOptions, EconomicDispatch, InitialState};
pub use error::{OptimizerError, OptimizerResult};
pub use models::{DeploymentResult, DispatchResult, Facility, FleetSpec};
pub use prices::{CsvPriceDirectory, FlatPriceSource, PriceSeries, PriceSource};
