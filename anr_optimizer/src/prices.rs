use crate::data_loader::DataLoader;
use crate::error::{OptimizerError, OptimizerResult};
use std::path::PathBuf;

/// Hourly electricity prices, $/MWh, one value per hour of the horizon
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries(Vec<f64>);

impl PriceSeries {
    pub fn new(prices: Vec<f64>) -> OptimizerResult<Self> {
        if prices.is_empty() {
            return Err(OptimizerError::missing("price series", "no hourly prices"));
        }
        if let Some(&bad) = prices.iter().find(|p| !(**p >= 0.0) || !p.is_finite()) {
            return Err(OptimizerError::invalid("price", bad, "hourly prices must be finite and non-negative"));
        }
        Ok(Self(prices))
    }

    pub fn flat(price: f64, hours: usize) -> OptimizerResult<Self> {
        Self::new(vec![price; hours])
    }

    pub fn hours(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }
}

/// Where the dispatch sub-model gets its prices from.
///
/// No forecast is wired in yet: the available sources are a flat price and
/// per-state CSV files supplied by the caller.
pub trait PriceSource: Send + Sync {
    fn hourly_prices(&self, state: &str) -> OptimizerResult<PriceSeries>;
}

pub struct FlatPriceSource {
    pub price: f64,
    pub hours: usize,
}

impl PriceSource for FlatPriceSource {
    fn hourly_prices(&self, _state: &str) -> OptimizerResult<PriceSeries> {
        PriceSeries::flat(self.price, self.hours)
    }
}

/// Reads `<dir>/<state>.csv`, falling back to `<dir>/default.csv`
pub struct CsvPriceDirectory {
    dir: PathBuf,
}

impl CsvPriceDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PriceSource for CsvPriceDirectory {
    fn hourly_prices(&self, state: &str) -> OptimizerResult<PriceSeries> {
        let state_file = self.dir.join(format!("{}.csv", state));
        let path = if state_file.exists() {
            state_file
        } else {
            self.dir.join("default.csv")
        };
        if !path.exists() {
            return Err(OptimizerError::missing("price series", format!("{} ({})", state, path.display())));
        }
        PriceSeries::new(DataLoader::load_prices(&path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_negative_price_rejected() {
        assert!(PriceSeries::new(vec![10.0, -1.0]).is_err());
        assert!(PriceSeries::new(vec![]).is_err());
    }

    #[test]
    fn test_state_file_with_default_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut tx = std::fs::File::create(dir.path().join("TX.csv")).unwrap();
        writeln!(tx, "t,price\n0,12.5\n1,30").unwrap();
        let mut default = std::fs::File::create(dir.path().join("default.csv")).unwrap();
        writeln!(default, "t,price\n0,5\n1,5\n2,5").unwrap();

        let source = CsvPriceDirectory::new(dir.path());
        assert_eq!(source.hourly_prices("TX").unwrap().values(), &[12.5, 30.0]);
        assert_eq!(source.hourly_prices("OH").unwrap().hours(), 3);
    }
}
