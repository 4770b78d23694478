use crate::error::{OptimizerError, OptimizerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hydrogen-fired glass furnace that replaces the fossil-fired furnace at
/// process-heat sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FurnaceRetrofit {
    pub capex_per_mwt: f64,
    pub life_years: f64,
}

impl Default for FurnaceRetrofit {
    fn default() -> Self {
        Self {
            capex_per_mwt: 1_340_000.0,
            life_years: 12.0,
        }
    }
}

/// Settings shared by every facility solve of one scenario.
///
/// Passed by reference into each solve; nothing here is mutated while a
/// batch is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Number of reactor module slots per facility
    pub max_modules: usize,
    pub wacc: f64,
    pub itc_reactor: f64,
    pub itc_hydrogen: f64,
    pub hours_per_year: f64,
    /// Natural gas consumed by steam methane reforming, MJ per kg H2
    pub smr_heat_rate_mj_per_kg: f64,
    pub mj_per_mmbtu: f64,
    pub mj_per_mwh: f64,
    pub furnace: FurnaceRetrofit,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_modules: 20,
            wacc: 0.077,
            itc_reactor: 0.0,
            itc_hydrogen: 0.0,
            hours_per_year: 8760.0,
            smr_heat_rate_mj_per_kg: 159.6,
            mj_per_mmbtu: 1055.05585,
            mj_per_mwh: 3600.0,
            furnace: FurnaceRetrofit::default(),
        }
    }
}

impl OptimizerConfig {
    /// Load a scenario from JSON. Missing fields fall back to the defaults.
    pub fn from_json_file(path: &Path) -> OptimizerResult<Self> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_wacc(mut self, wacc: f64) -> Self {
        self.wacc = wacc;
        self
    }

    pub fn with_max_modules(mut self, max_modules: usize) -> Self {
        self.max_modules = max_modules;
        self
    }

    pub fn validate(&self) -> OptimizerResult<()> {
        if self.max_modules == 0 {
            return Err(OptimizerError::InvalidConfig(
                "max_modules must be at least 1".to_string(),
            ));
        }
        if !(self.wacc > 0.0) || !self.wacc.is_finite() {
            return Err(OptimizerError::invalid("wacc", self.wacc, "must be positive"));
        }
        for (name, itc) in [("itc_reactor", self.itc_reactor), ("itc_hydrogen", self.itc_hydrogen)] {
            if !(0.0..1.0).contains(&itc) {
                return Err(OptimizerError::invalid(name, itc, "must lie in [0, 1)"));
            }
        }
        let positive = [
            ("hours_per_year", self.hours_per_year),
            ("smr_heat_rate_mj_per_kg", self.smr_heat_rate_mj_per_kg),
            ("mj_per_mmbtu", self.mj_per_mmbtu),
            ("mj_per_mwh", self.mj_per_mwh),
            ("furnace.life_years", self.furnace.life_years),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(OptimizerError::invalid(name, value, "must be positive"));
            }
        }
        if self.furnace.capex_per_mwt < 0.0 {
            return Err(OptimizerError::invalid(
                "furnace.capex_per_mwt",
                self.furnace.capex_per_mwt,
                "must not be negative",
            ));
        }
        Ok(())
    }

    /// Energy content conversion, MMBtu per MJ
    pub fn mmbtu_per_mj(&self) -> f64 {
        1.0 / self.mj_per_mmbtu
    }

    pub fn days_per_year(&self) -> f64 {
        self.hours_per_year / 24.0
    }
}
