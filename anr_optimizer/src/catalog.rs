use crate::data_loader::DataLoader;
use crate::error::{OptimizerError, OptimizerResult};
use crate::models::{HydrogenTechnology, ReactorTechnology};
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Validated reactor and hydrogen technology tables.
///
/// Hydrogen entries are cross-indexed by (technology, reactor) because module
/// ratings and consumption change with the reactor they are coupled to.
#[derive(Debug, Clone)]
pub struct TechnologyCatalog {
    reactors: BTreeMap<String, ReactorTechnology>,
    hydrogen: BTreeMap<(String, String), HydrogenTechnology>,
}

impl TechnologyCatalog {
    pub fn new(
        reactors: Vec<ReactorTechnology>,
        hydrogen: Vec<HydrogenTechnology>,
    ) -> OptimizerResult<Self> {
        let mut reactor_map = BTreeMap::new();
        for reactor in reactors {
            validate_reactor(&reactor)?;
            if reactor_map.contains_key(&reactor.name) {
                return Err(OptimizerError::DuplicateData {
                    entity: "reactor technology",
                    key: reactor.name,
                });
            }
            reactor_map.insert(reactor.name.clone(), reactor);
        }

        let mut hydrogen_map = BTreeMap::new();
        for tech in hydrogen {
            if !reactor_map.contains_key(&tech.reactor) {
                return Err(OptimizerError::missing(
                    "reactor technology",
                    format!("{} (paired with {})", tech.reactor, tech.name),
                ));
            }
            validate_hydrogen(&tech)?;
            let key = (tech.name.clone(), tech.reactor.clone());
            if hydrogen_map.contains_key(&key) {
                return Err(OptimizerError::DuplicateData {
                    entity: "hydrogen technology",
                    key: format!("{}/{}", key.0, key.1),
                });
            }
            hydrogen_map.insert(key, tech);
        }

        if reactor_map.is_empty() {
            return Err(OptimizerError::missing("reactor technology", "catalog is empty"));
        }

        Ok(Self {
            reactors: reactor_map,
            hydrogen: hydrogen_map,
        })
    }

    pub fn from_csv_files(reactor_path: &Path, hydrogen_path: &Path) -> OptimizerResult<Self> {
        let reactors = DataLoader::load_reactors(reactor_path)?;
        let hydrogen = DataLoader::load_hydrogen(hydrogen_path)?;
        let catalog = Self::new(reactors, hydrogen)?;
        info!(
            "Technology catalog: {} reactors, {} hydrogen pairings",
            catalog.reactors.len(),
            catalog.hydrogen.len()
        );
        Ok(catalog)
    }

    pub fn reactor(&self, name: &str) -> OptimizerResult<&ReactorTechnology> {
        self.reactors
            .get(name)
            .ok_or_else(|| OptimizerError::missing("reactor technology", name))
    }

    pub fn hydrogen(&self, technology: &str, reactor: &str) -> OptimizerResult<&HydrogenTechnology> {
        self.hydrogen
            .get(&(technology.to_string(), reactor.to_string()))
            .ok_or_else(|| OptimizerError::missing("hydrogen technology", format!("{}/{}", technology, reactor)))
    }

    pub fn reactors(&self) -> impl Iterator<Item = &ReactorTechnology> {
        self.reactors.values()
    }

    pub fn hydrogen_technologies(&self) -> impl Iterator<Item = &HydrogenTechnology> {
        self.hydrogen.values()
    }

    /// Hydrogen technologies that can be coupled to `reactor`
    pub fn pairings_for<'a>(&'a self, reactor: &'a str) -> impl Iterator<Item = &'a HydrogenTechnology> {
        self.hydrogen.values().filter(move |h| h.reactor == reactor)
    }

    pub fn hydrogen_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.hydrogen.keys().map(|(h, _)| h).collect();
        names.into_iter().cloned().collect()
    }
}

fn validate_reactor(r: &ReactorTechnology) -> OptimizerResult<()> {
    positive(&[
        ("power_mwe", r.power_mwe),
        ("power_mwt", r.power_mwt),
        ("life_years", r.life_years),
    ])?;
    let efficiency = r.thermal_efficiency();
    if !(efficiency > 0.0 && efficiency <= 1.0) {
        return Err(OptimizerError::invalid(
            "thermal_efficiency",
            efficiency,
            "electric over thermal power must lie in (0, 1]",
        ));
    }
    if !(0.0..=1.0).contains(&r.ramp_rate) {
        return Err(OptimizerError::invalid("ramp_rate", r.ramp_rate, "must lie in [0, 1]"));
    }
    if !(0.0..=r.power_mwe).contains(&r.msl_mwe) {
        return Err(OptimizerError::invalid(
            "msl_mwe",
            r.msl_mwe,
            "must lie between zero and rated power",
        ));
    }
    non_negative(&[
        ("capex_per_mwe", r.capex_per_mwe),
        ("fom_per_mwe_year", r.fom_per_mwe_year),
        ("vom_per_mwh", r.vom_per_mwh),
    ])
}

fn validate_hydrogen(h: &HydrogenTechnology) -> OptimizerResult<()> {
    positive(&[
        ("capacity_kg_per_hour", h.capacity_kg_per_hour),
        ("capacity_mwe", h.capacity_mwe),
        ("life_years", h.life_years),
    ])?;
    non_negative(&[
        ("elec_mwh_per_kg", h.elec_mwh_per_kg),
        ("heat_mwh_per_kg", h.heat_mwh_per_kg),
        ("capex_per_mwe", h.capex_per_mwe),
        ("fom_per_mwe_year", h.fom_per_mwe_year),
        ("vom_per_mwh", h.vom_per_mwh),
        ("carbon_intensity", h.carbon_intensity),
    ])
}

fn positive(values: &[(&'static str, f64)]) -> OptimizerResult<()> {
    for &(name, value) in values {
        if !(value > 0.0) || !value.is_finite() {
            return Err(OptimizerError::invalid(name, value, "must be positive and finite"));
        }
    }
    Ok(())
}

fn non_negative(values: &[(&'static str, f64)]) -> OptimizerResult<()> {
    for &(name, value) in values {
        if !(value >= 0.0) || !value.is_finite() {
            return Err(OptimizerError::invalid(name, value, "must be finite and not negative"));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn reactor(name: &str, power_mwe: f64) -> ReactorTechnology {
        ReactorTechnology {
            name: name.to_string(),
            power_mwe,
            power_mwt: power_mwe / 0.3,
            capex_per_mwe: 5_000_000.0,
            fom_per_mwe_year: 100_000.0,
            vom_per_mwh: 2.0,
            life_years: 60.0,
            ramp_rate: 0.2,
            msl_mwe: power_mwe * 0.2,
        }
    }

    pub(crate) fn electrolyzer(name: &str, reactor: &str, kg_per_hour: f64, mwe: f64) -> HydrogenTechnology {
        HydrogenTechnology {
            name: name.to_string(),
            reactor: reactor.to_string(),
            capacity_kg_per_hour: kg_per_hour,
            capacity_mwe: mwe,
            elec_mwh_per_kg: mwe / kg_per_hour,
            heat_mwh_per_kg: 0.0,
            capex_per_mwe: 1_000_000.0,
            fom_per_mwe_year: 20_000.0,
            vom_per_mwh: 1.0,
            life_years: 20.0,
            carbon_intensity: 0.5,
        }
    }

    #[test]
    fn test_catalog_cross_index() {
        let catalog = TechnologyCatalog::new(
            vec![reactor("iPWR", 77.0), reactor("HTGR", 80.0)],
            vec![
                electrolyzer("PEM", "iPWR", 50.0, 2.5),
                electrolyzer("PEM", "HTGR", 50.0, 2.4),
                electrolyzer("HTSE", "HTGR", 60.0, 2.0),
            ],
        )
        .unwrap();

        assert_eq!(catalog.pairings_for("HTGR").count(), 2);
        assert_eq!(catalog.pairings_for("iPWR").count(), 1);
        assert_eq!(catalog.hydrogen_names(), vec!["HTSE".to_string(), "PEM".to_string()]);
        assert!(catalog.hydrogen("HTSE", "iPWR").is_err());
    }

    #[test]
    fn test_unknown_pairing_fails_fast() {
        let err = TechnologyCatalog::new(
            vec![reactor("iPWR", 77.0)],
            vec![electrolyzer("PEM", "Microreactor", 50.0, 2.5)],
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::MissingData { .. }));
    }

    #[test]
    fn test_invalid_efficiency_rejected() {
        let mut bad = reactor("iPWR", 77.0);
        bad.power_mwt = 50.0;
        assert!(TechnologyCatalog::new(vec![bad], vec![]).is_err());
    }

    #[test]
    fn test_infinite_cost_rejected() {
        let mut bad = reactor("iPWR", 77.0);
        bad.capex_per_mwe = f64::INFINITY;
        let err = TechnologyCatalog::new(vec![bad], vec![]).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidParameter { .. }));

        let mut pem = electrolyzer("PEM", "iPWR", 50.0, 2.5);
        pem.vom_per_mwh = f64::INFINITY;
        assert!(TechnologyCatalog::new(vec![reactor("iPWR", 77.0)], vec![pem]).is_err());

        let mut huge = reactor("iPWR", 77.0);
        huge.life_years = f64::INFINITY;
        assert!(TechnologyCatalog::new(vec![huge], vec![]).is_err());
    }

    #[test]
    fn test_duplicate_reactor_rejected() {
        let err = TechnologyCatalog::new(vec![reactor("iPWR", 77.0), reactor("iPWR", 70.0)], vec![])
            .unwrap_err();
        assert!(matches!(err, OptimizerError::DuplicateData { .. }));
    }
}
