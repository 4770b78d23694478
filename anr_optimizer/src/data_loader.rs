use crate::error::{OptimizerError, OptimizerResult};
use crate::models::{DemandProfile, Facility, HydrogenTechnology, ReactorTechnology};
use log::debug;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One row of the reactor catalog export
#[derive(Debug, Clone, Deserialize)]
pub struct ReactorRecord {
    #[serde(rename = "Reactor")]
    pub reactor: String,
    #[serde(rename = "Power in MWe")]
    pub power_mwe: f64,
    #[serde(rename = "Power in MWt")]
    pub power_mwt: f64,
    #[serde(rename = "CAPEX $/MWe")]
    pub capex: f64,
    #[serde(rename = "FOPEX $/MWe-y")]
    pub fopex: f64,
    #[serde(rename = "VOM in $/MWh-e")]
    pub vom: f64,
    #[serde(rename = "Life (y)")]
    pub life: f64,
    #[serde(rename = "Ramp Rate (fraction of capacity/hr)")]
    pub ramp_rate: f64,
    #[serde(rename = "MSL in MWe")]
    pub msl: f64,
}

impl From<ReactorRecord> for ReactorTechnology {
    fn from(r: ReactorRecord) -> Self {
        Self {
            name: r.reactor,
            power_mwe: r.power_mwe,
            power_mwt: r.power_mwt,
            capex_per_mwe: r.capex,
            fom_per_mwe_year: r.fopex,
            vom_per_mwh: r.vom,
            life_years: r.life,
            ramp_rate: r.ramp_rate,
            msl_mwe: r.msl,
        }
    }
}

/// One row of the hydrogen technology export, keyed by (technology, reactor)
#[derive(Debug, Clone, Deserialize)]
pub struct HydrogenRecord {
    #[serde(rename = "Technology")]
    pub technology: String,
    #[serde(rename = "ANR")]
    pub reactor: String,
    #[serde(rename = "H2Cap (kgh2/h)")]
    pub cap_kg_per_hour: f64,
    #[serde(rename = "H2Cap (MWe)")]
    pub cap_mwe: f64,
    #[serde(rename = "H2ElecCons (MWhe/kgh2)")]
    pub elec_cons: f64,
    #[serde(rename = "H2HeatCons (MWht/kgh2)")]
    pub heat_cons: f64,
    #[serde(rename = "CAPEX ($/MWe)")]
    pub capex: f64,
    #[serde(rename = "FOM ($/MWe-year)")]
    pub fom: f64,
    #[serde(rename = "VOM ($/MWhe)")]
    pub vom: f64,
    #[serde(rename = "Life (y)")]
    pub life: f64,
    #[serde(rename = "Carbon intensity (kgCO2eq/kgH2)")]
    pub carbon_intensity: f64,
}

impl From<HydrogenRecord> for HydrogenTechnology {
    fn from(r: HydrogenRecord) -> Self {
        Self {
            name: r.technology,
            reactor: r.reactor,
            capacity_kg_per_hour: r.cap_kg_per_hour,
            capacity_mwe: r.cap_mwe,
            elec_mwh_per_kg: r.elec_cons,
            heat_mwh_per_kg: r.heat_cons,
            capex_per_mwe: r.capex,
            fom_per_mwe_year: r.fom,
            vom_per_mwh: r.vom,
            life_years: r.life,
            carbon_intensity: r.carbon_intensity,
        }
    }
}

/// Facility demand row. Hydrogen demand may be given per day or per year;
/// a heat demand column turns the row into a process-heat site.
#[derive(Debug, Clone, Deserialize)]
pub struct FacilityRecord {
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(rename = "H2 demand (kg/day)", default)]
    pub h2_kg_per_day: Option<f64>,
    #[serde(rename = "H2 demand (kg/year)", default)]
    pub h2_kg_per_year: Option<f64>,
    #[serde(rename = "Heat demand (MJ/year)", default)]
    pub heat_mj_per_year: Option<f64>,
}

impl TryFrom<FacilityRecord> for Facility {
    type Error = OptimizerError;

    fn try_from(r: FacilityRecord) -> OptimizerResult<Self> {
        let hydrogen = r
            .h2_kg_per_day
            .or_else(|| r.h2_kg_per_year.map(|kg| kg / 365.0));

        let demand = match (hydrogen, r.heat_mj_per_year) {
            (h2, Some(heat)) => DemandProfile::ProcessHeat {
                hydrogen_kg_per_day: h2.unwrap_or(0.0),
                heat_mj_per_year: heat,
            },
            (Some(kg_per_day), None) => DemandProfile::Hydrogen { kg_per_day },
            (None, None) => return Err(OptimizerError::missing("facility demand", r.id)),
        };

        Ok(Facility {
            id: r.id,
            state: r.state,
            demand,
        })
    }
}

/// One facility row, converted on its own so a bad row does not sink the table
#[derive(Debug)]
pub struct FacilityRow {
    pub id: String,
    pub state: String,
    pub facility: OptimizerResult<Facility>,
}

impl From<Facility> for FacilityRow {
    fn from(facility: Facility) -> Self {
        Self {
            id: facility.id.clone(),
            state: facility.state.clone(),
            facility: Ok(facility),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PriceRecord {
    #[allow(dead_code)]
    t: usize,
    price: f64,
}

pub struct DataLoader;

impl DataLoader {
    pub fn load_reactors(path: &Path) -> OptimizerResult<Vec<ReactorTechnology>> {
        let rows: Vec<ReactorRecord> = Self::read_rows(std::fs::File::open(path)?)?;
        debug!("Loaded {} reactor rows from {}", rows.len(), path.display());
        Ok(rows.into_iter().map(ReactorTechnology::from).collect())
    }

    pub fn load_hydrogen(path: &Path) -> OptimizerResult<Vec<HydrogenTechnology>> {
        let rows: Vec<HydrogenRecord> = Self::read_rows(std::fs::File::open(path)?)?;
        debug!("Loaded {} hydrogen rows from {}", rows.len(), path.display());
        Ok(rows.into_iter().map(HydrogenTechnology::from).collect())
    }

    pub fn load_facilities(path: &Path) -> OptimizerResult<Vec<Facility>> {
        Self::facilities_from_reader(std::fs::File::open(path)?)
    }

    pub fn facilities_from_reader<R: Read>(reader: R) -> OptimizerResult<Vec<Facility>> {
        let rows: Vec<FacilityRecord> = Self::read_rows(reader)?;
        rows.into_iter().map(Facility::try_from).collect()
    }

    pub fn load_facility_rows(path: &Path) -> OptimizerResult<Vec<FacilityRow>> {
        Self::facility_rows_from_reader(std::fs::File::open(path)?)
    }

    /// Facility rows in file order. Only an unreadable header fails the
    /// whole table; parse and demand errors stay on their row.
    pub fn facility_rows_from_reader<R: Read>(reader: R) -> OptimizerResult<Vec<FacilityRow>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let id_column = headers.iter().position(|h| h == "id");
        let state_column = headers.iter().position(|h| h == "state");

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    rows.push(FacilityRow {
                        id: format!("row {}", line + 1),
                        state: String::new(),
                        facility: Err(err.into()),
                    });
                    continue;
                }
            };
            let field = |column: Option<usize>| column.and_then(|i| record.get(i)).unwrap_or("").to_string();
            let mut id = field(id_column);
            if id.is_empty() {
                id = format!("row {}", line + 1);
            }

            let facility = record
                .deserialize::<FacilityRecord>(Some(&headers))
                .map_err(OptimizerError::from)
                .and_then(Facility::try_from);
            if let Err(err) = &facility {
                debug!("Facility row {}: {}", id, err);
            }
            rows.push(FacilityRow {
                id,
                state: field(state_column),
                facility,
            });
        }
        Ok(rows)
    }

    /// Hourly prices from a two-column `t,price` file, in file order
    pub fn load_prices(path: &Path) -> OptimizerResult<Vec<f64>> {
        let rows: Vec<PriceRecord> = Self::read_rows(std::fs::File::open(path)?)?;
        Ok(rows.into_iter().map(|r| r.price).collect())
    }

    pub fn read_rows<T, R>(reader: R) -> OptimizerResult<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
        R: Read,
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for row in csv_reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }
}
