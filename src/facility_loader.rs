use anr_optimizer::{DataLoader, FacilityRow};
use anyhow::Result;
use glob::glob;
use std::path::{Path, PathBuf};

/// Facility demand table of one industry segment. Rows that failed to
/// convert stay in place and are reported as failed by the batch.
#[derive(Debug)]
pub struct IndustryTable {
    pub industry: String,
    pub facilities: Vec<FacilityRow>,
}

/// Find `<input>/facilities/*.csv`; each file stem names an industry.
pub fn discover_industries(input_dir: &Path) -> Result<Vec<IndustryTable>> {
    let pattern = input_dir.join("facilities").join("*.csv");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Non UTF-8 input path: {}", input_dir.display()))?;

    let mut files: Vec<PathBuf> = glob(pattern)?.filter_map(Result::ok).collect();
    files.sort();

    let mut tables = Vec::with_capacity(files.len());
    for path in files {
        let industry = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        let facilities = DataLoader::load_facility_rows(&path)?;
        let bad = facilities.iter().filter(|row| row.facility.is_err()).count();
        if bad > 0 {
            println!("  📄 {}: {} facilities ({} unreadable)", industry, facilities.len(), bad);
        } else {
            println!("  📄 {}: {} facilities", industry, facilities.len());
        }
        tables.push(IndustryTable {
            industry,
            facilities,
        });
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovers_one_table_per_industry() {
        let dir = tempfile::tempdir().unwrap();
        let facilities = dir.path().join("facilities");
        fs::create_dir_all(&facilities).unwrap();
        fs::write(
            facilities.join("refining.csv"),
            "id,state,H2 demand (kg/day)\nREF_1,TX,1000\nREF_2,LA,5000\n",
        )
        .unwrap();
        fs::write(
            facilities.join("glass.csv"),
            "id,state,H2 demand (kg/year),Heat demand (MJ/year)\nGL_1,PA,365000,2000000000\n",
        )
        .unwrap();
        fs::write(facilities.join("notes.txt"), "ignored").unwrap();

        let tables = discover_industries(dir.path()).unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.industry.as_str()).collect();
        assert_eq!(names, vec!["glass", "refining"]);
        assert_eq!(tables[1].facilities.len(), 2);

        let glass = tables[0].facilities[0].facility.as_ref().unwrap();
        assert!((glass.demand.hydrogen_kg_per_day() - 1000.0).abs() < 1e-9);
        assert_eq!(glass.demand.heat_mj_per_year(), Some(2.0e9));
    }

    #[test]
    fn test_blank_demand_row_keeps_table_loading() {
        let dir = tempfile::tempdir().unwrap();
        let facilities = dir.path().join("facilities");
        fs::create_dir_all(&facilities).unwrap();
        fs::write(
            facilities.join("refining.csv"),
            "id,state,H2 demand (kg/day)\nREF_1,TX,1000\nREF_BAD,CA,\nREF_2,LA,5000\n",
        )
        .unwrap();
        fs::write(
            facilities.join("steel.csv"),
            "id,state,H2 demand (kg/day)\nST_1,OH,8000\n",
        )
        .unwrap();

        let tables = discover_industries(dir.path()).unwrap();
        assert_eq!(tables.len(), 2);

        let refining = &tables[0];
        let ids: Vec<&str> = refining.facilities.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["REF_1", "REF_BAD", "REF_2"]);
        assert!(refining.facilities[0].facility.is_ok());
        assert!(refining.facilities[1].facility.is_err());
        assert_eq!(refining.facilities[1].state, "CA");
        assert!(refining.facilities[2].facility.is_ok());
        assert!(tables[1].facilities[0].facility.is_ok());
    }

    #[test]
    fn test_missing_directory_yields_no_tables() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_industries(dir.path()).unwrap().is_empty());
    }
}
