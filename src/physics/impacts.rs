//! Crust-puncturing impacts driven by a tabulated accretion-rate history.
//!
//! The table holds `(time_yr, mass_rate_kg_per_yr, energy_rate_j_per_yr)` rows
//! in ascending time order. Tables are read-only for a whole run, so they are
//! handed out behind `Arc` and cached per path for parameter sweeps.

use crate::error::{SimError, SimResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Cache for loaded tables to avoid repeated disk reads
static TABLE_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<ImpactTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactRateRow {
    pub time_yr: f64,
    pub mass_rate_kg_per_yr: f64,
    pub energy_rate_j_per_yr: f64,
}

/// What one timestep of bombardment delivers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImpactDelivery {
    pub area_m2: f64,
    pub mass_kg: f64,
    pub energy_j: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImpactTable {
    source_name: String,
    rows: Vec<ImpactRateRow>,
}

impl ImpactTable {
    pub fn new(source_name: impl Into<String>, rows: Vec<ImpactRateRow>) -> SimResult<ImpactTable> {
        let source_name = source_name.into();
        let fail = |reason: String| SimError::ImpactTable {
            source_name: source_name.clone(),
            reason,
        };

        if rows.is_empty() {
            return Err(fail("table has no rows".to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            if !(row.time_yr.is_finite() && row.mass_rate_kg_per_yr.is_finite() && row.energy_rate_j_per_yr.is_finite()) {
                return Err(fail(format!("row {} has a non-finite value", i + 1)));
            }
            if row.time_yr < 0.0 || row.mass_rate_kg_per_yr < 0.0 || row.energy_rate_j_per_yr < 0.0 {
                return Err(fail(format!("row {} has a negative value", i + 1)));
            }
        }
        if rows.windows(2).any(|pair| pair[1].time_yr < pair[0].time_yr) {
            return Err(fail("rows are not in ascending time order".to_string()));
        }

        Ok(ImpactTable { source_name, rows })
    }

    /// Parse CSV text: one header line, then `time,mass_rate,energy_rate` rows.
    pub fn from_csv_str(source_name: &str, csv: &str) -> SimResult<ImpactTable> {
        let mut rows = Vec::new();

        for (line_index, line) in csv.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 3 {
                return Err(SimError::ImpactTable {
                    source_name: source_name.to_string(),
                    reason: format!("line {}: expected 3 columns, found {}", line_index + 1, fields.len()),
                });
            }
            let mut values = [0.0; 3];
            for (slot, field) in values.iter_mut().zip(&fields) {
                *slot = field.parse::<f64>().map_err(|e| SimError::ImpactTable {
                    source_name: source_name.to_string(),
                    reason: format!("line {}: `{}` is not a number ({})", line_index + 1, field, e),
                })?;
            }
            rows.push(ImpactRateRow {
                time_yr: values[0],
                mass_rate_kg_per_yr: values[1],
                energy_rate_j_per_yr: values[2],
            });
        }

        ImpactTable::new(source_name, rows)
    }

    pub fn load<P: AsRef<Path>>(file_path: P) -> SimResult<ImpactTable> {
        let path = file_path.as_ref();
        let csv = fs::read_to_string(path)?;
        Self::from_csv_str(&path.display().to_string(), &csv)
    }

    /// Load a table once per path and share it between runs.
    pub fn load_cached<P: AsRef<Path>>(file_path: P) -> SimResult<Arc<ImpactTable>> {
        let path_buf = file_path.as_ref().to_path_buf();

        // a poisoned cache only means another run panicked mid-insert
        if let Some(table) = TABLE_CACHE
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&path_buf)
        {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(Self::load(&path_buf)?);
        TABLE_CACHE
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path_buf, Arc::clone(&table));
        Ok(table)
    }

    pub fn clear_cache() {
        TABLE_CACHE
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn rows(&self) -> &[ImpactRateRow] {
        &self.rows
    }

    pub fn last_row(&self) -> &ImpactRateRow {
        // non-empty by construction
        &self.rows[self.rows.len() - 1]
    }

    /// Mass, energy and punctured area delivered during `timestep_yr` at
    /// `elapsed_yr`.
    ///
    /// Inside the table the row used is the last one at or before
    /// `elapsed + timestep / 2`; before the first row nothing arrives. Past the
    /// end of the table the last rates decay as `rate · t_last / t`.
    pub fn delivery(&self, elapsed_yr: f64, timestep_yr: f64, mass_to_area_kg_per_m2: f64) -> ImpactDelivery {
        let last = self.last_row();

        let (mass_rate, energy_rate) = if elapsed_yr <= last.time_yr {
            let window_end = elapsed_yr + timestep_yr / 2.0;
            let matches = self.rows.partition_point(|row| row.time_yr <= window_end);
            if matches == 0 {
                return ImpactDelivery::default();
            }
            let row = &self.rows[matches - 1];
            (row.mass_rate_kg_per_yr, row.energy_rate_j_per_yr)
        } else {
            (
                last.mass_rate_kg_per_yr * last.time_yr / elapsed_yr,
                last.energy_rate_j_per_yr * last.time_yr / elapsed_yr,
            )
        };

        let mass_kg = mass_rate * timestep_yr;
        ImpactDelivery {
            area_m2: mass_kg / mass_to_area_kg_per_m2,
            mass_kg,
            energy_j: energy_rate * timestep_yr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CSV: &str = "time_yr,mass_rate,energy_rate
10,1e12,1e20
100,5e11,4e19
1000,1e11,1e19
";

    fn table() -> ImpactTable {
        ImpactTable::from_csv_str("test", CSV).unwrap()
    }

    #[test]
    fn parses_rows() {
        let table = table();
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[1].mass_rate_kg_per_yr, 5e11);
        assert_eq!(table.last_row().time_yr, 1000.0);
    }

    #[test]
    fn nothing_before_first_row() {
        let delivery = table().delivery(1.0, 2.0, 1e7);
        assert_eq!(delivery, ImpactDelivery::default());
    }

    #[test]
    fn window_reaches_half_a_step_ahead() {
        // 9 + 4/2 = 11 >= 10, so the first row is picked up
        let delivery = table().delivery(9.0, 4.0, 1e7);
        assert_relative_eq!(delivery.mass_kg, 4e12);
        assert_relative_eq!(delivery.energy_j, 4e20);
        assert_relative_eq!(delivery.area_m2, 4e5);
    }

    #[test]
    fn picks_latest_row_in_window() {
        let delivery = table().delivery(500.0, 10.0, 1e7);
        assert_relative_eq!(delivery.mass_kg, 5e12);
    }

    #[test]
    fn decays_beyond_table() {
        let delivery = table().delivery(4000.0, 2.0, 1e7);
        assert_relative_eq!(delivery.mass_kg, 1e11 * 1000.0 / 4000.0 * 2.0);
        assert_relative_eq!(delivery.energy_j, 1e19 * 1000.0 / 4000.0 * 2.0);
        assert_relative_eq!(delivery.area_m2, delivery.mass_kg / 1e7);
    }

    #[test]
    fn rejects_bad_tables() {
        assert!(ImpactTable::from_csv_str("empty", "time,mass,energy\n").is_err());
        assert!(ImpactTable::from_csv_str("short", "h\n1,2\n").is_err());
        assert!(ImpactTable::from_csv_str("text", "h\n1,abc,3\n").is_err());
        assert!(ImpactTable::from_csv_str("order", "h\n10,1,1\n5,1,1\n").is_err());
        assert!(ImpactTable::from_csv_str("negative", "h\n10,-1,1\n").is_err());
    }

    #[test]
    fn error_names_the_line() {
        match ImpactTable::from_csv_str("text", "h\n1,2,3\n4,x,6\n") {
            Err(SimError::ImpactTable { reason, .. }) => assert!(reason.contains("line 3"), "{}", reason),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cached_tables_are_shared() {
        let path = std::env::temp_dir().join("imagma_impacts_cache_test.csv");
        fs::write(&path, CSV).unwrap();

        let a = ImpactTable::load_cached(&path).unwrap();
        let b = ImpactTable::load_cached(&path).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let _ = fs::remove_file(&path);
    }
}
