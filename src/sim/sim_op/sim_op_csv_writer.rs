use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::Simulation;
use crate::temp_utils::seconds_to_years;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// CSV Writer Operator
///
/// Writes the run's time series once the run has completed. Files are named
/// after the switch combination (`noImpacts_wQuench`, ...) so runs with
/// different switches can share an output directory:
/// - `{label}.csv`: time_yr, liquid_fraction
/// - `{label}_TemperatureCMB.csv`: time_yr, cmb_temperature_k
/// - `{label}_CrustalThickness.csv`: time_yr, crust_thickness_m, averaged_crust_thickness_m
/// - `{label}_Timeseries.csv`: every per-increment field
/// - `{label}_HoleTracker.csv` and `{label}_impactedCrust.csv` when impacts are on
pub struct CsvWriterOp {
    /// Directory the files are written to; `params.output_dir` when `None`
    pub output_dir: Option<PathBuf>,
    written: Vec<PathBuf>,
}

impl CsvWriterOp {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self {
            output_dir,
            written: Vec::new(),
        }
    }

    pub fn handle(output_dir: Option<PathBuf>) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(output_dir)))
    }

    /// Paths written by the last completed run.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_table(path: &Path, header: &str, rows: Vec<String>) -> Result<(), std::io::Error> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}", header)?;
        for row in rows {
            writeln!(writer, "{}", row)?;
        }
        writer.flush()
    }

    fn write_all(&mut self, sim: &Simulation) -> Result<(), std::io::Error> {
        let dir = self.output_dir.clone().unwrap_or_else(|| sim.params.output_dir.clone());
        fs::create_dir_all(&dir)?;
        let label = sim.params.switch_label();
        let samples = &sim.record.samples;
        let yr = seconds_to_years;

        let mut tables: Vec<(String, &str, Vec<String>)> = vec![
            (
                format!("{}.csv", label),
                "time_yr,liquid_fraction",
                samples.iter().map(|s| format!("{:e},{:e}", yr(s.time_s), s.liquid_fraction)).collect(),
            ),
            (
                format!("{}_TemperatureCMB.csv", label),
                "time_yr,cmb_temperature_k",
                samples.iter().map(|s| format!("{:e},{:e}", yr(s.time_s), s.cmb_temperature_k)).collect(),
            ),
            (
                format!("{}_CrustalThickness.csv", label),
                "time_yr,crust_thickness_m,averaged_crust_thickness_m",
                samples
                    .iter()
                    .map(|s| format!("{:e},{:e},{:e}", yr(s.time_s), s.crust_thickness_m, s.averaged_crust_thickness_m))
                    .collect(),
            ),
            (
                format!("{}_Timeseries.csv", label),
                "time_yr,timestep_yr,liquid_fraction,magma_ocean_volume_m3,cmb_radius_m,cmb_temperature_k,\
                 crust_thickness_m,averaged_crust_thickness_m,quench_thickness_m,heat_loss_mode,timestep_iterations",
                samples
                    .iter()
                    .map(|s| {
                        format!(
                            "{:e},{:e},{:e},{:e},{:e},{:e},{:e},{:e},{:e},{},{}",
                            yr(s.time_s),
                            yr(s.timestep_s),
                            s.liquid_fraction,
                            s.magma_ocean_volume_m3,
                            s.cmb_radius_m,
                            s.cmb_temperature_k,
                            s.crust_thickness_m,
                            s.averaged_crust_thickness_m,
                            s.quench_thickness_m,
                            s.heat_loss_mode.code(),
                            s.timestep_iterations
                        )
                    })
                    .collect(),
            ),
        ];

        if sim.params.impacts_enabled {
            tables.push((
                format!("{}_HoleTracker.csv", label),
                "time_yr,hole_area_pct,mean_thickness_m,mean_surface_temperature_k,creation_rate_m2_per_yr,\
                 cumulative_area_pct,count",
                sim.record
                    .holes
                    .iter()
                    .map(|h| {
                        format!(
                            "{:e},{:e},{:e},{:e},{:e},{:e},{}",
                            yr(h.time_s),
                            h.area_percent,
                            h.mean_thickness_m,
                            h.mean_surface_temperature_k,
                            h.creation_rate_m2_per_yr,
                            h.cumulative_area_percent,
                            h.count
                        )
                    })
                    .collect(),
            ));
            tables.push((
                format!("{}_impactedCrust.csv", label),
                "time_yr,impacted_thickness_m,averaged_crust_thickness_m",
                sim.record
                    .impacted_crust
                    .iter()
                    .map(|c| format!("{:e},{:e},{:e}", yr(c.time_s), c.impacted_thickness_m, c.averaged_crust_thickness_m))
                    .collect(),
            ));
        }

        self.written.clear();
        for (file_name, header, rows) in tables {
            let path = dir.join(file_name);
            Self::write_table(&path, header, rows)?;
            self.written.push(path);
        }
        Ok(())
    }
}

impl SimOp for CsvWriterOp {
    fn name(&self) -> &str {
        "CsvWriterOp"
    }

    fn after_sim(&mut self, sim: &mut Simulation) {
        if sim.record.is_empty() {
            log::info!("{}: no increments recorded, no time series written", sim.name);
            return;
        }
        if let Err(e) = self.write_all(sim) {
            log::warn!("failed to write time series for {}: {}", sim.name, e);
        }
    }
}
