use crate::error::SimResult;
use crate::sim::record::RunSummary;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::Simulation;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SCORE_CARD_FILE: &str = "scoreCard.csv";

/// Append one summary row to the score card at `path`, writing the header
/// first when the file is new or empty.
pub fn append_score_card(path: &Path, summary: &RunSummary) -> SimResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let needs_header = fs::metadata(path).map(|meta| meta.len() == 0).unwrap_or(true);

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_header {
        writeln!(file, "{}", summary.csv_header())?;
    }
    writeln!(file, "{}", summary.csv_row())?;
    Ok(())
}

/// Score Card Operator
///
/// Appends the run summary to the cumulative score card. `after_sim` only
/// fires for runs that completed, so failed runs never reach the card.
pub struct ScoreCardOp {
    /// Score card location; `{params.output_dir}/scoreCard.csv` when `None`
    pub file_path: Option<PathBuf>,
}

impl ScoreCardOp {
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self { file_path }
    }

    pub fn handle(file_path: Option<PathBuf>) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(file_path)))
    }
}

impl SimOp for ScoreCardOp {
    fn name(&self) -> &str {
        "ScoreCardOp"
    }

    fn after_sim(&mut self, sim: &mut Simulation) {
        let path = self
            .file_path
            .clone()
            .unwrap_or_else(|| sim.params.output_dir.join(SCORE_CARD_FILE));

        match sim.summary() {
            Some(summary) => {
                if let Err(e) = append_score_card(&path, summary) {
                    log::warn!("failed to append to score card {}: {}", path.display(), e);
                }
            }
            None => log::warn!("{} finished without a summary", sim.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SimParams;
    use crate::sim::state::SimulationState;

    fn summary(run_number: u32) -> RunSummary {
        let params = SimParams {
            run_number,
            ..SimParams::default()
        };
        let state = SimulationState::new(&params).unwrap();
        RunSummary::new(&params, &state, params.planet().surface_area_m2(), 0.5)
    }

    #[test]
    fn header_written_once() {
        let path = std::env::temp_dir().join("imagma_score_card_test").join(SCORE_CARD_FILE);
        let _ = fs::remove_file(&path);

        append_score_card(&path, &summary(1)).unwrap();
        append_score_card(&path, &summary(2)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("run,"));
        assert!(lines[1].starts_with("1.0000000e0,"));
        assert!(lines[2].starts_with("2.0000000e0,"));

        let _ = fs::remove_file(&path);
    }
}
