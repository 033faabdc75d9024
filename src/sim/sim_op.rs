mod sim_op_csv_writer;
mod sim_op_progress_reporter;
mod sim_op_score_card;

pub use sim_op_csv_writer::CsvWriterOp;
pub use sim_op_progress_reporter::ProgressReporterOp;
pub use sim_op_score_card::{append_score_card, ScoreCardOp, SCORE_CARD_FILE};

use crate::sim::Simulation;

/// Observer hooks around a run. Ops read the committed state; the engine owns
/// all physics.
pub trait SimOp {
    /// The name of this operator (for identification and lookup)
    fn name(&self) -> &str;

    /// Called once before the first increment
    fn init_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }

    /// Called after every committed increment
    fn update_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }

    /// Called once after a run completes without error
    fn after_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }
}

pub struct SimOpHandle {
    pub op: Box<dyn SimOp>,
}

impl SimOpHandle {
    /// Create a new SimOpHandle with the given operation
    pub fn new(op: Box<dyn SimOp>) -> Self {
        SimOpHandle { op }
    }
}
