// Backfill run state and historical push status

pub mod manager;
pub mod run_state;

pub use manager::StateManager;
pub use run_state::{HistoricalPushStatus, JobPhase, JobRunState, PushStatus};
