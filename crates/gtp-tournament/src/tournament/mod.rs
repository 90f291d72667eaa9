//! Round-robin scheduling across a worker pool

pub mod batch;
pub mod config;
pub mod recorder;
pub mod schedule;
pub mod worker;

pub use batch::{run_batch, BatchSummary, PairStanding};
pub use config::{EngineSpec, TournamentConfig};
pub use recorder::{format_result_block, ResultRecorder};
pub use schedule::GameTask;
pub use worker::{worker_main, PairRecord, WorkerContext, WorkerStats};
