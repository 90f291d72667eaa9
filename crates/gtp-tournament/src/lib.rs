//! Automated round-robin tournaments between Go engines speaking GTP.
//!
//! - [`gtp`]: engine processes and the GTP command/response client
//! - [`game`]: one game between two players, scored by a third engine
//! - [`tournament`]: configuration, scheduling and result recording

pub mod error;
pub mod game;
pub mod gtp;
pub mod tournament;

pub use error::{GameError, GtpError};
pub use tournament::{run_batch, BatchSummary, TournamentConfig};
