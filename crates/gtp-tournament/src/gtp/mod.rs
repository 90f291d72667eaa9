pub mod client;
pub mod process;
pub mod vertex;

pub use client::{ClientOptions, Gtp, GtpClient, DEFAULT_MAX_NOISE_LINES};
pub use process::{EngineProcess, ReadOutcome};
pub use vertex::{coordinates_to_vertex, vertex_to_coordinates, Move};
