//! Error types for engine processes and single games

/// Failures of one engine process.
#[derive(thiserror::Error, Debug)]
pub enum GtpError {
    /// Engine command line has no executable
    #[error("engine command is empty")]
    EmptyCommand,

    /// Executable could not be launched
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A stdio pipe was not handed out by the OS
    #[error("{program}: no {pipe} pipe")]
    MissingPipe { program: String, pipe: &'static str },

    /// Writing to the engine's stdin failed (closed pipe, exited process)
    #[error("{program}: write failed: {source}")]
    Write {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process was already shut down
    #[error("{program}: process already shut down")]
    Closed { program: String },
}

/// Failures that abort one game. None of these stop the batch.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    /// A player or the scorer could not be started
    #[error(transparent)]
    Spawn(#[from] GtpError),

    /// A player did not answer `name` before the game started
    #[error("cannot get name from {0}")]
    NoName(String),

    /// The scorer did not answer `final_score`
    #[error("scorer {0} did not return a score")]
    ScorerUnresponsive(String),

    /// Appending the result block failed
    #[error("failed to record result: {0}")]
    Record(#[from] std::io::Error),
}

/// Result type for game orchestration
pub type GameResult<T> = Result<T, GameError>;
