use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::game::GameOutcome;

/// Appends result blocks to the shared result file.
///
/// One instance is shared by every worker of a batch; the mutex serialises
/// whole blocks so two games never interleave in the file.
pub struct ResultRecorder {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ResultRecorder {
    /// Checks that `path` can be opened for appending (creating it if
    /// missing).
    pub fn open(path: &Path) -> io::Result<Self> {
        append_handle(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A worker that panicked mid-write leaves at worst a truncated block;
    /// later writers carry on after it.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            log::warn!("a writer panicked while appending to {}", self.path.display());
            self.lock.clear_poison();
            poisoned.into_inner()
        })
    }

    pub fn record(&self, outcome: &GameOutcome, black: &str, white: &str) -> io::Result<()> {
        let block = format_result_block(outcome, black, white);
        let _guard = self.lock();
        let mut file = append_handle(&self.path)?;
        file.write_all(block.as_bytes())?;
        file.flush()
    }
}

fn append_handle(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn format_result_block(outcome: &GameOutcome, black: &str, white: &str) -> String {
    let code = outcome.winner.result_code();
    format!("[White \"{white}\"]\n[Black \"{black}\"]\n[Result \"{code}\"]\n\n{code}\n\n")
}
