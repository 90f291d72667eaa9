use std::path::Path;
use std::time::Duration;

use super::process::{EngineProcess, ReadOutcome};
use crate::error::GtpError;
use crate::game::Color;

/// Default bound on discarded lines while waiting for one response.
pub const DEFAULT_MAX_NOISE_LINES: usize = 10_000;

/// The GTP operations a game needs from a player or scorer.
///
/// Every operation reports protocol failure (timeout, crash, closed pipe) as
/// `None`/`false` instead of an error, so the game loop can treat a silent
/// player as a forfeit.
pub trait Gtp {
    /// Name used in logs and result files
    fn label(&self) -> &str;
    fn set_board_size(&mut self, size: usize) -> bool;
    fn clear_board(&mut self) -> bool;
    fn set_komi(&mut self, komi: f32) -> bool;
    fn play(&mut self, color: Color, vertex: &str) -> bool;
    fn generate_move(&mut self, color: Color) -> Option<String>;
    fn final_score(&mut self) -> Option<String>;
    fn fetch_name(&mut self) -> Option<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    /// Read timeout for `genmove`
    pub move_timeout: Option<Duration>,
    /// Read timeout for every other command
    pub response_timeout: Option<Duration>,
    pub max_noise_lines: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            move_timeout: None,
            response_timeout: None,
            max_noise_lines: DEFAULT_MAX_NOISE_LINES,
        }
    }
}

/// GTP command/response client over one [`EngineProcess`].
///
/// Once a command goes unanswered the client is out of step with the engine
/// (a late reply would be read as the answer to the next command), so every
/// later command fails without being sent.
pub struct GtpClient {
    process: EngineProcess,
    display_name: Option<String>,
    reported_name: Option<String>,
    options: ClientOptions,
    failed: bool,
}

impl GtpClient {
    pub fn spawn(
        command: &[String],
        working_dir: Option<&Path>,
        display_name: Option<String>,
        options: ClientOptions,
    ) -> Result<Self, GtpError> {
        let process = EngineProcess::spawn(command, working_dir)?;
        Ok(Self::new(process, display_name, options))
    }

    pub fn new(process: EngineProcess, display_name: Option<String>, options: ClientOptions) -> Self {
        Self {
            process,
            display_name,
            reported_name: None,
            options,
            failed: false,
        }
    }

    pub fn send_command(&mut self, cmd: &str) -> Result<(), GtpError> {
        self.process.write_line(cmd)
    }

    /// Reads until a `=` response line and returns its payload.
    pub fn await_response(&mut self, timeout: Option<Duration>) -> Option<String> {
        let max_noise = self.options.max_noise_lines;
        let response = read_response(|| self.process.read_line(timeout), max_noise);
        if response.is_none() {
            log::warn!("program {} did not respond", self.process.program());
            self.failed = true;
        }
        response
    }

    /// `send_command` + `await_response`. A failed write counts as no
    /// response.
    pub fn command(&mut self, cmd: &str, timeout: Option<Duration>) -> Option<String> {
        if self.failed {
            log::debug!("{}: not sending '{cmd}' after an earlier failure", self.program());
            return None;
        }
        if let Err(e) = self.send_command(cmd) {
            log::warn!("{e}");
            self.failed = true;
            return None;
        }
        self.await_response(timeout)
    }

    pub fn program(&self) -> &str {
        self.process.program()
    }

    /// True once a command has gone unanswered.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn shutdown(&mut self) {
        self.process.shutdown();
    }

    fn acknowledged(&mut self, cmd: &str) -> bool {
        let timeout = self.options.response_timeout;
        self.command(cmd, timeout).is_some()
    }
}

impl Gtp for GtpClient {
    fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.reported_name.as_deref())
            .unwrap_or_else(|| self.process.program())
    }

    fn set_board_size(&mut self, size: usize) -> bool {
        self.acknowledged(&format!("boardsize {size}"))
    }

    fn clear_board(&mut self) -> bool {
        self.acknowledged("clear_board")
    }

    fn set_komi(&mut self, komi: f32) -> bool {
        self.acknowledged(&format!("komi {komi}"))
    }

    fn play(&mut self, color: Color, vertex: &str) -> bool {
        self.acknowledged(&format!("play {} {}", color.gtp_name(), vertex))
    }

    fn generate_move(&mut self, color: Color) -> Option<String> {
        let timeout = self.options.move_timeout;
        self.command(&format!("genmove {}", color.gtp_letter()), timeout)
    }

    fn final_score(&mut self) -> Option<String> {
        let timeout = self.options.response_timeout;
        self.command("final_score", timeout)
    }

    fn fetch_name(&mut self) -> Option<String> {
        let timeout = self.options.response_timeout;
        let name = self.command("name", timeout)?;
        self.reported_name = Some(name.clone());
        Some(name)
    }
}

/// Pulls lines from `next_line` until a response marker shows up.
///
/// Blank lines are skipped. Lines not starting with `=` are discarded; after
/// `max_noise` of them the wait is abandoned.
pub fn read_response<F>(mut next_line: F, max_noise: usize) -> Option<String>
where
    F: FnMut() -> ReadOutcome,
{
    let mut noise = 0usize;
    loop {
        let line = match next_line() {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Timeout | ReadOutcome::EndOfStream => return None,
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Some(payload) = response_payload(&line) {
            return Some(payload.to_string());
        }
        if line.starts_with('?') {
            log::debug!("failure response discarded: {line}");
        }
        noise += 1;
        if noise >= max_noise {
            log::warn!("gave up after {noise} lines without a response");
            return None;
        }
    }
}

/// Payload of a `=` line: everything from the third character on.
pub fn response_payload(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('=')?;
    let mut chars = rest.chars();
    chars.next();
    Some(chars.as_str())
}
