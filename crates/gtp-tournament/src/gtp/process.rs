use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::error::GtpError;

/// Grace period after `quit`, and again after SIGTERM.
pub const ENGINE_QUIT_TIMEOUT: Duration = Duration::from_secs(1);
pub const ENGINE_QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What one `read_line` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Nothing complete arrived within the requested timeout
    Timeout,
    /// The process closed its stdout, or the stream could not be decoded
    EndOfStream,
}

/// One external program with piped stdin/stdout.
///
/// A reader thread forwards complete stdout lines over a channel, so a read
/// that times out never consumes a partial line.
pub struct EngineProcess {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    rx: Option<Receiver<String>>,
    program: String,
    shut_down: bool,
}

impl EngineProcess {
    pub fn spawn(command: &[String], working_dir: Option<&Path>) -> Result<Self, GtpError> {
        let (exe, args) = command.split_first().ok_or(GtpError::EmptyCommand)?;
        let program = exe.clone();

        let mut cmd = Command::new(exe);
        cmd.args(args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::null());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        // Engines stay in our process group: Ctrl-C on the terminal reaches
        // them too, since `Drop` does not run when we are interrupted.
        let mut child = cmd.spawn().map_err(|source| GtpError::Spawn {
            program: program.clone(),
            source,
        })?;
        let stdin = child.stdin.take().ok_or_else(|| GtpError::MissingPipe {
            program: program.clone(),
            pipe: "stdin",
        })?;
        let stdout = child.stdout.take().ok_or_else(|| GtpError::MissingPipe {
            program: program.clone(),
            pipe: "stdout",
        })?;

        let (tx, rx) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            break;
                        }
                    }
                    // EOF, broken pipe or invalid UTF-8: the channel closes
                    Err(_) => break,
                }
            }
        });

        log::debug!("spawned {} (pid {})", program, child.id());
        Ok(Self {
            child,
            stdin: Some(BufWriter::new(stdin)),
            rx: Some(rx),
            program,
            shut_down: false,
        })
    }

    /// Executable path, used to identify the process in logs.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Reads one line with the trailing newline (and `\r`) stripped.
    ///
    /// `None` blocks until a line arrives or the stream ends.
    pub fn read_line(&mut self, timeout: Option<Duration>) -> ReadOutcome {
        let Some(rx) = self.rx.as_ref() else {
            return ReadOutcome::EndOfStream;
        };
        let received = match timeout {
            Some(t) => rx.recv_timeout(t),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(mut line) => {
                if line.ends_with('\r') {
                    line.pop();
                }
                log::debug!("{} > {}", self.program, line);
                ReadOutcome::Line(line)
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "program {} did not respond in time ({:.3}s)",
                    self.program,
                    timeout.unwrap_or_default().as_secs_f64()
                );
                ReadOutcome::Timeout
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("program {} crashed? (end of output)", self.program);
                ReadOutcome::EndOfStream
            }
        }
    }

    /// Writes `text` followed by an empty line and flushes.
    pub fn write_line(&mut self, text: &str) -> Result<(), GtpError> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(GtpError::Closed {
                program: self.program.clone(),
            });
        };
        log::debug!("{} < {}", self.program, text);
        let written = stdin
            .write_all(text.as_bytes())
            .and_then(|_| stdin.write_all(b"\n\n"))
            .and_then(|_| stdin.flush());
        written.map_err(|source| GtpError::Write {
            program: self.program.clone(),
            source,
        })
    }

    /// Stops the process: `quit`, then SIGTERM, then SIGKILL, each after a
    /// one second grace period. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let _ = self.write_line("quit");
        // Closing stdin lets well-behaved programs see EOF even if they
        // ignored `quit`; dropping the receiver stops the reader thread.
        self.stdin = None;
        self.rx = None;

        if self.wait_for_exit(ENGINE_QUIT_TIMEOUT) {
            return;
        }

        #[cfg(unix)]
        {
            log::warn!("forcibly terminating {} (pid {})", self.program, self.child.id());
            // SAFETY: kill(2) on our own child's pid has no memory-safety requirements.
            unsafe {
                libc::kill(self.child.id() as libc::pid_t, libc::SIGTERM);
            }
            if self.wait_for_exit(ENGINE_QUIT_TIMEOUT) {
                return;
            }
        }

        log::warn!("forcibly killing {} (pid {})", self.program, self.child.id());
        if let Err(e) = self.child.kill() {
            log::warn!("kill {} failed: {e}", self.program);
        }
        let _ = self.child.wait();
    }

    /// Polls `try_wait` until the child exits or `timeout` passes.
    fn wait_for_exit(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(e) => {
                    log::warn!("waiting for {} failed: {e}", self.program);
                    return false;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(ENGINE_QUIT_POLL_INTERVAL);
        }
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}
