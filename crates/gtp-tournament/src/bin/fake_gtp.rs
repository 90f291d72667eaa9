//! Scripted GTP program for tests.
//!
//! Answers every command with `= ` plus a payload; `genmove` walks through
//! `--moves` and passes once they run out. Flags make it misbehave the ways
//! real engines do: chatter, hang, crash, or refuse to exit.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(about = "scripted GTP engine for tests")]
struct Cli {
    /// Reply to `name`
    #[arg(long, default_value = "fake")]
    name: String,

    /// Comma separated replies to successive `genmove`s
    #[arg(long, value_delimiter = ',')]
    moves: Vec<String>,

    /// Reply to `final_score`
    #[arg(long, default_value = "0")]
    score: String,

    /// Non-response lines printed before every reply
    #[arg(long, default_value_t = 0)]
    noise: usize,

    /// Never answer `genmove`
    #[arg(long)]
    silent_on_genmove: bool,

    /// Exit without answering the Nth `genmove` (1-based)
    #[arg(long)]
    exit_on_genmove: Option<usize>,

    /// Wait this long before answering each `play`
    #[arg(long)]
    delay_play_ms: Option<u64>,

    /// Exit without answering `name`
    #[arg(long)]
    exit_on_name: bool,

    /// Exit without answering `final_score`
    #[arg(long)]
    exit_on_score: bool,

    /// Keep running after `quit` and after stdin closes
    #[arg(long)]
    ignore_quit: bool,

    /// Ignore SIGTERM
    #[arg(long)]
    ignore_term: bool,

    /// Append every received command to this file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(unix)]
    {
        if cli.ignore_term {
            // SAFETY: installing SIG_IGN has no preconditions.
            unsafe {
                libc::signal(libc::SIGTERM, libc::SIG_IGN);
            }
        }
    }

    let mut log = match &cli.log {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => None,
    };

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    let mut moves = cli.moves.iter();
    let mut genmoves = 0usize;

    for line in stdin.lock().lines() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        record(&mut log, command)?;

        let verb = command.split_whitespace().next().unwrap_or_default();
        let payload = match verb {
            "name" => {
                if cli.exit_on_name {
                    return Ok(());
                }
                cli.name.clone()
            }
            "genmove" => {
                genmoves += 1;
                if cli.exit_on_genmove == Some(genmoves) {
                    return Ok(());
                }
                if cli.silent_on_genmove {
                    continue;
                }
                moves.next().cloned().unwrap_or_else(|| "pass".to_string())
            }
            "play" => {
                if let Some(ms) = cli.delay_play_ms {
                    std::thread::sleep(Duration::from_millis(ms));
                }
                String::new()
            }
            "final_score" => {
                if cli.exit_on_score {
                    return Ok(());
                }
                cli.score.clone()
            }
            "quit" => {
                // the caller may already have stopped reading
                let _ = reply(&mut out, cli.noise, "");
                if cli.ignore_quit {
                    continue;
                }
                return Ok(());
            }
            _ => String::new(),
        };
        reply(&mut out, cli.noise, &payload)?;
    }

    if cli.ignore_quit {
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    }
    Ok(())
}

fn reply(out: &mut impl Write, noise: usize, payload: &str) -> io::Result<()> {
    for i in 0..noise {
        writeln!(out, "info noise {i}")?;
    }
    write!(out, "= {payload}\n\n")?;
    out.flush()
}

fn record(log: &mut Option<File>, command: &str) -> io::Result<()> {
    if let Some(file) = log.as_mut() {
        writeln!(file, "{command}")?;
        file.flush()?;
    }
    Ok(())
}
