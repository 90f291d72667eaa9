//! Round-robin tournament between GTP engines.
//!
//! ```text
//! gtp_tournament --config tournament.toml --concurrency 8 --log-file run.log
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use gtp_tournament::{run_batch, BatchSummary, TournamentConfig};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(clap::Parser, Debug)]
#[command(about = "round-robin tournament for GTP engines, scored by a referee engine")]
struct Cli {
    /// Tournament configuration (TOML)
    #[arg(long)]
    config: PathBuf,

    /// Override: number of times each ordered pair is played
    #[arg(long)]
    iterations: Option<u32>,

    /// Override: number of games played at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Override: result file (appended to)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the log here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, cfg: &mut TournamentConfig) {
        if let Some(iterations) = self.iterations {
            cfg.iterations = iterations;
        }
        if let Some(concurrency) = self.concurrency {
            cfg.concurrency = concurrency;
        }
        if let Some(output) = &self.output {
            cfg.output = output.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut cfg = TournamentConfig::load(&cli.config)?;
    cli.apply_overrides(&mut cfg);

    let summary = run_batch(&cfg)?;
    print_final_table(&summary);
    Ok(())
}

fn init_logging(cli: &Cli) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }
    builder.init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

fn print_final_table(summary: &BatchSummary) {
    println!();
    println!("=== Tournament Complete ===");
    println!("Started: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Total: {} of {} games played, {} failed, in {:.1}s",
        summary.played(),
        summary.total,
        summary.failed(),
        summary.elapsed.as_secs_f64()
    );
    for s in summary.standings() {
        let la = &summary.engine_labels[s.a];
        let lb = &summary.engine_labels[s.b];
        let wr = s.score_rate().unwrap_or(0.0);
        let elo_str = s.elo().map_or("N/A".to_string(), |e| format!("{:+.0}", e));
        println!(
            "  {} vs {}: {}W-{}L-{}D | {} score: {:.1}% | Elo: {}",
            la,
            lb,
            s.wins_a,
            s.wins_b,
            s.draws,
            la,
            wr * 100.0,
            elo_str
        );
    }
    println!("Output: {}", summary.output.display());
    println!("===========================");
}
