use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use crossbeam_channel as chan;

use super::config::TournamentConfig;
use super::recorder::ResultRecorder;
use super::schedule::GameTask;
use super::worker::{worker_main, PairRecord, WorkerContext, WorkerStats};
use crate::game::{load_openings, GameConfig, Opening};

/// Head-to-head record of two engines over both colours, from `a`'s side.
#[derive(Debug, Clone, PartialEq)]
pub struct PairStanding {
    pub a: usize,
    pub b: usize,
    pub wins_a: u32,
    pub wins_b: u32,
    pub draws: u32,
}

impl PairStanding {
    pub fn games(&self) -> u32 {
        self.wins_a + self.wins_b + self.draws
    }

    /// `a`'s score with draws counted as half a win
    pub fn score_rate(&self) -> Option<f64> {
        let games = self.games();
        (games > 0).then(|| (self.wins_a as f64 + self.draws as f64 * 0.5) / games as f64)
    }

    /// Elo difference implied by the score rate; `None` at 0% or 100%
    pub fn elo(&self) -> Option<f64> {
        let wr = self.score_rate()?;
        (wr > 0.0 && wr < 1.0).then(|| -400.0 * (1.0 / wr - 1.0).log10())
    }
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    /// Games scheduled
    pub total: u64,
    pub engine_labels: Vec<String>,
    pub output: PathBuf,
    pub stats: WorkerStats,
}

impl BatchSummary {
    pub fn played(&self) -> u64 {
        self.stats.played
    }

    pub fn failed(&self) -> u64 {
        self.stats.failed
    }

    /// Ordered-pair tallies folded into one entry per unordered pair
    /// (`a < b`), sorted by index.
    pub fn standings(&self) -> Vec<PairStanding> {
        let n = self.engine_labels.len();
        let empty = PairRecord::default();
        let mut out = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                let ab = self.stats.pairs.get(&(a, b)).unwrap_or(&empty);
                let ba = self.stats.pairs.get(&(b, a)).unwrap_or(&empty);
                let standing = PairStanding {
                    a,
                    b,
                    wins_a: ab.black_wins + ba.white_wins,
                    wins_b: ab.white_wins + ba.black_wins,
                    draws: ab.draws + ba.draws,
                };
                if standing.games() > 0 {
                    out.push(standing);
                }
            }
        }
        out
    }
}

/// Plays the whole round-robin described by `config` and waits for every
/// worker to finish.
///
/// Per-game failures are logged and counted; only setup problems (bad
/// configuration, unreadable openings, unopenable result file, thread spawn
/// failure) return an error.
pub fn run_batch(config: &TournamentConfig) -> Result<BatchSummary> {
    config.validate()?;

    let openings = match &config.openings_dir {
        Some(dir) => load_checked_openings(dir, config.board_size)?,
        None => Vec::new(),
    };
    let recorder = ResultRecorder::open(&config.output)
        .with_context(|| format!("failed to open result file {}", config.output.display()))?;

    let ctx = Arc::new(WorkerContext {
        engines: config.engines.clone(),
        scorer: config.scorer.clone(),
        game: GameConfig {
            board_size: config.board_size,
            komi: config.komi,
        },
        options: config.client_options(),
        openings,
        recorder,
    });

    let total = config.total_games();
    let started_at = Local::now();
    let start = Instant::now();
    log::info!(
        "starting {} games: {} engines, {} iterations, {} workers, results to {}",
        total,
        config.engines.len(),
        config.iterations,
        config.concurrency,
        config.output.display()
    );

    let (task_tx, task_rx) = chan::bounded::<Option<GameTask>>(config.concurrency * 2);
    let mut handles = Vec::with_capacity(config.concurrency);
    for i in 0..config.concurrency {
        let ctx = Arc::clone(&ctx);
        let rx = task_rx.clone();
        let handle = thread::Builder::new()
            .name(format!("game-worker-{i}"))
            .spawn(move || worker_main(ctx, rx))
            .with_context(|| format!("failed to spawn worker thread {i}"))?;
        handles.push(handle);
    }
    drop(task_rx);

    for task in GameTask::matrix(config.engines.len(), config.iterations) {
        if task_tx.send(Some(task)).is_err() {
            log::error!("all workers exited early; game {} and later were not scheduled", task.sequence);
            break;
        }
    }

    // one sentinel per worker
    for _ in 0..handles.len() {
        let _ = task_tx.send(None);
    }
    let mut stats = WorkerStats::default();
    for h in handles {
        match h.join() {
            Ok(worker_stats) => stats.merge(worker_stats),
            Err(_) => log::error!("worker thread panicked"),
        }
    }

    let elapsed = start.elapsed();
    log::info!(
        "batch finished: {} played, {} failed in {:.1}s",
        stats.played,
        stats.failed,
        elapsed.as_secs_f64()
    );

    Ok(BatchSummary {
        started_at,
        elapsed,
        total,
        engine_labels: engine_labels(config, &stats),
        output: config.output.clone(),
        stats,
    })
}

/// Names the engines reported during the batch; engines that never got
/// that far fall back to their configured name or executable.
fn engine_labels(config: &TournamentConfig, stats: &WorkerStats) -> Vec<String> {
    config
        .engines
        .iter()
        .enumerate()
        .map(|(i, spec)| match stats.names.get(&i) {
            Some(name) => name.clone(),
            None => spec.launch_label().to_string(),
        })
        .collect()
}

fn load_checked_openings(dir: &std::path::Path, board_size: usize) -> Result<Vec<Opening>> {
    let openings = load_openings(dir)?;
    for opening in &openings {
        if opening.size != board_size {
            bail!(
                "opening {} is for {}x{}, tournament board is {}x{}",
                opening.source.display(),
                opening.size,
                opening.size,
                board_size,
                board_size
            );
        }
    }
    log::info!("loaded {} openings from {}", openings.len(), dir.display());
    Ok(openings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::config::EngineSpec;
    use std::collections::HashMap;

    fn summary(pairs: HashMap<(usize, usize), PairRecord>) -> BatchSummary {
        BatchSummary {
            started_at: Local::now(),
            elapsed: Duration::ZERO,
            total: 0,
            engine_labels: vec!["a".into(), "b".into(), "c".into()],
            output: PathBuf::new(),
            stats: WorkerStats {
                pairs,
                ..WorkerStats::default()
            },
        }
    }

    #[test]
    fn standings_fold_both_colours() {
        let mut pairs = HashMap::new();
        pairs.insert(
            (0, 1),
            PairRecord {
                black_wins: 2,
                white_wins: 1,
                draws: 0,
            },
        );
        pairs.insert(
            (1, 0),
            PairRecord {
                black_wins: 0,
                white_wins: 3,
                draws: 2,
            },
        );
        let s = summary(pairs).standings();
        assert_eq!(s.len(), 1);
        assert_eq!((s[0].a, s[0].b), (0, 1));
        assert_eq!(s[0].wins_a, 5);
        assert_eq!(s[0].wins_b, 1);
        assert_eq!(s[0].draws, 2);
        assert_eq!(s[0].games(), 8);
        assert_eq!(s[0].score_rate(), Some(0.75));
        let elo = s[0].elo().unwrap();
        assert!((elo - 190.85).abs() < 0.1, "elo = {elo}");
    }

    #[test]
    fn elo_undefined_for_shutouts() {
        let p = PairStanding {
            a: 0,
            b: 1,
            wins_a: 4,
            wins_b: 0,
            draws: 0,
        };
        assert_eq!(p.elo(), None);
        let even = PairStanding {
            wins_b: 4,
            ..p
        };
        assert_eq!(even.elo(), Some(0.0));
    }

    #[test]
    fn invalid_config_fails_before_anything_runs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("r.pgn");
        let cfg = TournamentConfig::new(
            vec![EngineSpec::new(["only-one"])],
            EngineSpec::new(["scorer"]),
            out.clone(),
        );
        assert!(run_batch(&cfg).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn mismatched_opening_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("o.sgf"), "(;SZ[19];B[dd])").unwrap();
        let err = load_checked_openings(dir.path(), 9).unwrap_err();
        assert!(err.to_string().contains("19x19"));
        assert_eq!(load_checked_openings(dir.path(), 19).unwrap().len(), 1);
    }

    #[test]
    fn unopenable_output_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TournamentConfig::new(
            vec![EngineSpec::new(["a"]), EngineSpec::new(["b"])],
            EngineSpec::new(["s"]),
            dir.path().join("missing").join("r.pgn"),
        );
        let err = run_batch(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("failed to open result file"));
    }

    #[test]
    fn unlaunchable_engines_fail_every_game() {
        let dir = tempfile::tempdir().unwrap();
        let missing = "/nonexistent/gtp-engine-binary";
        let mut cfg = TournamentConfig::new(
            vec![EngineSpec::new([missing]), EngineSpec::new([missing])],
            EngineSpec::new([missing]),
            dir.path().join("r.pgn"),
        );
        cfg.iterations = 3;
        cfg.concurrency = 2;
        let summary = run_batch(&cfg).unwrap();
        assert_eq!(summary.total, 6);
        assert_eq!(summary.failed(), 6);
        assert_eq!(summary.played(), 0);
        assert!(summary.standings().is_empty());
        assert_eq!(summary.engine_labels, vec![missing.to_string(), missing.to_string()]);
    }

    #[test]
    fn labels_prefer_reported_names() {
        let mut cfg = TournamentConfig::new(
            vec![EngineSpec::new(["/bin/alpha"]), EngineSpec::new(["/bin/beta"])],
            EngineSpec::new(["s"]),
            PathBuf::from("r.pgn"),
        );
        cfg.engines[1].name = Some("Beta".to_string());
        let stats = WorkerStats::default();
        assert_eq!(engine_labels(&cfg, &stats), vec!["/bin/alpha", "Beta"]);

        let mut stats = WorkerStats::default();
        stats.note_name(0, "Alpha 1.0");
        assert_eq!(engine_labels(&cfg, &stats), vec!["Alpha 1.0", "Beta"]);
    }
}
