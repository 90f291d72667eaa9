use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel as chan;

use super::config::EngineSpec;
use super::recorder::ResultRecorder;
use super::schedule::GameTask;
use crate::error::{GameError, GameResult};
use crate::game::{duration_to_millis, run_game, GameConfig, GameOutcome, MoveEvent, Opening, Winner};
use crate::gtp::{ClientOptions, Gtp, GtpClient};

/// Everything a worker needs, shared read-only across the pool.
pub struct WorkerContext {
    pub engines: Vec<EngineSpec>,
    pub scorer: EngineSpec,
    pub game: GameConfig,
    pub options: ClientOptions,
    pub openings: Vec<Opening>,
    pub recorder: ResultRecorder,
}

impl WorkerContext {
    fn opening_for(&self, task: &GameTask) -> Option<&Opening> {
        if self.openings.is_empty() {
            return None;
        }
        let idx = (task.sequence % self.openings.len() as u64) as usize;
        self.openings.get(idx)
    }
}

/// Results of one ordered pairing, seen from the board.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PairRecord {
    pub black_wins: u32,
    pub white_wins: u32,
    pub draws: u32,
}

impl PairRecord {
    pub fn games(&self) -> u32 {
        self.black_wins + self.white_wins + self.draws
    }
}

/// Per-worker tally, merged by the batch once the worker has exited.
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Games recorded to the result file
    pub played: u64,
    /// Games skipped or aborted
    pub failed: u64,
    /// Keyed by `(black_idx, white_idx)`
    pub pairs: HashMap<(usize, usize), PairRecord>,
    /// Name each engine reported (or was configured with), by index
    pub names: HashMap<usize, String>,
}

impl WorkerStats {
    pub fn tally(&mut self, task: &GameTask, winner: Winner) {
        self.played += 1;
        let rec = self.pairs.entry((task.black_idx, task.white_idx)).or_default();
        match winner {
            Winner::Black => rec.black_wins += 1,
            Winner::White => rec.white_wins += 1,
            Winner::Draw => rec.draws += 1,
        }
    }

    /// Keeps the first name seen for each engine.
    pub fn note_name(&mut self, idx: usize, name: &str) {
        self.names.entry(idx).or_insert_with(|| name.to_string());
    }

    pub fn merge(&mut self, other: WorkerStats) {
        self.played += other.played;
        self.failed += other.failed;
        for (idx, name) in other.names {
            self.names.entry(idx).or_insert(name);
        }
        for (key, rec) in other.pairs {
            let mine = self.pairs.entry(key).or_default();
            mine.black_wins += rec.black_wins;
            mine.white_wins += rec.white_wins;
            mine.draws += rec.draws;
        }
    }
}

/// A recorded game and the names it was recorded under.
struct PlayedGame {
    outcome: GameOutcome,
    black_name: String,
    white_name: String,
}

/// Plays tasks until a `None` sentinel arrives or the channel closes.
pub fn worker_main(ctx: Arc<WorkerContext>, rx: chan::Receiver<Option<GameTask>>) -> WorkerStats {
    let mut stats = WorkerStats::default();

    while let Ok(Some(task)) = rx.recv() {
        match panic::catch_unwind(AssertUnwindSafe(|| play_task(&ctx, &task))) {
            Ok(Ok(game)) => {
                stats.note_name(task.black_idx, &game.black_name);
                stats.note_name(task.white_idx, &game.white_name);
                stats.tally(&task, game.outcome.winner);
            }
            Ok(Err(e)) => {
                log::error!("{}> game failed: {e}", task.sequence);
                stats.failed += 1;
            }
            Err(payload) => {
                log::error!("{}> game panicked: {}", task.sequence, panic_message(payload.as_ref()));
                stats.failed += 1;
            }
        }
    }

    log::debug!(
        "worker {} exiting: {} played, {} failed",
        std::thread::current().name().unwrap_or("?"),
        stats.played,
        stats.failed
    );
    stats
}

/// One complete game: spawn, name, play, record, tear down.
///
/// Clients still alive on an early return are shut down by their `Drop`.
fn play_task(ctx: &WorkerContext, task: &GameTask) -> GameResult<PlayedGame> {
    let started = Instant::now();
    let black_spec = &ctx.engines[task.black_idx];
    let white_spec = &ctx.engines[task.white_idx];

    let mut scorer = spawn_client(&ctx.scorer, ctx.options)?;
    let mut black = spawn_client(black_spec, ctx.options)?;
    let mut white = spawn_client(white_spec, ctx.options)?;

    let black_name = player_name(&mut black, black_spec)?;
    let white_name = player_name(&mut white, white_spec)?;

    let seq = task.sequence;
    log::info!("{seq}> {black_name} versus {white_name} started");

    let mut on_move = |event: &MoveEvent<'_>| {
        log::debug!(
            "{seq}> {} {} ({}): {}",
            event.ply,
            event.color.gtp_name(),
            event.engine_label,
            event.mv
        );
    };
    let outcome = run_game(
        &mut black,
        &mut white,
        &mut scorer,
        &ctx.game,
        ctx.opening_for(task),
        &mut on_move,
    )?;

    ctx.recorder.record(&outcome, &black_name, &white_name)?;

    white.shutdown();
    black.shutdown();
    scorer.shutdown();

    log::info!(
        "{seq}> {black_name} versus {white_name}: {} ({}, {}, {} moves) in {} ms",
        outcome.raw,
        outcome.winner.result_code(),
        outcome.reason.label(),
        outcome.moves,
        duration_to_millis(started.elapsed())
    );
    Ok(PlayedGame {
        outcome,
        black_name,
        white_name,
    })
}

fn spawn_client(spec: &EngineSpec, options: ClientOptions) -> GameResult<GtpClient> {
    let client =
        GtpClient::spawn(&spec.command, spec.working_dir.as_deref(), spec.name.clone(), options)?;
    Ok(client)
}

/// Asks for the engine's name; the configured name, when set, wins for
/// labelling.
fn player_name(client: &mut GtpClient, spec: &EngineSpec) -> GameResult<String> {
    if client.fetch_name().is_none() {
        return Err(GameError::NoName(spec.launch_label().to_string()));
    }
    Ok(client.label().to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(black_idx: usize, white_idx: usize) -> GameTask {
        GameTask {
            black_idx,
            white_idx,
            sequence: 0,
        }
    }

    #[test]
    fn tally_and_merge() {
        let mut a = WorkerStats::default();
        a.tally(&task(0, 1), Winner::Black);
        a.tally(&task(0, 1), Winner::Draw);
        a.failed += 1;

        let mut b = WorkerStats::default();
        b.tally(&task(0, 1), Winner::White);
        b.tally(&task(1, 0), Winner::Black);

        a.merge(b);
        assert_eq!(a.played, 4);
        assert_eq!(a.failed, 1);
        assert_eq!(
            a.pairs[&(0, 1)],
            PairRecord {
                black_wins: 1,
                white_wins: 1,
                draws: 1
            }
        );
        assert_eq!(a.pairs[&(1, 0)].black_wins, 1);
        assert_eq!(a.pairs[&(1, 0)].games(), 1);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");
        let payload = panic::catch_unwind(|| std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic payload>");
    }

    #[test]
    fn merge_keeps_first_name_per_engine() {
        let mut a = WorkerStats::default();
        a.note_name(0, "alpha");
        a.note_name(0, "renamed");
        let mut b = WorkerStats::default();
        b.note_name(0, "other");
        b.note_name(2, "gamma");

        a.merge(b);
        assert_eq!(a.names.len(), 2);
        assert_eq!(a.names[&0], "alpha");
        assert_eq!(a.names[&2], "gamma");
    }

    #[test]
    fn worker_exits_on_sentinel_and_closed_channel() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(WorkerContext {
            engines: Vec::new(),
            scorer: EngineSpec::new(["unused"]),
            game: GameConfig {
                board_size: 9,
                komi: None,
            },
            options: ClientOptions::default(),
            openings: Vec::new(),
            recorder: ResultRecorder::open(&dir.path().join("r.pgn")).unwrap(),
        });

        let (tx, rx) = chan::bounded(1);
        tx.send(None).unwrap();
        let stats = worker_main(Arc::clone(&ctx), rx);
        assert_eq!(stats.played + stats.failed, 0);

        let (tx, rx) = chan::bounded::<Option<GameTask>>(1);
        drop(tx);
        let stats = worker_main(ctx, rx);
        assert_eq!(stats.played + stats.failed, 0);
    }

    #[test]
    fn spawn_failure_counts_as_failed_game() {
        let dir = tempfile::tempdir().unwrap();
        let missing = "/nonexistent/gtp-engine-binary";
        let ctx = Arc::new(WorkerContext {
            engines: vec![EngineSpec::new([missing]), EngineSpec::new([missing])],
            scorer: EngineSpec::new([missing]),
            game: GameConfig {
                board_size: 9,
                komi: None,
            },
            options: ClientOptions::default(),
            openings: Vec::new(),
            recorder: ResultRecorder::open(&dir.path().join("r.pgn")).unwrap(),
        });

        let (tx, rx) = chan::bounded(4);
        tx.send(Some(task(0, 1))).unwrap();
        tx.send(Some(task(1, 0))).unwrap();
        tx.send(None).unwrap();
        let stats = worker_main(ctx, rx);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.played, 0);
        assert_eq!(std::fs::read_to_string(dir.path().join("r.pgn")).unwrap(), "");
    }
}
