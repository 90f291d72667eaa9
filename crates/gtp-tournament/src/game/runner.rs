use super::board::Board;
use super::sgf::Opening;
use super::types::{Color, GameOutcome};
use crate::error::{GameError, GameResult};
use crate::gtp::{Gtp, Move};

/// A game ends once either side has passed this many times in total.
pub const PASS_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub board_size: usize,
    /// Sent with `komi` when set; an opening's own komi takes precedence
    pub komi: Option<f32>,
}

/// Called once per generated move
pub struct MoveEvent<'a> {
    pub ply: u32,
    pub color: Color,
    /// Lowercased payload of `genmove`
    pub mv: &'a str,
    pub engine_label: &'a str,
}

/// Plays one game to the end.
///
/// - `black`, `white`: players, already spawned
/// - `scorer`: receives every move and is asked for `final_score` when the
///   pass limit ends the game
/// - `opening`: moves pre-played on all three before the players start
///
/// A player that does not answer `genmove`, or does not acknowledge the
/// opponent's move, loses by forfeit and nothing more is sent to anyone. Only
/// a silent scorer makes the game itself fail.
pub fn run_game<'a>(
    black: &mut (dyn Gtp + 'a),
    white: &mut (dyn Gtp + 'a),
    scorer: &mut (dyn Gtp + 'a),
    config: &GameConfig,
    opening: Option<&Opening>,
    on_move: &mut dyn FnMut(&MoveEvent<'_>),
) -> GameResult<GameOutcome> {
    let mut board = Board::new(config.board_size);
    let komi = opening.and_then(|o| o.komi).or(config.komi);

    for client in [&mut *scorer, &mut *black, &mut *white] {
        client.set_board_size(config.board_size);
        client.clear_board();
        if let Some(k) = komi {
            client.set_komi(k);
        }
    }

    if let Some(opening) = opening {
        for mv in &opening.moves {
            let vertex = mv.vertex();
            black.play(mv.color, &vertex);
            white.play(mv.color, &vertex);
            scorer.play(mv.color, &vertex);
            if let Some((x, y)) = mv.point {
                board.set(x, y, mv.color);
            }
        }
    }

    let mut color = opening.map_or(Color::Black, Opening::next_to_move);
    let mut passes = [0u32; Color::NUM];
    let mut moves = 0u32;

    loop {
        let (mover, other) = match color {
            Color::Black => (&mut *black, &mut *white),
            Color::White => (&mut *white, &mut *black),
        };

        let Some(reply) = mover.generate_move(color) else {
            log::warn!(
                "{} ({}) did not return a move; {} wins by forfeit",
                mover.label(),
                color.gtp_name(),
                color.opponent().gtp_name()
            );
            return Ok(GameOutcome::forfeit(color.opponent(), moves));
        };
        moves += 1;
        let mv = reply.trim().to_ascii_lowercase();
        on_move(&MoveEvent {
            ply: moves,
            color,
            mv: &mv,
            engine_label: mover.label(),
        });

        let parsed = Move::parse(&mv);
        // a resignation ends the game whether or not it is acknowledged
        let resigned = parsed == Some(Move::Resign);
        if !other.play(color, &mv) && !resigned {
            log::warn!(
                "{} ({}) did not acknowledge {}; {} wins by forfeit",
                other.label(),
                color.opponent().gtp_name(),
                mv,
                color.gtp_name()
            );
            return Ok(GameOutcome::forfeit(color, moves));
        }
        if !scorer.play(color, &mv) && !resigned {
            return Err(GameError::ScorerUnresponsive(scorer.label().to_string()));
        }

        match parsed {
            Some(Move::Pass) => {
                passes[color.index()] += 1;
                if passes.iter().any(|&p| p >= PASS_LIMIT) {
                    break;
                }
            }
            Some(Move::Resign) => return Ok(GameOutcome::resignation(color.opponent(), moves)),
            Some(Move::Vertex { x, y }) if board.set(x, y, color) => {}
            _ => log::warn!(
                "{}: move '{}' is not a vertex on a {}x{} board",
                mover.label(),
                mv,
                config.board_size,
                config.board_size
            ),
        }

        color = color.opponent();
    }

    let raw = scorer
        .final_score()
        .ok_or_else(|| GameError::ScorerUnresponsive(scorer.label().to_string()))?;
    log::debug!("game ended after {moves} moves with {} stones placed", board.stones());
    Ok(GameOutcome::scored(raw.trim().to_string(), moves))
}
