use std::time::Duration;

/// Side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    White = 1,
}

impl Color {
    pub const NUM: usize = 2;

    #[inline]
    pub const fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Index for per-color arrays
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Long form used by `play`
    pub const fn gtp_name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
        }
    }

    /// Short form used by `genmove`
    pub const fn gtp_letter(self) -> char {
        match self {
            Color::Black => 'b',
            Color::White => 'w',
        }
    }
}

impl std::ops::Not for Color {
    type Output = Color;

    #[inline]
    fn not(self) -> Color {
        self.opponent()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Black,
    White,
    /// Jigo, or a score string that names neither side
    Draw,
}

impl Winner {
    pub fn from_color(color: Color) -> Self {
        match color {
            Color::Black => Winner::Black,
            Color::White => Winner::White,
        }
    }

    /// Reads the winner from the first character of a result text such as
    /// `B+3.5`, `w+R` or `0`.
    pub fn from_result_text(raw: &str) -> Self {
        match raw.trim_start().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('b') => Winner::Black,
            Some('w') => Winner::White,
            _ => Winner::Draw,
        }
    }

    /// Result code written to the result file
    pub fn result_code(self) -> &'static str {
        match self {
            Winner::Black => "1-0",
            Winner::White => "0-1",
            Winner::Draw => "1/2-1/2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Winner::Black => "black_win",
            Winner::White => "white_win",
            Winner::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The side to move did not answer `genmove`
    Forfeit,
    Resignation,
    /// Pass limit reached, result taken from the scorer
    Score,
}

impl EndReason {
    pub fn label(self) -> &'static str {
        match self {
            EndReason::Forfeit => "forfeit",
            EndReason::Resignation => "resign",
            EndReason::Score => "score",
        }
    }
}

/// Result of one finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner: Winner,
    /// `B+F`/`W+F` for forfeits, `B+R`/`W+R` for resignations, otherwise the
    /// scorer's `final_score` payload verbatim.
    pub raw: String,
    pub reason: EndReason,
    /// Moves generated by the players, opening moves excluded
    pub moves: u32,
}

impl GameOutcome {
    pub(crate) fn forfeit(winner: Color, moves: u32) -> Self {
        Self {
            winner: Winner::from_color(winner),
            raw: format!("{}+F", winner.gtp_letter().to_ascii_uppercase()),
            reason: EndReason::Forfeit,
            moves,
        }
    }

    pub(crate) fn resignation(winner: Color, moves: u32) -> Self {
        Self {
            winner: Winner::from_color(winner),
            raw: format!("{}+R", winner.gtp_letter().to_ascii_uppercase()),
            reason: EndReason::Resignation,
            moves,
        }
    }

    pub(crate) fn scored(raw: String, moves: u32) -> Self {
        Self {
            winner: Winner::from_result_text(&raw),
            raw,
            reason: EndReason::Score,
            moves,
        }
    }
}

pub fn duration_to_millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
