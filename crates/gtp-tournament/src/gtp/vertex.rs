//! GTP vertex strings (`d4`, `j10`, `pass`, `resign`)
//!
//! Columns run `a..h, j..z`: the letter `i` is skipped. Rows count from 1 at
//! the bottom. Coordinates are zero-based `(column, row)` pairs.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Pass,
    Resign,
    Vertex { x: usize, y: usize },
}

impl Move {
    /// Parses a `genmove` payload. Case-insensitive.
    pub fn parse(text: &str) -> Option<Move> {
        let lower = text.trim().to_ascii_lowercase();
        match lower.as_str() {
            "pass" => Some(Move::Pass),
            "resign" => Some(Move::Resign),
            _ => vertex_to_coordinates(&lower).map(|(x, y)| Move::Vertex { x, y }),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Move::Pass => f.write_str("pass"),
            Move::Resign => f.write_str("resign"),
            Move::Vertex { x, y } => match coordinates_to_vertex(x, y) {
                Some(v) => f.write_str(&v),
                None => write!(f, "({x},{y})"),
            },
        }
    }
}

/// Converts a lowercase vertex such as `c17` to `(column, row)`.
///
/// Only the first character and the digit run after it are read; anything
/// after the digits is ignored. The result is not checked against a board
/// size.
pub fn vertex_to_coordinates(s: &str) -> Option<(usize, usize)> {
    let mut chars = s.chars();
    let letter = chars.next()?;
    if !letter.is_ascii_lowercase() {
        return None;
    }
    let mut x = (letter as u8 - b'a') as usize;
    if letter >= 'i' {
        x -= 1;
    }

    let digits: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    let row: usize = digits.parse().ok()?;
    let y = row.checked_sub(1)?;
    Some((x, y))
}

/// Inverse of [`vertex_to_coordinates`]. `None` past column `z`.
pub fn coordinates_to_vertex(x: usize, y: usize) -> Option<String> {
    // 25 usable letters once `i` is dropped
    if x >= 25 {
        return None;
    }
    let mut letter = b'a' + x as u8;
    if letter >= b'i' {
        letter += 1;
    }
    Some(format!("{}{}", letter as char, y + 1))
}
