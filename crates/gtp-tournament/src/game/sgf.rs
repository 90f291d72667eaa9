//! SGF opening files
//!
//! Only the first game tree is read. Supported properties: `SZ`, `KM`, `B`, `W`.
//! Everything else is skipped.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::types::Color;
use crate::gtp::coordinates_to_vertex;

pub const DEFAULT_SGF_SIZE: usize = 19;

#[derive(Debug, Clone, PartialEq)]
pub struct OpeningMove {
    pub color: Color,
    /// GTP coordinates (row 0 at the bottom); `None` is a pass
    pub point: Option<(usize, usize)>,
}

impl OpeningMove {
    /// Vertex text for `play`
    pub fn vertex(&self) -> String {
        self.point
            .and_then(|(x, y)| coordinates_to_vertex(x, y))
            .unwrap_or_else(|| "pass".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Opening {
    pub source: PathBuf,
    pub size: usize,
    pub komi: Option<f32>,
    pub moves: Vec<OpeningMove>,
}

impl Opening {
    /// Side to move once the opening has been played.
    pub fn next_to_move(&self) -> Color {
        self.moves.last().map_or(Color::Black, |m| m.color.opponent())
    }
}

/// Loads every `*.sgf` file in `dir`, sorted by file name.
pub fn load_openings(dir: &Path) -> Result<Vec<Opening>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("cannot open directory {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_sgf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("sgf"));
        if path.is_file() && is_sgf {
            paths.push(path);
        }
    }
    paths.sort();

    let mut openings = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut opening =
            parse_sgf(&text).with_context(|| format!("invalid opening {}", path.display()))?;
        opening.source = path;
        openings.push(opening);
    }
    if openings.is_empty() {
        bail!("no .sgf openings found in {}", dir.display());
    }
    Ok(openings)
}

pub fn parse_sgf(text: &str) -> Result<Opening> {
    let props = properties(text)?;

    let size = match props.iter().find(|(k, _)| k == "SZ") {
        Some((_, v)) => v.trim().parse::<usize>().with_context(|| format!("bad SZ[{v}]"))?,
        None => DEFAULT_SGF_SIZE,
    };
    if !(2..=25).contains(&size) {
        bail!("unsupported board size {size}");
    }
    let komi = match props.iter().find(|(k, _)| k == "KM") {
        Some((_, v)) => Some(v.trim().parse::<f32>().with_context(|| format!("bad KM[{v}]"))?),
        None => None,
    };

    let mut moves = Vec::new();
    for (key, value) in &props {
        let color = match key.as_str() {
            "B" => Color::Black,
            "W" => Color::White,
            _ => continue,
        };
        moves.push(OpeningMove {
            color,
            point: sgf_point(value, size)?,
        });
    }

    Ok(Opening {
        source: PathBuf::new(),
        size,
        komi,
        moves,
    })
}

/// `dc` → GTP coordinates. SGF rows count from the top.
fn sgf_point(value: &str, size: usize) -> Result<Option<(usize, usize)>> {
    if value.is_empty() || (value == "tt" && size <= 19) {
        return Ok(None);
    }
    let bytes = value.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_lowercase) {
        bail!("bad move [{value}]");
    }
    let x = (bytes[0] - b'a') as usize;
    let y = (bytes[1] - b'a') as usize;
    if x >= size || y >= size {
        bail!("move [{value}] is off a {size}x{size} board");
    }
    Ok(Some((x, size - 1 - y)))
}

/// Flattens the first game tree into `(identifier, value)` pairs in file
/// order. `AB[aa][bb]` yields two pairs.
fn properties(text: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    let mut key = String::new();
    let mut chars = text.chars();
    let mut depth = 0i32;

    while let Some(c) = chars.next() {
        match c {
            '(' => {
                depth += 1;
                key.clear();
            }
            ')' => {
                depth -= 1;
                key.clear();
                if depth <= 0 {
                    break;
                }
            }
            ';' => key.clear(),
            '[' => {
                let mut value = String::new();
                let mut closed = false;
                while let Some(v) = chars.next() {
                    match v {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        ']' => {
                            closed = true;
                            break;
                        }
                        _ => value.push(v),
                    }
                }
                if !closed {
                    bail!("unterminated property value");
                }
                if key.is_empty() {
                    bail!("property value without identifier");
                }
                out.push((key.clone(), value));
            }
            c if c.is_ascii_uppercase() => {
                // a new identifier starts after a value list
                if out.last().is_some_and(|(k, _)| *k == key) {
                    key.clear();
                }
                key.push(c);
            }
            c if c.is_whitespace() => {}
            _ => key.clear(),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_komi_and_moves() {
        let o = parse_sgf("(;GM[1]FF[4]SZ[9]KM[7.5];B[ee];W[cc];B[])").unwrap();
        assert_eq!(o.size, 9);
        assert_eq!(o.komi, Some(7.5));
        assert_eq!(o.moves.len(), 3);
        // ee is the centre of a 9x9 board
        assert_eq!(o.moves[0].point, Some((4, 4)));
        assert_eq!(o.moves[0].vertex(), "e5");
        // cc: third column, third row from the top
        assert_eq!(o.moves[1].color, Color::White);
        assert_eq!(o.moves[1].point, Some((2, 6)));
        assert_eq!(o.moves[1].vertex(), "c7");
        assert_eq!(o.moves[2].point, None);
        assert_eq!(o.moves[2].vertex(), "pass");
        assert_eq!(o.next_to_move(), Color::White);
    }

    #[test]
    fn defaults_without_size_or_komi() {
        let o = parse_sgf("(;FF[4]C[opening with a comment \\] inside])").unwrap();
        assert_eq!(o.size, DEFAULT_SGF_SIZE);
        assert_eq!(o.komi, None);
        assert!(o.moves.is_empty());
        assert_eq!(o.next_to_move(), Color::Black);
    }

    #[test]
    fn multi_value_properties_are_split() {
        let props = properties("(;AB[aa][bb]SZ[9])").unwrap();
        assert_eq!(
            props,
            vec![
                ("AB".to_string(), "aa".to_string()),
                ("AB".to_string(), "bb".to_string()),
                ("SZ".to_string(), "9".to_string()),
            ]
        );
    }

    #[test]
    fn only_first_tree_is_read() {
        let o = parse_sgf("(;SZ[9];B[aa])(;SZ[13];B[bb];W[cc])").unwrap();
        assert_eq!(o.size, 9);
        assert_eq!(o.moves.len(), 1);
    }

    #[test]
    fn tt_is_a_pass_on_small_boards() {
        let o = parse_sgf("(;SZ[19];B[tt])").unwrap();
        assert_eq!(o.moves[0].point, None);
    }

    #[test]
    fn rejects_bad_moves() {
        assert!(parse_sgf("(;SZ[9];B[zz])").is_err());
        assert!(parse_sgf("(;SZ[9];B[abc])").is_err());
        assert!(parse_sgf("(;SZ[9];B[a1])").is_err());
        assert!(parse_sgf("(;SZ[x])").is_err());
        assert!(parse_sgf("(;SZ[9];B[aa").is_err());
    }

    #[test]
    fn loads_sorted_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.sgf"), "(;SZ[9];B[aa])").unwrap();
        std::fs::write(dir.path().join("a.sgf"), "(;SZ[9];B[bb];W[cc])").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not an opening").unwrap();

        let openings = load_openings(dir.path()).unwrap();
        assert_eq!(openings.len(), 2);
        assert!(openings[0].source.ends_with("a.sgf"));
        assert_eq!(openings[0].moves.len(), 2);
        assert_eq!(openings[1].moves.len(), 1);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_openings(dir.path()).is_err());
    }
}
