//! Shared helpers for the integration tests

#![allow(dead_code)] // not every test file uses every helper

use std::path::{Path, PathBuf};
use std::time::Duration;

use gtp_tournament::tournament::{EngineSpec, TournamentConfig};

/// Read timeout for tests that expect an answer
pub const T_RESPONSE: Duration = Duration::from_secs(5);
/// Read timeout for tests that expect silence
pub const T_SILENT: Duration = Duration::from_millis(200);

pub fn fake_gtp_path() -> String {
    env!("CARGO_BIN_EXE_fake_gtp").to_string()
}

/// Command line for the scripted engine with extra flags.
pub fn fake_command(args: &[&str]) -> Vec<String> {
    std::iter::once(fake_gtp_path())
        .chain(args.iter().map(|a| a.to_string()))
        .collect()
}

pub fn fake_engine(name: &str, args: &[&str]) -> EngineSpec {
    let mut all = vec!["--name", name];
    all.extend_from_slice(args);
    EngineSpec {
        command: fake_command(&all),
        working_dir: None,
        name: None,
    }
}

/// Two or more scripted players and a scorer answering `score`.
pub fn fake_tournament(players: Vec<EngineSpec>, score: &str, output: &Path) -> TournamentConfig {
    let scorer = EngineSpec {
        command: fake_command(&["--name", "scorer", "--score", score]),
        working_dir: None,
        name: None,
    };
    let mut cfg = TournamentConfig::new(players, scorer, output.to_path_buf());
    cfg.response_timeout_ms = Some(5_000);
    cfg.move_timeout_ms = Some(5_000);
    cfg
}

/// Result blocks in file order: `(white, black, code)`.
pub fn parse_results(path: &Path) -> Vec<(String, String, String)> {
    let text = std::fs::read_to_string(path).unwrap_or_default();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len() % 6, 0, "partial block in:\n{text}");
    lines
        .chunks(6)
        .map(|b| {
            let tag = |line: &str, name: &str| {
                line.strip_prefix(&format!("[{name} \""))
                    .and_then(|s| s.strip_suffix("\"]"))
                    .unwrap_or_else(|| panic!("bad {name} tag: {line}"))
                    .to_string()
            };
            let white = tag(b[0], "White");
            let black = tag(b[1], "Black");
            let code = tag(b[2], "Result");
            assert_eq!(b[3], "");
            assert_eq!(b[4], code);
            assert_eq!(b[5], "");
            (white, black, code)
        })
        .collect()
}

pub fn temp_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}
