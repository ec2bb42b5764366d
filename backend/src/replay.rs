//! Parsing of the raw text the runner posts back when a job finishes.
//!
//! The game engine writes its replay as a single JSON line introduced by a
//! sentinel header. Two alternate sentinels mark a bot that crashed or failed
//! to build, in which case the opposite side wins by default.

use crate::error::{AppError, Result};
use serde::Deserialize;

pub const REPLAY_HEADER: &str = "====== BEGIN REPLAY HERE ======";
pub const RED_BROKEN: &str = "===== RED BROKEN =====";
pub const BLUE_BROKEN: &str = "===== BLUE BROKEN =====";

/// What the runner's output resolved to, before any storage side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerOutput {
    /// The sentinel header was found; `replay_line` is the JSON line after it.
    Replay { replay_line: String },
    /// A broken-bot sentinel was found; `winner` is the side that wins by
    /// default (1 = red/team1, 2 = blue/team2).
    Forfeit { winner: i32 },
}

#[derive(Deserialize)]
struct ReplayDoc {
    winner: String,
}

/// Scans the output for one of the three sentinels. No sentinel at all is a
/// parse failure.
pub fn scan_output(raw: &[u8]) -> Result<RunnerOutput> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| AppError::Parse("runner output is not valid UTF-8".to_string()))?;

    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        match line {
            RED_BROKEN => return Ok(RunnerOutput::Forfeit { winner: 2 }),
            BLUE_BROKEN => return Ok(RunnerOutput::Forfeit { winner: 1 }),
            REPLAY_HEADER => {
                let replay_line = lines
                    .next()
                    .ok_or_else(|| {
                        AppError::Parse("replay header with no replay line".to_string())
                    })?
                    .to_string();
                return Ok(RunnerOutput::Replay { replay_line });
            }
            _ => {}
        }
    }

    Err(AppError::Parse("no replay found in runner output".to_string()))
}

/// Maps the replay JSON to a winner number: red is team 1, blue is team 2.
pub fn winner_from_replay(replay_line: &str) -> Result<i32> {
    let doc: ReplayDoc = serde_json::from_str(replay_line)
        .map_err(|e| AppError::Parse(format!("replay line is not valid JSON: {e}")))?;

    match doc.winner.as_str() {
        "red" => Ok(1),
        "blue" => Ok(2),
        other => Err(AppError::Parse(format!("unknown winner {other:?}"))),
    }
}
