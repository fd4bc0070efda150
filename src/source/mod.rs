use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

use crate::classify::ClassifyError;

mod sqlite;
#[cfg(test)]
mod tests;

pub use sqlite::{SqliteRunSource, ensure_schema};

/// Per-run metadata as delivered by a source. `tel_cut_mask` is `None` when
/// DQM has no report for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadataRecord {
    pub run_id: String,
    pub data_start_time: NaiveDateTime,
    pub tel_cut_mask: Option<String>,
    pub config_mask: u8,
    pub run_type: String,
    pub days_since_t1_move: i64,
    pub days_since_upgrade: i64,
}

pub trait RunMetadataSource {
    /// `Ok(None)` when the source has no row for the run.
    fn lookup(&self, run_id: &str) -> Result<Option<RunMetadataRecord>>;
}

/// One line of the stage5 file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunEntry {
    pub run_id: String,
    pub path: String,
}

pub struct RunPathParser {
    pattern: Regex,
}

impl RunPathParser {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"(?P<run_id>[^/\\\s]{5})\.stage5\.root$")
            .context("failed to compile stage5 path regex")?;
        Ok(Self { pattern })
    }

    /// Blank lines and `#` comments yield `None`.
    pub fn parse_line(&self, line: &str) -> Option<Result<RunEntry, ClassifyError>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let entry = self
            .pattern
            .captures(trimmed)
            .and_then(|captures| captures.name("run_id"))
            .map(|run_id| RunEntry {
                run_id: run_id.as_str().to_string(),
                path: trimmed.to_string(),
            })
            .ok_or_else(|| ClassifyError::MalformedRunPath(trimmed.to_string()));

        Some(entry)
    }
}
