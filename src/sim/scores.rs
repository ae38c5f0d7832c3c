/// Leaderboard: one row per cleared level.
///
/// ## File format:
///   Tab-separated text with a header row:
///   ```text
///   UserName	Time	TotalJumps	Level
///   ada	01:42	37	Winter Wilds
///   ```
/// Rows are only ever appended. Tabs and line breaks in names are
/// replaced with spaces so a row always has exactly four fields.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ScoreError;

pub const HEADER: &str = "UserName\tTime\tTotalJumps\tLevel";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreRecord {
    pub user_name: String,
    /// Elapsed time as `MM:SS`.
    pub time: String,
    pub total_jumps: u32,
    pub level: String,
}

/// Somewhere finished runs are recorded.
pub trait ScoreSink {
    fn append(&mut self, record: &ScoreRecord) -> Result<(), ScoreError>;
}

pub struct ScoreFile {
    path: PathBuf,
}

impl ScoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ScoreFile { path: path.into() }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All recorded rows, oldest first. A missing file has no rows.
    pub fn read_all(&self) -> Result<Vec<ScoreRecord>, ScoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(source) => return Err(ScoreError::Io { path: self.path.clone(), source }),
        };

        let mut records = vec![];
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() || (idx == 0 && line == HEADER) {
                continue;
            }
            let malformed = || ScoreError::Malformed { path: self.path.clone(), line: idx + 1 };
            let fields: Vec<&str> = line.split('\t').collect();
            let [user_name, time, jumps, level] = fields.as_slice() else {
                return Err(malformed());
            };
            records.push(ScoreRecord {
                user_name: user_name.to_string(),
                time: time.to_string(),
                total_jumps: jumps.parse().map_err(|_| malformed())?,
                level: level.to_string(),
            });
        }
        Ok(records)
    }
}

impl ScoreSink for ScoreFile {
    fn append(&mut self, record: &ScoreRecord) -> Result<(), ScoreError> {
        let io_err = |source| ScoreError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;

        let mut row = String::new();
        if needs_header {
            row.push_str(HEADER);
            row.push('\n');
        }
        row.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            clean(&record.user_name),
            clean(&record.time),
            record.total_jumps,
            clean(&record.level),
        ));
        file.write_all(row.as_bytes()).map_err(io_err)?;

        info!(
            user = %record.user_name,
            time = %record.time,
            jumps = record.total_jumps,
            level = %record.level,
            "score_recorded"
        );
        Ok(())
    }
}

fn clean(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

/// Steps at `fps` as `MM:SS`. Minutes keep counting past 59.
pub fn format_elapsed(steps: u64, fps: u32) -> String {
    let secs = steps / u64::from(fps.max(1));
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(name: &str, jumps: u32) -> ScoreRecord {
        ScoreRecord {
            user_name: name.into(),
            time: "01:05".into(),
            total_jumps: jumps,
            level: "Galactic Tower".into(),
        }
    }

    #[test]
    fn elapsed_formats_minutes_and_seconds() {
        assert_eq!(format_elapsed(0, 60), "00:00");
        assert_eq!(format_elapsed(59, 60), "00:00");
        assert_eq!(format_elapsed(60 * 65, 60), "01:05");
        assert_eq!(format_elapsed(60 * 60 * 100, 60), "100:00");
    }

    #[test]
    fn appends_under_a_single_header() {
        let temp = TempDir::new().expect("tempdir");
        let mut sink = ScoreFile::new(temp.path().join("ranking.tsv"));
        sink.append(&record("ada", 12)).unwrap();
        sink.append(&record("bo", 40)).unwrap();

        let text = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(text.matches(HEADER).count(), 1);
        assert!(text.starts_with(HEADER));
        assert_eq!(sink.read_all().unwrap(), vec![record("ada", 12), record("bo", 40)]);
    }

    #[test]
    fn missing_file_reads_empty() {
        let temp = TempDir::new().expect("tempdir");
        let file = ScoreFile::new(temp.path().join("none.tsv"));
        assert!(file.read_all().unwrap().is_empty());
    }

    #[test]
    fn tabs_in_names_do_not_split_fields() {
        let temp = TempDir::new().expect("tempdir");
        let mut sink = ScoreFile::new(temp.path().join("ranking.tsv"));
        sink.append(&record("a\tb\nc", 3)).unwrap();
        let rows = sink.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_name, "a b c");
    }

    #[test]
    fn malformed_row_reports_line() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("ranking.tsv");
        fs::write(&path, format!("{HEADER}\nada\t01:00\tmany\tX\n")).unwrap();
        let err = ScoreFile::new(&path).read_all().unwrap_err();
        assert!(matches!(err, ScoreError::Malformed { line: 2, .. }));
    }
}
