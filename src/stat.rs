//! Parsing of kernel status records from the process-information filesystem.
//!
//! Two record types are understood:
//! - `<root>/<pid>/stat`: the per-process status line
//! - `<root>/stat`: the system-wide status file, of which only the `btime` line is used

use std::fs;
use std::path::{Path, PathBuf};

/// Offsets into the fields that follow the last `)` of a `<pid>/stat` line.
/// Index 0 is the process state (kernel field 3).
const UTIME_IDX: usize = 11; // field 14
const STIME_IDX: usize = 12; // field 15
const STARTTIME_IDX: usize = 19; // field 22
const VSIZE_IDX: usize = 20; // field 23
const RSS_IDX: usize = 21; // field 24

/// Errors raised while reading or parsing a status record.
#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing ')' after process name")]
    MissingParen,

    #[error("not enough fields in stat: expected at least 22, got {found}")]
    TooFewFields { found: usize },

    #[error("invalid value {value:?} for field {field}")]
    InvalidField { field: &'static str, value: String },

    #[error("no btime line found")]
    MissingBootTime,
}

/// The subset of a `/proc/<pid>/stat` record used for accounting, in kernel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcStat {
    /// Time spent in user mode, in clock ticks.
    pub utime_ticks: u64,
    /// Time spent in kernel mode, in clock ticks.
    pub stime_ticks: u64,
    /// Start time after boot, in clock ticks.
    pub start_ticks: u64,
    /// Virtual memory size, in bytes.
    pub vsize_bytes: u64,
    /// Resident set size, in pages.
    pub rss_pages: u64,
}

impl ProcStat {
    /// Total user + system CPU time in seconds.
    pub fn cpu_seconds(&self, ticks: f64) -> f64 {
        self.utime_ticks as f64 / ticks + self.stime_ticks as f64 / ticks
    }

    /// Resident set size converted to bytes.
    pub fn rss_bytes(&self, pagesize: u64) -> u64 {
        self.rss_pages.saturating_mul(pagesize)
    }
}

/// Parses the content of a `/proc/<pid>/stat` file.
///
/// The process name (field 2) is parenthesized and may itself contain spaces
/// and parentheses, so everything up to and including the last `)` is dropped
/// before the remaining fields are split on whitespace.
///
/// The name is arbitrary bytes set by the process, so only the tail after it
/// is decoded as text.
pub fn parse_pid_stat(content: impl AsRef<[u8]>) -> Result<ProcStat, StatError> {
    let content = content.as_ref();
    let close_paren = content
        .iter()
        .rposition(|&b| b == b')')
        .ok_or(StatError::MissingParen)?;
    let tail = String::from_utf8_lossy(&content[close_paren + 1..]);
    let fields: Vec<&str> = tail.split_whitespace().collect();

    if fields.len() <= RSS_IDX {
        return Err(StatError::TooFewFields {
            found: fields.len(),
        });
    }

    let field = |idx: usize, name: &'static str| -> Result<u64, StatError> {
        fields[idx].parse().map_err(|_| StatError::InvalidField {
            field: name,
            value: fields[idx].to_string(),
        })
    };

    Ok(ProcStat {
        utime_ticks: field(UTIME_IDX, "utime")?,
        stime_ticks: field(STIME_IDX, "stime")?,
        start_ticks: field(STARTTIME_IDX, "starttime")?,
        vsize_bytes: field(VSIZE_IDX, "vsize")?,
        rss_pages: field(RSS_IDX, "rss")?,
    })
}

/// Reads and parses `<proc_path>/stat`.
///
/// The file handle is released before parsing starts.
pub fn read_pid_stat(proc_path: &Path) -> Result<ProcStat, StatError> {
    let path = proc_path.join("stat");
    let content = fs::read(&path).map_err(|source| StatError::Io { path, source })?;
    parse_pid_stat(content)
}

/// Extracts the boot time from the content of the system-wide `/proc/stat`.
///
/// Only the first line starting with `btime ` is considered.
pub fn parse_boot_time(content: &str) -> Result<u64, StatError> {
    let value = content
        .lines()
        .find_map(|line| line.strip_prefix("btime "))
        .ok_or(StatError::MissingBootTime)?
        .trim();

    value.parse().map_err(|_| StatError::InvalidField {
        field: "btime",
        value: value.to_string(),
    })
}

/// Reads the boot time (seconds since epoch) from `<root>/stat`.
pub fn read_boot_time(root: &Path) -> Result<u64, StatError> {
    let path = root.join("stat");
    let content = fs::read(&path).map_err(|source| StatError::Io { path, source })?;
    parse_boot_time(&String::from_utf8_lossy(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // pid (comm) state ppid pgrp session tty_nr tpgid flags minflt cminflt majflt cmajflt
    // utime stime cutime cstime priority nice num_threads itrealvalue starttime vsize rss ...
    const STAT_LINE: &str = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 0 0 20 0 1 0 12345 12345678 1234 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";

    // -------------------------------------------------------------------------
    // Tests for parse_pid_stat
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_pid_stat() {
        let stat = parse_pid_stat(STAT_LINE).expect("valid stat line");
        assert_eq!(stat.utime_ticks, 1000);
        assert_eq!(stat.stime_ticks, 500);
        assert_eq!(stat.start_ticks, 12345);
        assert_eq!(stat.vsize_bytes, 12345678);
        assert_eq!(stat.rss_pages, 1234);
    }

    #[test]
    fn test_parse_pid_stat_name_with_spaces_and_parens() {
        let line = STAT_LINE.replace("(test_process)", "(weird (name) here)");
        let stat = parse_pid_stat(&line).expect("name must not shift fields");
        assert_eq!(stat, parse_pid_stat(STAT_LINE).unwrap());
    }

    #[test]
    fn test_parse_pid_stat_name_with_trailing_paren_and_digits() {
        // A name ending in ") 9 9" would misalign a naive split on the first ')'
        let line = STAT_LINE.replace("(test_process)", "(a) 9 9 (b))");
        let stat = parse_pid_stat(&line).expect("last ')' wins");
        assert_eq!(stat.utime_ticks, 1000);
        assert_eq!(stat.rss_pages, 1234);
    }

    #[test]
    fn test_parse_pid_stat_non_utf8_name() {
        let mut line = b"1234 (bad".to_vec();
        line.extend_from_slice(&[0xff, 0xfe]);
        line.extend_from_slice(STAT_LINE.split_once("(test_process").unwrap().1.as_bytes());

        let stat = parse_pid_stat(&line).expect("name bytes are not decoded");
        assert_eq!(stat, parse_pid_stat(STAT_LINE).unwrap());
    }

    #[test]
    fn test_parse_pid_stat_missing_paren() {
        let result = parse_pid_stat("1234 test S 1 2 3");
        assert!(matches!(result, Err(StatError::MissingParen)));
    }

    #[test]
    fn test_parse_pid_stat_too_few_fields() {
        let result = parse_pid_stat("1234 (test) S 1 2 3");
        assert!(matches!(result, Err(StatError::TooFewFields { found: 4 })));
    }

    #[test]
    fn test_parse_pid_stat_invalid_field() {
        let line = STAT_LINE.replace(" 1000 500 ", " abc 500 ");
        match parse_pid_stat(&line) {
            Err(StatError::InvalidField { field, value }) => {
                assert_eq!(field, "utime");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_conversions() {
        let stat = ProcStat {
            utime_ticks: 50,
            stime_ticks: 30,
            start_ticks: 1000,
            vsize_bytes: 204800,
            rss_pages: 10,
        };
        assert!((stat.cpu_seconds(100.0) - 0.8).abs() < 1e-9);
        assert_eq!(stat.rss_bytes(4096), 40960);
    }

    // -------------------------------------------------------------------------
    // Tests for read_pid_stat
    // -------------------------------------------------------------------------

    #[test]
    fn test_read_pid_stat() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("stat"), STAT_LINE).expect("Failed to write stat file");

        let stat = read_pid_stat(dir.path()).expect("readable stat");
        assert_eq!(stat.utime_ticks, 1000);
    }

    #[test]
    fn test_read_pid_stat_non_utf8_name() {
        let dir = tempdir().expect("Failed to create temp dir");
        let line = STAT_LINE.replacen("(test_process)", "(bad\u{0}name)", 1);
        let mut bytes = line.into_bytes();
        let nul = bytes.iter().position(|&b| b == 0).unwrap();
        bytes[nul] = 0xff;
        std::fs::write(dir.path().join("stat"), &bytes).expect("Failed to write stat file");

        let stat = read_pid_stat(dir.path()).expect("readable stat");
        assert_eq!(stat.vsize_bytes, 12345678);
    }

    #[test]
    fn test_read_pid_stat_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let result = read_pid_stat(dir.path());
        assert!(matches!(result, Err(StatError::Io { .. })));
    }

    // -------------------------------------------------------------------------
    // Tests for boot time
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_boot_time() {
        let content = "cpu  10 20 30 40 0 0 0 0 0 0\nctxt 123\nbtime 1700000000\nprocesses 42\n";
        assert_eq!(parse_boot_time(content).unwrap(), 1700000000);
    }

    #[test]
    fn test_parse_boot_time_missing() {
        let content = "cpu  10 20 30 40 0 0 0 0 0 0\nctxt 123\n";
        assert!(matches!(
            parse_boot_time(content),
            Err(StatError::MissingBootTime)
        ));
    }

    #[test]
    fn test_parse_boot_time_garbage() {
        assert!(matches!(
            parse_boot_time("btime soon\n"),
            Err(StatError::InvalidField { field: "btime", .. })
        ));
    }

    #[test]
    fn test_read_boot_time_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(matches!(
            read_boot_time(dir.path()),
            Err(StatError::Io { .. })
        ));
    }
}
