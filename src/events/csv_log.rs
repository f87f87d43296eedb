//! The CSV request log.
//!
//! # Responsibilities
//! - Create one log file per process run, named with a date-time stamp
//!   prefix plus the configured suffix
//! - Write the header row once, then one complete record per request
//! - Keep a monotonically increasing record counter
//!
//! # Design Decisions
//! - One mutex guards the writer and the counter, so concurrent pipeline
//!   executions can never interleave partial records
//! - Each record is flushed as it is written: the log is for post-incident
//!   reading, and a crash must not eat the last requests
//! - Fields are comma-joined with no quoting or escaping; embedded commas
//!   in free-form fields (URLs, user agents) shift columns. Known format
//!   limitation, kept for on-disk compatibility.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;

use crate::events::recorder;

struct LogFile {
    writer: BufWriter<File>,
    count: u64,
}

/// Serialized append-only CSV writer.
pub struct LogSink {
    path: PathBuf,
    state: Mutex<LogFile>,
}

impl LogSink {
    /// Create the log file for this process run, e.g.
    /// `logs/20260804_140434_frontgate.csv`.
    pub fn open(folder: &Path, suffix: &str) -> io::Result<Self> {
        fs::create_dir_all(folder)?;
        let now = Local::now();
        let name = format!("{}_{}", now.format("%Y%m%d_%H%M%S"), suffix);
        let path = folder.join(name);
        let file = File::create(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(LogFile {
                writer: BufWriter::new(file),
                count: 0,
            }),
        })
    }

    /// Where this run's log file lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the column-name row. Called once, immediately after open.
    pub fn write_header(&self) -> io::Result<()> {
        let header = recorder::log_header().join(",");
        let mut state = self.lock();
        writeln!(state.writer, "{}", header)?;
        state.writer.flush()
    }

    /// Write one complete record and bump the counter.
    pub fn write_record(&self, fields: &[String]) -> io::Result<()> {
        let record = fields.join(",");
        let mut state = self.lock();
        writeln!(state.writer, "{}", record)?;
        state.writer.flush()?;
        state.count += 1;
        Ok(())
    }

    /// Number of records written so far (the header row is not counted).
    pub fn count(&self) -> u64 {
        self.lock().count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogFile> {
        // A panic while holding the lock leaves the writer usable; keep
        // logging rather than poisoning the whole feature.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
