//! Append-only mutation journal.
//!
//! Every state mutation during a run is appended here, one line per entry,
//! fsynced before the mutation is acknowledged. At the next startup the file
//! is replayed on top of the snapshot and then recreated empty.
//!
//! Wire format, whitespace-delimited: `+ h <u64>` (new fingerprint),
//! `+ u <url>` (new feed), `+ i <i64>` (new destination). A crash mid-write
//! can leave a torn final line; replay skips malformed lines with a warning
//! instead of aborting.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Fingerprint(u64),
    Feed(String),
    Destination(i64),
}

impl LogEntry {
    /// Decode one journal line. Returns `None` for lines that don't match the
    /// wire format (wrong marker, wrong field count, unparseable operand).
    pub fn decode(line: &str) -> Option<LogEntry> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            ["+", "h", value] => value.parse().ok().map(LogEntry::Fingerprint),
            ["+", "u", url] => Some(LogEntry::Feed((*url).to_string())),
            ["+", "i", value] => value.parse().ok().map(LogEntry::Destination),
            _ => None,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Fingerprint(hash) => write!(f, "+ h {}", hash),
            LogEntry::Feed(url) => write!(f, "+ u {}", url),
            LogEntry::Destination(id) => write!(f, "+ i {}", id),
        }
    }
}

pub struct Journal {
    file: File,
}

impl Journal {
    /// Create (or truncate) the journal file for a new run.
    ///
    /// Only called at startup, after the previous run's entries have been
    /// folded into a fresh snapshot.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append one entry and force it to stable storage before returning.
    pub fn append(&mut self, entry: &LogEntry) -> io::Result<()> {
        writeln!(self.file, "{}", entry)?;
        self.file.sync_data()
    }

    /// Read every decodable entry of a journal file, in file order.
    ///
    /// An absent file yields an empty replay (first run, or clean shutdown
    /// after snapshotting). Malformed lines are logged and skipped.
    pub fn replay(path: &Path) -> io::Result<Vec<LogEntry>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match LogEntry::decode(&line) {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::warn!(line = number + 1, content = %line, "skipping malformed journal line");
                }
            }
        }
        Ok(entries)
    }
}
