//! Diagnostic log of ACTIVE state command decisions
//!
//! One line per decision, `"{o|r} {base} {elbow} {wrist}"`, where `o` is a transmitted demand and
//! `r` a suppressed repeat.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::arm_ctrl::CmdDecision;
use comms_if::eqpt::motor::JointDems;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct DiagLog {
    writer: Option<Box<dyn Write + Send>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiagLog {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Some(Box::new(writer)),
        }
    }

    /// Create (or truncate) a log file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }

    /// A log which discards everything.
    pub fn sink() -> Self {
        Self::new(io::sink())
    }

    pub fn record(&mut self, decision: CmdDecision, dems: &JointDems) -> io::Result<()> {
        match self.writer {
            Some(ref mut w) => writeln!(w, "{} {}", decision, dems),
            None => Err(io::Error::new(io::ErrorKind::Other, "diagnostic log is closed")),
        }
    }

    /// Flush and close the log, later records fail.
    pub fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut w) => w.flush(),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_record_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.log");

        let mut log = DiagLog::create(&path).unwrap();
        log.record(CmdDecision::Send, &JointDems::new(20, 0, -5))
            .unwrap();
        log.record(CmdDecision::Repeat, &JointDems::new(22, 1, -5))
            .unwrap();
        log.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "o 20 0 -5\nr 22 1 -5\n");
        assert!(log.record(CmdDecision::Send, &JointDems::default()).is_err());
    }
}
