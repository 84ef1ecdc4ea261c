//! Session management
//!
//! A session is one run of an executable. Each gets its own directory, named after the executable
//! and the start time, which holds the log file and anything saved during the run. Saves are
//! written as pretty JSON by a background thread so the control loop never blocks on the disk.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use erased_serde::Serialize;
use log::{debug, info, warn};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use thiserror::Error;

use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

/// Queue of the running session's saver, so data can be saved from any thread.
static SAVE_QUEUE: OnceCell<Mutex<Sender<SaveJob>>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamps in session directory and saved file names.
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pending save, the path is relative to the session root.
struct SaveJob {
    rel_path: PathBuf,
    data: Box<dyn Serialize + Send>,
}

pub struct Session {
    /// Directory holding everything produced by this run
    pub session_root: PathBuf,

    /// The log file written by [`crate::logger::logger_init`]
    pub log_file_path: PathBuf,

    saver: Option<JoinHandle<()>>,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("PARRY_SW_ROOT is not set, cannot locate the sessions directory")]
    SwRootNotSet,

    #[error("A session has already been started in this process")]
    AlreadyStarted,

    #[error("Could not create the session directory {0:?}: {1}")]
    CreateDirError(PathBuf, std::io::Error),

    #[error("Could not start the save thread: {0}")]
    SaverSpawnError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a session in `$PARRY_SW_ROOT/{sessions_dir}`.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let sw_root = crate::host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::new_in(exec_name, sw_root.join(sessions_dir))
    }

    /// Start a session in the given parent directory.
    ///
    /// Only one session may be started per process.
    pub fn new_in<P: AsRef<Path>>(exec_name: &str, parent: P) -> Result<Self, SessionError> {
        EPOCH
            .try_init_once(Utc::now)
            .map_err(|_| SessionError::AlreadyStarted)?;
        let started = epoch().ok_or(SessionError::AlreadyStarted)?;

        let session_root = parent
            .as_ref()
            .join(format!("{}_{}", exec_name, started.format(STAMP_FORMAT)));
        fs::create_dir_all(&session_root)
            .map_err(|e| SessionError::CreateDirError(session_root.clone(), e))?;

        let (queue, jobs) = mpsc::channel();
        SAVE_QUEUE.init_once(|| Mutex::new(queue));

        let root = session_root.clone();
        let saver = thread::Builder::new()
            .name("session-save".into())
            .spawn(move || run_saver(&root, jobs))
            .map_err(SessionError::SaverSpawnError)?;

        Ok(Self {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            saver: Some(saver),
        })
    }

    /// End the session, blocking until every queued save has been written.
    pub fn exit(mut self) {
        // Dropping the process wide sender ends the saver once the queue is empty
        if let Some(queue) = SAVE_QUEUE.get() {
            if let Ok(mut q) = queue.lock() {
                *q = mpsc::channel().0;
            }
        }

        if let Some(saver) = self.saver.take() {
            info!("Waiting for pending saves");
            if saver.join().is_err() {
                warn!("The save thread panicked, some session data may be missing");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Time the session started, `None` before one is started.
pub fn epoch() -> Option<&'static DateTime<Utc>> {
    EPOCH.get()
}

/// Seconds since the session started, `NAN` before one is started.
pub fn get_elapsed_seconds() -> f64 {
    epoch()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
        .unwrap_or(f64::NAN)
}

/// Queue `data` to be saved as JSON at `rel_path` inside the session directory.
///
/// Without a running session the data is dropped with a warning.
pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(rel_path: P, data: T) {
    let rel_path = rel_path.as_ref().to_path_buf();

    let queue = match SAVE_QUEUE.get().map(|q| q.lock()) {
        Some(Ok(q)) => q,
        Some(Err(_)) => {
            warn!("Save queue is poisoned, dropping {:?}", rel_path);
            return;
        }
        None => {
            warn!("No session is running, dropping {:?}", rel_path);
            return;
        }
    };

    if queue
        .send(SaveJob {
            rel_path: rel_path.clone(),
            data: Box::new(data),
        })
        .is_err()
    {
        warn!("The session has ended, dropping {:?}", rel_path);
    }
}

/// As [`save`], with the current time appended to the file stem so repeated saves don't collide.
pub fn save_with_timestamp<P: AsRef<Path>, T: Serialize + Send + 'static>(rel_path: P, data: T) {
    save(stamp_path(rel_path.as_ref(), &Utc::now()), data);
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn stamp_path(path: &Path, time: &DateTime<Utc>) -> PathBuf {
    let mut name: OsString = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!("_{}", time.format(STAMP_FORMAT)));

    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }

    path.with_file_name(name)
}

fn run_saver(root: &Path, jobs: Receiver<SaveJob>) {
    // Ends when every sender is dropped and the queue drained
    for job in jobs {
        let full_path = root.join(&job.rel_path);

        match write_json(&full_path, &*job.data) {
            Ok(()) => debug!("Saved {:?}", full_path),
            Err(e) => warn!("Could not save {:?}: {}", full_path, e),
        }
    }
}

fn write_json(
    full_path: &Path,
    data: &(dyn Serialize + Send),
) -> Result<(), Box<dyn std::error::Error>> {
    if full_path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err("only .json files can be saved".into());
    }

    if let Some(dir) = full_path.parent() {
        fs::create_dir_all(dir)?;
    }

    let writer = BufWriter::new(File::create(full_path)?);
    serde_json::to_writer_pretty(writer, data)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stamp_path() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        assert_eq!(
            stamp_path(Path::new("calibration/calib.json"), &time),
            PathBuf::from("calibration/calib_20240309_140507.json")
        );
        assert_eq!(
            stamp_path(Path::new("summary"), &time),
            PathBuf::from("summary_20240309_140507")
        );
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let data: Box<dyn Serialize + Send> = Box::new(vec![1u8, 2, 3]);

        write_json(&path, &*data).unwrap();

        let written: Vec<u8> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec![1, 2, 3]);

        assert!(write_json(&dir.path().join("data.toml"), &*data).is_err());
    }

    #[test]
    fn test_no_session() {
        assert!(epoch().is_none());
        assert!(get_elapsed_seconds().is_nan());

        // Dropped with a warning
        save("orphan.json", 1u8);
    }
}
