//! Single-instance lock. Two scanners driving the same browser would
//! each keep their own marker registry and double-submit rows, so a
//! second copy of the process must refuse to start.

use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    process,
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

use crate::infrastructure::directories::ResolvedPaths;

const LOCK_FILENAME: &str = ".mailsentry.lock";

#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    started_at: i64,
}

impl InstanceGuard {
    pub fn acquire(paths: &ResolvedPaths) -> Result<Self> {
        let lock_path = paths.data_dir.join(LOCK_FILENAME);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file {}", lock_path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                write_lock_info(&mut file, process::id())?;
                tracing::info!(
                    target: "lifecycle",
                    pid = process::id(),
                    path = %lock_path.display(),
                    "acquired runtime lock"
                );
                Ok(Self {
                    file,
                    path: lock_path,
                })
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                Err(describe_conflict(&lock_path))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn describe_conflict(lock_path: &Path) -> anyhow::Error {
    let owner = fs::read_to_string(lock_path)
        .ok()
        .and_then(|raw| serde_json::from_str::<LockInfo>(&raw).ok());
    match owner {
        Some(info) => {
            let mut system = System::new();
            system.refresh_processes();
            let alive = system.process(Pid::from_u32(info.pid)).is_some();
            anyhow!(
                "another instance holds the lock (pid {}, {})",
                info.pid,
                if alive { "running" } else { "not visible in the process table" }
            )
        }
        None => anyhow!("another instance holds the lock at {}", lock_path.display()),
    }
}

fn write_lock_info(file: &mut File, pid: u32) -> Result<()> {
    let info = LockInfo {
        pid,
        started_at: Utc::now().timestamp_millis(),
    };
    let payload = serde_json::to_vec(&info)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&payload)?;
    file.sync_all()?;
    Ok(())
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    target: "lifecycle",
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove lock file on shutdown"
                );
            }
        }
    }
}
