//! Command dispatch: bridges CLI args -> monitor operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod profiles;
pub mod summary;
pub mod sync;
pub mod util;
pub mod watch;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs4::fs_std::FileExt;

use netwatch_config::Config;
use netwatch_core::{DataStore, FileSource, Monitor, SnapshotDevice, SyncReport};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Exclusive advisory lock on `<state>.lock`, released on drop.
///
/// Every load → mutate → save cycle on the state file runs under it, so
/// overlapping invocations never write back a stale image.
pub struct StateLock {
    _file: File,
}

impl StateLock {
    pub async fn acquire(state_path: &Path) -> Result<Self, CliError> {
        let path = state_path.with_extension("lock");
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| CliError::Io(std::io::Error::other(e)))??;
        Ok(Self { _file: file })
    }
}

/// A loaded state file plus the monitor operating on it.
pub struct Session {
    pub monitor: Monitor<FileSource>,
    pub state_path: PathBuf,
    pub color: bool,
    lock: Option<StateLock>,
}

impl Session {
    /// Lock the state file and load it. The lock is held until the
    /// session is dropped or [`unlock`](Self::unlock)ed.
    pub async fn open(cfg: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let state_path = cfg.state_path();
        let lock = StateLock::acquire(&state_path).await?;
        let store = DataStore::load(&state_path).await?;
        let source = FileSource::new(cfg.source_dir());
        tracing::debug!(
            state = %state_path.display(),
            source_dir = %source.dir().display(),
            "session opened"
        );

        Ok(Self {
            monitor: Monitor::new(cfg.to_monitor_config(), Arc::new(store), source),
            state_path,
            color: global.color.as_ref().is_some_and(output::should_color),
            lock: Some(lock),
        })
    }

    /// Release the state file for long-running commands. After this,
    /// write through [`merge_report`](Self::merge_report) only.
    pub fn unlock(&mut self) {
        drop(self.lock.take());
    }

    pub fn store(&self) -> &DataStore {
        self.monitor.store()
    }

    /// Write the store back to the state file.
    pub async fn persist(&self) -> Result<(), CliError> {
        self.monitor.store().save(&self.state_path).await?;
        Ok(())
    }

    /// Reconcile a sync result into the current state file under a fresh
    /// lock, leaving changes made by other invocations in place.
    pub async fn merge_report(&self, report: &SyncReport) -> Result<(), CliError> {
        let _lock = StateLock::acquire(&self.state_path).await?;
        let current = DataStore::load(&self.state_path).await?;
        let snapshot = report
            .devices
            .iter()
            .map(|d| SnapshotDevice::from(d.as_ref()))
            .collect();
        current.reconcile(report.profile_id, snapshot).await?;
        current.save(&self.state_path).await?;
        Ok(())
    }
}

/// Dispatch a state-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    mut session: Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Profiles(args) => profiles::handle(&session, args, global).await,
        Command::Devices(args) => devices::handle(&session, args, global).await,
        Command::Summary(args) => summary::handle(&session, &args, global),
        Command::Sync(args) => sync::handle(&session, args, global).await,
        Command::Watch(args) => {
            session.unlock();
            watch::handle(&session, &args, global).await
        }
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
