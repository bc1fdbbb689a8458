//! JSON state file holding an engine snapshot between invocations.
//!
//! Writers hold an exclusive advisory lock on a sibling `.lock` file from
//! load to save, so overlapping `quadra` processes are serialized the same
//! way the engine serializes threads.

use anyhow::Context;
use fd_lock::RwLock;
use quadra_voting::{EngineConfig, EngineSnapshot, TracingEventSink, VotingEngine};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// State file on disk.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Path of the lock file guarding writes, e.g. `state.json.lock`.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn open_lock(&self) -> anyhow::Result<RwLock<File>> {
        let dir = self.dir();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create state directory '{}'", dir.display()))?;

        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file '{}'", lock_path.display()))?;
        Ok(RwLock::new(file))
    }

    /// Create a fresh engine and write its empty state. Refuses to overwrite
    /// an existing file unless `force` is set.
    pub fn init(&self, config: EngineConfig, force: bool) -> anyhow::Result<VotingEngine> {
        let mut lock = self.open_lock()?;
        let _guard = lock
            .write()
            .with_context(|| format!("Failed to lock '{}'", self.path.display()))?;

        if self.exists() && !force {
            anyhow::bail!(
                "State file '{}' already exists (use --force to overwrite)",
                self.path.display()
            );
        }
        let engine = VotingEngine::new(config)?;
        self.save(&engine)?;
        Ok(engine)
    }

    /// Load and validate the engine state for reading. Saves replace the
    /// file by rename, so a reader never observes a partial write.
    pub fn load(&self) -> anyhow::Result<VotingEngine> {
        let json = fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Failed to read state file '{}' (run `quadra init` first)",
                self.path.display()
            )
        })?;
        let snapshot: EngineSnapshot = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse state file '{}'", self.path.display()))?;
        let engine = VotingEngine::from_snapshot(snapshot, Arc::new(TracingEventSink))
            .with_context(|| format!("State file '{}' is inconsistent", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "state loaded");
        Ok(engine)
    }

    /// Run `op` on the stored engine under the exclusive lock and persist
    /// the result if it succeeds. A failed `op` leaves the file untouched.
    pub fn update<T, F>(&self, op: F) -> anyhow::Result<(VotingEngine, T)>
    where
        F: FnOnce(&VotingEngine) -> anyhow::Result<T>,
    {
        let mut lock = self.open_lock()?;
        let _guard = lock
            .write()
            .with_context(|| format!("Failed to lock '{}'", self.path.display()))?;
        tracing::trace!(lock = %self.lock_path().display(), "state lock acquired");

        let engine = self.load()?;
        let value = op(&engine)?;
        self.save(&engine)?;
        Ok((engine, value))
    }

    /// Write the engine state through a uniquely named temporary file in the
    /// same directory and rename it over the state file. Callers hold the lock.
    fn save(&self, engine: &VotingEngine) -> anyhow::Result<()> {
        let dir = self.dir();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create state directory '{}'", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in '{}'", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, &engine.snapshot())?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to flush '{}'", tmp.path().display()))?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace '{}'", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "state persisted");
        Ok(())
    }
}
