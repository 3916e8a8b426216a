//! Snapshot provider backed by the JSON files the fetcher jobs drop on
//! shared storage.

pub mod leaf;
pub mod messages;
pub mod store;
pub mod temperature;
pub mod weather;

use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use smol_str::SmolStr;

use crate::error::{DashError, Result};
use crate::snapshot::{Action, DashboardSnapshot};

pub use store::JsonStore;

/// Assembles the current state of the world.
///
/// Implementations may block on file I/O; callers on the async runtime go
/// through [`blocking`].
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self) -> Result<DashboardSnapshot>;
}

#[derive(Debug, Clone)]
pub struct FileSnapshotProvider {
    store: JsonStore,
    messages_file: PathBuf,
    temperature_sensor: SmolStr,
}

impl FileSnapshotProvider {
    pub fn new(
        store: JsonStore,
        messages_file: impl Into<PathBuf>,
        temperature_sensor: impl Into<SmolStr>,
    ) -> Self {
        Self {
            store,
            messages_file: messages_file.into(),
            temperature_sensor: temperature_sensor.into(),
        }
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn messages_file(&self) -> &Path {
        &self.messages_file
    }
}

impl SnapshotProvider for FileSnapshotProvider {
    fn snapshot(&self) -> Result<DashboardSnapshot> {
        let today = Local::now();

        let leaf = leaf::load(&self.store)?;
        let message = messages::message_for(&self.store, &self.messages_file, today.date_naive())?;
        let weather = weather::load(&self.store)?.map(|report| report.for_display());
        let temperature_reading = temperature::reading(&self.store, &self.temperature_sensor)?
            .map(|reading| reading.for_display());

        Ok(DashboardSnapshot {
            leaf,
            message,
            date_string: today.format("%A, %d %B %Y").to_string(),
            weather,
            temperature_reading,
            actions: vec![Action::refresh()],
            generated_at: Utc::now(),
        })
    }
}

/// Run blocking work on the blocking thread pool.
pub async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DashError::Task(e.to_string()))?
}
