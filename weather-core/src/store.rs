//! Persistence of daily summaries, keyed by city and timestamp.

use async_trait::async_trait;
use std::{
    fmt::Debug,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    sync::{Mutex, RwLock},
};
use tracing::debug;

use crate::model::WeatherRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("weather store I/O failed")]
    Io(#[from] std::io::Error),

    #[error("weather record could not be (de)serialized")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait WeatherStore: Send + Sync + Debug {
    async fn put(&self, record: WeatherRecord) -> Result<(), StoreError>;

    /// Records for `city` (case-insensitive), oldest first.
    async fn list(&self, city: &str) -> Result<Vec<WeatherRecord>, StoreError>;
}

fn same_city(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<WeatherRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn put(&self, record: WeatherRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list(&self, city: &str) -> Result<Vec<WeatherRecord>, StoreError> {
        let mut found: Vec<_> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| same_city(&r.city, city))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.timestamp);
        Ok(found)
    }
}

/// Append-only file, one JSON record per line.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesStore {
    /// The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl WeatherStore for JsonLinesStore {
    async fn put(&self, record: WeatherRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        debug!(city = %record.city, path = %self.path.display(), "stored weather record");
        Ok(())
    }

    async fn list(&self, city: &str) -> Result<Vec<WeatherRecord>, StoreError> {
        let contents = {
            let _guard = self.lock.lock().await;
            match fs::read_to_string(&self.path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            }
        };

        let mut found = Vec::new();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            let record: WeatherRecord = serde_json::from_str(line)?;
            if same_city(&record.city, city) {
                found.push(record);
            }
        }
        found.sort_by_key(|r| r.timestamp);
        Ok(found)
    }
}
