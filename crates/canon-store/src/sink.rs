//! Byte-sink boundary.
//!
//! A Canon store never touches storage on its own. Whoever owns its
//! lifecycle hands it a [`ByteSink`] and asks it to persist or restore an
//! export blob.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use canon_types::{
    CanonError, CanonErrorCode, CanonResult, Clock, ExportBlob, Snapshot, SystemClock,
};

use crate::config::CanonConfig;
use crate::store::CanonStore;

/// Errors from byte-sink operations.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The sink cannot be used right now.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

impl From<SinkError> for CanonError {
    fn from(err: SinkError) -> Self {
        CanonError::new(CanonErrorCode::Sink, err.to_string())
    }
}

/// Storage for one serialized store.
pub trait ByteSink: Send + Sync {
    /// Replace the stored blob.
    fn write_blob(&self, bytes: &[u8]) -> Result<(), SinkError>;

    /// Read the stored blob. Returns `Ok(None)` if nothing was written yet.
    fn read_blob(&self) -> Result<Option<Vec<u8>>, SinkError>;
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    blob: RwLock<Option<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteSink for MemorySink {
    fn write_blob(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut blob = self
            .blob
            .write()
            .map_err(|_| SinkError::Unavailable("lock poisoned".into()))?;
        *blob = Some(bytes.to_vec());
        Ok(())
    }

    fn read_blob(&self) -> Result<Option<Vec<u8>>, SinkError> {
        let blob = self
            .blob
            .read()
            .map_err(|_| SinkError::Unavailable("lock poisoned".into()))?;
        Ok(blob.clone())
    }
}

/// Sink backed by a single file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash never leaves a half-written export behind.
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSink for FileSink {
    fn write_blob(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn read_blob(&self) -> Result<Option<Vec<u8>>, SinkError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl CanonStore {
    /// Export the store and write it to `sink`.
    ///
    /// Returns the snapshot embedded in the written blob.
    pub fn persist(&self, sink: &dyn ByteSink) -> CanonResult<Snapshot> {
        let blob = self.export()?;
        let bytes = blob.to_bytes().map_err(CanonError::serialization)?;
        sink.write_blob(&bytes)?;
        tracing::info!(bytes = bytes.len(), snapshot = %blob.snapshot.id, "store persisted");
        Ok(blob.snapshot)
    }

    /// Read and import the blob held by `sink`.
    ///
    /// Returns `Ok(None)` when the sink is empty.
    pub fn restore(sink: &dyn ByteSink) -> CanonResult<Option<Self>> {
        Self::restore_with(sink, CanonConfig::default(), SystemClock)
    }

    pub fn restore_with(
        sink: &dyn ByteSink,
        config: CanonConfig,
        clock: impl Clock + 'static,
    ) -> CanonResult<Option<Self>> {
        match sink.read_blob()? {
            None => Ok(None),
            Some(bytes) => {
                let blob = ExportBlob::from_bytes(&bytes).map_err(CanonError::serialization)?;
                Self::import_with(&blob, config, clock).map(Some)
            }
        }
    }
}
