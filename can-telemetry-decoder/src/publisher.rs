//! Snapshot publisher
//!
//! Serializes a whole snapshot document and hands it to a [`SnapshotSink`],
//! which replaces the previous content. The file sink writes to a temporary
//! file in the target directory and renames it over the destination, so a
//! reader sees either the old or the new document, never a partial one.

use crate::config::EngineConfig;
use crate::snapshot::{DocumentKind, TelemetrySnapshot};
use crate::types::{DecoderError, Result};
use crossbeam_channel::{select, tick, Sender};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Destination that replaces a document's content in one step
pub trait SnapshotSink: Send + Sync {
    fn replace(&self, document: DocumentKind, contents: &[u8]) -> Result<()>;
}

/// Writes documents as files in a data directory
#[derive(Debug, Clone)]
pub struct FileSink {
    paths: HashMap<DocumentKind, PathBuf>,
}

impl FileSink {
    pub fn new(config: &EngineConfig) -> Self {
        let paths = DocumentKind::ALL
            .into_iter()
            .map(|document| (document, config.document_path(document)))
            .collect();
        Self { paths }
    }

    pub fn path(&self, document: DocumentKind) -> Option<&Path> {
        self.paths.get(&document).map(PathBuf::as_path)
    }

    fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SnapshotSink for FileSink {
    fn replace(&self, document: DocumentKind, contents: &[u8]) -> Result<()> {
        let path = self.path(document).ok_or_else(|| DecoderError::PublishFailure {
            document: document.to_string(),
            reason: "no destination configured".to_string(),
        })?;

        Self::write_atomic(path, contents).map_err(|e| DecoderError::PublishFailure {
            document: document.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

/// Serializes snapshot documents into a sink
#[derive(Clone)]
pub struct SnapshotPublisher {
    snapshot: TelemetrySnapshot,
    sink: Arc<dyn SnapshotSink>,
}

impl SnapshotPublisher {
    pub fn new(snapshot: TelemetrySnapshot, sink: Arc<dyn SnapshotSink>) -> Self {
        Self { snapshot, sink }
    }

    /// Publisher writing files as described by `config`
    pub fn from_config(snapshot: TelemetrySnapshot, config: &EngineConfig) -> Self {
        Self::new(snapshot, Arc::new(FileSink::new(config)))
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    /// Replace the persisted copy of one document with the current state
    pub fn publish(&self, document: DocumentKind) -> Result<()> {
        let contents = self.snapshot.to_json(document).map_err(|e| DecoderError::PublishFailure {
            document: document.to_string(),
            reason: e.to_string(),
        })?;
        self.sink.replace(document, &contents)?;
        log::trace!("Published {} snapshot ({} bytes)", document, contents.len());
        Ok(())
    }

    /// Publish both documents, returning the first failure
    pub fn publish_all(&self) -> Result<()> {
        let mut first_error = None;
        for document in DocumentKind::ALL {
            if let Err(e) = self.publish(document) {
                log::warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Background thread flushing changed documents on a fixed interval
pub struct IntervalPublisher {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalPublisher {
    pub fn spawn(publisher: SnapshotPublisher, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("snapshot-publisher".to_string())
            .spawn(move || {
                let ticker = tick(interval);
                let mut published: HashMap<DocumentKind, u64> = HashMap::new();
                log::info!("Interval publisher started ({:?})", interval);
                loop {
                    select! {
                        recv(ticker) -> _ => flush_changed(&publisher, &mut published),
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                flush_changed(&publisher, &mut published);
                log::info!("Interval publisher stopped");
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to start interval publisher: {}", e);
                None
            }
        };

        Self { shutdown: Some(shutdown_tx), handle }
    }

    /// Stop the thread after a final flush
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Interval publisher thread panicked");
            }
        }
    }
}

impl Drop for IntervalPublisher {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn flush_changed(publisher: &SnapshotPublisher, published: &mut HashMap<DocumentKind, u64>) {
    for document in DocumentKind::ALL {
        let revision = publisher.snapshot().revision(document);
        if revision == 0 || published.get(&document) == Some(&revision) {
            continue;
        }
        match publisher.publish(document) {
            Ok(()) => {
                published.insert(document, revision);
            }
            Err(e) => log::warn!("{}", e),
        }
    }
}
