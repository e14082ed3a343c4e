//! Runs export commands and packs their output into one ZIP archive.
//!
//! The archive is assembled entirely in memory and written to disk once, via
//! a temporary file renamed over the destination. A failing command therefore
//! never leaves a partial archive behind.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tabex_core::{ExportConfig, ExportError, Result};
use tracing::{debug, info, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::command::ExportCommand;

/// Lifecycle of an [`ExportInvoker`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokerState {
    Idle,
    Accumulating,
    Executing,
    Sealed,
    Failed,
}

/// Outcome of a successful batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub destination: PathBuf,
    pub entries: Vec<String>,
    pub archive_bytes: usize,
}

/// Collects export commands and writes their combined archive.
#[derive(Debug)]
pub struct ExportInvoker {
    destination: PathBuf,
    commands: Vec<ExportCommand>,
    filenames: HashSet<String>,
    state: InvokerState,
}

impl ExportInvoker {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            commands: Vec::new(),
            filenames: HashSet::new(),
            state: InvokerState::Idle,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.destination.clone())
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn state(&self) -> InvokerState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Appends a command. Only allowed before [`create_files`](Self::create_files)
    /// runs; two commands may not produce the same filename.
    pub fn add_command(&mut self, command: ExportCommand) -> Result<()> {
        match self.state {
            InvokerState::Idle | InvokerState::Accumulating => {}
            other => {
                return Err(ExportError::InvalidState(format!(
                    "cannot add commands once the batch is {other:?}"
                )));
            }
        }

        let filename = command.filename();
        if !self.filenames.insert(filename.clone()) {
            return Err(ExportError::DuplicateEntry { filename });
        }

        debug!(file = %filename, "Registered export command");
        self.commands.push(command);
        self.state = InvokerState::Accumulating;
        Ok(())
    }

    /// Executes every command in registration order, archives the results and
    /// writes the archive to the destination, replacing any existing file.
    ///
    /// The first failure aborts the batch and nothing is written.
    pub fn create_files(&mut self) -> Result<ExportSummary> {
        match self.state {
            InvokerState::Idle | InvokerState::Accumulating => {}
            other => {
                return Err(ExportError::InvalidState(format!(
                    "batch already ran and is {other:?}"
                )));
            }
        }
        self.state = InvokerState::Executing;

        let result = self.build_archive().and_then(|(archive, entries)| {
            persist(&self.destination, &archive)?;
            Ok(ExportSummary {
                destination: self.destination.clone(),
                entries,
                archive_bytes: archive.len(),
            })
        });

        match &result {
            Ok(summary) => {
                self.state = InvokerState::Sealed;
                info!(
                    destination = %summary.destination.display(),
                    entries = summary.entries.len(),
                    bytes = summary.archive_bytes,
                    "Export archive written"
                );
            }
            Err(e) => {
                self.state = InvokerState::Failed;
                warn!("Export batch failed, nothing written: {e}");
            }
        }
        result
    }

    fn build_archive(&self) -> Result<(Vec<u8>, Vec<String>)> {
        if self.commands.is_empty() {
            warn!("No export commands registered, writing an empty archive");
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut entries = Vec::with_capacity(self.commands.len());

        for command in &self.commands {
            let filename = command.filename();
            let bytes = command.execute()?;

            zip.start_file(filename.as_str(), options)
                .map_err(|e| ExportError::Archive(format!("Failed to create {filename}: {e}")))?;
            zip.write_all(&bytes)
                .map_err(|e| ExportError::Archive(format!("Failed to write {filename}: {e}")))?;

            debug!(file = %filename, bytes = bytes.len(), "Added archive entry");
            entries.push(filename);
        }

        let cursor = zip
            .finish()
            .map_err(|e| ExportError::Archive(format!("Failed to finalize archive: {e}")))?;
        Ok((cursor.into_inner(), entries))
    }
}

/// Writes `bytes` to a temporary file next to `destination`, then renames it
/// into place.
fn persist(destination: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        ExportError::Archive(format!("Failed to create temp file in {}: {e}", dir.display()))
    })?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ExportError::Archive(format!("Failed to write archive: {e}")))?;
    tmp.persist(destination).map_err(|e| {
        ExportError::Archive(format!(
            "Failed to move archive to {}: {}",
            destination.display(),
            e.error
        ))
    })?;
    Ok(())
}
