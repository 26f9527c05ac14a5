//! Raw traffic capture.
//!
//! A [`DebugSink`] receives a copy of every byte exchanged with the controller, in wire order.
//! Capture is strictly best effort: sink failures are logged and never interrupt the session.

use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{trace, warn};

/// A destination for mirrored protocol bytes.
pub trait DebugSink: Send {
    /// Appends `bytes` to the capture.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flushes and releases any underlying resource.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DebugSink for NullSink {
    fn write(&mut self, _bytes: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// Appends captured bytes to a file.
///
/// The file is released on [`DebugSink::close`] and reopened in append mode by the next write,
/// so a capture survives reconnects.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = Some(Self::open_writer(&path)?);
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_writer(path: &Path) -> io::Result<BufWriter<File>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }
}

impl DebugSink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => Self::open_writer(&self.path)?,
        };
        let writer = self.writer.insert(writer);

        writer.write_all(bytes)?;
        writer.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Copies `bytes` into `sink`, logging and discarding any failure.
pub(crate) fn mirror(sink: &mut dyn DebugSink, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }

    if let Err(e) = sink.write(bytes) {
        warn!("Failed to mirror {} bytes to the debug sink: {}", bytes.len(), e);
    } else {
        trace!("mirrored {} bytes", bytes.len());
    }
}
