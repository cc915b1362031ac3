use crate::foundation::error::{CaptureError, CaptureResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWrite;

/// Single-file save ("download") capability.
#[async_trait::async_trait]
pub trait Downloads: Send {
    /// Persist `bytes` under `file_name`.
    async fn save(&mut self, file_name: &str, bytes: &[u8]) -> CaptureResult<()>;
}

/// Per-file writes into a caller-chosen directory.
#[async_trait::async_trait]
pub trait FrameDirectory: Send {
    /// Write one file; returns once the write has completed.
    async fn write_file(&mut self, file_name: &str, bytes: Vec<u8>) -> CaptureResult<()>;
}

/// Destination for encoded video bytes.
pub enum VideoOutput {
    /// Buffer the whole container and return it from the export.
    InMemory,
    /// Append container bytes to a writer as the encoder produces them.
    Stream(Box<dyn AsyncWrite + Send + Unpin>),
}

impl std::fmt::Debug for VideoOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory => f.write_str("InMemory"),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Local filesystem directory implementing both [`Downloads`] and [`FrameDirectory`].
#[derive(Clone, Debug)]
pub struct FsDirectory {
    root: PathBuf,
}

impl FsDirectory {
    /// Use `root` as the output directory. It is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> CaptureResult<()> {
        let name = checked_file_name(file_name)?;
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            CaptureError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "failed to create output directory '{}': {e}",
                    self.root.display()
                ),
            ))
        })?;
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            CaptureError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to write '{}': {e}", path.display()),
            ))
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Downloads for FsDirectory {
    async fn save(&mut self, file_name: &str, bytes: &[u8]) -> CaptureResult<()> {
        self.write(file_name, bytes).await
    }
}

#[async_trait::async_trait]
impl FrameDirectory for FsDirectory {
    async fn write_file(&mut self, file_name: &str, bytes: Vec<u8>) -> CaptureResult<()> {
        self.write(file_name, &bytes).await
    }
}

/// In-memory file map, for tests and embedding hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryFiles {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFiles {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// File names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Contents of `file_name`, if written.
    pub fn get(&self, file_name: &str) -> Option<&[u8]> {
        self.files.get(file_name).map(Vec::as_slice)
    }

    /// Number of files written.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Return `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait::async_trait]
impl Downloads for MemoryFiles {
    async fn save(&mut self, file_name: &str, bytes: &[u8]) -> CaptureResult<()> {
        let name = checked_file_name(file_name)?;
        self.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[async_trait::async_trait]
impl FrameDirectory for MemoryFiles {
    async fn write_file(&mut self, file_name: &str, bytes: Vec<u8>) -> CaptureResult<()> {
        let name = checked_file_name(file_name)?;
        self.files.insert(name.to_string(), bytes);
        Ok(())
    }
}

/// Reject names that would escape the target directory.
fn checked_file_name(file_name: &str) -> CaptureResult<&str> {
    let ok = !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\']);
    if ok {
        Ok(file_name)
    } else {
        Err(CaptureError::validation(format!(
            "invalid output file name '{file_name}'"
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/storage.rs"]
mod tests;
