use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::extraction::DocumentKind;

/// An uploaded document written to a request-scoped temporary file.
///
/// The file is deleted when the value is released or dropped, whichever
/// comes first, so every exit path of a request frees the disk space.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    kind: DocumentKind,
}

impl StagedUpload {
    /// Writes `bytes` to a fresh file in `dir`, named `upload-<random>.<ext>`.
    pub async fn stage(dir: &Path, kind: DocumentKind, bytes: Bytes) -> std::io::Result<Self> {
        let dir = dir.to_path_buf();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("upload-")
                .suffix(suffix_for(kind))
                .tempfile_in(dir)?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(std::io::Error::other)??;

        Ok(Self { file, kind })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Deletes the staged file now. Failure is logged; there is nothing a
    /// caller could do about it.
    pub fn release(self) {
        let path: PathBuf = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!("Failed to remove staged upload {}: {e}", path.display());
        }
    }
}

fn suffix_for(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Pdf => ".pdf",
        DocumentKind::Image => ".img",
    }
}
