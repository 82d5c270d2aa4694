//! Temporary storage for multipart uploads
//!
//! The uploaded file must be removed on every exit path, so the saved
//! file is owned by a drop guard rather than cleaned up by hand at each
//! return point.

use crate::error::{ReportSrvError, Result};
use axum::extract::Multipart;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A saved upload that deletes itself when dropped.
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Pull the file field out of a multipart request and persist it
    /// under `dir`. Rejects the request before any database work when no
    /// file field is present.
    pub async fn from_multipart(multipart: &mut Multipart, dir: &Path) -> Result<TempUpload> {
        while let Some(field) = multipart.next_field().await? {
            let is_file = field.file_name().is_some() || field.name() == Some("file");
            if !is_file {
                continue;
            }

            let data = field.bytes().await?;
            tokio::fs::create_dir_all(dir).await?;

            let path = dir.join(format!("upload-{}.csv", Uuid::new_v4()));
            tokio::fs::write(&path, &data).await?;
            debug!(path = %path.display(), bytes = data.len(), "upload saved");

            return Ok(TempUpload { path });
        }

        Err(ReportSrvError::MissingFile)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "failed to remove upload: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload-test.csv");
        std::fs::write(&path, b"a,b\n1,2\n").unwrap();

        {
            let _upload = TempUpload { path: path.clone() };
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
