// circuitgate-objectstore/src/local.rs
// ============================================================================
// Module: Local Filesystem Object Store
// Description: ObjectStore implementation backed by the local filesystem.
// Purpose: Give tests and single-node deployments a zero-dependency object
//          store that honors the same streaming and size-limit contract as
//          the S3-backed implementation.
// Dependencies: circuitgate-core, tokio
// ============================================================================

//! ## Overview
//! Objects are stored one file per key under a root directory, with the
//! key's `/` separators mapped to nested directories. Writes land in a
//! sibling `.partial` file first and are renamed into place only once the
//! full stream has been read and found within `max_bytes`; a stream that
//! overruns the limit leaves no object visible at the final key.

use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use circuitgate_core::ObjectStore;
use circuitgate_core::ObjectStoreError;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;

use crate::CHUNK_SIZE;

/// Local-filesystem-backed [`ObjectStore`].
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Creates a store rooted at `root`, which must already exist.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_stream(
        &self,
        key: &str,
        content: &mut (dyn tokio::io::AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> Result<u64, ObjectStoreError> {
        let final_path = self.path_for(key);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        }
        let partial_path = partial_path_for(&final_path);

        let mut file = fs::File::create(&partial_path)
            .await
            .map_err(|e| ObjectStoreError::Write(e.to_string()))?;

        let mut total: u64 = 0;
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let read = content
                .read(&mut buf)
                .await
                .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
            if read == 0 {
                break;
            }
            total += read as u64;
            if total > max_bytes {
                drop(file);
                let _ = fs::remove_file(&partial_path).await;
                return Err(ObjectStoreError::Write(format!(
                    "stream exceeded {max_bytes} byte limit"
                )));
            }
            file.write_all(&buf[..read])
                .await
                .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        }
        file.flush().await.map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        drop(file);

        fs::rename(&partial_path, &final_path)
            .await
            .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        Ok(total)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.path_for(key);
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ObjectStoreError::NotFound(key.to_string())
            } else {
                ObjectStoreError::Read(e.to_string())
            }
        })
    }

    async fn readiness(&self) -> Result<(), ObjectStoreError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(ObjectStoreError::Write(format!(
                "object store root {} is not a directory",
                self.root.display()
            )))
        }
    }
}

fn partial_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    final_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalObjectStore::new(dir.path());
        let mut content = Cursor::new(b"hello world".to_vec());
        let written = store
            .put_stream("task-1/report.pdf", &mut content, 1024)
            .await
            .expect("put succeeds");
        assert_eq!(written, 11);
        let loaded = store.get("task-1/report.pdf").await.expect("get succeeds");
        assert_eq!(loaded, b"hello world");
    }

    #[tokio::test]
    async fn stream_exceeding_max_bytes_leaves_no_object_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalObjectStore::new(dir.path());
        let mut content = Cursor::new(vec![0u8; 200]);
        let result = store.put_stream("task-2/report.pdf", &mut content, 100).await;
        assert!(result.is_err());
        let get_result = store.get("task-2/report.pdf").await;
        assert!(matches!(get_result, Err(ObjectStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_key_reports_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalObjectStore::new(dir.path());
        let result = store.get("absent/key.pdf").await;
        assert!(matches!(result, Err(ObjectStoreError::NotFound(_))));
    }
}
