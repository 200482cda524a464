// circuitgate-objectstore/src/s3.rs
// ============================================================================
// Module: S3 Object Store
// Description: ObjectStore implementation backed by Amazon S3.
// Purpose: Production streamed upload/download of uploaded artifacts (C1),
//          keyed by `{task_id}/{filename}` (§6).
// Dependencies: circuitgate-core, aws-sdk-s3, aws-config, tokio
// ============================================================================

//! ## Overview
//! Uploads never buffer the full payload: the caller's stream is read in
//! [`crate::CHUNK_SIZE`]-sized reads and accumulated only up to one
//! multipart-upload part (`PART_SIZE`) before that part ships to S3. A
//! stream whose actual length exceeds `max_bytes` aborts the in-flight
//! multipart upload rather than leaving a partial object visible.

use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::CompletedMultipartUpload;
use aws_sdk_s3::types::CompletedPart;
use async_trait::async_trait;
use circuitgate_core::ObjectStore;
use circuitgate_core::ObjectStoreError;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;

use crate::CHUNK_SIZE;

/// Minimum size of a non-final multipart-upload part; AWS rejects smaller
/// intermediate parts.
const PART_SIZE: usize = 8 * 1024 * 1024;

/// S3-backed [`ObjectStore`].
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Creates a store against `bucket` using the given client.
    #[must_use]
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Creates a store using the default AWS configuration resolved from
    /// the process environment.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), bucket)
    }

    async fn put_small(&self, key: &str, bytes: Vec<u8>) -> Result<u64, ObjectStoreError> {
        let len = bytes.len() as u64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        Ok(len)
    }

    async fn put_multipart(
        &self,
        key: &str,
        first_part: Vec<u8>,
        content: &mut (dyn AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> Result<u64, ObjectStoreError> {
        let create = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        let upload_id = create
            .upload_id()
            .ok_or_else(|| ObjectStoreError::Write("no multipart upload id returned".to_string()))?
            .to_string();

        match self
            .upload_parts(key, &upload_id, first_part, content, max_bytes)
            .await
        {
            Ok((total, parts)) => {
                let assembled = CompletedMultipartUpload::builder().set_parts(Some(parts)).build();
                self.client
                    .complete_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(assembled)
                    .send()
                    .await
                    .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
                Ok(total)
            }
            Err(e) => {
                let _ = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await;
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        first_part: Vec<u8>,
        content: &mut (dyn AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> Result<(u64, Vec<CompletedPart>), ObjectStoreError> {
        let mut total: u64 = first_part.len() as u64;
        let mut part_number: i32 = 1;
        let mut completed = Vec::new();
        let mut pending = first_part;

        loop {
            let part_bytes = std::mem::take(&mut pending);
            completed.push(
                self.upload_one_part(key, upload_id, part_number, part_bytes)
                    .await?,
            );
            part_number += 1;

            let mut buf = vec![0u8; CHUNK_SIZE];
            let mut filled = 0usize;
            loop {
                let read = content
                    .read(&mut buf[filled..])
                    .await
                    .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
                if read == 0 {
                    break;
                }
                filled += read;
                total += read as u64;
                if total > max_bytes {
                    return Err(ObjectStoreError::Write(format!(
                        "stream exceeded {max_bytes} byte limit"
                    )));
                }
                if filled >= PART_SIZE {
                    break;
                }
                buf.resize(filled + CHUNK_SIZE, 0);
            }
            if filled == 0 {
                break;
            }
            buf.truncate(filled);
            pending = buf;
        }

        Ok((total, completed))
    }

    async fn upload_one_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        bytes: Vec<u8>,
    ) -> Result<CompletedPart, ObjectStoreError> {
        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        let e_tag = output
            .e_tag()
            .ok_or_else(|| ObjectStoreError::Write(format!("no etag for part {part_number}")))?;
        Ok(CompletedPart::builder().part_number(part_number).e_tag(e_tag).build())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_stream(
        &self,
        key: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
        max_bytes: u64,
    ) -> Result<u64, ObjectStoreError> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut filled = 0usize;
        loop {
            let read = content
                .read(&mut buf[filled..])
                .await
                .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
            if read == 0 {
                break;
            }
            filled += read;
            if filled as u64 > max_bytes {
                return Err(ObjectStoreError::Write(format!(
                    "stream exceeded {max_bytes} byte limit"
                )));
            }
            if filled >= PART_SIZE {
                break;
            }
            buf.resize(filled + CHUNK_SIZE, 0);
        }
        buf.truncate(filled);

        if (filled as u64) < PART_SIZE as u64 {
            // Confirm the stream is actually exhausted before falling back
            // to a single-shot put: a stream that fills exactly one part
            // boundary still needs to probe for more data.
            let mut probe = [0u8; 1];
            let extra = content
                .read(&mut probe)
                .await
                .map_err(|e| ObjectStoreError::Write(e.to_string()))?;
            if extra == 0 {
                return self.put_small(key, buf).await;
            }
            let mut rest = buf;
            rest.push(probe[0]);
            let total = rest.len() as u64;
            if total > max_bytes {
                return Err(ObjectStoreError::Write(format!(
                    "stream exceeded {max_bytes} byte limit"
                )));
            }
            return self.put_multipart(key, rest, content, max_bytes).await;
        }
        self.put_multipart(key, buf, content, max_bytes).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    ObjectStoreError::NotFound(key.to_string())
                } else {
                    ObjectStoreError::Read(e.to_string())
                }
            })?;
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::Read(e.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn readiness(&self) -> Result<(), ObjectStoreError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| ObjectStoreError::Write(e.to_string()))
    }
}
