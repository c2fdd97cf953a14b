//! services/api/src/adapters/media.rs
//!
//! This module contains the blob store adapter, the concrete implementation of
//! the `MediaStore` port against any S3-compatible object store.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use coursehub_core::domain::MediaAsset;
use coursehub_core::ports::{MediaKind, MediaStore, MediaUpload, PortError, PortResult};
use uuid::Uuid;

/// All uploads land under one folder so stray objects are easy to audit.
const UPLOAD_PREFIX: &str = "course_uploads";

/// A blob store adapter that implements the `MediaStore` port.
#[derive(Clone)]
pub struct S3MediaStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3MediaStore {
    /// Creates a new `S3MediaStore`.
    pub fn new(client: S3Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
        }
    }
}

/// Picks a fresh object key, keeping the original file extension so the
/// store serves the blob with a sensible content type.
fn object_key(file_name: &str) -> String {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("bin");
    format!("{}/{}.{}", UPLOAD_PREFIX, Uuid::new_v4(), extension)
}

// Helper for working with public S3-compatible URLs.
// Allows simple templating: https://host/{bucket}/{key} or https://bucket.host/{key}
fn build_public_url(base: &str, bucket: &str, key: &str) -> String {
    let trimmed = base.trim_end_matches('/');

    if trimmed.contains("{bucket}") || trimmed.contains("{key}") {
        return trimmed.replace("{bucket}", bucket).replace("{key}", key);
    }

    // If the base already includes the bucket, append only the key.
    if trimmed.contains(bucket) {
        format!("{}/{}", trimmed, key)
    } else {
        format!("{}/{}/{}", trimmed, bucket, key)
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(&self, upload: MediaUpload) -> PortResult<MediaAsset> {
        let key = object_key(&upload.file_name);
        let stream = ByteStream::from(upload.data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&upload.content_type)
            .body(stream)
            .send()
            .await
            .map_err(|e| PortError::Upstream(format!("blob upload failed: {}", e)))?;

        Ok(MediaAsset {
            url: build_public_url(&self.public_base_url, &self.bucket, &key),
            key,
        })
    }

    async fn delete(&self, key: &str, kind: MediaKind) -> PortResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                PortError::Upstream(format!("blob delete failed ({:?} {}): {}", kind, key, e))
            })?;
        Ok(())
    }
}
