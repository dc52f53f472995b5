use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

use crate::error::StoreError;

/// Object storage for attachment payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;

    /// Time-limited GET link for one object.
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> Result<String, StoreError>;
}

pub struct S3BlobStore {
    client: S3Client,
    bucket_name: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket_name: impl Into<String>) -> Self {
        Self {
            client,
            bucket_name: bucket_name.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::backend("PutObject", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::backend("DeleteObject", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> Result<String, StoreError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StoreError::backend("PresigningConfig", e))?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StoreError::backend("PresignGetObject", DisplayErrorContext(&e)))?;

        Ok(presigned_request.uri().to_string())
    }
}
