use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;

use crate::adapters::object_store::{ArchiveStore, SiteStore, UploadOptions};
use crate::error::StoreError;

/// An S3 bucket viewed either as the artifact store or as the site bucket.
#[derive(Debug, Clone)]
pub struct S3Bucket {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3Bucket {
    pub fn new(s3_client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
        }
    }
}

#[async_trait]
impl ArchiveStore for S3Bucket {
    async fn fetch_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let output = self
            .s3_client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| match error.into_service_error() {
                GetObjectError::NoSuchKey(_) => {
                    StoreError::NotFound(format!("s3://{}/{key}", self.bucket))
                }
                other => StoreError::Backend(format!("failed to read object from s3: {other}")),
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|error| StoreError::Backend(format!("failed to read object body: {error}")))?;
        Ok(body.into_bytes().to_vec())
    }
}

#[async_trait]
impl SiteStore for S3Bucket {
    async fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        let mut pages = self
            .s3_client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        let mut paths = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|error| {
                StoreError::Backend(format!("failed to list objects in s3: {error}"))
            })?;
            paths.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }
        Ok(paths)
    }

    async fn put_file(
        &self,
        path: &str,
        body: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), StoreError> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(body))
            .content_type(&options.content_type)
            .cache_control(&options.cache_control)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| StoreError::Backend(format!("failed to write object to s3: {error}")))
    }

    async fn delete_file(&self, path: &str) -> Result<(), StoreError> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                StoreError::Backend(format!("failed to delete object from s3: {error}"))
            })
    }
}
