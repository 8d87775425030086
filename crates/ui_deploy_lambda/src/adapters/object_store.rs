use async_trait::async_trait;

use crate::error::StoreError;

pub const NO_STORE_CACHE_CONTROL: &str = "no-store";

/// Per-object metadata applied on every site upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    pub cache_control: String,
}

impl UploadOptions {
    /// Content type is inferred from the path's extension; every object is
    /// marked `no-store` because deploys rewrite files under stable names.
    pub fn for_path(path: &str) -> Self {
        Self {
            content_type: mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            cache_control: NO_STORE_CACHE_CONTROL.to_string(),
        }
    }
}

/// Read side of the build artifact bucket.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn fetch_object(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// The bucket serving the published site. Flat namespace of paths.
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn list_paths(&self) -> Result<Vec<String>, StoreError>;

    async fn put_file(
        &self,
        path: &str,
        body: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), StoreError>;

    async fn delete_file(&self, path: &str) -> Result<(), StoreError>;
}
