//! Image content stores.
//!
//! The upload pipeline ends at [`ImageStore::save`]: a fully validated
//! buffer goes in, an opaque image id comes out. [`DiskImageStore`] writes
//! files under a configured directory; [`MemoryImageStore`] keeps the bytes
//! in memory and is used by tests and demos.

use async_trait::async_trait;
use bytes::Bytes;
use catalog_tonic_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// External content-store boundary for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists one complete image and returns its generated id.
    ///
    /// `image_type` is the file extension declared by the uploader,
    /// e.g. `".jpg"`.
    async fn save(&self, laptop_id: &str, image_type: &str, data: Bytes) -> Result<String>;
}

/// Metadata recorded for each image written by [`DiskImageStore`].
#[derive(Clone, Debug)]
pub struct ImageInfo {
    pub laptop_id: String,
    pub image_type: String,
    pub path: PathBuf,
}

/// Content store writing uuid-named image files under one directory.
pub struct DiskImageStore {
    image_dir: PathBuf,
    images: RwLock<HashMap<String, ImageInfo>>,
}

impl DiskImageStore {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            images: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the recorded metadata for an image id.
    pub fn info(&self, image_id: &str) -> Option<ImageInfo> {
        self.images.read().get(image_id).cloned()
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(&self, laptop_id: &str, image_type: &str, data: Bytes) -> Result<String> {
        let image_id = Uuid::new_v4().to_string();

        tokio::fs::create_dir_all(&self.image_dir)
            .await
            .map_err(|e| Error::Internal {
                context: format!("cannot create image directory: {e}"),
            })?;

        let path = self.image_dir.join(format!("{image_id}{image_type}"));
        tokio::fs::write(&path, &data).await.map_err(|e| Error::Internal {
            context: format!("cannot write image file: {e}"),
        })?;

        self.images.write().insert(
            image_id.clone(),
            ImageInfo {
                laptop_id: laptop_id.to_owned(),
                image_type: image_type.to_owned(),
                path,
            },
        );

        Ok(image_id)
    }
}

/// Image record held by [`MemoryImageStore`].
#[derive(Clone, Debug)]
pub struct StoredImage {
    pub laptop_id: String,
    pub image_type: String,
    pub data: Bytes,
}

/// Content store keeping image bytes in memory.
#[derive(Default)]
pub struct MemoryImageStore {
    images: RwLock<HashMap<String, StoredImage>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, image_id: &str) -> Option<StoredImage> {
        self.images.read().get(image_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, laptop_id: &str, image_type: &str, data: Bytes) -> Result<String> {
        let image_id = Uuid::new_v4().to_string();
        self.images.write().insert(
            image_id.clone(),
            StoredImage {
                laptop_id: laptop_id.to_owned(),
                image_type: image_type.to_owned(),
                data,
            },
        );
        Ok(image_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disk_store_writes_the_file_and_records_info() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path());

        let data = Bytes::from_static(b"not really a jpeg");
        let image_id = store.save("laptop-1", ".jpg", data.clone()).await.unwrap();

        let info = store.info(&image_id).unwrap();
        assert_eq!(info.laptop_id, "laptop-1");
        assert_eq!(info.image_type, ".jpg");
        assert_eq!(std::fs::read(&info.path).unwrap(), data.as_ref());
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryImageStore::new();
        assert!(store.is_empty());

        let data = Bytes::from(vec![7u8; 128]);
        let image_id = store.save("laptop-1", ".png", data.clone()).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get(&image_id).unwrap();
        assert_eq!(stored.laptop_id, "laptop-1");
        assert_eq!(stored.data, data);
    }
}
