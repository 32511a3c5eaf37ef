//! [`DiskMedia`]: content-addressed picture storage on the local filesystem.
//!
//! Files land at `<root>/<owner>/<sha256>.<ext>` and are served from
//! `<base_url>/<owner>/<sha256>.<ext>`. Storing the same bytes twice for the
//! same owner yields the same URL.

use std::path::PathBuf;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use skilltrade_core::{
  StorageError,
  media::{MediaMetadata, extension_for},
  service::MediaStorage,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DiskMedia {
  root:     PathBuf,
  base_url: String,
}

impl DiskMedia {
  pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
    Self {
      root:     root.into(),
      base_url: base_url.into().trim_end_matches('/').to_owned(),
    }
  }

  /// Relative key of `bytes` for `metadata`: `<owner>/<sha256>.<ext>`.
  fn key(bytes: &[u8], metadata: &MediaMetadata) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!(
      "{}/{digest}.{}",
      metadata.owner,
      extension_for(&metadata.content_type)
    )
  }
}

impl MediaStorage for DiskMedia {
  async fn store(&self, bytes: Bytes, metadata: MediaMetadata) -> Result<String, StorageError> {
    if !metadata.content_type.starts_with("image/") {
      return Err(StorageError::UnsupportedType(metadata.content_type));
    }
    if bytes.is_empty() {
      return Err(StorageError::Empty);
    }

    let key = Self::key(&bytes, &metadata);
    let path = self.root.join(&key);
    if let Some(dir) = path.parent() {
      tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&path, &bytes).await?;

    debug!(path = %path.display(), size = bytes.len(), "stored picture");
    Ok(format!("{}/{key}", self.base_url))
  }
}

#[cfg(test)]
mod tests {
  use skilltrade_core::media::ImageFile;
  use uuid::Uuid;

  use super::*;

  fn media(dir: &tempfile::TempDir) -> DiskMedia {
    DiskMedia::new(dir.path(), "http://localhost:8080/media/")
  }

  #[tokio::test]
  async fn stores_under_owner_by_content_hash() {
    let dir = tempfile::tempdir().unwrap();
    let media = media(&dir);
    let owner = Uuid::new_v4();
    let file = ImageFile::from_bytes("me.png", vec![1u8, 2, 3]);

    let url = media
      .store(file.bytes.clone(), file.metadata(owner))
      .await
      .unwrap();

    let digest = hex::encode(Sha256::digest([1u8, 2, 3]));
    assert_eq!(url, format!("http://localhost:8080/media/{owner}/{digest}.png"));
    let on_disk = std::fs::read(dir.path().join(owner.to_string()).join(format!("{digest}.png")))
      .unwrap();
    assert_eq!(on_disk, [1, 2, 3]);
  }

  #[tokio::test]
  async fn same_bytes_same_url() {
    let dir = tempfile::tempdir().unwrap();
    let media = media(&dir);
    let owner = Uuid::new_v4();
    let a = ImageFile::from_bytes("a.jpg", vec![9u8; 16]);
    let b = ImageFile::from_bytes("b.jpeg", vec![9u8; 16]);

    let first = media.store(a.bytes.clone(), a.metadata(owner)).await.unwrap();
    let second = media.store(b.bytes.clone(), b.metadata(owner)).await.unwrap();
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn rejects_non_images_and_empty_files() {
    let dir = tempfile::tempdir().unwrap();
    let media = media(&dir);
    let owner = Uuid::new_v4();

    let pdf = ImageFile::from_bytes("cv.pdf", vec![1u8]);
    let err = media.store(pdf.bytes.clone(), pdf.metadata(owner)).await.unwrap_err();
    assert!(matches!(err, StorageError::UnsupportedType(_)));

    let empty = ImageFile::from_bytes("me.png", Vec::<u8>::new());
    let err = media.store(empty.bytes.clone(), empty.metadata(owner)).await.unwrap_err();
    assert!(matches!(err, StorageError::Empty));
  }
}
