//! Media types for profile pictures.
//!
//! No binary data lives in a profile; the picture is stored by the media
//! service and the profile only keeps the URL it hands back.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A locally selected image waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct ImageFile {
  pub file_name:    String,
  pub content_type: String,
  pub bytes:        Bytes,
}

impl ImageFile {
  /// Wrap file contents, guessing the media type from the file extension.
  pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
    let file_name = file_name.into();
    let content_type = guess_content_type(&file_name).to_owned();
    Self { file_name, content_type, bytes: bytes.into() }
  }

  /// Only `image/*` uploads are accepted for profile pictures.
  pub fn is_image(&self) -> bool { self.content_type.starts_with("image/") }

  pub fn len(&self) -> usize { self.bytes.len() }

  pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

  /// Metadata sent alongside the bytes to the media service.
  pub fn metadata(&self, owner: Uuid) -> MediaMetadata {
    MediaMetadata {
      owner,
      file_name: self.file_name.clone(),
      content_type: self.content_type.clone(),
      size: self.bytes.len(),
    }
  }
}

/// Describes an upload to the media service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
  /// The identity the picture belongs to.
  pub owner:        Uuid,
  pub file_name:    String,
  pub content_type: String,
  pub size:         usize,
}

/// Result of a successful picture upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedPicture {
  pub url: String,
}

/// Map a file extension to a media type. Unknown extensions become
/// `application/octet-stream`, which the picture upload rejects.
pub fn guess_content_type(file_name: &str) -> &'static str {
  let ext = file_name
    .rsplit_once('.')
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "svg" => "image/svg+xml",
    "avif" => "image/avif",
    _ => "application/octet-stream",
  }
}

/// The canonical file extension for an image media type.
pub fn extension_for(content_type: &str) -> &'static str {
  match content_type {
    "image/png" => "png",
    "image/jpeg" => "jpg",
    "image/gif" => "gif",
    "image/webp" => "webp",
    "image/svg+xml" => "svg",
    "image/avif" => "avif",
    _ => "bin",
  }
}
