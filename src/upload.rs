//! Asset upload boundary.
//!
//! The editor never stores file bytes in a document, only the `src` string
//! an uploader hands back. [`AssetUploader`] is that contract; object
//! storage, a CDN, or anything else can sit behind it. [`LocalUploader`]
//! writes into a local directory served under a URL prefix.
//!
//! ## Naming
//!
//! Local uploads are content-addressed: the file name is the first 16 hex
//! digits of the SHA-256 of the bytes plus the original extension. The same
//! image uploaded twice maps to the same URL and is written once.

use crate::config::UploadsConfig;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("file is empty")]
    Empty,
    #[error("file is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
}

/// Image extensions accepted by [`LocalUploader`].
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif", "svg"];

/// A file as received from the client.
#[derive(Debug, Clone)]
pub struct AssetFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl AssetFile {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            file_name,
            bytes: fs::read(path)?,
        })
    }

    /// Lowercased extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Where an uploaded file can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub src: String,
}

pub trait AssetUploader {
    fn upload(&self, file: &AssetFile) -> Result<UploadedAsset, UploadError>;
}

/// Stores uploads in a local directory.
#[derive(Debug, Clone)]
pub struct LocalUploader {
    dir: PathBuf,
    public_prefix: String,
    max_bytes: u64,
}

impl LocalUploader {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn from_config(config: &UploadsConfig) -> Self {
        Self::new(&config.dir, &config.public_prefix, config.max_bytes)
    }
}

impl AssetUploader for LocalUploader {
    fn upload(&self, file: &AssetFile) -> Result<UploadedAsset, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let size = file.bytes.len() as u64;
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        let ext = file
            .extension()
            .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| UploadError::UnsupportedType(file.file_name.clone()))?;

        let digest = format!("{:x}", Sha256::digest(&file.bytes));
        let name = format!("{}.{}", &digest[..16], ext);
        let path = self.dir.join(&name);
        if !path.exists() {
            fs::create_dir_all(&self.dir)?;
            fs::write(&path, &file.bytes)?;
            tracing::debug!(file = %file.file_name, stored = %path.display(), "asset uploaded");
        }
        Ok(UploadedAsset {
            src: format!("{}/{}", self.public_prefix, name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn png(name: &str, bytes: &[u8]) -> AssetFile {
        AssetFile {
            file_name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn upload_writes_content_addressed_file() {
        let tmp = TempDir::new().unwrap();
        let uploader = LocalUploader::new(tmp.path(), "/uploads/", 1024);
        let asset = uploader.upload(&png("Photo.PNG", b"pixels")).unwrap();

        assert!(asset.src.starts_with("/uploads/"));
        assert!(asset.src.ends_with(".png"));
        let name = asset.src.trim_start_matches("/uploads/");
        assert_eq!(fs::read(tmp.path().join(name)).unwrap(), b"pixels");
    }

    #[test]
    fn same_bytes_same_src() {
        let tmp = TempDir::new().unwrap();
        let uploader = LocalUploader::new(tmp.path(), "/u", 1024);
        let a = uploader.upload(&png("a.png", b"same")).unwrap();
        let b = uploader.upload(&png("b.png", b"same")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_empty_large_and_unknown() {
        let tmp = TempDir::new().unwrap();
        let uploader = LocalUploader::new(tmp.path(), "/u", 4);
        assert!(matches!(uploader.upload(&png("a.png", b"")), Err(UploadError::Empty)));
        assert!(matches!(
            uploader.upload(&png("a.png", b"too big")),
            Err(UploadError::TooLarge { size: 7, max: 4 })
        ));
        assert!(matches!(
            uploader.upload(&png("notes.txt", b"hi")),
            Err(UploadError::UnsupportedType(_))
        ));
        assert!(matches!(
            uploader.upload(&png("noext", b"hi")),
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn from_path_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hero.jpg");
        fs::write(&path, b"jpeg").unwrap();
        let file = AssetFile::from_path(&path).unwrap();
        assert_eq!(file.file_name, "hero.jpg");
        assert_eq!(file.extension().as_deref(), Some("jpg"));
        assert_eq!(file.bytes, b"jpeg");
    }
}
