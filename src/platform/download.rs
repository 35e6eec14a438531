//! Object URLs and download triggering.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::dataurl::{self, DataUrlError};

const OBJECT_URL_PREFIX: &str = "blob:mermaid-export/";

/// In-memory bytes with a media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("unknown or revoked object URL: {0}")]
    UnknownObjectUrl(String),
    #[error("unsupported download URL: {0}")]
    UnsupportedUrl(String),
    #[error(transparent)]
    DataUrl(#[from] DataUrlError),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Object URL registry plus the download trigger.
pub trait Downloader: Send + Sync {
    /// Register `blob` and return a temporary URL that refers to it.
    fn create_object_url(&self, blob: Blob) -> String;

    /// Release a URL returned by [`Downloader::create_object_url`].
    fn revoke_object_url(&self, url: &str);

    /// Deliver the resource at `href` (an object URL or a `data:` URL) as a
    /// file named `filename`.
    ///
    /// # Errors
    ///
    /// Returns an error if `href` cannot be resolved or the file cannot be
    /// delivered.
    fn trigger(&self, filename: &str, href: &str) -> Result<(), DownloadError>;
}

/// Saves downloads into a directory.
#[derive(Debug)]
pub struct FileDownloader {
    out_dir: PathBuf,
    next_id: AtomicU64,
    objects: Mutex<HashMap<String, Blob>>,
    saved: Mutex<Vec<PathBuf>>,
}

impl FileDownloader {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            next_id: AtomicU64::new(1),
            objects: Mutex::new(HashMap::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Paths written so far, oldest first.
    pub fn saved(&self) -> Vec<PathBuf> {
        lock(&self.saved).clone()
    }

    /// Number of object URLs that have not been revoked.
    pub fn live_object_urls(&self) -> usize {
        lock(&self.objects).len()
    }

    fn resolve(&self, href: &str) -> Result<Vec<u8>, DownloadError> {
        if href.starts_with(OBJECT_URL_PREFIX) {
            return lock(&self.objects)
                .get(href)
                .map(|blob| blob.bytes.clone())
                .ok_or_else(|| DownloadError::UnknownObjectUrl(href.to_string()));
        }
        if dataurl::is_data_url(href) {
            return Ok(dataurl::decode(href)?.bytes);
        }
        Err(DownloadError::UnsupportedUrl(href.to_string()))
    }
}

impl Downloader for FileDownloader {
    fn create_object_url(&self, blob: Blob) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{OBJECT_URL_PREFIX}{id}");
        tracing::debug!(%url, bytes = blob.bytes.len(), content_type = %blob.content_type, "object URL created");
        lock(&self.objects).insert(url.clone(), blob);
        url
    }

    fn revoke_object_url(&self, url: &str) {
        if lock(&self.objects).remove(url).is_some() {
            tracing::debug!(%url, "object URL revoked");
        }
    }

    fn trigger(&self, filename: &str, href: &str) -> Result<(), DownloadError> {
        let bytes = self.resolve(href)?;
        let path = self.out_dir.join(sanitize_filename(filename));

        fs::create_dir_all(&self.out_dir).map_err(|source| DownloadError::Io {
            path: self.out_dir.clone(),
            source,
        })?;
        fs::write(&path, &bytes).map_err(|source| DownloadError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "download saved");
        lock(&self.saved).push(path);
        Ok(())
    }
}

/// Keep only the final path component so a filename cannot escape the
/// output directory.
fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        "download".to_string()
    } else {
        name.to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_object_url_download_writes_blob() {
        let dir = tempdir().unwrap();
        let downloader = FileDownloader::new(dir.path());
        let url = downloader.create_object_url(Blob::new(b"<svg/>".to_vec(), "image/svg+xml"));
        assert!(url.starts_with("blob:"));

        downloader.trigger("chart.svg", &url).unwrap();
        assert_eq!(fs::read(dir.path().join("chart.svg")).unwrap(), b"<svg/>");
        assert_eq!(downloader.saved(), vec![dir.path().join("chart.svg")]);
    }

    #[test]
    fn test_revoked_object_url_cannot_be_downloaded() {
        let dir = tempdir().unwrap();
        let downloader = FileDownloader::new(dir.path());
        let url = downloader.create_object_url(Blob::new(b"x".to_vec(), "text/plain"));
        assert_eq!(downloader.live_object_urls(), 1);
        downloader.revoke_object_url(&url);
        assert_eq!(downloader.live_object_urls(), 0);

        let err = downloader.trigger("x.txt", &url).unwrap_err();
        assert!(matches!(err, DownloadError::UnknownObjectUrl(_)));
    }

    #[test]
    fn test_data_url_download_decodes_payload() {
        let dir = tempdir().unwrap();
        let downloader = FileDownloader::new(dir.path().join("nested"));
        let href = dataurl::encode("image/png", b"\x89PNG");
        downloader.trigger("chart.png", &href).unwrap();
        assert_eq!(
            fs::read(dir.path().join("nested").join("chart.png")).unwrap(),
            b"\x89PNG"
        );
    }

    #[test]
    fn test_unsupported_href_is_rejected() {
        let dir = tempdir().unwrap();
        let downloader = FileDownloader::new(dir.path());
        let err = downloader
            .trigger("a.png", "https://example.com/a.png")
            .unwrap_err();
        assert!(matches!(err, DownloadError::UnsupportedUrl(_)));
    }

    #[test]
    fn test_sanitize_filename_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir\\chart.svg"), "chart.svg");
        assert_eq!(sanitize_filename(".."), "download");
    }
}
