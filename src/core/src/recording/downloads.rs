use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use uuid::Uuid;

use crate::error_handling::types::RecordingError;

use super::types::{Artifact, DownloadTarget, ObjectUrl};

/// Download target that writes artifacts into a directory.
///
/// Object URLs are `blob:<uuid>` keys of an in-memory table; revoking one
/// frees the artifact bytes. A download never overwrites an existing file:
/// `name.webm` becomes `name (1).webm`, `name (2).webm`, ...
pub struct FileDownloader {
    download_dir: PathBuf,
    objects: HashMap<ObjectUrl, Artifact>,
    delivered: Vec<PathBuf>,
}

impl FileDownloader {
    pub fn new<P: AsRef<Path>>(download_dir: P) -> Result<Self, RecordingError> {
        let download_dir = download_dir.as_ref().to_path_buf();
        fs::create_dir_all(&download_dir).map_err(|e| {
            error!(
                "Failed to create download dir {}: {}",
                download_dir.display(),
                e
            );
            RecordingError::DownloadFailed(e)
        })?;
        info!("FileDownloader writing to {}", download_dir.display());
        Ok(Self {
            download_dir,
            objects: HashMap::new(),
            delivered: Vec::new(),
        })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Object URLs not yet revoked.
    pub fn live_urls(&self) -> usize {
        self.objects.len()
    }

    pub fn delivered(&self) -> &[PathBuf] {
        &self.delivered
    }

    fn unique_path(&self, file_name: &str) -> PathBuf {
        let candidate = self.download_dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
        let name = Path::new(file_name);
        let stem = name
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        let extension = name.extension().and_then(|s| s.to_str());
        (1..)
            .map(|n| match extension {
                Some(ext) => self.download_dir.join(format!("{} ({}).{}", stem, n, ext)),
                None => self.download_dir.join(format!("{} ({})", stem, n)),
            })
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}

impl DownloadTarget for FileDownloader {
    fn create_object_url(&mut self, artifact: Artifact) -> Result<ObjectUrl, RecordingError> {
        let url = ObjectUrl(format!("blob:{}", Uuid::new_v4()));
        debug!(
            "Created {} for {} ({} bytes, {})",
            url,
            artifact.file_name,
            artifact.bytes.len(),
            artifact.mime_type
        );
        self.objects.insert(url.clone(), artifact);
        Ok(url)
    }

    fn trigger_download(
        &mut self,
        url: &ObjectUrl,
        file_name: &str,
    ) -> Result<Option<PathBuf>, RecordingError> {
        let artifact = self
            .objects
            .get(url)
            .ok_or_else(|| RecordingError::UnknownObjectUrl(url.to_string()))?;
        let path = self.unique_path(file_name);
        fs::write(&path, &artifact.bytes).map_err(|e| {
            error!("Failed to write download {}: {}", path.display(), e);
            RecordingError::DownloadFailed(e)
        })?;
        info!("Saved {} bytes to {}", artifact.bytes.len(), path.display());
        self.delivered.push(path.clone());
        Ok(Some(path))
    }

    fn revoke_object_url(&mut self, url: &ObjectUrl) -> bool {
        self.objects.remove(url).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::types::RecordedChunks;

    fn artifact(bytes: &[u8]) -> Artifact {
        RecordedChunks::new()
            .with_fragment(bytes.to_vec())
            .assemble("screen-recording.webm", "video/webm")
            .unwrap()
    }

    #[test]
    fn download_writes_bytes_and_revoke_frees_the_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = FileDownloader::new(dir.path()).unwrap();

        let url = downloader.create_object_url(artifact(b"webm-bytes")).unwrap();
        assert!(url.0.starts_with("blob:"));
        let path = downloader
            .trigger_download(&url, "screen-recording.webm")
            .unwrap()
            .unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"webm-bytes".to_vec());

        assert!(downloader.revoke_object_url(&url));
        assert!(!downloader.revoke_object_url(&url));
        assert_eq!(downloader.live_urls(), 0);
    }

    #[test]
    fn repeated_downloads_get_numbered_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = FileDownloader::new(dir.path()).unwrap();

        for payload in [b"one".as_slice(), b"two".as_slice(), b"three".as_slice()] {
            let url = downloader.create_object_url(artifact(payload)).unwrap();
            downloader
                .trigger_download(&url, "screen-recording.webm")
                .unwrap();
            downloader.revoke_object_url(&url);
        }

        let names: Vec<String> = downloader
            .delivered()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "screen-recording.webm",
                "screen-recording (1).webm",
                "screen-recording (2).webm"
            ]
        );
    }

    #[test]
    fn revoked_url_cannot_be_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = FileDownloader::new(dir.path()).unwrap();
        let url = downloader.create_object_url(artifact(b"x")).unwrap();
        downloader.revoke_object_url(&url);

        let err = downloader.trigger_download(&url, "a.webm").unwrap_err();
        assert!(matches!(err, RecordingError::UnknownObjectUrl(_)));
    }
}
