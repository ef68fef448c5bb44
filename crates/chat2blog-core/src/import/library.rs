//! Local media library.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::Result;

/// Fallback stem for names that sanitize to nothing.
const DEFAULT_STEM: &str = "media";

/// Directory holding imported media files.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
    base_url: Option<String>,
}

impl MediaLibrary {
    /// Opens a library rooted at `root`, creating the directory if needed.
    ///
    /// With a `base_url`, [`MediaLibrary::url_for`] returns URLs below it
    /// instead of filesystem paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(root: impl AsRef<Path>, base_url: Option<String>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    /// Library directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under a unique, sanitized version of `file_name`.
    ///
    /// Existing files are never overwritten: `photo.jpg` becomes
    /// `photo-1.jpg`, `photo-2.jpg`, ... when taken. Returns the name used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let sanitized = sanitize_file_name(file_name);
        let (stem, ext) = split_name(&sanitized);

        let mut attempt = 0_u32;
        loop {
            let candidate = match (attempt, ext) {
                (0, Some(ext)) => format!("{stem}.{ext}"),
                (0, None) => stem.to_string(),
                (n, Some(ext)) => format!("{stem}-{n}.{ext}"),
                (n, None) => format!("{stem}-{n}"),
            };

            let path = self.root.join(&candidate);
            let opened = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match opened {
                Ok(file) => {
                    write_or_discard(&path, file, bytes).await?;
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Removes a stored file. Missing files are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub async fn remove(&self, file_name: &str) -> Result<()> {
        match fs::remove_file(self.path_for(file_name)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Filesystem path of a stored file.
    #[must_use]
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Public location of a stored file.
    #[must_use]
    pub fn url_for(&self, file_name: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}/{file_name}"),
            None => self.path_for(file_name).display().to_string(),
        }
    }
}

/// Reduces a name to a safe single path component.
///
/// Directory parts are dropped, runs of characters other than ASCII
/// letters, digits, `.`, `_` and `-` become a single `-`, and leading or
/// trailing separators are trimmed.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let mut out = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed = out.trim_matches(|c| matches!(c, '.' | '-' | '_'));
    if trimmed.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes `bytes` to a freshly created `file`, removing it if the write fails.
async fn write_or_discard(path: &Path, mut file: fs::File, bytes: &[u8]) -> Result<()> {
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "Failed to remove partial media file");
        }
        return Err(e.into());
    }
    Ok(())
}

fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("IMG_0001.JPG"), "IMG_0001.JPG");
        assert_eq!(sanitize_file_name("Summer trip: day 1!.jpg"), "Summer-trip-day-1-.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\a b.png"), "a-b.png");
        assert_eq!(sanitize_file_name("..."), "media");
        assert_eq!(sanitize_file_name(""), "media");
    }

    #[tokio::test]
    async fn test_store_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::open(dir.path(), None).await.unwrap();

        let first = library.store("photo.jpg", b"one").await.unwrap();
        let second = library.store("photo.jpg", b"two").await.unwrap();
        let third = library.store("photo.jpg", b"three").await.unwrap();

        assert_eq!(first, "photo.jpg");
        assert_eq!(second, "photo-1.jpg");
        assert_eq!(third, "photo-2.jpg");
        assert_eq!(std::fs::read(library.path_for(&first)).unwrap(), b"one");
        assert_eq!(std::fs::read(library.path_for(&second)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_remove_and_urls() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::open(dir.path().join("uploads"), Some("https://blog.example/media/".into()))
            .await
            .unwrap();

        let name = library.store("clip", b"x").await.unwrap();
        assert_eq!(name, "clip");
        assert_eq!(library.url_for(&name), "https://blog.example/media/clip");

        library.remove(&name).await.unwrap();
        assert!(!library.path_for(&name).exists());
        library.remove(&name).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.jpg");
        std::fs::write(&path, b"").unwrap();

        // Read-only handle, so the write fails.
        let file = fs::File::open(&path).await.unwrap();
        let result = write_or_discard(&path, file, b"jpeg-bytes").await;

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_store_sanitizes_name() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::open(dir.path(), None).await.unwrap();

        let name = library.store("../Road trip.png", b"png").await.unwrap();
        assert_eq!(name, "Road-trip.png");
        assert_eq!(std::fs::read(library.path_for(&name)).unwrap(), b"png");
    }
}
