use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use figdoc_core::report::is_safe_filename;

/// Directory of generated PDFs waiting to be downloaded once.
///
/// With a retention period set, PDFs older than it are swept on every save.
#[derive(Debug, Clone)]
pub struct PdfStore {
    dir: PathBuf,
    retention: Option<Duration>,
}

impl PdfStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            retention: None,
        })
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Remove stored PDFs older than the retention period. Returns how many went.
    pub async fn sweep(&self) -> std::io::Result<usize> {
        let Some(retention) = self.retention else {
            return Ok(0);
        };
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || sweep_expired(&dir, retention))
            .await
            .map_err(std::io::Error::other)?
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under `filename`, refusing to replace an existing file.
    pub async fn save(&self, filename: &str, bytes: Vec<u8>) -> std::io::Result<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("unsafe filename: {filename}"),
            ));
        }

        let path = self.dir.join(filename);
        let target = path.clone();
        let sweep = self.retention.map(|r| (self.dir.clone(), r));
        tokio::task::spawn_blocking(move || {
            if let Some((dir, retention)) = sweep {
                if let Err(e) = sweep_expired(&dir, retention) {
                    log::warn!("Could not sweep {}: {e}", dir.display());
                }
            }

            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)?;
            file.write_all(&bytes)?;
            file.sync_all()
        })
        .await
        .map_err(std::io::Error::other)??;

        Ok(path)
    }

    /// Read and delete a stored PDF. `None` when it is unknown or already taken.
    pub async fn take(&self, filename: &str) -> std::io::Result<Option<Vec<u8>>> {
        if !is_safe_filename(filename) {
            return Ok(None);
        }

        let path = self.dir.join(filename);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(Some(bytes)),
            // Another download won the race.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn sweep_expired(dir: &Path, retention: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_str().is_some_and(is_safe_filename) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => continue,
        };
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= retention {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    if removed > 0 {
        log::debug!("Swept {removed} expired PDFs from {}", dir.display());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age(path: &Path, by: Duration) {
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - by)
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path())
            .unwrap()
            .with_retention(Duration::from_secs(600));

        for name in ["old_1.pdf", "fresh_1.pdf", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        age(&dir.path().join("old_1.pdf"), Duration::from_secs(3600));
        age(&dir.path().join("notes.txt"), Duration::from_secs(3600));

        assert_eq!(store.sweep().await.unwrap(), 1);
        assert!(!dir.path().join("old_1.pdf").exists());
        assert!(dir.path().join("fresh_1.pdf").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_save_sweeps_abandoned_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path())
            .unwrap()
            .with_retention(Duration::from_secs(600));
        std::fs::write(dir.path().join("abandoned_1.pdf"), b"x").unwrap();
        age(&dir.path().join("abandoned_1.pdf"), Duration::from_secs(3600));

        store.save("new_1.pdf", b"%PDF".to_vec()).await.unwrap();

        assert!(!dir.path().join("abandoned_1.pdf").exists());
        assert!(dir.path().join("new_1.pdf").exists());
    }

    #[tokio::test]
    async fn test_sweep_without_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("old_1.pdf"), b"x").unwrap();
        age(&dir.path().join("old_1.pdf"), Duration::from_secs(3600));

        assert_eq!(store.sweep().await.unwrap(), 0);
        assert!(dir.path().join("old_1.pdf").exists());
    }

    #[tokio::test]
    async fn test_save_then_take_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path()).unwrap();

        store.save("a_1.pdf", b"%PDF-1.5".to_vec()).await.unwrap();

        assert_eq!(store.take("a_1.pdf").await.unwrap(), Some(b"%PDF-1.5".to_vec()));
        assert_eq!(store.take("a_1.pdf").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path()).unwrap();

        store.save("a_1.pdf", b"first".to_vec()).await.unwrap();
        let err = store.save("a_1.pdf", b"second".to_vec()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(dir.path().join("a_1.pdf")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_unsafe_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("secret.pdf"), b"secret").unwrap();

        assert_eq!(store.take("../secret.pdf").await.unwrap(), None);
        assert!(store.save("../escape.pdf", Vec::new()).await.is_err());
        assert!(dir.path().join("secret.pdf").exists());
    }

    #[test]
    fn test_new_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path().join("nested/output")).unwrap();
        assert!(store.dir().is_dir());
    }
}
