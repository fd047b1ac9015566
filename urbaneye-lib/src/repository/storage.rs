use std::{
    fs::{self, create_dir_all},
    io,
    path::{Component, Path, PathBuf},
};

use tracing::debug;
use walkdir::WalkDir;

use crate::{Error, Result, backend::BlobStorage};

/// Blob storage with one directory per bucket.
///
/// Objects are addressed by a bucket name and a relative path inside it, and every stored object
/// has a public URL made of the configured base, the bucket and the path.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    public_url_base: String,
}

impl Storage {
    pub fn new(root: PathBuf, public_url_base: String) -> Self {
        Self {
            root,
            public_url_base: public_url_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn upload(&self, bucket: &str, path: &str, bytes: &[u8], upsert: bool) -> Result<()> {
        let dest = self.object_path(bucket, path)?;

        if dest.exists() && !upsert {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{bucket}/{path} already exists"),
            )
            .into());
        }

        if let Some(parent) = dest.parent() {
            create_dir_all(parent)?;
        }
        fs::write(&dest, bytes)?;

        debug!("Stored {} bytes at {bucket}/{path}", bytes.len());

        Ok(())
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{bucket}/{path}", self.public_url_base)
    }

    /// Map a public URL handed out by this storage back to the file holding the object.
    pub fn local_path(&self, url: &str) -> Option<PathBuf> {
        let relative = url
            .strip_prefix(&self.public_url_base)?
            .trim_start_matches('/');
        if !is_plain(relative) {
            return None;
        }

        let path = self.root.join(relative);
        path.is_file().then_some(path)
    }

    /// List the paths of every object stored in `bucket`, sorted.
    pub fn objects(&self, bucket: &str) -> Result<Vec<String>> {
        let dir = self.root.join(bucket);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file()
                && let Ok(relative) = entry.path().strip_prefix(&dir)
            {
                objects.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
        objects.sort();

        Ok(objects)
    }

    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        if !is_plain(bucket) || !is_plain(path) {
            return Err(Error::InvalidObjectPath(format!("{bucket}/{path}")));
        }

        Ok(self.root.join(bucket).join(path))
    }
}

/// A non-empty relative path that stays below the directory it is joined onto.
fn is_plain(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

impl BlobStorage for Storage {
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], upsert: bool) -> Result<()> {
        Storage::upload(self, bucket, path, bytes, upsert)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        Storage::public_url(self, bucket, path)
    }
}

#[cfg(test)]
mod test {
    use tempfile::tempdir;

    use super::Storage;
    use crate::Error;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf(), "https://cdn.test/".into());
        (dir, storage)
    }

    #[test]
    fn test_upload_and_list() {
        let (_dir, storage) = storage();

        storage
            .upload("profile-avatars", "avatars/u1-1.png", b"png", true)
            .unwrap();

        assert_eq!(
            storage.objects("profile-avatars").unwrap(),
            vec!["avatars/u1-1.png".to_string()]
        );
        assert!(storage.objects("profile-banners").unwrap().is_empty());
    }

    #[test]
    fn test_upsert_overwrites() {
        let (dir, storage) = storage();

        storage.upload("b", "a/x.png", b"one", true).unwrap();
        storage.upload("b", "a/x.png", b"two", true).unwrap();

        let contents = std::fs::read(dir.path().join("b/a/x.png")).unwrap();
        assert_eq!(contents, b"two");
    }

    #[test]
    fn test_no_upsert_conflict() {
        let (_dir, storage) = storage();

        storage.upload("b", "x.png", b"one", false).unwrap();

        assert!(matches!(
            storage.upload("b", "x.png", b"two", false),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let (_dir, storage) = storage();

        assert!(matches!(
            storage.upload("b", "../x.png", b"", true),
            Err(Error::InvalidObjectPath(_))
        ));
        assert!(matches!(
            storage.upload("b", "/etc/x.png", b"", true),
            Err(Error::InvalidObjectPath(_))
        ));
    }

    #[test]
    fn test_public_url_round_trip() {
        let (_dir, storage) = storage();
        storage.upload("b", "a/x.png", b"one", true).unwrap();

        let url = storage.public_url("b", "a/x.png");

        assert_eq!(url, "https://cdn.test/b/a/x.png");
        assert!(storage.local_path(&url).unwrap().ends_with("b/a/x.png"));
        assert!(storage.local_path("https://elsewhere/b/a/x.png").is_none());
    }

    #[test]
    fn test_local_path_stays_inside_storage() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("secret.png"), b"secret").unwrap();
        let storage = Storage::new(dir.path().join("storage"), "https://cdn.test".into());

        assert!(storage.local_path("https://cdn.test/../secret.png").is_none());
        assert!(storage.local_path("https://cdn.test/b/../../secret.png").is_none());
        assert!(storage.local_path("https://cdn.test/").is_none());
    }
}
