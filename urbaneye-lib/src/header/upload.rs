use std::{
    ffi::OsStr,
    fmt::{self, Debug, Formatter},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use chrono::{DateTime, Utc};
use strum::{Display, EnumIter};
use tracing::{debug, trace, warn};

use crate::{Result, backend::BlobStorage};

/// Which profile image an upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum UploadTarget {
    Avatar,
    Banner,
}

impl UploadTarget {
    /// Storage bucket holding images for this target
    pub fn bucket(self) -> &'static str {
        match self {
            Self::Avatar => "profile-avatars",
            Self::Banner => "profile-banners",
        }
    }

    /// First path segment of objects inside the bucket
    pub fn category(self) -> &'static str {
        match self {
            Self::Avatar => "avatars",
            Self::Banner => "banners",
        }
    }
}

/// An image file the user picked, read into memory.
#[derive(Clone)]
pub struct PickedFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lowercased file extension, `bin` when the name has none.
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(OsStr::to_str)
            .filter(|ext| !ext.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".into())
    }
}

impl Debug for PickedFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Local stand-in for an image that has not been confirmed by storage yet.
///
/// A preview is owned by exactly one place in a draft. Replacing or dropping it releases it.
pub struct LocalPreview {
    id: u64,
    file: PickedFile,
}

impl LocalPreview {
    pub(crate) fn new(id: u64, file: PickedFile) -> Self {
        trace!("Created preview {id} for {}", file.name);
        Self { id, file }
    }

    /// Identifier unique within one editor, usable as a cache key for decoded images.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.file.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file.name
    }
}

impl Drop for LocalPreview {
    fn drop(&mut self) {
        trace!("Released preview {}", self.id);
    }
}

impl Debug for LocalPreview {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalPreview")
            .field("id", &self.id)
            .field("file", &self.file)
            .finish()
    }
}

/// Lifecycle of the most recent upload for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    /// The draft shows the local preview of upload `seq` while it is in flight.
    Previewing { seq: u64 },
    Confirmed(String),
    Failed(String),
}

/// Work handed to the caller by [`ProfileEditor::begin_upload`](super::ProfileEditor::begin_upload).
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub target: UploadTarget,
    pub seq: u64,
    pub user_id: String,
    pub file: PickedFile,
}

impl PendingUpload {
    /// Run the upload against `storage`.
    pub fn run(&self, storage: &impl BlobStorage) -> Result<String> {
        upload_image(storage, self.target, &self.user_id, &self.file, Utc::now())
    }
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(i64::MIN);

/// Milliseconds since the epoch, bumped when needed so that no two calls in this process return
/// the same value.
fn unique_millis(now: DateTime<Utc>) -> i64 {
    let now = now.timestamp_millis();
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last.saturating_add(1)))
        })
        .unwrap_or(now);

    now.max(previous.saturating_add(1))
}

/// Object path of a new upload: `<category>/<userId>-<epochMillis>.<ext>`.
pub fn object_path(
    target: UploadTarget,
    user_id: &str,
    file: &PickedFile,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{}/{user_id}-{}.{}",
        target.category(),
        unique_millis(now),
        file.extension()
    )
}

/// Upload `file` as the new image for `target` and return its public URL.
///
/// Both targets share this path, so the caller decides how failures are reported.
pub fn upload_image(
    storage: &impl BlobStorage,
    target: UploadTarget,
    user_id: &str,
    file: &PickedFile,
    now: DateTime<Utc>,
) -> Result<String> {
    let path = object_path(target, user_id, file, now);

    storage
        .upload(target.bucket(), &path, &file.bytes, true)
        .inspect_err(|err| warn!("Uploading {target} for {user_id} failed: {err}"))?;

    let url = storage.public_url(target.bucket(), &path);
    debug!("Uploaded {target} for {user_id} to {url}");

    Ok(url)
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use chrono::{TimeZone, Utc};

    use super::{PickedFile, UploadTarget, object_path, upload_image};
    use crate::{Error, Repository, repository::storage::Storage};

    #[test]
    fn test_object_path_layout() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let file = PickedFile::new("Me.JPG", vec![1, 2, 3]);

        let path = object_path(UploadTarget::Avatar, "u1", &file, now);

        assert!(path.starts_with("avatars/u1-"));
        assert!(path.ends_with(".jpg"));
    }

    #[test]
    fn test_object_paths_never_collide() {
        let now = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();
        let file = PickedFile::new("banner.png", vec![0]);

        let paths: HashSet<_> = (0..100)
            .map(|_| object_path(UploadTarget::Banner, "u1", &file, now))
            .collect();

        assert_eq!(paths.len(), 100);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(PickedFile::new("noext", vec![]).extension(), "bin");
        assert_eq!(PickedFile::new("a.tar.GZ", vec![]).extension(), "gz");
    }

    #[test]
    fn test_upload_image() {
        let repo = Repository::mock();
        let file = PickedFile::new("me.png", vec![9, 9, 9]);

        let url = upload_image(&repo, UploadTarget::Avatar, "u1", &file, Utc::now()).unwrap();

        let path = repo.storage().local_path(&url).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![9, 9, 9]);
        assert_eq!(repo.storage().objects("profile-avatars").unwrap().len(), 1);
    }

    #[test]
    fn test_upload_image_failure() {
        // A storage root that is a file cannot hold buckets
        let file = tempfile::NamedTempFile::new().unwrap();
        let storage = Storage::new(file.path().to_path_buf(), "https://cdn.test".into());

        let result = upload_image(
            &storage,
            UploadTarget::Banner,
            "u1",
            &PickedFile::new("b.png", vec![1]),
            Utc::now(),
        );

        assert!(matches!(result, Err(Error::Io(_))));
    }
}
