use std::collections::HashMap;

use iced::widget::image::Handle;
use tracing::debug;
use urbaneye_lib::{
    header::{ImageSource, ProfileDraft},
    repository::storage::Storage,
};

/// Decoded image handles for local previews, keyed by preview id.
///
/// Handles are created once when a file is picked so the preview is not decoded again on every
/// frame.
#[derive(Debug, Default)]
pub struct PreviewCache {
    handles: HashMap<u64, Handle>,
}

impl PreviewCache {
    pub fn insert(&mut self, id: u64, bytes: &[u8]) {
        self.handles.insert(id, Handle::from_bytes(bytes.to_vec()));
    }

    /// Forget every handle whose preview is no longer part of `draft`.
    pub fn retain(&mut self, draft: &ProfileDraft) {
        let live: Vec<u64> = [&draft.avatar, &draft.banner]
            .into_iter()
            .filter_map(|source| source.preview().map(|p| p.id()))
            .collect();

        self.handles.retain(|id, _| live.contains(id));
    }

    /// What to draw for `source`, if anything.
    pub fn handle(&self, source: &ImageSource, storage: &Storage) -> Option<Handle> {
        match source {
            ImageSource::None => None,
            ImageSource::Remote(url) => remote(url, storage),
            ImageSource::Preview { preview, .. } => self.handles.get(&preview.id()).cloned(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Handle for an image already in storage. Only objects of the local storage can be shown.
pub fn remote(url: &str, storage: &Storage) -> Option<Handle> {
    let path = storage.local_path(url);
    if path.is_none() {
        debug!("Not displaying {url}, it is not in local storage");
    }

    path.map(Handle::from_path)
}
