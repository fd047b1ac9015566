//! Editing logic behind the profile header.
//!
//! [`ProfileEditor`] holds the stored profile, a local draft of it and the state of the edit
//! controls. The draft only differs from the stored profile while editing: saving writes it back
//! in one update and cancelling throws it away.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    Error, Result,
    backend::{BlobStorage, ProfileStore},
    posts::initials,
    repository::{BannerOffset, Profile, ProfileUpdate},
};

mod drag;
mod draft;
mod upload;

pub use drag::DragTracker;
pub use draft::{ImageSource, ProfileDraft};
pub use upload::{
    LocalPreview, PendingUpload, PickedFile, UploadState, UploadTarget, object_path, upload_image,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Viewing,
    Editing,
}

/// Which parts of the header are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub edit: bool,
    pub save: bool,
    /// False while a save is in flight
    pub save_enabled: bool,
    pub cancel: bool,
    /// Avatar replacement button
    pub camera: bool,
    pub change_cover: bool,
    pub remove_banner: bool,
    pub drag_hint: bool,
    /// Name, email and phone are text inputs
    pub inputs: bool,
    /// Email and phone are shown at all
    pub contact: bool,
}

#[derive(Debug)]
pub struct ProfileEditor {
    is_owner: bool,
    mode: Mode,
    saving: bool,
    baseline: Profile,
    draft: ProfileDraft,
    drag: DragTracker,
    avatar_upload: UploadState,
    banner_upload: UploadState,
    next_seq: u64,
}

impl ProfileEditor {
    pub fn new(profile: Profile, is_owner: bool) -> Self {
        Self {
            is_owner,
            mode: Mode::Viewing,
            saving: false,
            draft: ProfileDraft::from(&profile),
            baseline: profile,
            drag: DragTracker::default(),
            avatar_upload: UploadState::Idle,
            banner_upload: UploadState::Idle,
            next_seq: 0,
        }
    }

    /// Take in a profile freshly supplied by the session. While editing only the baseline moves,
    /// so the user's unsaved changes survive.
    pub fn sync(&mut self, profile: Profile) {
        if self.mode == Mode::Viewing {
            self.draft = ProfileDraft::from(&profile);
        }
        self.baseline = profile;
    }

    // State

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == Mode::Editing
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn user_id(&self) -> &str {
        &self.baseline.user_id
    }

    pub fn profile(&self) -> &Profile {
        &self.baseline
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn upload_state(&self, target: UploadTarget) -> &UploadState {
        match target {
            UploadTarget::Avatar => &self.avatar_upload,
            UploadTarget::Banner => &self.banner_upload,
        }
    }

    /// Initials of the draft's full name, for when there is no avatar to show.
    pub fn initials(&self) -> String {
        initials(&self.draft.full_name)
    }

    pub fn controls(&self) -> Controls {
        let owner = self.is_owner;
        let editing = owner && self.is_editing();
        let banner = self.draft.banner.is_present();

        Controls {
            edit: owner && !editing,
            save: editing,
            save_enabled: editing && !self.saving,
            cancel: editing,
            camera: owner,
            change_cover: editing,
            remove_banner: editing && banner,
            drag_hint: editing && banner,
            inputs: editing,
            contact: owner,
        }
    }

    // Transitions

    /// Enter edit mode. Only the owner can edit.
    pub fn begin_edit(&mut self) -> bool {
        if !self.is_owner {
            return false;
        }
        self.mode = Mode::Editing;
        true
    }

    /// Throw the draft away and go back to viewing. Nothing is written.
    pub fn cancel(&mut self) {
        if self.saving {
            return;
        }
        self.reset();
    }

    /// Start a save, returning the write to perform. `None` when not editing or while another
    /// save is in flight.
    pub fn begin_save(&mut self, now: DateTime<Utc>) -> Option<ProfileUpdate> {
        if !self.is_editing() || self.saving {
            return None;
        }

        self.saving = true;
        Some(self.draft.to_update(now))
    }

    /// Finish a save started by [`Self::begin_save`]. The editor returns to viewing whether or
    /// not the write succeeded.
    pub fn finish_save(&mut self, update: &ProfileUpdate, saved: bool) {
        self.saving = false;

        if saved {
            self.baseline.apply(update);
        }
        self.reset();
    }

    /// Write the draft to `store` and go back to viewing.
    pub fn save(&mut self, store: &impl ProfileStore, now: DateTime<Utc>) -> Result<()> {
        let Some(update) = self.begin_save(now) else {
            return Err(Error::NotEditing);
        };

        let outcome = store.update_profile(self.user_id(), &update);
        if let Err(err) = &outcome {
            warn!("Saving profile of {} failed: {err}", self.user_id());
        }
        self.finish_save(&update, outcome.is_ok());

        outcome
    }

    // Fields

    pub fn set_full_name(&mut self, full_name: String) {
        if self.is_editing() {
            self.draft.full_name = full_name;
        }
    }

    pub fn set_email(&mut self, email: String) {
        if self.is_editing() {
            self.draft.email = email;
        }
    }

    pub fn set_phone(&mut self, phone: String) {
        if self.is_editing() {
            self.draft.phone = phone;
        }
    }

    /// Place the banner at an exact offset, for callers without a pointer to drag with.
    pub fn set_banner_offset(&mut self, offset: BannerOffset) {
        if self.is_editing() {
            self.draft.banner_offset_y = offset;
        }
    }

    pub fn remove_banner(&mut self) {
        if !self.is_editing() {
            return;
        }
        self.draft.banner = ImageSource::None;
        self.draft.banner_offset_y = Default::default();
        self.banner_upload = UploadState::Idle;
        self.drag.end();
    }

    // Uploads

    /// Show `file` as the new image for `target` right away and hand back the upload to run.
    ///
    /// Replacing the avatar is offered outside edit mode too, so it switches into edit mode
    /// first. The banner can only be replaced while editing.
    pub fn begin_upload(&mut self, target: UploadTarget, file: PickedFile) -> Option<PendingUpload> {
        match (self.mode, target) {
            (Mode::Viewing, UploadTarget::Avatar) => {
                if !self.begin_edit() {
                    return None;
                }
            }
            (Mode::Viewing, UploadTarget::Banner) => return None,
            (Mode::Editing, _) => {}
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let slot = self.image_mut(target);
        let fallback = slot.persisted_url().map(str::to_string);
        *slot = ImageSource::Preview {
            preview: LocalPreview::new(seq, file.clone()),
            fallback,
        };
        *self.upload_state_mut(target) = UploadState::Previewing { seq };

        Some(PendingUpload {
            target,
            seq,
            user_id: self.user_id().to_string(),
            file,
        })
    }

    /// Apply the outcome of upload `seq`. Outcomes for uploads that have since been superseded,
    /// cancelled or saved are ignored; the return value says whether this one was applied.
    ///
    /// On failure the preview stays in place.
    pub fn finish_upload(
        &mut self,
        target: UploadTarget,
        seq: u64,
        outcome: std::result::Result<String, String>,
    ) -> bool {
        if *self.upload_state(target) != (UploadState::Previewing { seq }) {
            debug!("Ignoring stale {target} upload {seq}");
            return false;
        }

        *self.upload_state_mut(target) = match outcome {
            Ok(url) => {
                *self.image_mut(target) = ImageSource::Remote(url.clone());
                UploadState::Confirmed(url)
            }
            Err(reason) => UploadState::Failed(reason),
        };

        true
    }

    /// Run a whole upload synchronously.
    pub fn upload(
        &mut self,
        storage: &impl BlobStorage,
        target: UploadTarget,
        file: PickedFile,
    ) -> Result<String> {
        let pending = self.begin_upload(target, file).ok_or(Error::NotEditing)?;

        match pending.run(storage) {
            Ok(url) => {
                self.finish_upload(target, pending.seq, Ok(url.clone()));
                Ok(url)
            }
            Err(err) => {
                self.finish_upload(target, pending.seq, Err(err.to_string()));
                Err(err)
            }
        }
    }

    // Banner dragging

    pub fn drag_start(&mut self, y: f64) {
        if self.is_editing() && self.draft.banner.is_present() {
            self.drag.start(y);
        }
    }

    pub fn drag_move(&mut self, y: f64) {
        if !self.is_editing() {
            return;
        }
        if let Some(offset) = self.drag.track(y, self.draft.banner_offset_y) {
            self.draft.banner_offset_y = offset;
        }
    }

    pub fn drag_end(&mut self) {
        if self.is_editing() {
            self.drag.end();
        }
    }

    fn reset(&mut self) {
        self.mode = Mode::Viewing;
        self.draft = ProfileDraft::from(&self.baseline);
        self.drag.end();
        self.avatar_upload = UploadState::Idle;
        self.banner_upload = UploadState::Idle;
    }

    fn image_mut(&mut self, target: UploadTarget) -> &mut ImageSource {
        match target {
            UploadTarget::Avatar => &mut self.draft.avatar,
            UploadTarget::Banner => &mut self.draft.banner,
        }
    }

    fn upload_state_mut(&mut self, target: UploadTarget) -> &mut UploadState {
        match target {
            UploadTarget::Avatar => &mut self.avatar_upload,
            UploadTarget::Banner => &mut self.banner_upload,
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use chrono::{TimeZone, Utc};

    use super::{ImageSource, Mode, PickedFile, ProfileEditor, UploadState, UploadTarget};
    use crate::{
        Error, Repository, Result,
        backend::ProfileStore,
        repository::{BannerOffset, NewProfile, Profile, ProfileUpdate},
    };

    #[derive(Default)]
    struct RecordingStore {
        writes: RefCell<Vec<(String, ProfileUpdate)>>,
        fail: bool,
    }

    impl ProfileStore for RecordingStore {
        fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
            self.writes
                .borrow_mut()
                .push((user_id.to_string(), update.clone()));
            if self.fail {
                Err(Error::ProfileNotFound(user_id.to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn profile() -> Profile {
        Profile {
            user_id: "u1".into(),
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+911234567890".into(),
            avatar_url: Some("https://cdn.test/profile-avatars/avatars/u1-1.png".into()),
            banner_url: Some("https://cdn.test/profile-banners/banners/u1-1.png".into()),
            banner_offset_y: BannerOffset::new(10.0),
            updated_at: None,
        }
    }

    fn file() -> PickedFile {
        PickedFile::new("new.png", vec![1, 2, 3])
    }

    #[test]
    fn test_cancel_never_writes() {
        let store = RecordingStore::default();
        let mut editor = ProfileEditor::new(profile(), true);

        editor.begin_edit();
        editor.set_full_name("Someone Else".into());
        editor.set_phone("+910000000000".into());
        editor.drag_start(0.0);
        editor.drag_move(80.0);
        editor.cancel();

        assert_eq!(editor.mode(), Mode::Viewing);
        assert_eq!(editor.draft().full_name, "Ada Lovelace");
        assert_eq!(editor.draft().banner_offset_y.get(), 10.0);
        assert!(store.writes.borrow().is_empty());
    }

    #[test]
    fn test_save_issues_one_update() {
        let store = RecordingStore::default();
        let mut editor = ProfileEditor::new(profile(), true);
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();

        editor.begin_edit();
        editor.set_full_name("Ada King".into());
        editor.set_email("ada@king.test".into());
        editor.remove_banner();
        editor.save(&store, now).unwrap();

        let writes = store.writes.borrow();
        assert_eq!(writes.len(), 1);

        let (user_id, update) = writes.first().unwrap();
        assert_eq!(user_id, "u1");
        assert_eq!(update.full_name, "Ada King");
        assert_eq!(update.email, "ada@king.test");
        assert_eq!(update.phone, "+911234567890");
        assert_eq!(update.avatar_url, profile().avatar_url);
        assert_eq!(update.banner_url, None);
        assert_eq!(update.banner_offset_y, BannerOffset::default());
        assert_eq!(update.updated_at, now);

        assert_eq!(editor.mode(), Mode::Viewing);
        assert_eq!(editor.profile().full_name, "Ada King");
        assert_eq!(editor.draft().full_name, "Ada King");
    }

    #[test]
    fn test_failed_save_still_returns_to_viewing() {
        let store = RecordingStore {
            fail: true,
            ..Default::default()
        };
        let mut editor = ProfileEditor::new(profile(), true);

        editor.begin_edit();
        editor.set_full_name("Lost Edit".into());

        assert!(editor.save(&store, Utc::now()).is_err());
        assert_eq!(store.writes.borrow().len(), 1);
        assert_eq!(editor.mode(), Mode::Viewing);
        assert!(!editor.is_saving());
        assert_eq!(editor.draft().full_name, "Ada Lovelace");
    }

    #[test]
    fn test_save_requires_editing() {
        let store = RecordingStore::default();
        let mut editor = ProfileEditor::new(profile(), true);

        assert!(matches!(
            editor.save(&store, Utc::now()),
            Err(Error::NotEditing)
        ));
        assert!(store.writes.borrow().is_empty());
    }

    #[test]
    fn test_no_duplicate_submission() {
        let mut editor = ProfileEditor::new(profile(), true);
        editor.begin_edit();

        let first = editor.begin_save(Utc::now());

        assert!(first.is_some());
        assert!(editor.begin_save(Utc::now()).is_none());
        assert!(!editor.controls().save_enabled);

        // Cancelling mid-save is ignored
        editor.cancel();
        assert_eq!(editor.mode(), Mode::Editing);

        editor.finish_save(&first.unwrap(), true);
        assert_eq!(editor.mode(), Mode::Viewing);
    }

    #[test]
    fn test_non_owner_sees_no_controls() {
        let mut editor = ProfileEditor::new(profile(), false);

        assert!(!editor.begin_edit());
        assert!(editor.begin_upload(UploadTarget::Avatar, file()).is_none());

        let controls = editor.controls();
        assert!(!controls.contact);
        assert!(!controls.edit);
        assert!(!controls.save);
        assert!(!controls.cancel);
        assert!(!controls.camera);
        assert!(!controls.change_cover);
        assert!(!controls.inputs);
    }

    #[test]
    fn test_owner_controls() {
        let mut editor = ProfileEditor::new(profile(), true);

        let viewing = editor.controls();
        assert!(viewing.edit && viewing.camera && viewing.contact);
        assert!(!viewing.save && !viewing.inputs && !viewing.change_cover);

        editor.begin_edit();
        let editing = editor.controls();
        assert!(!editing.edit);
        assert!(editing.save && editing.save_enabled && editing.cancel);
        assert!(editing.change_cover && editing.remove_banner && editing.drag_hint);

        editor.remove_banner();
        assert!(!editor.controls().remove_banner);
        assert!(!editor.controls().drag_hint);
    }

    #[test]
    fn test_edits_ignored_while_viewing() {
        let mut editor = ProfileEditor::new(profile(), true);

        editor.set_full_name("Nope".into());
        editor.remove_banner();

        assert_eq!(editor.draft().full_name, "Ada Lovelace");
        assert!(editor.draft().banner.is_present());
    }

    #[test]
    fn test_avatar_pick_enters_editing() {
        let mut editor = ProfileEditor::new(profile(), true);

        let pending = editor.begin_upload(UploadTarget::Avatar, file()).unwrap();

        assert_eq!(editor.mode(), Mode::Editing);
        assert_eq!(
            *editor.upload_state(UploadTarget::Avatar),
            UploadState::Previewing { seq: pending.seq }
        );
        assert!(editor.draft().avatar.preview().is_some());
    }

    #[test]
    fn test_banner_pick_requires_editing() {
        let mut editor = ProfileEditor::new(profile(), true);

        assert!(editor.begin_upload(UploadTarget::Banner, file()).is_none());
        assert_eq!(editor.mode(), Mode::Viewing);
    }

    #[test]
    fn test_upload_success_replaces_preview() {
        let mut editor = ProfileEditor::new(profile(), true);
        editor.begin_edit();

        let pending = editor.begin_upload(UploadTarget::Banner, file()).unwrap();
        let applied = editor.finish_upload(
            UploadTarget::Banner,
            pending.seq,
            Ok("https://cdn.test/new.png".into()),
        );

        assert!(applied);
        assert!(matches!(
            &editor.draft().banner,
            ImageSource::Remote(url) if url == "https://cdn.test/new.png"
        ));
        assert_eq!(
            *editor.upload_state(UploadTarget::Banner),
            UploadState::Confirmed("https://cdn.test/new.png".into())
        );
    }

    #[test]
    fn test_upload_failure_keeps_preview_and_saves_previous_url() {
        let store = RecordingStore::default();
        let mut editor = ProfileEditor::new(profile(), true);

        let pending = editor.begin_upload(UploadTarget::Avatar, file()).unwrap();
        editor.finish_upload(UploadTarget::Avatar, pending.seq, Err("offline".into()));

        assert!(editor.draft().avatar.preview().is_some());
        assert_eq!(
            *editor.upload_state(UploadTarget::Avatar),
            UploadState::Failed("offline".into())
        );

        editor.save(&store, Utc::now()).unwrap();
        assert_eq!(store.writes.borrow().first().unwrap().1.avatar_url, profile().avatar_url);
    }

    #[test]
    fn test_stale_upload_ignored() {
        let mut editor = ProfileEditor::new(profile(), true);
        editor.begin_edit();

        let first = editor.begin_upload(UploadTarget::Banner, file()).unwrap();
        let second = editor.begin_upload(UploadTarget::Banner, file()).unwrap();

        assert!(!editor.finish_upload(UploadTarget::Banner, first.seq, Ok("old".into())));
        assert_eq!(
            editor.draft().banner.preview().map(|p| p.id()),
            Some(second.seq)
        );

        // Results arriving after a cancel are dropped too
        editor.cancel();
        assert!(!editor.finish_upload(UploadTarget::Banner, second.seq, Ok("late".into())));
        assert_eq!(editor.draft().banner.persisted_url(), profile().banner_url.as_deref());
    }

    #[test]
    fn test_drag_only_while_editing_with_banner() {
        let mut editor = ProfileEditor::new(profile(), true);

        editor.drag_start(0.0);
        editor.drag_move(50.0);
        assert_eq!(editor.draft().banner_offset_y.get(), 10.0);

        editor.begin_edit();
        editor.drag_start(0.0);
        editor.drag_move(500.0);
        assert_eq!(editor.draft().banner_offset_y.get(), BannerOffset::MAX);
        editor.drag_end();
        assert!(!editor.is_dragging());

        editor.remove_banner();
        editor.drag_start(0.0);
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_hover_without_press_does_not_pan() {
        let mut editor = ProfileEditor::new(profile(), true);

        editor.drag_move(0.0);
        editor.drag_move(120.0);
        assert!(!editor.is_dragging());
        assert_eq!(editor.draft().banner_offset_y.get(), 10.0);

        editor.begin_edit();
        editor.drag_move(0.0);
        editor.drag_move(-50.0);
        assert!(!editor.is_dragging());
        assert_eq!(editor.draft().banner_offset_y.get(), 10.0);

        editor.drag_start(0.0);
        editor.drag_move(5.0);
        assert_eq!(editor.draft().banner_offset_y.get(), 15.0);
    }

    #[test]
    fn test_sync_keeps_unsaved_edits() {
        let mut editor = ProfileEditor::new(profile(), true);
        editor.begin_edit();
        editor.set_full_name("Draft Name".into());

        let mut refreshed = profile();
        refreshed.full_name = "Server Name".into();
        editor.sync(refreshed);

        assert_eq!(editor.draft().full_name, "Draft Name");

        editor.cancel();
        assert_eq!(editor.draft().full_name, "Server Name");
    }

    #[test]
    fn test_initials() {
        let editor = ProfileEditor::new(profile(), true);

        assert_eq!(editor.initials(), "AL");
    }

    #[test]
    fn test_upload_and_save_against_repository() {
        let repo = Repository::mock();
        let stored = repo
            .add_profile(NewProfile::new("u1", "ada@example.com"))
            .unwrap();
        let mut editor = ProfileEditor::new(stored, true);

        editor.begin_edit();
        let url = editor.upload(&repo, UploadTarget::Banner, file()).unwrap();
        editor.drag_start(0.0);
        editor.drag_move(-42.0);
        editor.save(&repo, Utc::now()).unwrap();

        let saved = repo.profile("u1").unwrap().unwrap();
        assert_eq!(saved.banner_url, Some(url));
        assert_eq!(saved.banner_offset_y.get(), -42.0);
        assert!(saved.updated_at.is_some());
    }
}
