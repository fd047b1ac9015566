use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    Error, Result,
    backend::{AuthSession, BlobStorage, IssuesSource, ProfileStore, Session, User},
    repository::{
        config::{Cfg, CoreConfig},
        db::Db,
        storage::Storage,
    },
};

mod db;

pub mod config;
pub mod entities;
pub mod storage;

pub use entities::{
    BannerOffset, Issue, IssueCategory, IssueFilter, IssuePriority, IssueStats, IssueStatus,
    NewIssue, NewProfile, Profile, ProfileUpdate,
};

/// Central access point for all persistent data.
///
/// The [`Repository`] stands in for the managed backend the profile page talks to. It owns the
/// profile and issue records, the blob buckets that hold avatars and banners, and the core
/// configuration that remembers who is signed in.
#[derive(Clone, Debug)]
pub struct Repository {
    db: Db,
    cfg: Cfg,
    storage: Storage,
}

impl Repository {
    pub fn new() -> Result<Self> {
        let cfg = CoreConfig::load()?;
        let storage = Storage::new(cfg.storage_dir(), cfg.public_url_base());

        Ok(Self {
            db: Db::new()?,
            cfg: Arc::new(RwLock::new(cfg)),
            storage,
        })
    }

    // Profiles

    /// Register a new profile. Registration normally happens elsewhere; this is what it writes.
    pub fn add_profile(&self, new_profile: NewProfile) -> Result<Profile> {
        Profile::add(&self.db, new_profile)
    }

    pub fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        Profile::find(&self.db, user_id)
    }

    pub fn profiles(&self) -> Result<Vec<Profile>> {
        Profile::list(&self.db)
    }

    // Session

    /// Remember `user_id` as the signed-in user. The profile must already exist.
    pub fn sign_in(&self, user_id: &str) -> Result<()> {
        if self.profile(user_id)?.is_none() {
            return Err(Error::ProfileNotFound(user_id.to_string()));
        }

        let mut cfg = self.cfg.write();
        cfg.set_signed_in_user(Some(user_id.to_string()));
        cfg.save()?;

        info!("Signed in as {user_id}");

        Ok(())
    }

    pub fn sign_out(&self) -> Result<()> {
        let mut cfg = self.cfg.write();
        cfg.set_signed_in_user(None);
        cfg.save()
    }

    // Issues

    pub fn add_issue(&self, reporter_id: &str, new_issue: NewIssue) -> Result<Issue> {
        Issue::add(&self.db, reporter_id, new_issue, chrono::Utc::now())
    }

    pub fn issue(&self, id: &str) -> Result<Option<Issue>> {
        Issue::find(&self.db, id)
    }

    /// Add `voter_id`'s upvote to the issue and return its new state.
    pub fn vote(&self, id: &str, voter_id: &str) -> Result<Issue> {
        Issue::vote(&self.db, id, voter_id, chrono::Utc::now())
    }

    pub fn set_issue_status(&self, id: &str, status: IssueStatus) -> Result<Issue> {
        Issue::set_status(&self.db, id, status)
    }

    pub fn issue_stats(&self, filter: &IssueFilter) -> Result<IssueStats> {
        Ok(IssueStats::collect(&Issue::list(&self.db, filter)?))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[cfg(test)]
    /// Return a mock version of a [`Repository`] with an in-memory database, a configuration
    /// that is never written to disk and a throwaway storage directory.
    pub(crate) fn mock() -> Self {
        let cfg = CoreConfig::mock();
        let storage = Storage::new(cfg.storage_dir(), cfg.public_url_base());

        Self {
            db: Db::in_memory(),
            cfg: Arc::new(RwLock::new(cfg)),
            storage,
        }
    }
}

impl ProfileStore for Repository {
    fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        Profile::update(&self.db, user_id, update)?;
        debug!("Updated profile of {user_id}");
        Ok(())
    }
}

impl BlobStorage for Repository {
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], upsert: bool) -> Result<()> {
        self.storage.upload(bucket, path, bytes, upsert)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage.public_url(bucket, path)
    }
}

impl AuthSession for Repository {
    fn session(&self) -> Result<Session> {
        let Some(user_id) = self.cfg.read().signed_in_user().map(str::to_string) else {
            return Ok(Session::default());
        };

        let profile = self.profile(&user_id)?;

        Ok(Session {
            user: Some(User { id: user_id }),
            profile,
        })
    }
}

impl IssuesSource for Repository {
    fn issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        Issue::list(&self.db, filter)
    }
}
