//! Seams to the managed backend.
//!
//! The profile page only ever talks to these traits. [`Repository`](crate::Repository) implements
//! all of them against the local database and blob storage, and tests substitute recording fakes.

use crate::{
    Result,
    repository::{Issue, IssueFilter, Profile, ProfileUpdate},
};

/// Record store holding one [`Profile`] per user.
pub trait ProfileStore {
    /// Write every field of `update` to the profile of `user_id` in a single call.
    fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()>;
}

/// Bucketed blob storage that hands out public URLs.
pub trait BlobStorage {
    /// Store `bytes` at `path` inside `bucket`. With `upsert` an existing object is overwritten.
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], upsert: bool) -> Result<()>;

    /// The permanent public URL of the object at `path` inside `bucket`.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Supplies the signed-in user and their profile.
pub trait AuthSession {
    fn session(&self) -> Result<Session>;
}

/// Supplies issue records, optionally narrowed to one reporter.
pub trait IssuesSource {
    fn issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
}

/// Snapshot of the authentication state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub profile: Option<Profile>,
}

impl Session {
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}
