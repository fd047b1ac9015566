use agdb::{DbElement, DbId};

use crate::repository::db::Uid;

#[derive(Debug, Clone, DbElement, PartialEq, PartialOrd)]
pub(crate) struct IssueModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) uid: u64,
    pub(crate) reporter_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) category: String,
    pub(crate) priority: String,
    pub(crate) status: String,
    pub(crate) votes_count: u64,
    /// RFC 3339 creation time
    pub(crate) created_at: String,
}

impl IssueModel {
    pub fn new(uid: Uid, reporter_id: &str, title: &str, description: &str) -> Self {
        Self {
            db_id: None,
            uid: uid.0,
            reporter_id: reporter_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category: String::new(),
            priority: String::new(),
            status: String::new(),
            votes_count: 0,
            created_at: String::new(),
        }
    }
}

/// One user's vote, linked from the issue it was cast on.
#[derive(Debug, Clone, DbElement, PartialEq, PartialOrd)]
pub(crate) struct VoteModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) voter_id: String,
    /// RFC 3339 time the vote was cast
    pub(crate) created_at: String,
}

impl VoteModel {
    pub fn new(voter_id: &str, created_at: &str) -> Self {
        Self {
            db_id: None,
            voter_id: voter_id.to_string(),
            created_at: created_at.to_string(),
        }
    }
}
