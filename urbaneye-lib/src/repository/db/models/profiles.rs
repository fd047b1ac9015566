use agdb::{DbElement, DbId};

use crate::repository::db::Uid;

/// Stored form of a profile. Empty URL fields stand for "no image" and an empty `updated_at`
/// means the profile has never been edited.
#[derive(Debug, Clone, DbElement, PartialEq, PartialOrd)]
pub(crate) struct ProfileModel {
    pub(crate) db_id: Option<DbId>,
    pub(crate) uid: u64,
    pub(crate) user_id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) avatar_url: String,
    pub(crate) banner_url: String,
    pub(crate) banner_offset_y: f64,
    pub(crate) updated_at: String,
}

impl ProfileModel {
    pub fn new(uid: Uid, user_id: &str, email: &str) -> Self {
        Self {
            db_id: None,
            uid: uid.0,
            user_id: user_id.to_string(),
            full_name: String::new(),
            email: email.to_string(),
            phone: String::new(),
            avatar_url: String::new(),
            banner_url: String::new(),
            banner_offset_y: 0.0,
            updated_at: String::new(),
        }
    }
}
