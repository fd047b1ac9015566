use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Internal database error {0}")]
    Internal(#[from] agdb::DbError),
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No profile exists for user '{0}'")]
    ProfileNotFound(String),
    #[error("No issue exists with id '{0}'")]
    IssueNotFound(String),
    #[error("User '{voter}' already voted on issue '{issue}'")]
    AlreadyVoted { issue: String, voter: String },
    #[error("A profile already exists for user '{0}'")]
    DuplicateProfile(String),
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("The profile is not being edited")]
    NotEditing,
    #[error("Invalid object path '{0}'")]
    InvalidObjectPath(String),
}
