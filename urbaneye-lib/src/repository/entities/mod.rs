//! Core domain records for Urban Eye.
//!
//! These types are plain snapshots of what the database holds. Each module also carries the
//! queries that read and write its records, so the [`Repository`](crate::Repository) stays a thin
//! facade.

use chrono::{DateTime, Utc};

use crate::{Error, Result};

mod issue;
mod profile;

pub use issue::{
    Issue, IssueCategory, IssueFilter, IssuePriority, IssueStats, IssueStatus, NewIssue,
};
pub use profile::{BannerOffset, NewProfile, Profile, ProfileUpdate};

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimestamp(value.to_string()))
}
