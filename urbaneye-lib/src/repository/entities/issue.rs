use std::{collections::BTreeMap, str::FromStr};

use agdb::{DbId, QueryBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::{
    Error, Result,
    repository::{
        db::{
            Db, Uid,
            models::{IssueModel, VoteModel},
        },
        entities::parse_timestamp,
    },
};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    New,
    Acknowledged,
    InProgress,
    Resolved,
    Rejected,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Roads,
    Streetlights,
    WaterSupply,
    WasteManagement,
    PublicTransport,
    Parks,
    Drainage,
    Electricity,
    #[default]
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A civic issue reported by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub reporter_id: String,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub votes_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Narrows an issue listing. The default matches every issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub reporter_id: Option<String>,
    pub category: Option<IssueCategory>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
}

impl IssueFilter {
    pub fn reporter(reporter_id: Option<&str>) -> Self {
        Self {
            reporter_id: reporter_id.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: Option<IssueCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn status(mut self, status: Option<IssueStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, priority: Option<IssuePriority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        self.reporter_id
            .as_ref()
            .is_none_or(|id| *id == issue.reporter_id)
            && self.category.is_none_or(|c| c == issue.category)
            && self.status.is_none_or(|s| s == issue.status)
            && self.priority.is_none_or(|p| p == issue.priority)
    }
}

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub priority: IssuePriority,
}

impl NewIssue {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            category: IssueCategory::default(),
            priority: IssuePriority::default(),
        }
    }

    pub fn category(mut self, category: IssueCategory) -> Self {
        self.category = category;
        self
    }

    pub fn priority(mut self, priority: IssuePriority) -> Self {
        self.priority = priority;
        self
    }
}

impl Issue {
    pub(crate) fn add(
        db: &Db,
        reporter_id: &str,
        new_issue: NewIssue,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let mut model = IssueModel::new(
            Uid::new(db)?,
            reporter_id,
            &new_issue.title,
            &new_issue.description,
        );
        model.category = new_issue.category.to_string();
        model.priority = new_issue.priority.to_string();
        model.status = IssueStatus::New.to_string();
        model.created_at = now.to_rfc3339();

        db.write().transaction_mut(|t| -> Result<DbId> {
            let issue_id = t
                .exec_mut(QueryBuilder::insert().element(&model).query())?
                .elements
                .first()
                .expect("IssueModel insertion should return the ID as the first element")
                .id;

            t.exec_mut(
                QueryBuilder::insert()
                    .edges()
                    .from("issues")
                    .to(issue_id)
                    .query(),
            )?;

            Ok(issue_id)
        })?;

        debug!("Added issue {} by {reporter_id}", model.uid);

        Self::try_from(model)
    }

    /// List issues matching `filter`, newest first.
    pub(crate) fn list(db: &Db, filter: &IssueFilter) -> Result<Vec<Self>> {
        let query = match &filter.reporter_id {
            Some(reporter_id) => QueryBuilder::select()
                .elements::<IssueModel>()
                .search()
                .from("issues")
                .where_()
                .neighbor()
                .and()
                .key("reporter_id")
                .value(reporter_id.as_str())
                .query(),
            None => QueryBuilder::select()
                .elements::<IssueModel>()
                .search()
                .from("issues")
                .where_()
                .neighbor()
                .query(),
        };

        let models: Vec<IssueModel> = db.read().exec(query)?.try_into()?;

        let mut issues = models
            .into_iter()
            .map(Self::try_from)
            .collect::<Result<Vec<_>>>()?;
        issues.retain(|issue| filter.matches(issue));
        // Ids are decimal UIDs, so longer means newer on a timestamp tie
        issues.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.len().cmp(&a.id.len()))
                .then(b.id.cmp(&a.id))
        });

        Ok(issues)
    }

    pub(crate) fn find(db: &Db, id: &str) -> Result<Option<Self>> {
        Self::find_model(db, id)?.map(Self::try_from).transpose()
    }

    /// Record one upvote by `voter_id`. Each user may vote on an issue once.
    pub(crate) fn vote(db: &Db, id: &str, voter_id: &str, now: DateTime<Utc>) -> Result<Self> {
        let mut model =
            Self::find_model(db, id)?.ok_or_else(|| Error::IssueNotFound(id.to_string()))?;
        let db_id = model
            .db_id
            .ok_or_else(|| Error::IssueNotFound(id.to_string()))?;

        let vote = VoteModel::new(voter_id, &now.to_rfc3339());
        let votes_count = db.write().transaction_mut(|t| -> Result<u64> {
            let existing = t
                .exec(
                    QueryBuilder::search()
                        .from(db_id)
                        .where_()
                        .neighbor()
                        .and()
                        .key("voter_id")
                        .value(voter_id)
                        .query(),
                )?
                .result;
            if existing > 0 {
                return Err(Error::AlreadyVoted {
                    issue: id.to_string(),
                    voter: voter_id.to_string(),
                });
            }

            let vote_id = t
                .exec_mut(QueryBuilder::insert().element(&vote).query())?
                .elements
                .first()
                .expect("VoteModel insertion should return the ID as the first element")
                .id;
            t.exec_mut(QueryBuilder::insert().edges().from(db_id).to(vote_id).query())?;

            let votes_count = model.votes_count.saturating_add(1);
            t.exec_mut(
                QueryBuilder::insert()
                    .values([[("votes_count", votes_count).into()]])
                    .ids(db_id)
                    .query(),
            )?;

            Ok(votes_count)
        })?;

        debug!("{voter_id} voted on issue {id}");
        model.votes_count = votes_count;

        Self::try_from(model)
    }

    /// Move the issue to `status`. Any status may follow any other.
    pub(crate) fn set_status(db: &Db, id: &str, status: IssueStatus) -> Result<Self> {
        let mut model =
            Self::find_model(db, id)?.ok_or_else(|| Error::IssueNotFound(id.to_string()))?;
        let db_id = model
            .db_id
            .ok_or_else(|| Error::IssueNotFound(id.to_string()))?;

        model.status = status.to_string();
        db.write().exec_mut(
            QueryBuilder::insert()
                .values([[("status", model.status.as_str()).into()]])
                .ids(db_id)
                .query(),
        )?;

        debug!("Issue {id} is now {status}");

        Self::try_from(model)
    }

    fn find_model(db: &Db, id: &str) -> Result<Option<IssueModel>> {
        let Ok(uid) = id.parse::<u64>() else {
            return Ok(None);
        };

        let models: Vec<IssueModel> = db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<IssueModel>()
                    .search()
                    .from("issues")
                    .where_()
                    .neighbor()
                    .and()
                    .key("uid")
                    .value(uid)
                    .query(),
            )?
            .try_into()?;

        Ok(models.into_iter().next())
    }
}

impl TryFrom<IssueModel> for Issue {
    type Error = Error;

    fn try_from(model: IssueModel) -> Result<Self> {
        // Unknown enum values fall back to defaults rather than hiding the issue
        Ok(Self {
            id: model.uid.to_string(),
            category: IssueCategory::from_str(&model.category).unwrap_or_default(),
            priority: IssuePriority::from_str(&model.priority).unwrap_or_default(),
            status: IssueStatus::from_str(&model.status).unwrap_or_default(),
            created_at: parse_timestamp(&model.created_at)?,
            reporter_id: model.reporter_id,
            title: model.title,
            description: model.description,
            votes_count: model.votes_count,
        })
    }
}

/// Issue counts for a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueStats {
    pub total: usize,
    pub votes: u64,
    pub by_status: BTreeMap<IssueStatus, usize>,
    pub by_category: BTreeMap<IssueCategory, usize>,
    pub by_priority: BTreeMap<IssuePriority, usize>,
}

impl IssueStats {
    pub fn collect(issues: &[Issue]) -> Self {
        let mut stats = Self {
            total: issues.len(),
            ..Self::default()
        };

        for issue in issues {
            stats.votes = stats.votes.saturating_add(issue.votes_count);
            *stats.by_status.entry(issue.status).or_default() += 1;
            *stats.by_category.entry(issue.category).or_default() += 1;
            *stats.by_priority.entry(issue.priority).or_default() += 1;
        }

        stats
    }
}
