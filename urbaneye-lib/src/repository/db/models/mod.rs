use agdb::{DbElement, DbId};

mod issues;
mod profiles;

pub(crate) use issues::{IssueModel, VoteModel};
pub(crate) use profiles::ProfileModel;

pub(crate) const CURRENT_MODEL_VERSION: u64 = 1;

/// Version of the data model stored in the database, linked from the `model_version` alias.
#[derive(Debug, Clone, DbElement, PartialEq, PartialOrd)]
pub(crate) struct ModelVersion {
    db_id: Option<DbId>,
    version: u64,
}

impl ModelVersion {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Default for ModelVersion {
    fn default() -> Self {
        Self {
            db_id: None,
            version: CURRENT_MODEL_VERSION,
        }
    }
}
