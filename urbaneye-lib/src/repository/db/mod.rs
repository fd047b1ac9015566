use std::sync::Arc;

use agdb::{DbAny, DbError, QueryBuilder};
use derive_more::{Deref, Display};
use parking_lot::RwLock;
use tracing::info;

use crate::{
    Result,
    fs::state_dir,
    repository::db::models::{CURRENT_MODEL_VERSION, ModelVersion},
};

pub(crate) mod models;

#[derive(Debug, Clone, Deref)]
pub(crate) struct Db {
    #[deref]
    db: Arc<RwLock<DbAny>>,
}

impl Db {
    pub fn new() -> Result<Self> {
        let path = state_dir()?.join("data.db");
        let path_str = path.to_string_lossy();

        let mut db = Self {
            db: Arc::new(RwLock::new(DbAny::new_file(&path_str)?)),
        };

        db.init()?;

        Ok(db)
    }

    fn init(&mut self) -> Result<()> {
        let alias_count = self
            .db
            .read()
            .exec(QueryBuilder::select().aliases().query())?
            .result;

        if alias_count == 0 {
            self.db
                .write()
                .transaction_mut(|t| -> std::result::Result<(), DbError> {
                    t.exec_mut(
                        // Insert aliases if they don't exist
                        QueryBuilder::insert()
                            .nodes()
                            .aliases([
                                // Root element nodes
                                "profiles",
                                "issues",
                                // State nodes
                                "model_version",
                                "next_uid",
                            ])
                            .query(),
                    )?;

                    // Signifies what the UID should be for a newly inserted element. It gets
                    // incremented with every new element.
                    t.exec_mut(
                        QueryBuilder::insert()
                            .values([[("next_uid", 0_u64).into()]])
                            .ids("next_uid")
                            .query(),
                    )?;

                    Ok(())
                })?;
        }

        // Fetch the current model version (if any)
        let model_version: Option<ModelVersion> = self
            .db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<ModelVersion>()
                    .search()
                    .from("model_version")
                    .where_()
                    .neighbor()
                    .query(),
            )?
            .try_into()
            .ok()
            .and_then(|versions: Vec<ModelVersion>| versions.into_iter().next());

        if let Some(mv) = model_version {
            if mv.version() < CURRENT_MODEL_VERSION {
                self.backup()?;
                self.migrate(mv)?;
            }
        } else {
            // Insert default ModelVersion if missing
            self.db
                .write()
                .transaction_mut(|t| -> std::result::Result<(), DbError> {
                    let model_version_id = t
                        .exec_mut(
                            QueryBuilder::insert()
                                .element(&ModelVersion::default())
                                .query(),
                        )?
                        .elements
                        .first()
                        .expect("ModelVersion insertion should return the ID as the first element")
                        .id;

                    t.exec_mut(
                        QueryBuilder::insert()
                            .edges()
                            .from("model_version")
                            .to(model_version_id)
                            .query(),
                    )?;

                    Ok(())
                })?;
        }

        Ok(())
    }

    /// Perform a backup of the database
    fn backup(&self) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = state_dir()?.join(format!("data-{timestamp}.db.bak"));

        self.db.write().backup(&path.to_string_lossy())?;

        info!("Backed up database to {}", path.display());

        Ok(())
    }

    /// Bring an older database up to the current model version. Every model change so far has
    /// been additive, so only the version marker needs to move.
    fn migrate(&self, mut mv: ModelVersion) -> Result<()> {
        let from = mv.version();
        mv.set_version(CURRENT_MODEL_VERSION);

        self.db
            .write()
            .exec_mut(QueryBuilder::insert().element(&mv).query())?;

        info!("Migrated database model from v{from} to v{CURRENT_MODEL_VERSION}");

        Ok(())
    }

    /// Create a memory backed database for use in tests
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        let mut db = Self {
            db: Arc::new(RwLock::new(DbAny::new_memory("test").unwrap())),
        };

        db.init().unwrap();

        db
    }
}

/// A unique identifier handed to every inserted element. Unlike a `DbId` it is never reused after
/// the element is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub(crate) struct Uid(pub(crate) u64);

impl Uid {
    /// Allocate the next UID.
    pub fn new(db: &Db) -> Result<Self> {
        let uid = db
            .write()
            .transaction_mut(|t| -> std::result::Result<u64, DbError> {
                let uid = t
                    .exec(
                        QueryBuilder::select()
                            .values("next_uid")
                            .ids("next_uid")
                            .query(),
                    )?
                    .elements
                    .pop()
                    .and_then(|mut e| e.values.pop())
                    .expect("the next_uid node always carries a value")
                    .value
                    .to_u64()?;

                t.exec_mut(
                    QueryBuilder::insert()
                        .values([[("next_uid", uid.saturating_add(1)).into()]])
                        .ids("next_uid")
                        .query(),
                )?;

                Ok(uid)
            })?;

        Ok(Self(uid))
    }
}
