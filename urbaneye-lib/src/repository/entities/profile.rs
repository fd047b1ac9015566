use agdb::{DbId, QueryBuilder};
use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Error, Result,
    repository::{
        db::{Db, Uid, models::ProfileModel},
        entities::parse_timestamp,
    },
};

/// Vertical pan of the banner image in pixels, always within [`Self::MIN`]..=[`Self::MAX`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deref, Display, Serialize, Deserialize,
)]
#[serde(from = "f64", into = "f64")]
pub struct BannerOffset(f64);

impl BannerOffset {
    pub const MIN: f64 = -200.0;
    pub const MAX: f64 = 200.0;

    /// Build an offset, clamping `pixels` into range. NaN collapses to zero.
    pub fn new(pixels: f64) -> Self {
        if pixels.is_nan() {
            return Self(0.0);
        }
        Self(pixels.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// The offset moved by `delta` pixels, clamped.
    pub fn shifted(self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }
}

impl From<f64> for BannerOffset {
    fn from(pixels: f64) -> Self {
        Self::new(pixels)
    }
}

impl From<BannerOffset> for f64 {
    fn from(offset: BannerOffset) -> Self {
        offset.0
    }
}

/// Identity record of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub banner_offset_y: BannerOffset,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Copy the persisted fields of `update` onto this snapshot.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        self.full_name = update.full_name.clone();
        self.email = update.email.clone();
        self.phone = update.phone.clone();
        self.avatar_url = update.avatar_url.clone();
        self.banner_url = update.banner_url.clone();
        self.banner_offset_y = update.banner_offset_y;
        self.updated_at = Some(update.updated_at);
    }

    pub(crate) fn add(db: &Db, new_profile: NewProfile) -> Result<Self> {
        if Self::find_model(db, &new_profile.user_id)?.is_some() {
            return Err(Error::DuplicateProfile(new_profile.user_id));
        }

        let mut model = ProfileModel::new(Uid::new(db)?, &new_profile.user_id, &new_profile.email);
        model.full_name = new_profile.full_name;
        model.phone = new_profile.phone;

        db.write().transaction_mut(|t| -> Result<DbId> {
            let profile_id = t
                .exec_mut(QueryBuilder::insert().element(&model).query())?
                .elements
                .first()
                .expect("ProfileModel insertion should return the ID as the first element")
                .id;

            t.exec_mut(
                QueryBuilder::insert()
                    .edges()
                    .from("profiles")
                    .to(profile_id)
                    .query(),
            )?;

            Ok(profile_id)
        })?;

        debug!("Added profile: {}", model.user_id);

        Self::try_from(model)
    }

    pub(crate) fn find(db: &Db, user_id: &str) -> Result<Option<Self>> {
        Self::find_model(db, user_id)?
            .map(Self::try_from)
            .transpose()
    }

    pub(crate) fn list(db: &Db) -> Result<Vec<Self>> {
        let mut models: Vec<ProfileModel> = db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<ProfileModel>()
                    .search()
                    .from("profiles")
                    .query(),
            )?
            .try_into()?;
        models.sort_by_key(|m| m.uid);

        models.into_iter().map(Self::try_from).collect()
    }

    /// Overwrite the persisted fields of a profile in one write.
    pub(crate) fn update(db: &Db, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        let db_id = Self::find_model(db, user_id)?
            .and_then(|m| m.db_id)
            .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))?;

        db.write().exec_mut(
            QueryBuilder::insert()
                .values([[
                    ("full_name", update.full_name.as_str()).into(),
                    ("email", update.email.as_str()).into(),
                    ("phone", update.phone.as_str()).into(),
                    ("avatar_url", update.avatar_url.as_deref().unwrap_or_default()).into(),
                    ("banner_url", update.banner_url.as_deref().unwrap_or_default()).into(),
                    ("banner_offset_y", update.banner_offset_y.get()).into(),
                    ("updated_at", update.updated_at.to_rfc3339()).into(),
                ]])
                .ids(db_id)
                .query(),
        )?;

        Ok(())
    }

    fn find_model(db: &Db, user_id: &str) -> Result<Option<ProfileModel>> {
        let models: Vec<ProfileModel> = db
            .read()
            .exec(
                QueryBuilder::select()
                    .elements::<ProfileModel>()
                    .search()
                    .from("profiles")
                    .where_()
                    .key("user_id")
                    .value(user_id)
                    .query(),
            )?
            .try_into()?;

        Ok(models.into_iter().next())
    }
}

impl TryFrom<ProfileModel> for Profile {
    type Error = Error;

    fn try_from(model: ProfileModel) -> Result<Self> {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);

        let updated_at = match model.updated_at.as_str() {
            "" => None,
            value => Some(parse_timestamp(value)?),
        };

        Ok(Self {
            user_id: model.user_id,
            full_name: model.full_name,
            email: model.email,
            phone: model.phone,
            avatar_url: non_empty(model.avatar_url),
            banner_url: non_empty(model.banner_url),
            banner_offset_y: BannerOffset::new(model.banner_offset_y),
            updated_at,
        })
    }
}

/// Fields supplied at registration.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
}

impl NewProfile {
    pub fn new(user_id: &str, email: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            full_name: String::new(),
            phone: String::new(),
        }
    }

    pub fn full_name(mut self, full_name: &str) -> Self {
        self.full_name = full_name.to_string();
        self
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.phone = phone.to_string();
        self
    }
}

/// Everything a profile save writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    /// `None` is stored as null
    pub avatar_url: Option<String>,
    /// `None` is stored as null
    pub banner_url: Option<String>,
    pub banner_offset_y: BannerOffset,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use crate::{
        Error, Repository,
        backend::ProfileStore,
        repository::{BannerOffset, NewProfile, ProfileUpdate},
    };

    fn update() -> ProfileUpdate {
        ProfileUpdate {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+911234567890".into(),
            avatar_url: Some("https://cdn.test/profile-avatars/avatars/u1-1.png".into()),
            banner_url: None,
            banner_offset_y: BannerOffset::new(-35.0),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_add() {
        let repo = Repository::mock();

        let profile = repo
            .add_profile(NewProfile::new("u1", "ada@example.com").full_name("Ada"))
            .unwrap();

        assert_eq!(profile.full_name, "Ada");
        assert_eq!(profile.avatar_url, None);
        assert_eq!(profile.banner_offset_y, BannerOffset::default());
        assert_eq!(profile.updated_at, None);
        assert_eq!(repo.profile("u1").unwrap(), Some(profile));
    }

    #[test]
    fn test_add_duplicate() {
        let repo = Repository::mock();

        repo.add_profile(NewProfile::new("u1", "a@example.com"))
            .unwrap();

        assert!(matches!(
            repo.add_profile(NewProfile::new("u1", "b@example.com")),
            Err(Error::DuplicateProfile(_))
        ));
    }

    #[test]
    fn test_list() {
        let repo = Repository::mock();

        assert!(repo.profiles().unwrap().is_empty());

        repo.add_profile(NewProfile::new("u1", "a@example.com"))
            .unwrap();
        repo.add_profile(NewProfile::new("u2", "b@example.com"))
            .unwrap();

        let ids: Vec<_> = repo
            .profiles()
            .unwrap()
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        assert_eq!(ids, ["u1", "u2"]);
    }

    #[test]
    fn test_update() {
        let repo = Repository::mock();
        repo.add_profile(NewProfile::new("u1", "old@example.com"))
            .unwrap();
        repo.add_profile(NewProfile::new("u2", "other@example.com"))
            .unwrap();

        repo.update_profile("u1", &update()).unwrap();

        let profile = repo.profile("u1").unwrap().unwrap();
        assert_eq!(profile.full_name, "Ada Lovelace");
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.phone, "+911234567890");
        assert_eq!(profile.avatar_url, update().avatar_url);
        assert_eq!(profile.banner_url, None);
        assert_eq!(profile.banner_offset_y.get(), -35.0);
        assert_eq!(profile.updated_at, Some(update().updated_at));

        // Other profiles are untouched
        let other = repo.profile("u2").unwrap().unwrap();
        assert_eq!(other.email, "other@example.com");
    }

    #[test]
    fn test_update_missing_profile() {
        let repo = Repository::mock();

        assert!(matches!(
            repo.update_profile("ghost", &update()),
            Err(Error::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_banner_offset_clamps() {
        assert_eq!(BannerOffset::new(500.0).get(), BannerOffset::MAX);
        assert_eq!(BannerOffset::new(-500.0).get(), BannerOffset::MIN);
        assert_eq!(BannerOffset::new(f64::NAN).get(), 0.0);
        assert_eq!(BannerOffset::new(150.0).shifted(80.0).get(), 200.0);
    }
}
