use chrono::{DateTime, Utc};

use crate::{
    header::upload::LocalPreview,
    repository::{BannerOffset, Profile, ProfileUpdate},
};

/// Where a profile image currently comes from.
#[derive(Debug, Default)]
pub enum ImageSource {
    #[default]
    None,
    Remote(String),
    /// A picked file shown before storage confirms it. `fallback` is the remote URL it replaces,
    /// which is what gets saved if the upload never completes.
    Preview {
        preview: LocalPreview,
        fallback: Option<String>,
    },
}

impl ImageSource {
    pub fn from_url(url: Option<&str>) -> Self {
        match url {
            Some(url) if !url.is_empty() => Self::Remote(url.to_string()),
            _ => Self::None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// URL that may be written to the profile store. Local previews never are.
    pub fn persisted_url(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Remote(url) => Some(url),
            Self::Preview { fallback, .. } => fallback.as_deref(),
        }
    }

    pub fn preview(&self) -> Option<&LocalPreview> {
        match self {
            Self::Preview { preview, .. } => Some(preview),
            _ => None,
        }
    }
}

/// Local editable copy of a [`Profile`].
#[derive(Debug, Default)]
pub struct ProfileDraft {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub avatar: ImageSource,
    pub banner: ImageSource,
    pub banner_offset_y: BannerOffset,
}

impl ProfileDraft {
    /// The write that persists this draft.
    pub fn to_update(&self, now: DateTime<Utc>) -> ProfileUpdate {
        ProfileUpdate {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            avatar_url: self.avatar.persisted_url().map(str::to_string),
            banner_url: self.banner.persisted_url().map(str::to_string),
            banner_offset_y: self.banner_offset_y,
            updated_at: now,
        }
    }
}

impl From<&Profile> for ProfileDraft {
    fn from(profile: &Profile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            avatar: ImageSource::from_url(profile.avatar_url.as_deref()),
            banner: ImageSource::from_url(profile.banner_url.as_deref()),
            banner_offset_y: profile.banner_offset_y,
        }
    }
}
