use std::{fs, path::PathBuf, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    Result,
    fs::{config_dir, data_dir},
};

const FILE_NAME: &str = "core.toml";

/// Handle to the library's core configuration
pub type Cfg = Arc<RwLock<CoreConfig>>;

/// The library's core configuration, serialized to TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Directory holding one subdirectory per blob bucket
    storage_dir: PathBuf,
    /// Prefix of the public URLs handed out for uploaded blobs. Defaults to a `file://` URL of
    /// `storage_dir`.
    public_url_base: Option<String>,
    signed_in_user: Option<String>,
    /// Where this configuration is saved. `None` keeps it in memory only.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl CoreConfig {
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join(FILE_NAME);

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let mut cfg: Self = toml::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed {FILE_NAME}: {err}");
                Self::default()
            });
            cfg.path = Some(path);
            cfg.resolve_storage_dir()?;
            Ok(cfg)
        } else {
            let mut cfg = Self {
                path: Some(path),
                ..Self::default()
            };
            cfg.resolve_storage_dir()?;
            cfg.save()?;
            Ok(cfg)
        }
    }

    /// An unset storage directory falls back to `storage` under the data directory.
    fn resolve_storage_dir(&mut self) -> Result<()> {
        if self.storage_dir.as_os_str().is_empty() {
            self.storage_dir = data_dir()?.join("storage");
        }

        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let contents = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, contents)?;

        Ok(())
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone()
    }

    pub fn public_url_base(&self) -> String {
        self.public_url_base
            .clone()
            .unwrap_or_else(|| format!("file://{}", self.storage_dir.display()))
    }

    pub fn signed_in_user(&self) -> Option<&str> {
        self.signed_in_user.as_deref()
    }

    pub fn set_signed_in_user(&mut self, user_id: Option<String>) {
        self.signed_in_user = user_id;
    }

    #[cfg(test)]
    pub(crate) fn mock() -> Self {
        Self {
            storage_dir: tempfile::tempdir().unwrap().keep(),
            public_url_base: None,
            signed_in_user: None,
            path: None,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::new(),
            public_url_base: None,
            signed_in_user: None,
            path: None,
        }
    }
}
