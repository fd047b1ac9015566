use std::{fs, io, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;
use urbaneye_lib::fs::config_dir;

use crate::config::theme::Theme;

mod theme;

const CURRENT_CONFIG_VERSION: u16 = 1;
const FILE_NAME: &str = "gui.toml";

/// Handle to the front end's configuration
pub type Cfg = Arc<RwLock<GuiConfig>>;

/// The front end's configuration, serialized to TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    pub version: u16,
    pub theme: Theme,
    pub profile_page: ProfilePage,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePage {
    /// Seconds between refreshes of the relative post times
    pub clock_interval_secs: u64,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            theme: Theme::default(),
            profile_page: ProfilePage {
                clock_interval_secs: 60,
            },
        }
    }
}

impl GuiConfig {
    /// Read `gui.toml`, writing the defaults out when there is none yet. A broken file is
    /// reported and replaced by the defaults in memory.
    pub fn load() -> Self {
        let path = match config_dir() {
            Ok(dir) => dir.join(FILE_NAME),
            Err(e) => {
                warn!("No GUI config directory, using defaults: {e}");
                return Self::default();
            }
        };

        if !path.exists() {
            let cfg = Self::default();
            if let Err(e) = cfg.save() {
                warn!("Failed to write default GUI config: {e}");
            }
            return cfg;
        }

        match fs::read_to_string(&path).map(|contents| toml::from_str::<Self>(&contents)) {
            Ok(Ok(cfg)) => {
                if cfg.version != CURRENT_CONFIG_VERSION {
                    warn!(
                        "GUI config version {} differs from {CURRENT_CONFIG_VERSION}",
                        cfg.version
                    );
                }
                cfg
            }
            Ok(Err(e)) => {
                warn!("Malformed {}: {e}", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> io::Result<()> {
        let contents = toml::to_string_pretty(self).map_err(io::Error::other)?;

        fs::write(config_dir()?.join(FILE_NAME), contents)
    }

    pub fn theme(&self) -> iced::Theme {
        (&self.theme).into()
    }
}
