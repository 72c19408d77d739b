//! Configuration loading for tunecast.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Get the tunecast home directory (~/.tunecast).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".tunecast"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.tunecast/settings.json
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

/// Load and validate settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}. Run 'tunecast setup' first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Write settings as pretty JSON, creating the parent directory.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.playlist_limit == 0 {
        return Err(Error::Config("playlist_limit must be greater than 0".to_string()));
    }
    if settings.duration_limit_secs == 0 {
        return Err(Error::Config(
            "duration_limit_secs must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// tunecast settings.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    pub bot_token: Option<String>,

    /// Users allowed to request video playback.
    #[serde(default)]
    pub sudoers: Vec<u64>,

    /// Users whose commands are ignored entirely.
    #[serde(default)]
    pub blacklist: Vec<u64>,

    #[serde(default = "default_duration_limit_secs")]
    pub duration_limit_secs: u64,

    #[serde(default = "default_playlist_limit")]
    pub playlist_limit: usize,

    #[serde(default = "default_support_chat")]
    pub support_chat: String,

    /// Chat that receives play logs while the logger flag is on.
    pub log_chat_id: Option<i64>,

    pub downloads_dir: Option<PathBuf>,

    pub database_path: Option<PathBuf>,

    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,

    pub cookies_path: Option<PathBuf>,

    /// External streamer invoked as `<cmd> --chat <id> --file <path> [--video]`.
    pub player_command: Option<String>,
}

fn default_duration_limit_secs() -> u64 {
    3600
}

fn default_playlist_limit() -> usize {
    20
}

fn default_support_chat() -> String {
    "@tunecast_support".to_string()
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: None,
            sudoers: Vec::new(),
            blacklist: Vec::new(),
            duration_limit_secs: default_duration_limit_secs(),
            playlist_limit: default_playlist_limit(),
            support_chat: default_support_chat(),
            log_chat_id: None,
            downloads_dir: None,
            database_path: None,
            ytdlp_path: default_ytdlp_path(),
            cookies_path: None,
            player_command: None,
        }
    }
}

impl Settings {
    pub fn is_sudoer(&self, user_id: u64) -> bool {
        self.sudoers.contains(&user_id)
    }

    pub fn is_blacklisted(&self, user_id: u64) -> bool {
        self.blacklist.contains(&user_id)
    }

    /// Downloads directory, falling back to ~/.tunecast/downloads.
    pub fn downloads_dir(&self) -> Result<PathBuf> {
        match &self.downloads_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_home_dir()?.join("downloads")),
        }
    }

    /// SQLite database path, falling back to ~/.tunecast/settings.db.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_home_dir()?.join("settings.db")),
        }
    }
}
