//! Platform-specific paths and the migration config file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file, looked up in the working directory
pub const CONFIG_FILE: &str = "migrate.toml";

/// Get the Chrome user data directory holding the profile folders
/// - macOS: ~/Library/Application Support/Google/Chrome/
/// - Linux: ~/.config/google-chrome/
/// - Windows: %LOCALAPPDATA%/Google/Chrome/User Data/
pub fn chrome_user_data_dir() -> Result<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home
            .join("Library")
            .join("Application Support")
            .join("Google")
            .join("Chrome"))
    }

    #[cfg(target_os = "linux")]
    {
        let config = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config.join("google-chrome"))
    }

    #[cfg(target_os = "windows")]
    {
        let local = dirs::data_local_dir().context("Could not determine LocalAppData directory")?;
        Ok(local.join("Google").join("Chrome").join("User Data"))
    }
}

/// Get the default directory for profile copies (~/backups/)
pub fn backups_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join("backups"))
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

/// Source and destination profile directories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfilePaths {
    #[serde(default)]
    pub from_profile: String,
    #[serde(default)]
    pub to_profile: String,
}

impl ProfilePaths {
    pub fn is_complete(&self) -> bool {
        !self.from_profile.trim().is_empty() && !self.to_profile.trim().is_empty()
    }

    pub fn from_path(&self) -> PathBuf {
        expand_tilde(self.from_profile.trim())
    }

    pub fn to_path(&self) -> PathBuf {
        expand_tilde(self.to_profile.trim())
    }
}

/// What to migrate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MigrationOptions {
    /// Extensions, extension settings and the Preferences files they need
    pub extensions: bool,
    pub bookmarks: bool,
    /// Custom search engines (omnibox keywords)
    pub keyword_searches: bool,
    pub profile_picture: bool,
    /// Open tabs and windows; off by default since it restores old sessions
    pub tabs: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            extensions: true,
            bookmarks: true,
            keyword_searches: true,
            profile_picture: true,
            tabs: false,
        }
    }
}

/// A toggle in `MigrationOptions`, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationItem {
    Extensions,
    Bookmarks,
    KeywordSearches,
    ProfilePicture,
    Tabs,
}

impl MigrationItem {
    pub const ALL: [MigrationItem; 5] = [
        Self::Extensions,
        Self::Bookmarks,
        Self::KeywordSearches,
        Self::ProfilePicture,
        Self::Tabs,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Self::Extensions => "Extensions and extension settings",
            Self::Bookmarks => "Bookmarks and bookmark folders",
            Self::KeywordSearches => "Custom search engines (omnibox keywords)",
            Self::ProfilePicture => "Google profile picture",
            Self::Tabs => "Open tabs and windows (restores last session)",
        }
    }
}

impl MigrationOptions {
    pub fn get(&self, item: MigrationItem) -> bool {
        match item {
            MigrationItem::Extensions => self.extensions,
            MigrationItem::Bookmarks => self.bookmarks,
            MigrationItem::KeywordSearches => self.keyword_searches,
            MigrationItem::ProfilePicture => self.profile_picture,
            MigrationItem::Tabs => self.tabs,
        }
    }

    pub fn set(&mut self, item: MigrationItem, enabled: bool) {
        let flag = match item {
            MigrationItem::Extensions => &mut self.extensions,
            MigrationItem::Bookmarks => &mut self.bookmarks,
            MigrationItem::KeywordSearches => &mut self.keyword_searches,
            MigrationItem::ProfilePicture => &mut self.profile_picture,
            MigrationItem::Tabs => &mut self.tabs,
        };
        *flag = enabled;
    }

    pub fn toggle(&mut self, item: MigrationItem) {
        self.set(item, !self.get(item));
    }

    pub fn set_all(&mut self, enabled: bool) {
        for item in MigrationItem::ALL {
            self.set(item, enabled);
        }
    }

    pub fn any_enabled(&self) -> bool {
        MigrationItem::ALL.iter().any(|&item| self.get(item))
    }

    /// Enabled items in menu order
    pub fn enabled(&self) -> Vec<MigrationItem> {
        MigrationItem::ALL
            .into_iter()
            .filter(|&item| self.get(item))
            .collect()
    }
}

/// Contents of `migrate.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MigrateConfig {
    pub profiles: ProfilePaths,
    #[serde(default)]
    pub migrate: MigrationOptions,
}

impl MigrateConfig {
    pub fn new(from_profile: &Path, to_profile: &Path) -> Self {
        Self {
            profiles: ProfilePaths {
                from_profile: from_profile.to_string_lossy().to_string(),
                to_profile: to_profile.to_string_lossy().to_string(),
            },
            migrate: MigrationOptions::default(),
        }
    }

    /// Load the config; `None` if the file is absent or lacks either profile path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse: {}", path.display()))?;

        Ok(config.profiles.is_complete().then_some(config))
    }

    /// Write the config file
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write: {}", path.as_ref().display()))?;
        Ok(())
    }
}
