//! Chrome profile discovery
//!
//! Profiles live directly under the user data directory as `Default` and
//! `Profile N`, each holding a `Preferences` JSON file.

use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// A profile directory found under the Chrome user data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Directory name, e.g. `Default` or `Profile 3`
    pub name: String,
    pub path: PathBuf,
}

impl Profile {
    /// The name shown in Chrome's profile picker (`profile.name` in Preferences)
    pub fn display_name(&self) -> Option<String> {
        let content = fs::read_to_string(self.path.join("Preferences")).ok()?;
        let prefs: serde_json::Value = serde_json::from_str(&content).ok()?;
        prefs
            .get("profile")
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
            .map(String::from)
    }
}

/// List profiles under `chrome_dir`, `Default` first, then `Profile N` by number
pub fn discover_profiles(chrome_dir: &Path) -> Result<Vec<Profile>> {
    let mut profiles = Vec::new();

    if !chrome_dir.exists() {
        return Ok(profiles);
    }

    let entries = fs::read_dir(chrome_dir)
        .with_context(|| format!("Failed to read: {}", chrome_dir.display()))?;

    for entry in entries.flatten() {
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name != "Default" && !name.starts_with("Profile ") {
            continue;
        }

        let path = entry.path();
        if !path.join("Preferences").exists() {
            continue;
        }

        profiles.push(Profile { name, path });
    }

    profiles.sort_by(|a, b| compare_profile_names(&a.name, &b.name));
    Ok(profiles)
}

fn compare_profile_names(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

fn sort_key(name: &str) -> (u8, u64, &str) {
    if name == "Default" {
        return (0, 0, name);
    }
    match name.strip_prefix("Profile ").and_then(|n| n.parse().ok()) {
        Some(number) => (1, number, name),
        None => (2, 0, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_profile(root: &Path, name: &str, prefs: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Preferences"), prefs).unwrap();
    }

    #[test]
    fn test_discover_profiles_sorted() {
        let root = tempfile::tempdir().unwrap();
        make_profile(root.path(), "Profile 10", "{}");
        make_profile(root.path(), "Profile 2", "{}");
        make_profile(root.path(), "Default", "{}");
        make_profile(root.path(), "Profile Guest", "{}");

        let names: Vec<String> = discover_profiles(root.path())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["Default", "Profile 2", "Profile 10", "Profile Guest"]);
    }

    #[test]
    fn test_discover_skips_non_profiles() {
        let root = tempfile::tempdir().unwrap();
        make_profile(root.path(), "Default", "{}");
        make_profile(root.path(), "System Profile", "{}");
        fs::create_dir_all(root.path().join("Profile 1")).unwrap();
        fs::write(root.path().join("Local State"), "{}").unwrap();

        let profiles = discover_profiles(root.path()).unwrap();

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "Default");
        assert_eq!(profiles[0].path, root.path().join("Default"));
    }

    #[test]
    fn test_discover_missing_dir() {
        let profiles = discover_profiles(Path::new("/nonexistent/chrome/dir")).unwrap();
        assert!(profiles.is_empty());
    }

    #[test]
    fn test_display_name() {
        let root = tempfile::tempdir().unwrap();
        make_profile(root.path(), "Profile 1", r#"{"profile": {"name": "Work"}}"#);
        make_profile(root.path(), "Profile 2", "not json");

        let profiles = discover_profiles(root.path()).unwrap();

        assert_eq!(profiles[0].display_name(), Some("Work".to_string()));
        assert_eq!(profiles[1].display_name(), None);
    }
}
