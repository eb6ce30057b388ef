//! List command - Show Chrome profiles found on this machine

use anyhow::{Context, Result};
use chrome_profile_migrate::chrome::keywords::{count_custom_keywords, web_data_path};
use chrome_profile_migrate::chrome::{discover_profiles, Profile};
use chrome_profile_migrate::config;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Execute the list command
pub fn execute(chrome_dir: Option<PathBuf>) -> Result<String> {
    let chrome_dir = match chrome_dir {
        Some(dir) => dir,
        None => config::chrome_user_data_dir()
            .context("Failed to determine Chrome user data directory")?,
    };

    let profiles = discover_profiles(&chrome_dir)?;
    if profiles.is_empty() {
        return Ok(format!(
            "No Chrome profiles found in {}",
            chrome_dir.display()
        ));
    }

    Ok(format_profiles(&profiles))
}

/// Render profiles as a numbered table
pub fn format_profiles(profiles: &[Profile]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Profile"),
        Cell::new("Name"),
        Cell::new("Keywords"),
        Cell::new("Modified"),
        Cell::new("Path"),
    ]);

    for (i, profile) in profiles.iter().enumerate() {
        let display_name = profile.display_name().unwrap_or_else(|| "-".to_string());

        // A locked or corrupt Web Data should not hide the profile
        let keywords = match count_custom_keywords(&web_data_path(&profile.path)) {
            Ok(count) => count.to_string(),
            Err(e) => {
                warn!("{e}");
                "?".to_string()
            }
        };

        let modified = fs::metadata(profile.path.join("Preferences"))
            .and_then(|m| m.modified())
            .ok()
            .map(|t| {
                chrono::DateTime::<chrono::Local>::from(t)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&profile.name),
            Cell::new(display_name),
            Cell::new(keywords),
            Cell::new(modified),
            Cell::new(profile.path.display()),
        ]);
    }

    format!("{}\n\n{} profiles found", table, profiles.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_empty_dir() {
        let root = tempfile::tempdir().unwrap();
        let output = execute(Some(root.path().to_path_buf())).unwrap();
        assert!(output.starts_with("No Chrome profiles found"));
    }

    #[test]
    fn test_format_profiles() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Default");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Preferences"), r#"{"profile": {"name": "Personal"}}"#).unwrap();

        let output = execute(Some(root.path().to_path_buf())).unwrap();

        assert!(output.contains("Default"));
        assert!(output.contains("Personal"));
        assert!(output.ends_with("1 profiles found"));
    }
}
