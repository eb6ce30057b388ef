//! Init command - Discover profiles and write the config file

use anyhow::{bail, Result};
use chrome_profile_migrate::chrome::{discover_profiles, Profile};
use chrome_profile_migrate::config::{self, MigrateConfig};
use chrono::Local;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

use super::{list, utils};

/// A parsed profile selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileChoice {
    /// `0` in the destination prompt
    Backup,
    Listed(PathBuf),
    Custom(PathBuf),
    Invalid(String),
}

/// Interpret an answer as a list number (1-based) or a path
pub fn parse_profile_choice(input: &str, profiles: &[Profile], allow_backup: bool) -> ProfileChoice {
    let input = input.trim();
    if input.is_empty() {
        return ProfileChoice::Invalid("Please enter a number or path".to_string());
    }

    match input.parse::<usize>() {
        Ok(0) if allow_backup => ProfileChoice::Backup,
        Ok(n) if (1..=profiles.len()).contains(&n) => {
            ProfileChoice::Listed(profiles[n - 1].path.clone())
        }
        Ok(_) => ProfileChoice::Invalid(format!(
            "Please enter {}a number between 1 and {}",
            if allow_backup { "0 or " } else { "" },
            profiles.len()
        )),
        Err(_) => ProfileChoice::Custom(config::expand_tilde(input)),
    }
}

/// Default destination for a fresh copy: ~/backups/<source name>_<YYYYMMDD>
pub fn default_copy_destination(backups_dir: &Path, source: &Path, date: &str) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "profile".to_string());
    backups_dir.join(format!("{}_{}", name, date))
}

/// Execute the init command
pub fn execute(config_path: &Path) -> Result<()> {
    let chrome_dir = config::chrome_user_data_dir()?;

    println!("Discovering Chrome profiles in {}...", chrome_dir.display());
    let profiles = discover_profiles(&chrome_dir)?;

    if profiles.is_empty() {
        bail!(
            "No Chrome profiles found in {}. Create {} by hand with [profiles] from_profile/to_profile.",
            chrome_dir.display(),
            config_path.display()
        );
    }

    println!();
    println!("{}", list::format_profiles(&profiles));

    let from_profile = select_source(&profiles)?;
    println!("{} {}", "Source:".green(), from_profile.display());

    let date = Local::now().format("%Y%m%d").to_string();
    let backup_target = default_copy_destination(&config::backups_dir()?, &from_profile, &date);
    let to_profile = select_destination(&profiles, &backup_target)?;
    println!("{} {}", "Destination:".green(), to_profile.display());

    let cfg = MigrateConfig::new(&from_profile, &to_profile);
    cfg.write(config_path)?;

    println!();
    println!("{} {}", "Created:".green(), config_path.display());
    println!("  FROM: {}", from_profile.display());
    println!("  TO:   {}", to_profile.display());
    println!();
    println!("Edit the file to change paths or default selections, then run:");
    println!("  chrome-profile-migrate migrate");

    Ok(())
}

fn select_source(profiles: &[Profile]) -> Result<PathBuf> {
    println!();
    println!("{}", "SELECT SOURCE PROFILE (to migrate FROM):".green());
    println!("Enter a number from the list or a custom path (e.g. ~/Desktop/backup/Profile)");

    loop {
        let answer = utils::prompt_line("\nYour choice (number or path): ")?;
        match parse_profile_choice(&answer, profiles, false) {
            ProfileChoice::Listed(path) => return Ok(path),
            ProfileChoice::Custom(path) if path.exists() => return Ok(path),
            ProfileChoice::Custom(path) => {
                println!("{} {}", "Path does not exist:".yellow(), path.display());
                if !utils::confirm("Try again?")? {
                    bail!("Source profile selection cancelled");
                }
            }
            ProfileChoice::Backup => {
                println!("Please enter a number between 1 and {}", profiles.len())
            }
            ProfileChoice::Invalid(message) => println!("{}", message),
        }
    }
}

fn select_destination(profiles: &[Profile], backup_target: &Path) -> Result<PathBuf> {
    println!();
    println!("{}", "SELECT DESTINATION (to migrate TO):".green());
    println!("0. Create a copy in ~/backups/ (recommended)");
    println!("   -> {}", backup_target.display());
    println!("Or enter a number from the list above, or a custom path");

    loop {
        let answer = utils::prompt_line("\nYour choice (0 for backup, number, or path): ")?;
        match parse_profile_choice(&answer, profiles, true) {
            ProfileChoice::Backup => return Ok(backup_target.to_path_buf()),
            ProfileChoice::Listed(path) => return Ok(path),
            ProfileChoice::Custom(path) if path.exists() => return Ok(path),
            ProfileChoice::Custom(path) => {
                println!("{} {}", "Path does not exist:".yellow(), path.display());
                // Created later, when the migration validates paths
                if utils::confirm("Use it anyway?")? {
                    return Ok(path);
                }
            }
            ProfileChoice::Invalid(message) => println!("{}", message),
        }
    }
}
