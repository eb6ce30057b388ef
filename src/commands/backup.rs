//! Backup command - Copy a profile directory before it is modified

use anyhow::{bail, Context, Result};
use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use fs_extra::dir::{self, CopyOptions};
use owo_colors::OwoColorize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::Builder;

use super::utils;
use chrome_profile_migrate::chrome::artifacts;
use chrome_profile_migrate::config;

/// Execute the backup command
pub fn execute(profile: &str, archive: bool) -> Result<()> {
    let profile = config::expand_tilde(profile);
    let backup_path = create_backup(&profile, archive)?;

    println!("{} {}", "Backup saved at:".green(), backup_path.display());
    Ok(())
}

/// Copy `profile` next to itself as `<profile>.backup_<timestamp>[.tar.gz]`
pub fn create_backup(profile: &Path, archive: bool) -> Result<PathBuf> {
    if !profile.is_dir() {
        bail!("Profile directory does not exist: {}", profile.display());
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = backup_path_for(profile, &timestamp, archive);
    if backup_path.exists() {
        bail!("Backup already exists: {}", backup_path.display());
    }

    println!("Creating backup at: {}", backup_path.display());

    if archive {
        write_archive(profile, &backup_path)?;
    } else {
        let options = CopyOptions::new().copy_inside(true);
        dir::copy(profile, &backup_path, &options).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                profile.display(),
                backup_path.display()
            )
        })?;
    }

    let size = if archive {
        fs::metadata(&backup_path)?.len()
    } else {
        artifacts::dir_size(&backup_path)
    };
    println!(
        "{} backup created ({})",
        "Done:".green(),
        utils::format_size(size)
    );

    Ok(backup_path)
}

fn backup_path_for(profile: &Path, timestamp: &str, archive: bool) -> PathBuf {
    let mut name = profile.as_os_str().to_os_string();
    name.push(format!(".backup_{}", timestamp));
    if archive {
        name.push(".tar.gz");
    }
    PathBuf::from(name)
}

/// Write a gzip tar holding the profile under its directory name
fn write_archive(profile: &Path, backup_path: &Path) -> Result<()> {
    let prefix = profile
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("Profile path has no directory name")?;

    let file = File::create(backup_path)
        .with_context(|| format!("Failed to create: {}", backup_path.display()))?;

    let encoder = GzEncoder::new(file, Compression::default());
    let mut archive = Builder::new(encoder);

    add_dir_to_archive(&mut archive, profile, &prefix)?;

    let encoder = archive.into_inner()?;
    encoder.finish()?;
    Ok(())
}

/// Add a directory recursively to the archive
fn add_dir_to_archive<W: Write>(
    archive: &mut Builder<W>,
    source: &Path,
    prefix: &str,
) -> Result<()> {
    for entry in walkdir::WalkDir::new(source)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let relative = path
            .strip_prefix(source)
            .with_context(|| format!("Failed to strip prefix from: {}", path.display()))?;

        let archive_path = if relative.as_os_str().is_empty() {
            PathBuf::from(prefix)
        } else {
            PathBuf::from(prefix).join(relative)
        };

        if path.is_dir() {
            archive.append_dir(&archive_path, path)?;
        } else if path.is_file() {
            archive.append_path_with_name(path, &archive_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tar::Archive;

    fn sample_profile(root: &Path) -> PathBuf {
        let profile = root.join("Profile 16");
        fs::create_dir_all(profile.join("Extensions/abc")).unwrap();
        fs::write(profile.join("Bookmarks"), "{}").unwrap();
        fs::write(profile.join("Extensions/abc/manifest.json"), "{}").unwrap();
        profile
    }

    #[test]
    fn test_backup_path_for() {
        let path = backup_path_for(Path::new("/chrome/Profile 16"), "20250101_120000", false);
        assert_eq!(path, PathBuf::from("/chrome/Profile 16.backup_20250101_120000"));

        let path = backup_path_for(Path::new("/chrome/Default"), "20250101_120000", true);
        assert_eq!(
            path,
            PathBuf::from("/chrome/Default.backup_20250101_120000.tar.gz")
        );
    }

    #[test]
    fn test_directory_backup() {
        let root = tempfile::tempdir().unwrap();
        let profile = sample_profile(root.path());

        let backup = create_backup(&profile, false).unwrap();

        assert!(backup.join("Bookmarks").exists());
        assert!(backup.join("Extensions/abc/manifest.json").exists());
        assert!(profile.join("Bookmarks").exists());
    }

    #[test]
    fn test_archive_backup() {
        let root = tempfile::tempdir().unwrap();
        let profile = sample_profile(root.path());

        let backup = create_backup(&profile, true).unwrap();

        let mut archive = Archive::new(GzDecoder::new(File::open(&backup).unwrap()));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "Profile 16/Bookmarks"));
        assert!(names
            .iter()
            .any(|n| n == "Profile 16/Extensions/abc/manifest.json"));
    }

    #[test]
    fn test_backup_missing_profile() {
        let root = tempfile::tempdir().unwrap();
        assert!(create_backup(&root.path().join("absent"), false).is_err());
    }
}
