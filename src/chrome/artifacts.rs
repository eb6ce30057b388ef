//! Profile artifacts copied file-by-file between profile directories

use anyhow::{Context, Result};
use fs_extra::dir::{self, CopyOptions};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// A group of profile items migrated together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactGroup {
    Extensions,
    /// `Preferences` files Chrome needs to recognize copied extensions
    ExtensionPreferences,
    Bookmarks,
    ProfilePicture,
    Tabs,
}

impl ArtifactGroup {
    /// File and directory names inside a profile directory
    pub fn items(self) -> &'static [&'static str] {
        match self {
            Self::Extensions => &[
                "Extensions",
                "Extension Rules",
                "DNR Extension Rules",
                "Extension Scripts",
                "Extension State",
                "Local Extension Settings",
            ],
            Self::ExtensionPreferences => &["Preferences", "Secure Preferences"],
            Self::Bookmarks => &["Bookmarks", "Bookmarks.bak"],
            Self::ProfilePicture => &["Google Profile Picture.png"],
            Self::Tabs => &["Sessions", "Session Storage"],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Extensions => "Extensions",
            Self::ExtensionPreferences => "Extension Preferences",
            Self::Bookmarks => "Bookmarks",
            Self::ProfilePicture => "Profile Picture",
            Self::Tabs => "Tabs & Sessions",
        }
    }
}

/// What an item's entry count means, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Extensions,
    SessionFiles,
}

/// Result of copying one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied {
        name: String,
        size_bytes: u64,
        /// Directories only: extension folders or session files, where counted
        entries: Option<(usize, EntryKind)>,
        replaced: bool,
    },
    Missing {
        name: String,
    },
    Failed {
        name: String,
        reason: String,
    },
}

impl CopyOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Copied { name, .. } | Self::Missing { name } | Self::Failed { name, .. } => name,
        }
    }
}

/// Copy every item of a group; a failing item does not stop the others
pub fn copy_group(group: ArtifactGroup, from_profile: &Path, to_profile: &Path) -> Vec<CopyOutcome> {
    group
        .items()
        .iter()
        .map(|name| copy_item(name, from_profile, to_profile))
        .collect()
}

/// Copy one named item, replacing an existing destination directory
pub fn copy_item(name: &str, from_profile: &Path, to_profile: &Path) -> CopyOutcome {
    let source = from_profile.join(name);
    let dest = to_profile.join(name);

    if !source.exists() {
        debug!("{} not found in source profile", source.display());
        return CopyOutcome::Missing {
            name: name.to_string(),
        };
    }

    let result = if source.is_dir() {
        replace_dir(&source, &dest).map(|replaced| {
            let entries = count_entries(name, &dest);
            (dir_size(&dest), entries, replaced)
        })
    } else {
        let replaced = dest.exists();
        fs::copy(&source, &dest)
            .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))
            .map(|size| (size, None, replaced))
    };

    match result {
        Ok((size_bytes, entries, replaced)) => CopyOutcome::Copied {
            name: name.to_string(),
            size_bytes,
            entries,
            replaced,
        },
        Err(e) => CopyOutcome::Failed {
            name: name.to_string(),
            reason: format!("{:#}", e),
        },
    }
}

/// Remove `dst` if present, then copy `src` to it; returns whether something was removed
fn replace_dir(src: &Path, dst: &Path) -> Result<bool> {
    let replaced = dst.exists();
    if replaced {
        let removed = if dst.is_dir() {
            fs::remove_dir_all(dst)
        } else {
            fs::remove_file(dst)
        };
        removed.with_context(|| format!("Failed to remove existing {}", dst.display()))?;
    }

    let options = CopyOptions::new().copy_inside(true);
    dir::copy(src, dst, &options)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(replaced)
}

/// Extension folders in `Extensions`, session files in `Sessions`
fn count_entries(name: &str, dir: &Path) -> Option<(usize, EntryKind)> {
    let (kind, want_dirs) = match name {
        "Extensions" => (EntryKind::Extensions, true),
        "Sessions" => (EntryKind::SessionFiles, false),
        _ => return None,
    };

    let count = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() == want_dirs)
        .count();
    Some((count, kind))
}

/// Total size of the files below a directory
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_copy_file_item() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();
        write(&from.path().join("Bookmarks"), "{\"roots\":{}}");

        let outcome = copy_item("Bookmarks", from.path(), to.path());

        assert_eq!(
            outcome,
            CopyOutcome::Copied {
                name: "Bookmarks".to_string(),
                size_bytes: 12,
                entries: None,
                replaced: false,
            }
        );
        assert_eq!(
            fs::read_to_string(to.path().join("Bookmarks")).unwrap(),
            "{\"roots\":{}}"
        );
    }

    #[test]
    fn test_missing_item_is_reported() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();

        let outcome = copy_item("Google Profile Picture.png", from.path(), to.path());

        assert_eq!(
            outcome,
            CopyOutcome::Missing {
                name: "Google Profile Picture.png".to_string()
            }
        );
        assert!(!to.path().join("Google Profile Picture.png").exists());
    }

    #[test]
    fn test_directory_replaces_existing() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();
        write(&from.path().join("Extensions/abc/1.0/manifest.json"), "{}");
        write(&from.path().join("Extensions/def/2.0/manifest.json"), "{}");
        write(&to.path().join("Extensions/stale/manifest.json"), "{}");

        let outcome = copy_item("Extensions", from.path(), to.path());

        match outcome {
            CopyOutcome::Copied {
                entries, replaced, ..
            } => {
                assert_eq!(entries, Some((2, EntryKind::Extensions)));
                assert!(replaced);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(to.path().join("Extensions/abc/1.0/manifest.json").exists());
        assert!(!to.path().join("Extensions/stale").exists());
    }

    #[test]
    fn test_sessions_count_files() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();
        write(&from.path().join("Sessions/Session_1"), "a");
        write(&from.path().join("Sessions/Tabs_1"), "b");

        let outcome = copy_item("Sessions", from.path(), to.path());

        match outcome {
            CopyOutcome::Copied { entries, .. } => {
                assert_eq!(entries, Some((2, EntryKind::SessionFiles)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_copy_group_continues_past_missing_items() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();
        write(&from.path().join("Bookmarks.bak"), "{}");

        let outcomes = copy_group(ArtifactGroup::Bookmarks, from.path(), to.path());

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], CopyOutcome::Missing { .. }));
        assert!(matches!(outcomes[1], CopyOutcome::Copied { .. }));
        assert_eq!(outcomes[1].name(), "Bookmarks.bak");
    }

    #[test]
    fn test_failed_copy_is_reported() {
        let from = tempfile::tempdir().unwrap();
        write(&from.path().join("Preferences"), "{}");
        let missing_dest = from.path().join("no-such-dir");

        let outcome = copy_item("Preferences", from.path(), &missing_dest);

        assert!(matches!(outcome, CopyOutcome::Failed { .. }));
    }

    #[test]
    fn test_group_items() {
        assert_eq!(ArtifactGroup::Extensions.items().len(), 6);
        assert_eq!(
            ArtifactGroup::ExtensionPreferences.items(),
            &["Preferences", "Secure Preferences"]
        );
        assert_eq!(ArtifactGroup::Tabs.items(), &["Sessions", "Session Storage"]);
    }

    #[test]
    fn test_dir_size() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a"), "12345");
        write(&dir.path().join("nested/b"), "123");

        assert_eq!(dir_size(dir.path()), 8);
    }
}
