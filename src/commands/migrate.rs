//! Migrate command - Copy selected profile data from one profile to another
//!
//! Steps:
//! - Resolve profiles from the config file and CLI overrides
//! - Make sure Chrome is closed
//! - Pick what to migrate
//! - Back up the destination profile
//! - Copy artifacts, then merge keyword searches

use anyhow::{bail, Context, Result};
use chrome_profile_migrate::chrome::artifacts::{copy_group, ArtifactGroup, CopyOutcome};
use chrome_profile_migrate::chrome::keywords::web_data_path;
use chrome_profile_migrate::chrome::MergeOptions;
use chrome_profile_migrate::config::{self, MigrateConfig, MigrationOptions};
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{backup, init, keywords, menu, utils};

/// Migrate command arguments
#[derive(Debug, Clone, Default)]
pub struct MigrateArgs {
    /// Overrides `from_profile` from the config file
    pub from: Option<String>,
    /// Overrides `to_profile` from the config file
    pub to: Option<String>,
    /// Non-interactive: no menu, no prompts
    pub yes: bool,
    /// Back up the destination as .tar.gz instead of a directory copy
    pub archive: bool,
    pub dry_run: bool,
    /// Read the source `Web Data` in place instead of through a temporary copy
    pub no_snapshot: bool,
}

/// Resolved profile directories and selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub from_profile: PathBuf,
    pub to_profile: PathBuf,
    pub options: MigrationOptions,
}

/// Combine CLI overrides with the config file; `None` if a profile path is missing
pub fn resolve_plan(loaded: Option<MigrateConfig>, args: &MigrateArgs) -> Option<MigrationPlan> {
    let from_profile = args
        .from
        .as_deref()
        .map(config::expand_tilde)
        .or_else(|| loaded.as_ref().map(|c| c.profiles.from_path()))?;
    let to_profile = args
        .to
        .as_deref()
        .map(config::expand_tilde)
        .or_else(|| loaded.as_ref().map(|c| c.profiles.to_path()))?;
    let options = loaded.map(|c| c.migrate).unwrap_or_default();

    Some(MigrationPlan {
        from_profile,
        to_profile,
        options,
    })
}

/// Artifact groups to copy, in order; preferences must follow extensions
pub fn planned_groups(options: &MigrationOptions) -> Vec<ArtifactGroup> {
    let mut groups = Vec::new();
    if options.extensions {
        groups.push(ArtifactGroup::Extensions);
        groups.push(ArtifactGroup::ExtensionPreferences);
    }
    if options.bookmarks {
        groups.push(ArtifactGroup::Bookmarks);
    }
    if options.profile_picture {
        groups.push(ArtifactGroup::ProfilePicture);
    }
    if options.tabs {
        groups.push(ArtifactGroup::Tabs);
    }
    groups
}

/// Execute the migrate command
pub fn execute(config_path: &Path, args: MigrateArgs) -> Result<()> {
    let loaded = MigrateConfig::load(config_path)?;

    let Some(mut plan) = resolve_plan(loaded, &args) else {
        if args.yes {
            bail!(
                "No profiles configured. Run `init` or pass --from and --to (config: {})",
                config_path.display()
            );
        }
        println!(
            "{} No usable {} found. Let's set up your profiles.",
            "Note:".yellow(),
            config_path.display()
        );
        return init::execute(config_path);
    };

    println!();
    println!("{}", "=== Chrome Profile Migration ===".green());
    println!("  FROM: {}", plan.from_profile.display());
    println!("  TO:   {}", plan.to_profile.display());

    if !args.dry_run && !ensure_chrome_closed(args.yes)? {
        println!("Migration cancelled.");
        return Ok(());
    }

    if !validate_paths(&plan, &args)? {
        println!("Migration cancelled.");
        return Ok(());
    }

    if !args.yes {
        menu::run_menu(&mut plan.options)?;
    }

    if !plan.options.any_enabled() {
        println!("{}", "No items selected for migration. Exiting.".yellow());
        return Ok(());
    }

    println!();
    println!("Will migrate:");
    for item in plan.options.enabled() {
        println!("  {} {}", "+".green(), item.description());
    }

    if args.dry_run {
        println!();
        println!("{}", "(DRY-RUN) No changes made.".blue());
        return Ok(());
    }

    println!();
    let backup_path = backup::create_backup(&plan.to_profile, args.archive)
        .context("Backup failed, nothing was migrated")?;

    let mut failures = 0;
    for group in planned_groups(&plan.options) {
        println!();
        println!("{}", format!("=== Copying {} ===", group.title()).green());
        if group == ArtifactGroup::Tabs {
            println!("  {} this restores your old open tabs and windows", "Note:".yellow());
        }

        for outcome in copy_group(group, &plan.from_profile, &plan.to_profile) {
            utils::print_copy_outcome(&outcome);
            if matches!(outcome, CopyOutcome::Failed { .. }) {
                failures += 1;
            }
        }
    }

    if plan.options.keyword_searches {
        failures += migrate_keywords(&plan, !args.no_snapshot);
    }

    println!();
    if failures == 0 {
        println!("{}", "=== Migration complete! ===".green());
    } else {
        println!(
            "{}",
            format!("=== Migration finished with {} failure(s) ===", failures).yellow()
        );
    }
    println!("Backup saved at: {}", backup_path.display());
    println!();
    println!("You can now start Chrome and verify the migration.");
    println!("If anything went wrong, restore from the backup.");

    Ok(())
}

/// Merge keywords; returns the number of failures to count in the summary
fn migrate_keywords(plan: &MigrationPlan, snapshot_source: bool) -> usize {
    keywords::print_header(&plan.from_profile, &plan.to_profile);

    if !web_data_path(&plan.from_profile).exists() {
        println!(
            "  {} Web Data not found in source, skipping keyword searches",
            "Skipping".yellow()
        );
        return 0;
    }

    let options = MergeOptions { snapshot_source };
    match keywords::run(&plan.from_profile, &plan.to_profile, &options) {
        Ok(report) => {
            utils::print_merge_report(&report);
            report.failed.len()
        }
        Err(e) => {
            eprintln!("  {} {:#}", "Failed:".red(), e);
            1
        }
    }
}

/// Returns false if the user declined to continue
fn ensure_chrome_closed(yes: bool) -> Result<bool> {
    match utils::is_chrome_running() {
        Ok(false) => Ok(true),
        Ok(true) => {
            if yes {
                bail!("Chrome is running. Please close it completely before migrating.");
            }
            println!("{} Chrome is currently running!", "Warning:".yellow());
            if !utils::confirm("Chrome must be closed for migration. Close it now?")? {
                return Ok(false);
            }
            utils::prompt_line("Please close Chrome, then press Enter to continue...")?;
            Ok(true)
        }
        Err(e) => {
            warn!("could not check if Chrome is running: {e}");
            println!("{} Could not check if Chrome is running: {}", "Note:".yellow(), e);
            Ok(true)
        }
    }
}

/// Returns false if the user declined to create a missing destination
fn validate_paths(plan: &MigrationPlan, args: &MigrateArgs) -> Result<bool> {
    if !plan.from_profile.exists() {
        bail!(
            "Source profile not found: {}",
            plan.from_profile.display()
        );
    }
    println!("{} source profile", "Found:".green());

    if plan.to_profile.exists() {
        println!("{} destination profile", "Found:".green());
        return Ok(true);
    }

    println!(
        "{} destination profile not found: {}",
        "Warning:".yellow(),
        plan.to_profile.display()
    );
    if args.dry_run {
        println!("  {} would create it", "[DRY-RUN]".blue());
        return Ok(true);
    }
    if !args.yes && !utils::confirm("Destination doesn't exist. Create it?")? {
        return Ok(false);
    }

    fs::create_dir_all(&plan.to_profile)
        .with_context(|| format!("Failed to create: {}", plan.to_profile.display()))?;
    println!("{} {}", "Created:".green(), plan.to_profile.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrome_profile_migrate::config::ProfilePaths;

    fn loaded() -> Option<MigrateConfig> {
        Some(MigrateConfig {
            profiles: ProfilePaths {
                from_profile: "/cfg/from".to_string(),
                to_profile: "/cfg/to".to_string(),
            },
            migrate: MigrationOptions {
                tabs: true,
                ..MigrationOptions::default()
            },
        })
    }

    #[test]
    fn test_resolve_plan_from_config() {
        let plan = resolve_plan(loaded(), &MigrateArgs::default()).unwrap();
        assert_eq!(plan.from_profile, PathBuf::from("/cfg/from"));
        assert_eq!(plan.to_profile, PathBuf::from("/cfg/to"));
        assert!(plan.options.tabs);
    }

    #[test]
    fn test_resolve_plan_cli_overrides() {
        let args = MigrateArgs {
            to: Some("/cli/to".to_string()),
            ..MigrateArgs::default()
        };
        let plan = resolve_plan(loaded(), &args).unwrap();
        assert_eq!(plan.from_profile, PathBuf::from("/cfg/from"));
        assert_eq!(plan.to_profile, PathBuf::from("/cli/to"));
    }

    #[test]
    fn test_resolve_plan_without_config() {
        assert!(resolve_plan(None, &MigrateArgs::default()).is_none());

        let args = MigrateArgs {
            from: Some("/a".to_string()),
            to: Some("/b".to_string()),
            ..MigrateArgs::default()
        };
        let plan = resolve_plan(None, &args).unwrap();
        assert_eq!(plan.options, MigrationOptions::default());
    }

    #[test]
    fn test_planned_groups_default() {
        assert_eq!(
            planned_groups(&MigrationOptions::default()),
            vec![
                ArtifactGroup::Extensions,
                ArtifactGroup::ExtensionPreferences,
                ArtifactGroup::Bookmarks,
                ArtifactGroup::ProfilePicture,
            ]
        );
    }

    #[test]
    fn test_planned_groups_tabs_only() {
        let mut options = MigrationOptions::default();
        options.set_all(false);
        options.tabs = true;
        options.keyword_searches = true;
        assert_eq!(planned_groups(&options), vec![ArtifactGroup::Tabs]);
    }

    #[test]
    fn test_non_interactive_run() {
        let root = tempfile::tempdir().unwrap();
        let from = root.path().join("from");
        let to = root.path().join("to");
        fs::create_dir_all(from.join("Extensions/abc")).unwrap();
        fs::write(from.join("Extensions/abc/manifest.json"), "{}").unwrap();
        fs::write(from.join("Bookmarks"), "{\"roots\":{}}").unwrap();
        fs::write(from.join("Preferences"), "{}").unwrap();
        fs::create_dir_all(&to).unwrap();
        fs::write(to.join("Bookmarks"), "old").unwrap();

        let plan = MigrationPlan {
            from_profile: from.clone(),
            to_profile: to.clone(),
            options: MigrationOptions::default(),
        };
        for group in planned_groups(&plan.options) {
            copy_group(group, &plan.from_profile, &plan.to_profile);
        }
        // No Web Data in source: skipped without failures
        assert_eq!(migrate_keywords(&plan, true), 0);

        assert_eq!(fs::read_to_string(to.join("Bookmarks")).unwrap(), "{\"roots\":{}}");
        assert!(to.join("Extensions/abc/manifest.json").exists());
        assert!(to.join("Preferences").exists());
        assert!(!to.join("Web Data").exists());
    }
}
