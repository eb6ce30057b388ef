//! Keywords command - Merge only the custom search engines of two profiles

use anyhow::{Context, Result};
use chrome_profile_migrate::chrome::keywords::web_data_path;
use chrome_profile_migrate::chrome::{merge_keywords, MergeOptions, MergeReport};
use chrome_profile_migrate::config;
use owo_colors::OwoColorize;
use std::path::Path;

use super::utils;

/// Execute the keywords command
pub fn execute(from_profile: &str, to_profile: &str, json: bool, no_snapshot: bool) -> Result<()> {
    let from_profile = config::expand_tilde(from_profile);
    let to_profile = config::expand_tilde(to_profile);

    let options = MergeOptions {
        snapshot_source: !no_snapshot,
    };

    if json {
        let report = run(&from_profile, &to_profile, &options)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_header(&from_profile, &to_profile);
        let report = run(&from_profile, &to_profile, &options)?;
        utils::print_merge_report(&report);
    }

    Ok(())
}

/// Merge `<from>/Web Data` into `<to>/Web Data`
pub fn run(from_profile: &Path, to_profile: &Path, options: &MergeOptions) -> Result<MergeReport> {
    merge_keywords(
        &web_data_path(from_profile),
        &web_data_path(to_profile),
        options,
    )
    .with_context(|| format!("Keyword migration from {} failed", from_profile.display()))
}

pub fn print_header(from_profile: &Path, to_profile: &Path) {
    println!();
    println!("{}", "=== Migrating Keyword Searches ===".green());
    println!(
        "  {} -> {}",
        web_data_path(from_profile).display(),
        web_data_path(to_profile).display()
    );
}
