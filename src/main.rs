//! chrome-profile-migrate: move profile data between Chrome profiles
//!
//! This tool is not affiliated with or endorsed by Google. It only touches
//! profile files stored locally on your machine.

use anyhow::Result;
use chrome_profile_migrate::{config, logging};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "chrome-profile-migrate")]
#[command(about = "Migrate extensions, bookmarks and keyword searches between Chrome profiles", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file with profile paths and default selections
    #[arg(long, global = true, default_value = config::CONFIG_FILE)]
    config: PathBuf,

    /// Show diagnostic logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate selected data from the source profile to the destination profile
    Migrate {
        /// Source profile directory (overrides the config file)
        #[arg(long)]
        from: Option<String>,

        /// Destination profile directory (overrides the config file)
        #[arg(long)]
        to: Option<String>,

        /// Skip the selection menu and prompts, use the config file selection
        #[arg(short, long)]
        yes: bool,

        /// Back up the destination as a .tar.gz archive
        #[arg(long)]
        archive: bool,

        /// Show what would be done without making changes
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Read the source Web Data in place instead of through a temporary copy
        #[arg(long)]
        no_snapshot: bool,
    },

    /// Merge custom search engines (omnibox keywords) between two profiles
    Keywords {
        /// Source profile directory
        from_profile: String,

        /// Destination profile directory
        to_profile: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Read the source Web Data in place instead of through a temporary copy
        #[arg(long)]
        no_snapshot: bool,
    },

    /// List Chrome profiles on this machine
    List {
        /// Chrome user data directory (defaults to the platform location)
        #[arg(long)]
        chrome_dir: Option<PathBuf>,
    },

    /// Pick source and destination profiles and write the config file
    Init,

    /// Back up a profile directory
    Backup {
        /// Profile directory to back up
        profile: String,

        /// Write a .tar.gz archive instead of a directory copy
        #[arg(long)]
        archive: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Migrate {
            from,
            to,
            yes,
            archive,
            dry_run,
            no_snapshot,
        } => {
            if dry_run {
                println!("{}", "(DRY-RUN MODE - no changes will be made)".blue());
            }
            let args = commands::migrate::MigrateArgs {
                from,
                to,
                yes,
                archive,
                dry_run,
                no_snapshot,
            };
            commands::migrate::execute(&cli.config, args)?;
        }

        Commands::Keywords {
            from_profile,
            to_profile,
            json,
            no_snapshot,
        } => {
            commands::keywords::execute(&from_profile, &to_profile, json, no_snapshot)?;
        }

        Commands::List { chrome_dir } => {
            let output = commands::list::execute(chrome_dir)?;
            println!("{}", output);
        }

        Commands::Init => {
            commands::init::execute(&cli.config)?;
        }

        Commands::Backup { profile, archive } => {
            commands::backup::execute(&profile, archive)?;
        }
    }

    Ok(())
}
