//! chrome-profile-migrate library
//!
//! Copies profile data (extensions, bookmarks, preferences, profile picture,
//! sessions) between Chrome profile directories and merges custom keyword
//! searches between their `Web Data` databases.
//!
//! This tool is not affiliated with or endorsed by Google. It only reads and
//! writes profile files stored locally on your machine.

pub mod chrome;
pub mod config;
pub mod logging;
