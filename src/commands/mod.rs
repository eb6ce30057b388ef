//! CLI commands

pub mod backup;
pub mod init;
pub mod keywords;
pub mod list;
pub mod menu;
pub mod migrate;
pub mod utils;
