//! Chrome profile data operations

pub mod artifacts;
pub mod keywords;
pub mod profile;

// Re-exports for library consumers
pub use keywords::{merge_keywords, MergeOptions, MergeReport};
pub use profile::{discover_profiles, Profile};
