//! Subhunter - Subtitle acquisition for media libraries
//!
//! Finds catalog items missing a target-language subtitle, fetches one from a
//! subtitle provider (translating a fallback-language subtitle when needed),
//! and places it next to the media or in a staging directory.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod catalog;
pub mod provider;
pub mod translate;
pub mod subtitle;
pub mod placement;
pub mod discovery;
pub mod error;
