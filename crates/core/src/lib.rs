//! Core library: workspace scanning, classification, snapshots, file access,
//! Markdown previews and the failures/funnel feeds.

pub mod browser;
pub mod classifier;
pub mod config;
pub mod content;
pub mod feeds;
pub mod markdown;
pub mod models;
pub mod scanner;
pub mod snapshot;
