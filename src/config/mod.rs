//! Configuration module for Shelfmark
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use shelfmark::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shelfmark.toml")).unwrap();
//! println!("Subject limit: {}", config.crawler.subject_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, Engine, IdentityConfig, OutputConfig, SelectorConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::engine_warnings;
