//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // URL
    pub url: String,
    pub root: String,
    /// Write `name/index.html` instead of `name.html` for documents
    /// without a permalink
    pub pretty_urls: bool,
    /// Rewrite links to `.md` files without a permalink to their `.html` URL
    pub relative_link_fallback: bool,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    pub layouts_dir: String,
    /// Glob patterns (relative to the source dir) that are neither rendered nor copied
    #[serde(default)]
    pub exclude: Vec<String>,

    // Writing
    pub default_layout: String,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub toc: TocConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "mdsite".to_string(),
            description: String::new(),
            author: String::new(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),
            pretty_urls: false,
            relative_link_fallback: false,

            source_dir: ".".to_string(),
            public_dir: "_site".to_string(),
            layouts_dir: "_layouts".to_string(),
            exclude: Vec::new(),

            default_layout: "default".to_string(),
            highlight: HighlightConfig::default(),
            toc: TocConfig::default(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        // An empty file deserializes to null rather than an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SiteConfig =
            serde_yaml::from_str(&content).with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub line_number: bool,
    /// Name of a syntect bundled theme
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            line_number: false,
            theme: "InspiredGitHub".to_string(),
        }
    }
}

/// Table of contents configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    pub enable: bool,
    pub max_depth: usize,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            enable: true,
            max_depth: 3,
        }
    }
}
