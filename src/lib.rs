//! mdsite: a small static site generator for Markdown articles
//!
//! Documents are Markdown files with an optional YAML front-matter block.
//! Each one has its links to other documents resolved to their permalinks,
//! is rendered to HTML and wrapped in a Tera layout.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Name of the configuration file at the site root
pub const CONFIG_FILE: &str = "_config.yml";

/// A site on disk
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Site layouts directory
    pub layouts_dir: PathBuf,
}

impl Site {
    /// Open a site from a directory. A relative path is taken from the
    /// current directory, so every site path is absolute.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let base_dir = if base_dir.is_absolute() {
            base_dir.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Failed to resolve the current directory")?
                .join(base_dir)
        };
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let source_dir = join_dir(&base_dir, &config.source_dir);
        let public_dir = join_dir(&base_dir, &config.public_dir);
        let layouts_dir = join_dir(&base_dir, &config.layouts_dir);

        Ok(Self {
            config,
            base_dir,
            source_dir,
            public_dir,
            layouts_dir,
        })
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<generator::BuildReport> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new document
    pub fn new_document(&self, title: &str, layout: Option<&str>) -> Result<PathBuf> {
        commands::new::create_document(self, title, layout, None)
    }
}

fn join_dir(base: &Path, dir: &str) -> PathBuf {
    if dir.is_empty() || dir == "." {
        base.to_path_buf()
    } else {
        base.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.source_dir, dir.path());
        assert_eq!(site.public_dir, dir.path().join("_site"));
        assert_eq!(site.layouts_dir, dir.path().join("_layouts"));
    }

    #[test]
    fn test_relative_base_is_made_absolute() {
        let site = Site::new("rel-site").unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(site.base_dir, cwd.join("rel-site"));
        assert_eq!(site.public_dir, cwd.join("rel-site/_site"));
        assert!(site.source_dir.is_absolute());
    }

    #[test]
    fn test_site_dirs_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "source_dir: articles\npublic_dir: public\n",
        )
        .unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.source_dir, dir.path().join("articles"));
        assert_eq!(site.public_dir, dir.path().join("public"));
    }
}
