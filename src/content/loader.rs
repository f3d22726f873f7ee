//! Content loader - finds and loads documents from the source directory

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::document::relative_source;
use super::{ContentError, Document};
use crate::Site;

/// Files found in the source directory
#[derive(Debug, Default)]
pub struct SourceFiles {
    /// Markdown documents, in path order
    pub documents: Vec<PathBuf>,
    /// Everything else that gets copied verbatim
    pub assets: Vec<PathBuf>,
}

/// Documents that loaded, and the files that didn't
#[derive(Debug, Default)]
pub struct LoadedContent {
    pub documents: Vec<Document>,
    pub failures: Vec<ContentError>,
}

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    exclude: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let exclude = site
            .config
            .exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern {:?}", p))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { site, exclude })
    }

    /// Walk the source directory
    pub fn scan(&self) -> SourceFiles {
        let source_dir = &self.site.source_dir;
        let mut files = SourceFiles::default();
        if !source_dir.exists() {
            tracing::warn!("Source directory {:?} does not exist", source_dir);
            return files;
        }

        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_skipped(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if is_markdown_file(&path) {
                files.documents.push(path);
            } else {
                files.assets.push(path);
            }
        }

        files
    }

    /// Load the given markdown files. A file that fails doesn't stop the others.
    pub fn load(&self, paths: &[PathBuf]) -> LoadedContent {
        let source_dir = &self.site.source_dir;
        let results: Vec<_> = paths
            .par_iter()
            .map(|path| Document::load(source_dir, path))
            .collect();

        let mut content = LoadedContent::default();
        for result in results {
            match result {
                Ok(doc) => content.documents.push(doc),
                Err(e) => {
                    tracing::warn!("{}", e);
                    content.failures.push(e);
                }
            }
        }
        content
    }

    /// Scan and load every document
    pub fn load_all(&self) -> (LoadedContent, Vec<PathBuf>) {
        let files = self.scan();
        let content = self.load(&files.documents);
        tracing::info!(
            "Loaded {} documents ({} failed), {} assets",
            content.documents.len(),
            content.failures.len(),
            files.assets.len()
        );
        (content, files.assets)
    }

    /// Hidden and `_`-prefixed entries, the output directory, and excluded paths
    fn is_skipped(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('_') || name.starts_with('.') {
            return true;
        }

        let path = entry.path();
        if path == self.site.public_dir || path == self.site.layouts_dir {
            return true;
        }

        let relative = relative_source(&self.site.source_dir, path);
        self.exclude.iter().any(|p| p.matches(&relative))
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(base: &Path, relative: &str, content: &str) {
        let path = base.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_skips_special_entries() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        write(base, "_config.yml", "exclude:\n  - drafts/**\n  - README.md\n");
        write(base, "index.md", "home");
        write(base, "kotlin/enums.md", "enums");
        write(base, "kotlin/img/enum.png", "png");
        write(base, "_layouts/post.html", "layout");
        write(base, "_site/old.html", "old");
        write(base, ".git/HEAD", "ref");
        write(base, "drafts/wip.md", "wip");
        write(base, "README.md", "readme");

        let site = Site::new(base).unwrap();
        let loader = ContentLoader::new(&site).unwrap();
        let files = loader.scan();

        let docs: Vec<_> = files
            .documents
            .iter()
            .map(|p| relative_source(base, p))
            .collect();
        assert_eq!(docs, vec!["index.md", "kotlin/enums.md"]);

        let assets: Vec<_> = files
            .assets
            .iter()
            .map(|p| relative_source(base, p))
            .collect();
        assert_eq!(assets, vec!["kotlin/img/enum.png"]);
    }

    #[test]
    fn test_load_reports_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        write(base, "good.md", "---\ntitle: Good\n---\nBody");
        write(base, "bad.md", "---\ntitle: X\nBody");

        let site = Site::new(base).unwrap();
        let loader = ContentLoader::new(&site).unwrap();
        let (content, _) = loader.load_all();

        assert_eq!(content.documents.len(), 1);
        assert_eq!(content.documents[0].title(), "Good");
        assert_eq!(content.failures.len(), 1);
        assert!(matches!(
            &content.failures[0],
            ContentError::MalformedFrontMatter { path, .. } if path.ends_with("bad.md")
        ));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "exclude:\n  - \"[\"\n").unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(ContentLoader::new(&site).is_err());
    }
}
