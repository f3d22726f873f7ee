//! Document model

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ContentError, Result};
use super::FrontMatter;
use crate::config::SiteConfig;
use crate::helpers::{encode_path, full_url_for, url_for};

/// One Markdown file, immutable once loaded
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Path relative to the source directory, `/`-separated
    pub source: String,

    /// Full source file path
    pub full_source: PathBuf,

    /// Parsed front matter
    pub front_matter: FrontMatter,

    /// Raw markdown body, without the front-matter block
    pub body: String,
}

impl Document {
    /// Build a document from raw file text
    pub fn parse(source: impl Into<String>, full_source: PathBuf, text: &str) -> Result<Self> {
        let (front_matter, body) = FrontMatter::parse(text, &full_source)?;
        Ok(Self {
            source: source.into(),
            body: body.to_string(),
            front_matter,
            full_source,
        })
    }

    /// Read a document from disk. `source_dir` is used to derive the relative path.
    pub fn load(source_dir: &Path, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ContentError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let source = relative_source(source_dir, path);
        Self::parse(source, path.to_path_buf(), &text)
    }

    /// Title from front matter, or the file stem
    pub fn title(&self) -> String {
        self.front_matter
            .title()
            .unwrap_or_else(|| self.stem().to_string())
    }

    pub fn description(&self) -> Option<String> {
        self.front_matter.description()
    }

    pub fn layout(&self) -> Option<String> {
        self.front_matter.layout()
    }

    pub fn permalink(&self) -> Option<String> {
        self.front_matter.permalink()
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        let name = self.source.rsplit('/').next().unwrap_or(&self.source);
        strip_markdown_ext(name)
    }

    /// Site path before the root prefix is applied, always starting with `/`
    fn site_path(&self, config: &SiteConfig) -> String {
        match self.permalink() {
            Some(permalink) => format!("/{}", permalink.trim_start_matches('/')),
            None => default_site_path(&self.source, config.pretty_urls),
        }
    }

    /// Site path with filename-derived segments percent-encoded.
    /// Declared permalinks are used as written.
    fn encoded_site_path(&self, config: &SiteConfig) -> String {
        let path = self.site_path(config);
        if self.permalink().is_some() {
            path
        } else {
            encode_path(&path)
        }
    }

    /// Public URL of the rendered page, including the configured root
    pub fn url(&self, config: &SiteConfig) -> String {
        url_for(config, &self.encoded_site_path(config))
    }

    /// Absolute URL, with the site's domain
    pub fn full_url(&self, config: &SiteConfig) -> String {
        full_url_for(config, &self.encoded_site_path(config))
    }

    /// Output file path, relative to the public directory
    pub fn output_path(&self, config: &SiteConfig) -> PathBuf {
        let path = self.site_path(config);
        let mut out: PathBuf = path
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .collect();

        let is_file = path
            .rsplit('/')
            .next()
            .map(|last| last.ends_with(".html") || last.ends_with(".htm"))
            .unwrap_or(false);

        if !is_file {
            out.push("index.html");
        }
        out
    }
}

/// Filename-derived site path for documents without a permalink
fn default_site_path(source: &str, pretty_urls: bool) -> String {
    let without_ext = strip_markdown_ext(source);

    if without_ext == "index" || without_ext.ends_with("/index") {
        let dir = without_ext.strip_suffix("index").unwrap_or(without_ext);
        return format!("/{}", dir);
    }

    if pretty_urls {
        format!("/{}/", without_ext)
    } else {
        format!("/{}.html", without_ext)
    }
}

fn strip_markdown_ext(name: &str) -> &str {
    name.strip_suffix(".md")
        .or_else(|| name.strip_suffix(".markdown"))
        .unwrap_or(name)
}

/// `/`-separated path of `path` relative to `source_dir`
pub(crate) fn relative_source(source_dir: &Path, path: &Path) -> String {
    path.strip_prefix(source_dir)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source: &str, text: &str) -> Document {
        Document::parse(source, PathBuf::from(source), text).unwrap()
    }

    #[test]
    fn test_title_falls_back_to_stem() {
        let d = doc("kotlin/sealed-classes.md", "# Sealed");
        assert_eq!(d.title(), "sealed-classes");
        let d = doc("a.md", "---\ntitle: Sealed classes\n---\n");
        assert_eq!(d.title(), "Sealed classes");
    }

    #[test]
    fn test_output_from_permalink() {
        let config = SiteConfig::default();
        let d = doc("x.md", "---\npermalink: /kotlin/enums/\n---\n");
        assert_eq!(d.url(&config), "/kotlin/enums/");
        assert_eq!(d.output_path(&config), PathBuf::from("kotlin/enums/index.html"));

        let d = doc("x.md", "---\npermalink: kotlin/enums.html\n---\n");
        assert_eq!(d.url(&config), "/kotlin/enums.html");
        assert_eq!(d.output_path(&config), PathBuf::from("kotlin/enums.html"));

        let d = doc("x.md", "---\npermalink: /kotlin/enums\n---\n");
        assert_eq!(d.output_path(&config), PathBuf::from("kotlin/enums/index.html"));

        let d = doc("x.md", "---\npermalink: /\n---\n");
        assert_eq!(d.output_path(&config), PathBuf::from("index.html"));
    }

    #[test]
    fn test_permalink_cannot_escape_public_dir() {
        let config = SiteConfig::default();
        let d = doc("x.md", "---\npermalink: /../../etc/\n---\n");
        assert_eq!(d.output_path(&config), PathBuf::from("etc/index.html"));
    }

    #[test]
    fn test_output_from_filename() {
        let mut config = SiteConfig::default();
        let d = doc("kotlin/null safety.md", "text");
        assert_eq!(d.url(&config), "/kotlin/null%20safety.html");
        assert_eq!(d.output_path(&config), PathBuf::from("kotlin/null safety.html"));

        config.pretty_urls = true;
        assert_eq!(d.url(&config), "/kotlin/null%20safety/");
        assert_eq!(
            d.output_path(&config),
            PathBuf::from("kotlin/null safety/index.html")
        );
    }

    #[test]
    fn test_index_documents() {
        let config = SiteConfig::default();
        let d = doc("index.md", "home");
        assert_eq!(d.url(&config), "/");
        assert_eq!(d.output_path(&config), PathBuf::from("index.html"));

        let d = doc("ksp/index.markdown", "ksp");
        assert_eq!(d.url(&config), "/ksp/");
        assert_eq!(d.output_path(&config), PathBuf::from("ksp/index.html"));
    }

    #[test]
    fn test_root_prefix() {
        let config = SiteConfig {
            root: "/kotlin-book/".to_string(),
            ..Default::default()
        };
        let d = doc("x.md", "---\npermalink: /foo/\n---\n");
        assert_eq!(d.url(&config), "/kotlin-book/foo/");
        assert_eq!(d.full_url(&config), "http://example.com/kotlin-book/foo/");
        assert_eq!(d.output_path(&config), PathBuf::from("foo/index.html"));
    }

    #[test]
    fn test_relative_source() {
        let base = Path::new("/site");
        assert_eq!(
            relative_source(base, Path::new("/site/kotlin/enums.md")),
            "kotlin/enums.md"
        );
    }
}
