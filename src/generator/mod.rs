//! Generator module - renders documents into static HTML files

use anyhow::{Context as _, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tera::Context;

use crate::content::{relative_source, Document, LinkResolver, MarkdownRenderer};
use crate::helpers::{escape_html, toc};
use crate::templates::{NavEntry, PageData, SiteData, TemplateRenderer};
use crate::Site;

/// A file that could not be published
#[derive(Debug, Clone)]
pub struct BuildFailure {
    pub path: PathBuf,
    pub message: String,
}

/// A document left out because another one already claimed its output path
#[derive(Debug, Clone)]
pub struct SkippedDuplicate {
    pub source: String,
    pub kept: String,
    pub output: PathBuf,
}

/// Outcome of a build
#[derive(Debug, Default)]
pub struct BuildReport {
    pub rendered: usize,
    pub copied: usize,
    pub failures: Vec<BuildFailure>,
    pub duplicates: Vec<SkippedDuplicate>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Static site generator
pub struct Generator<'a> {
    site: &'a Site,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(site: &'a Site) -> Result<Self> {
        let templates = TemplateRenderer::load(&site.layouts_dir)?;
        let markdown = MarkdownRenderer::with_options(&site.config.highlight);

        Ok(Self {
            site,
            templates,
            markdown,
        })
    }

    /// Build site data for templates
    pub fn build_site_data(&self, documents: &[Document]) -> SiteData {
        let config = &self.site.config;
        let mut entries: Vec<NavEntry> = documents
            .iter()
            .map(|doc| NavEntry {
                title: escape_html(&doc.title()),
                url: escape_html(&doc.url(config)),
                source: escape_html(&doc.source),
            })
            .collect();
        entries.sort_by(|a, b| a.source.cmp(&b.source));

        SiteData {
            title: escape_html(&config.title),
            description: escape_html(&config.description),
            author: escape_html(&config.author),
            url: escape_html(&config.url),
            root: escape_html(&config.root),
            documents: entries,
        }
    }

    /// Render one document to a complete HTML page
    pub fn render_document(
        &self,
        doc: &Document,
        links: &LinkResolver,
        site_data: &SiteData,
    ) -> Result<String> {
        let config = &self.site.config;

        let body = links.resolve(&doc.body, &doc.source);
        let rendered = self.markdown.render(&body);

        let toc_html = if config.toc.enable {
            toc(&rendered.headings, config.toc.max_depth)
        } else {
            String::new()
        };

        let layout = self.templates.resolve_layout(
            doc.layout().as_deref(),
            &config.default_layout,
            &doc.source,
        );

        let page = PageData {
            title: escape_html(&doc.title()),
            description: doc.description().map(|d| escape_html(&d)),
            keywords: doc
                .front_matter
                .keywords()
                .iter()
                .map(|k| escape_html(k))
                .collect(),
            url: escape_html(&doc.url(config)),
            permalink: escape_html(&doc.full_url(config)),
            source: escape_html(&doc.source),
            layout: layout.clone(),
            front_matter: &doc.front_matter,
        };

        let mut context = Context::new();
        context.insert("site", site_data);
        context.insert("page", &page);
        context.insert("content", &rendered.html);
        context.insert("toc", &toc_html);

        self.templates
            .render(&layout, &context)
            .with_context(|| format!("Failed to render {} with layout {:?}", doc.source, layout))
    }

    /// Render and write every document, then copy the static assets.
    ///
    /// A document that fails is recorded in the report; the rest still get written.
    pub fn generate(&self, documents: &[Document], assets: &[PathBuf]) -> Result<BuildReport> {
        let public_dir = &self.site.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        let mut report = BuildReport::default();
        let outputs = self.assign_outputs(documents, &mut report);

        let links = LinkResolver::new(documents, &self.site.config);
        let site_data = self.build_site_data(documents);

        tracing::info!("Rendering {} documents", outputs.len());

        let results: Vec<_> = outputs
            .par_iter()
            .map(|(output, doc)| {
                let result = self
                    .render_document(doc, &links, &site_data)
                    .and_then(|html| write_file(&public_dir.join(output), html.as_bytes()));
                (doc, result)
            })
            .collect();

        for (doc, result) in results {
            match result {
                Ok(()) => {
                    report.rendered += 1;
                    tracing::debug!("Generated: {}", doc.source);
                }
                Err(e) => {
                    tracing::warn!("Failed to generate {}: {:#}", doc.source, e);
                    report.failures.push(BuildFailure {
                        path: doc.full_source.clone(),
                        message: format!("{:#}", e),
                    });
                }
            }
        }

        report.copied = self.copy_assets(assets, &outputs, &mut report)?;

        Ok(report)
    }

    /// Map each output path to one document, in source order, reporting collisions
    fn assign_outputs<'d>(
        &self,
        documents: &'d [Document],
        report: &mut BuildReport,
    ) -> BTreeMap<PathBuf, &'d Document> {
        let mut sorted: Vec<&Document> = documents.iter().collect();
        sorted.sort_by(|a, b| a.source.cmp(&b.source));

        let mut outputs: BTreeMap<PathBuf, &Document> = BTreeMap::new();
        for doc in sorted {
            let output = doc.output_path(&self.site.config);
            if let Some(kept) = outputs.get(&output) {
                tracing::warn!(
                    "{} and {} both publish to {:?}; keeping {}",
                    kept.source,
                    doc.source,
                    output,
                    kept.source
                );
                report.duplicates.push(SkippedDuplicate {
                    source: doc.source.clone(),
                    kept: kept.source.clone(),
                    output,
                });
                continue;
            }
            outputs.insert(output, doc);
        }
        outputs
    }

    /// Copy static assets (images, etc.) to public directory.
    ///
    /// An asset landing on a rendered page's output path is skipped; the page wins.
    fn copy_assets(
        &self,
        assets: &[PathBuf],
        outputs: &BTreeMap<PathBuf, &Document>,
        report: &mut BuildReport,
    ) -> Result<usize> {
        let source_dir = &self.site.source_dir;
        let mut copied = 0;

        for path in assets {
            let relative = path.strip_prefix(source_dir).unwrap_or(path);
            if let Some(kept) = outputs.get(relative) {
                let source = relative_source(source_dir, path);
                tracing::warn!(
                    "{} and {} both publish to {:?}; keeping {}",
                    kept.source,
                    source,
                    relative,
                    kept.source
                );
                report.duplicates.push(SkippedDuplicate {
                    source,
                    kept: kept.source.clone(),
                    output: relative.to_path_buf(),
                });
                continue;
            }
            let dest = self.site.public_dir.join(relative);

            let result = dest
                .parent()
                .map(fs::create_dir_all)
                .transpose()
                .and_then(|_| fs::copy(path, &dest));
            match result {
                Ok(_) => copied += 1,
                Err(e) => {
                    tracing::warn!("Failed to copy {:?}: {}", path, e);
                    report.failures.push(BuildFailure {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(copied)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source: &str, text: &str) -> Document {
        Document::parse(source, PathBuf::from(source), text).unwrap()
    }

    fn test_site(dir: &Path) -> Site {
        Site::new(dir).unwrap()
    }

    #[test]
    fn test_render_document() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());
        let generator = Generator::new(&site).unwrap();

        let docs = vec![
            doc(
                "index.md",
                "---\nlayout: post\ntitle: Collections <3\ndescription: map & filter\n---\n## Sequences\n\nSee [nulls](null-safety.md).\n",
            ),
            doc("null-safety.md", "---\npermalink: /nulls/\n---\n# Nulls\n"),
        ];
        let links = LinkResolver::new(&docs, &site.config);
        let site_data = generator.build_site_data(&docs);

        let html = generator.render_document(&docs[0], &links, &site_data).unwrap();
        assert!(html.contains("<title>Collections &lt;3 | mdsite</title>"));
        assert!(html.contains(r#"<meta name="description" content="map &amp; filter">"#));
        assert!(html.contains(r#"<h2 id="sequences">Sequences</h2>"#));
        assert!(html.contains(r#"<a href="/nulls/">nulls</a>"#));
        assert!(html.contains(r##"href="#sequences""##));
    }

    #[test]
    fn test_render_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());
        let generator = Generator::new(&site).unwrap();

        let docs = vec![doc(
            "enums.md",
            "---\ntitle: Enums\n---\n# Enums\n\n```kotlin\nenum class Color { RED, GREEN }\n```\n",
        )];
        let links = LinkResolver::new(&docs, &site.config);
        let site_data = generator.build_site_data(&docs);

        let first = generator.render_document(&docs[0], &links, &site_data).unwrap();
        let second = generator.render_document(&docs[0], &links, &site_data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_layout_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());
        let generator = Generator::new(&site).unwrap();

        let docs = vec![doc("a.md", "---\nlayout: gallery\ntitle: A\n---\nText\n")];
        let links = LinkResolver::new(&docs, &site.config);
        let site_data = generator.build_site_data(&docs);

        let html = generator.render_document(&docs[0], &links, &site_data).unwrap();
        assert!(html.contains(r#"<article class="page">"#));
        assert!(html.contains("<p>Text</p>"));
    }

    #[test]
    fn test_duplicate_outputs_keep_first_source() {
        let dir = tempfile::tempdir().unwrap();
        let site = test_site(dir.path());
        let generator = Generator::new(&site).unwrap();

        let docs = vec![
            doc("index2.md", "---\npermalink: /\ntitle: Old home\n---\nold"),
            doc("index.md", "---\ntitle: Home\n---\nnew"),
        ];
        let report = generator.generate(&docs, &[]).unwrap();

        assert_eq!(report.rendered, 1);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].source, "index2.md");
        assert_eq!(report.duplicates[0].kept, "index.md");

        let html = fs::read_to_string(site.public_dir.join("index.html")).unwrap();
        assert!(html.contains("<p>new</p>"));
    }
}
