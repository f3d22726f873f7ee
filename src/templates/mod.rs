//! Layouts, rendered with the Tera template engine
//!
//! A small set of layouts is embedded in the binary. A site can override
//! them, or add its own, with `<name>.html` files in its layouts directory.

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

use crate::content::FrontMatter;

/// Layout used when neither the requested nor the configured default exists
pub const FALLBACK_LAYOUT: &str = "default";

/// Template renderer with the built-in layouts and the site's own
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with only the built-in layouts
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Context values are escaped when they are built; URLs must not be
        // escaped a second time
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("default.html", include_str!("layouts/default.html")),
            ("page.html", include_str!("layouts/page.html")),
            ("post.html", include_str!("layouts/post.html")),
            ("home.html", include_str!("layouts/home.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Create a renderer and load `*.html` layouts from `layouts_dir`, if it exists
    pub fn load<P: AsRef<Path>>(layouts_dir: P) -> Result<Self> {
        let mut renderer = Self::new()?;
        let layouts_dir = layouts_dir.as_ref();
        if !layouts_dir.is_dir() {
            return Ok(renderer);
        }

        let mut layouts = Vec::new();
        for entry in fs::read_dir(layouts_dir)? {
            let path = entry?.path();
            let is_html = path.extension().and_then(|e| e.to_str()) == Some("html");
            if !path.is_file() || !is_html {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read layout {:?}", path))?;
            tracing::debug!("Loaded layout {:?}", path);
            layouts.push((name.to_string(), source));
        }

        // Added together so site layouts may extend each other as well as the built-ins
        renderer
            .tera
            .add_raw_templates(layouts)
            .with_context(|| format!("Invalid layout in {:?}", layouts_dir))?;

        Ok(renderer)
    }

    /// Whether a layout with this name is available
    pub fn has_layout(&self, name: &str) -> bool {
        let file = template_file(name);
        self.tera.get_template_names().any(|n| n == file)
    }

    /// Pick the layout to render with: the requested one, else the configured
    /// default, else the built-in fallback
    pub fn resolve_layout(&self, requested: Option<&str>, default: &str, source: &str) -> String {
        if let Some(name) = requested {
            if self.has_layout(name) {
                return name.to_string();
            }
            tracing::warn!(
                "Unknown layout {:?} in {}, using {:?}",
                name,
                source,
                default
            );
        }
        if self.has_layout(default) {
            default.to_string()
        } else {
            FALLBACK_LAYOUT.to_string()
        }
    }

    /// Render a layout with given context
    pub fn render(&self, layout: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(&template_file(layout), context)?)
    }
}

fn template_file(layout: &str) -> String {
    format!("{}.html", layout)
}

/// Data structures for template context.
///
/// Text fields are HTML-escaped when built.

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,
    pub root: String,
    pub documents: Vec<NavEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavEntry {
    pub title: String,
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageData<'a> {
    pub title: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub url: String,
    /// Absolute URL, for canonical links
    pub permalink: String,
    pub source: String,
    pub layout: String,
    /// Every front-matter field as written, unescaped
    pub front_matter: &'a FrontMatter,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_data() -> SiteData {
        SiteData {
            title: "Kotlin notes".to_string(),
            description: String::new(),
            author: String::new(),
            url: "http://example.com".to_string(),
            root: "/".to_string(),
            documents: vec![NavEntry {
                title: "Enums".to_string(),
                url: "/enums.html".to_string(),
                source: "enums.md".to_string(),
            }],
        }
    }

    fn context(fm: &FrontMatter, layout: &str) -> Context {
        let page = PageData {
            title: "Sealed &amp; enums".to_string(),
            description: Some("Closed hierarchies".to_string()),
            keywords: vec!["kotlin".to_string()],
            url: "/sealed/".to_string(),
            permalink: "http://example.com/sealed/".to_string(),
            source: "sealed.md".to_string(),
            layout: layout.to_string(),
            front_matter: fm,
        };
        let mut ctx = Context::new();
        ctx.insert("site", &site_data());
        ctx.insert("page", &page);
        ctx.insert("content", "<p>Body</p>");
        ctx.insert("toc", "");
        ctx
    }

    #[test]
    fn test_builtin_layouts() {
        let renderer = TemplateRenderer::new().unwrap();
        for layout in ["default", "page", "post", "home"] {
            assert!(renderer.has_layout(layout), "{layout}");
        }
        assert!(!renderer.has_layout("gallery"));
    }

    #[test]
    fn test_render_post_layout() {
        let renderer = TemplateRenderer::new().unwrap();
        let fm = FrontMatter::default();
        let html = renderer.render("post", &context(&fm, "post")).unwrap();
        assert!(html.contains("<title>Sealed &amp; enums | Kotlin notes</title>"));
        assert!(html.contains(r#"<meta name="description" content="Closed hierarchies">"#));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains("<li>kotlin</li>"));
        assert!(html.contains(r#"<meta name="keywords" content="kotlin">"#));
        assert!(html.contains(r#"<link rel="canonical" href="http://example.com/sealed/">"#));
    }

    #[test]
    fn test_home_layout_lists_documents() {
        let renderer = TemplateRenderer::new().unwrap();
        let fm = FrontMatter::default();
        let html = renderer.render("home", &context(&fm, "home")).unwrap();
        assert!(html.contains(r#"<li><a href="/enums.html">Enums</a></li>"#));
    }

    #[test]
    fn test_unknown_layout_falls_back() {
        let renderer = TemplateRenderer::new().unwrap();
        assert_eq!(renderer.resolve_layout(Some("post"), "default", "a.md"), "post");
        assert_eq!(renderer.resolve_layout(Some("gallery"), "page", "a.md"), "page");
        assert_eq!(renderer.resolve_layout(None, "missing", "a.md"), "default");
    }

    #[test]
    fn test_site_layouts_override_and_extend() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("page.html"),
            "<div class=\"custom\">{{ content | safe }}</div>",
        )
        .unwrap();
        fs::write(
            dir.path().join("article.html"),
            "{% extends \"default.html\" %}{% block content %}<section>{{ page.front_matter.series }}</section>{% endblock content %}",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let renderer = TemplateRenderer::load(dir.path()).unwrap();
        let mut fm = FrontMatter::default();
        fm.insert("series", "Kotlin in depth");

        let html = renderer.render("page", &context(&fm, "page")).unwrap();
        assert_eq!(html, "<div class=\"custom\"><p>Body</p></div>");

        let html = renderer.render("article", &context(&fm, "article")).unwrap();
        assert!(html.contains("<section>Kotlin in depth</section>"));
        assert!(html.contains("<!DOCTYPE html>"));
    }
}
