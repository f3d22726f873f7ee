//! Create a new document

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::content::FrontMatter;
use crate::Site;

/// Create a new Markdown document in the source directory.
///
/// The file name is the slugified title. Fails if the file already exists.
pub fn create_document(
    site: &Site,
    title: &str,
    layout: Option<&str>,
    permalink: Option<&str>,
) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    fs::create_dir_all(&site.source_dir)
        .with_context(|| format!("Failed to create {:?}", site.source_dir))?;
    let file_path = site.source_dir.join(format!("{}.md", slug));

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let layout = layout.unwrap_or(&site.config.default_layout);
    let now = chrono::Local::now();

    let mut front_matter = FrontMatter::default();
    front_matter.insert("layout", layout);
    front_matter.insert("title", title);
    if let Some(permalink) = permalink {
        front_matter.insert("permalink", permalink);
    }
    front_matter.insert("date", now.format("%Y-%m-%d %H:%M:%S").to_string());

    let content = front_matter.to_block()?;
    fs::write(&file_path, content)
        .with_context(|| format!("Failed to write {:?}", file_path))?;

    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
