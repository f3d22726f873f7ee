//! Initialize a new site

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# mdsite configuration

# Site
title: mdsite
description: ''
author: ''

# URL
url: http://example.com
root: /
pretty_urls: false
relative_link_fallback: false

# Directory
source_dir: .
public_dir: _site
layouts_dir: _layouts
exclude:
  - README.md

# Writing
default_layout: default
highlight:
  enable: true
  line_number: false
  theme: InspiredGitHub
toc:
  enable: true
  max_depth: 3
"#;

const SAMPLE_INDEX: &str = r#"---
layout: home
title: Home
description: Notes written in Markdown
---

Welcome! Every `.md` file next to this one becomes a page.

- [Getting started](getting-started.md)
"#;

const SAMPLE_DOCUMENT: &str = r#"---
layout: post
title: Getting started
permalink: /getting-started/
keywords: [mdsite, markdown]
---

## Write

Create a document with `mdsite new "My Title"` and edit it.

## Build

```bash
mdsite generate
```

The site is written to `_site/`. Links between documents such as
[the home page](index.md) are resolved to their permalinks.
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{:?} already contains a site", target_dir);
    }

    fs::create_dir_all(target_dir.join("_layouts"))
        .with_context(|| format!("Failed to create {:?}", target_dir))?;

    fs::write(&config_path, CONFIG_TEMPLATE)?;
    write_if_missing(&target_dir.join("index.md"), SAMPLE_INDEX)?;
    write_if_missing(&target_dir.join("getting-started.md"), SAMPLE_DOCUMENT)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::debug!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Site;

    #[test]
    fn test_init_site_builds() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        assert!(dir.path().join("_layouts").is_dir());
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.exclude, vec!["README.md"]);

        let report = site.generate().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.rendered, 2);

        let index = fs::read_to_string(site.public_dir.join("index.html")).unwrap();
        assert!(index.contains(r#"href="/getting-started/""#));
        assert!(site.public_dir.join("getting-started/index.html").exists());
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();
        assert!(init_site(dir.path()).is_err());
    }
}
