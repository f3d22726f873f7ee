//! Generate static files

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::content::loader::ContentLoader;
use crate::generator::{BuildFailure, BuildReport, Generator};
use crate::{Site, CONFIG_FILE};

/// Generate the static site.
///
/// Files that fail to load or render are listed in the report; everything
/// else is still published.
pub fn run(site: &Site) -> Result<BuildReport> {
    let start = Instant::now();

    let loader = ContentLoader::new(site)?;
    let (content, assets) = loader.load_all();

    let generator = Generator::new(site)?;
    let mut report = generator.generate(&content.documents, &assets)?;

    let load_failures = content.failures.into_iter().map(|e| BuildFailure {
        path: e.path().to_path_buf(),
        message: e.to_string(),
    });
    report.failures.splice(0..0, load_failures);

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} pages and copied {} assets in {:.2}s",
        report.rendered,
        report.copied,
        duration.as_secs_f64()
    );
    if !report.is_clean() {
        tracing::warn!("{} file(s) could not be published", report.failures.len());
    }

    Ok(report)
}

/// Watch for file changes and regenerate
pub fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = channel();

    // Debounce to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(300), tx)?;

    debouncer
        .watcher()
        .watch(&site.source_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", site.source_dir);

    if site.layouts_dir.exists() && !site.layouts_dir.starts_with(&site.source_dir) {
        debouncer
            .watcher()
            .watch(&site.layouts_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", site.layouts_dir);
    }

    let config_path = site.base_dir.join(CONFIG_FILE);
    if config_path.exists() && !config_path.starts_with(&site.source_dir) {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| is_relevant(site, &e.path))
                    .collect();
                if changed.is_empty() {
                    continue;
                }
                for event in &changed {
                    tracing::info!("File changed: {}", event.path.display());
                }

                // Reopen the site so config edits take effect
                let result = Site::new(&site.base_dir).and_then(|site| run(&site));
                if let Err(e) = result {
                    tracing::error!("Generation failed: {:#}", e);
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(_) => break,
        }
    }

    Ok(())
}

/// Ignore our own output and editor/VCS noise
fn is_relevant(site: &Site, path: &Path) -> bool {
    if path.starts_with(&site.public_dir) {
        return false;
    }
    let path_str = path.to_string_lossy();
    !path_str.contains("/.git/") && !path_str.ends_with('~') && !path_str.ends_with(".swp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_run_publishes_despite_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::write(base.join("good.md"), "---\ntitle: Good\n---\nBody\n").unwrap();
        fs::write(base.join("bad.md"), "---\ntitle: X\nBody").unwrap();

        let site = Site::new(base).unwrap();
        let report = run(&site).unwrap();

        assert_eq!(report.rendered, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("bad.md"));
        assert!(report.failures[0].message.contains("bad.md"));
        assert!(site.public_dir.join("good.html").exists());
        assert!(!site.public_dir.join("bad.html").exists());
    }

    #[test]
    fn test_is_relevant() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(is_relevant(&site, &dir.path().join("kotlin/enums.md")));
        assert!(!is_relevant(&site, &site.public_dir.join("index.html")));
        assert!(!is_relevant(&site, &dir.path().join("enums.md~")));
    }

    #[test]
    fn test_own_output_ignored_with_relative_base() {
        let site = Site::new("rel-site").unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert!(!is_relevant(&site, &cwd.join("rel-site/_site/index.html")));
        assert!(is_relevant(&site, &cwd.join("rel-site/notes.md")));
    }
}
