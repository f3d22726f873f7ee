//! Link resolution - rewrites links between documents to their permalinks

use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::HashMap;

use super::Document;
use crate::config::SiteConfig;
use crate::helpers::is_external;

lazy_static! {
    /// Destination of an inline link or image: `](dest "title")`
    static ref INLINE_DEST: Regex =
        Regex::new(r#"\]\(\s*(<[^<>\n]*>|[^\s()<>]+)(?:\s+(?:"[^"]*"|'[^']*'|\([^()]*\)))?\s*\)"#)
            .expect("valid inline link regex");

    /// Destination of a link reference definition: `[id]: dest`
    static ref REFERENCE_DEST: Regex =
        Regex::new(r"^[ \t]{0,3}\[[^\]]+\]:[ \t]*(<[^<>\n]*>|\S+)")
            .expect("valid reference definition regex");
}

/// Where a document can be linked to
#[derive(Debug, Clone)]
struct LinkTarget {
    /// URL from a declared permalink
    permalink: Option<String>,
    /// Filename-derived URL
    default_url: String,
}

/// Rewrites relative links to markdown files into site URLs
#[derive(Debug, Clone, Default)]
pub struct LinkResolver {
    /// Keyed by source path relative to the source directory
    targets: HashMap<String, LinkTarget>,
    /// Bare file name to the source paths carrying it
    by_name: HashMap<String, Vec<String>>,
    /// Rewrite links to documents without a permalink too
    fallback: bool,
}

impl LinkResolver {
    /// Index every document of the site
    pub fn new(documents: &[Document], config: &SiteConfig) -> Self {
        let mut resolver = Self {
            fallback: config.relative_link_fallback,
            ..Default::default()
        };

        for doc in documents {
            let target = LinkTarget {
                permalink: doc.permalink().map(|_| doc.url(config)),
                default_url: doc.url(config),
            };
            resolver.targets.insert(doc.source.clone(), target);

            let name = doc.source.rsplit('/').next().unwrap_or(&doc.source);
            resolver
                .by_name
                .entry(name.to_string())
                .or_default()
                .push(doc.source.clone());
        }

        resolver
    }

    /// What a link to each document is rewritten to, sorted by source path.
    /// `None` means links to it are left as written.
    pub fn link_table(&self) -> Vec<(&str, Option<&str>)> {
        let mut table: Vec<_> = self
            .targets
            .iter()
            .map(|(source, target)| {
                let url = match &target.permalink {
                    Some(url) => Some(url.as_str()),
                    None if self.fallback => Some(target.default_url.as_str()),
                    None => None,
                };
                (source.as_str(), url)
            })
            .collect();
        table.sort_by(|a, b| a.0.cmp(b.0));
        table
    }

    /// Rewrite the links in `body`, written by the document at `from_source`.
    ///
    /// Text inside fenced code blocks and inline code spans is left alone.
    /// Resolving an already resolved body returns it unchanged.
    pub fn resolve(&self, body: &str, from_source: &str) -> String {
        let from_dir = from_source.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let mut out = String::with_capacity(body.len());
        let mut fence: Option<(u8, usize)> = None;

        for line in body.split_inclusive('\n') {
            if let Some((marker, len)) = fence {
                if is_closing_fence(line, marker, len) {
                    fence = None;
                }
                out.push_str(line);
                continue;
            }
            if let Some(opening) = fence_marker(line) {
                fence = Some(opening);
                out.push_str(line);
                continue;
            }

            let line = self.rewrite_reference(line, from_dir);
            map_outside_code(&line, &mut out, |text, out| {
                self.rewrite_inline(text, from_dir, out)
            });
        }

        out
    }

    fn rewrite_inline(&self, text: &str, from_dir: &str, out: &mut String) {
        let mut last = 0;
        for caps in INLINE_DEST.captures_iter(text) {
            let Some(dest) = caps.get(1) else { continue };
            if let Some(url) = self.rewrite_target(dest.as_str(), from_dir) {
                out.push_str(&text[last..dest.start()]);
                out.push_str(&url);
                last = dest.end();
            }
        }
        out.push_str(&text[last..]);
    }

    fn rewrite_reference(&self, line: &str, from_dir: &str) -> String {
        if let Some(dest) = REFERENCE_DEST.captures(line).and_then(|caps| caps.get(1)) {
            if let Some(url) = self.rewrite_target(dest.as_str(), from_dir) {
                return format!("{}{}{}", &line[..dest.start()], url, &line[dest.end()..]);
            }
        }
        line.to_string()
    }

    /// Resolve a single link destination, `None` when it should stay as written
    fn rewrite_target(&self, dest: &str, from_dir: &str) -> Option<String> {
        let (dest, bracketed) = match dest.strip_prefix('<').and_then(|d| d.strip_suffix('>')) {
            Some(inner) => (inner, true),
            None => (dest, false),
        };

        if dest.is_empty() || dest.starts_with('/') || is_external(dest) {
            return None;
        }

        let (path, fragment) = match dest.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (dest, None),
        };
        let path = percent_decode_str(path).decode_utf8_lossy();
        if !is_markdown_path(&path) {
            return None;
        }

        let target = self.lookup(&path, from_dir)?;
        let url = match &target.permalink {
            Some(url) => url.clone(),
            None if self.fallback => target.default_url.clone(),
            None => return None,
        };

        let mut resolved = url;
        if let Some(fragment) = fragment {
            resolved.push('#');
            resolved.push_str(fragment);
        }
        // Declared permalinks are kept as written; a space would end the destination
        if bracketed || resolved.contains(char::is_whitespace) {
            resolved = format!("<{}>", resolved);
        }
        Some(resolved)
    }

    fn lookup(&self, path: &str, from_dir: &str) -> Option<&LinkTarget> {
        if let Some(target) = join_normalized(from_dir, path).and_then(|p| self.targets.get(&p)) {
            return Some(target);
        }

        // A bare file name may point anywhere in the site, as long as it is unambiguous
        if path.contains('/') {
            return None;
        }
        match self.by_name.get(path).map(Vec::as_slice) {
            Some([only]) => self.targets.get(only),
            Some(many) if many.len() > 1 => {
                tracing::debug!("Ambiguous link target {:?}: {:?}", path, many);
                None
            }
            _ => None,
        }
    }
}

fn is_markdown_path(path: &str) -> bool {
    path.ends_with(".md") || path.ends_with(".markdown")
}

/// Join `path` onto `dir`, folding `.` and `..` segments
fn join_normalized(dir: &str, path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in dir.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}

/// Opening code fence: marker byte and run length.
///
/// At most three spaces of indent; a backtick fence's info string may not
/// contain a backtick, otherwise the line is an inline code span.
fn fence_marker(line: &str) -> Option<(u8, usize)> {
    let indent = line.bytes().take_while(|&b| b == b' ').count();
    if indent > 3 {
        return None;
    }
    let trimmed = &line[indent..];
    let marker = *trimmed.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = trimmed.bytes().take_while(|&b| b == marker).count();
    if len < 3 {
        return None;
    }
    if marker == b'`' && trimmed[len..].contains('`') {
        return None;
    }
    Some((marker, len))
}

fn is_closing_fence(line: &str, marker: u8, len: usize) -> bool {
    let trimmed = line.trim();
    let run = trimmed.bytes().take_while(|&b| b == marker).count();
    run >= len && run == trimmed.len()
}

/// Feed the parts of `line` outside inline code spans through `f`,
/// copying code spans verbatim
fn map_outside_code(line: &str, out: &mut String, mut f: impl FnMut(&str, &mut String)) {
    let bytes = line.as_bytes();
    let mut plain_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        if let Some(span_end) = closing_backticks(bytes, i, i - run_start) {
            f(&line[plain_start..run_start], out);
            out.push_str(&line[run_start..span_end]);
            plain_start = span_end;
            i = span_end;
        }
    }

    f(&line[plain_start..], out);
}

/// End of the next backtick run of exactly `len` backticks, starting at `from`
fn closing_backticks(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        if i - start == len {
            return Some(i);
        }
    }
    None
}
