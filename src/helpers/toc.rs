//! Table of contents

use crate::content::Heading;
use super::escape_html;

/// Build a nested `<ol class="toc">` from rendered headings.
///
/// Headings deeper than `max_depth` are left out. Returns an empty string
/// when nothing qualifies.
pub fn toc(headings: &[Heading], max_depth: usize) -> String {
    let entries: Vec<_> = headings.iter().filter(|h| h.level <= max_depth).collect();
    if entries.is_empty() {
        return String::new();
    }

    // Nest relative to the shallowest heading so a page without an h1 isn't
    // wrapped in an empty level
    let base = entries.iter().map(|h| h.level).min().unwrap_or(1);

    let mut html = r#"<ol class="toc">"#.to_string();
    let mut current_level = 0;

    for heading in entries {
        let level = heading.level - base;
        while current_level < level {
            html.push_str("<ol>");
            current_level += 1;
        }
        while current_level > level {
            html.push_str("</ol>");
            current_level -= 1;
        }

        html.push_str(&format!(
            r##"<li class="toc-item toc-level-{}"><a class="toc-link" href="#{}"><span class="toc-text">{}</span></a></li>"##,
            heading.level,
            escape_html(&heading.id),
            escape_html(&heading.text)
        ));
    }

    while current_level > 0 {
        html.push_str("</ol>");
        current_level -= 1;
    }

    html.push_str("</ol>");
    html
}
