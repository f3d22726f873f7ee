//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashSet;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::config::HighlightConfig;
use crate::helpers::escape_html;

/// A heading found while rendering, used to build the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: usize,
    pub id: String,
    pub text: String,
}

/// Output of [`MarkdownRenderer::render`]
#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    pub html: String,
    pub headings: Vec<Heading>,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            highlight: config.enable,
            line_numbers: config.line_number,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> RenderedMarkdown {
        // Front matter is split off before rendering, so no metadata blocks here
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        // (index of the heading start event, level, text)
        let mut found_headings: Vec<(usize, usize, String)> = Vec::new();

        // (language, text) of the code block being collected
        let mut code_block: Option<(Option<String>, String)> = None;
        // (index of the heading start event, collected text)
        let mut heading: Option<(usize, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
                            .next()
                            .filter(|lang| !lang.is_empty())
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let block = self.highlight_code(&code, lang.as_deref());
                        events.push(Event::Html(CowStr::from(block)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::Start(Tag::Heading { .. }) => {
                    heading = Some((events.len(), String::new()));
                    events.push(event);
                }
                Event::End(TagEnd::Heading(level)) => {
                    if let Some((start, text)) = heading.take() {
                        found_headings.push((start, level as usize, text.trim().to_string()));
                    }
                    events.push(event);
                }
                Event::Text(_) | Event::Code(_) if heading.is_some() => {
                    if let (Some((_, buf)), Event::Text(text) | Event::Code(text)) =
                        (heading.as_mut(), &event)
                    {
                        buf.push_str(text);
                    }
                    events.push(event);
                }
                _ => events.push(event),
            }
        }

        let headings = assign_heading_ids(&mut events, found_headings);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());

        RenderedMarkdown {
            html: html_output,
            headings,
        }
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let highlighted = match lang {
            Some(lang) if self.highlight => self
                .find_syntax(lang)
                .zip(self.theme())
                .and_then(|(syntax, theme)| self.highlight_lines(code, syntax, theme)),
            _ => None,
        };

        let lines = highlighted.unwrap_or_else(|| {
            code.lines().map(escape_html).collect::<Vec<_>>()
        });

        let lang_attrs = lang
            .map(|l| {
                let l = escape_html(l);
                format!(r#" class="language-{l}" data-lang="{l}""#)
            })
            .unwrap_or_default();

        if self.line_numbers && !lines.is_empty() {
            add_line_numbers(&lines, &lang_attrs)
        } else {
            format!("<pre><code{}>{}</code></pre>\n", lang_attrs, lines.join("\n"))
        }
    }

    fn find_syntax(&self, lang: &str) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Highlight line by line, one HTML string per source line without its ending
    fn highlight_lines(
        &self,
        code: &str,
        syntax: &SyntaxReference,
        theme: &Theme,
    ) -> Option<Vec<String>> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();

        for line in LinesWithEndings::from(code) {
            let regions = highlighter.highlight_line(line, &self.syntax_set).ok()?;
            let regions: Vec<_> = regions
                .into_iter()
                .map(|(style, text)| (style, text.trim_end_matches(['\n', '\r'])))
                .filter(|(_, text)| !text.is_empty())
                .collect();
            lines.push(styled_line_to_highlighted_html(&regions, IncludeBackground::No).ok()?);
        }

        Some(lines)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Give every heading an anchor. Explicit `{#id}`s are claimed first so
/// generated ids never collide with them.
fn assign_heading_ids(
    events: &mut [Event],
    found: Vec<(usize, usize, String)>,
) -> Vec<Heading> {
    let mut used: HashSet<String> = found
        .iter()
        .filter_map(|(start, _, _)| match &events[*start] {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    let mut headings = Vec::with_capacity(found.len());
    for (start, level, text) in found {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
            let anchor = match id.as_deref().map(str::to_string) {
                Some(explicit) => explicit,
                None => {
                    let generated = unique_id(&text, &mut used);
                    *id = Some(CowStr::from(generated.clone()));
                    generated
                }
            };
            headings.push(Heading {
                level,
                id: anchor,
                text,
            });
        }
    }
    headings
}

/// Wrap highlighted lines in a gutter table
fn add_line_numbers(lines: &[String], lang_attrs: &str) -> String {
    let gutter = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre><code{}>{}</code></pre></td></tr></table></figure>
"#,
        gutter,
        lang_attrs,
        lines.join("\n")
    )
}

/// Slugify heading text into an anchor not yet in `used`, suffixing repeats
fn unique_id(text: &str, used: &mut HashSet<String>) -> String {
    let mut base = slug::slugify(text);
    if base.is_empty() {
        base = "section".to_string();
    }
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 1;
    loop {
        let id = format!("{}-{}", base, n);
        if used.insert(id.clone()) {
            return id;
        }
        n += 1;
    }
}
