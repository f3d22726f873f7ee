//! Content module - documents, front matter, links and markdown rendering

mod document;
mod error;
mod frontmatter;
mod links;
pub mod loader;
mod markdown;

pub use document::Document;
pub(crate) use document::relative_source;
pub use error::ContentError;
pub use frontmatter::FrontMatter;
pub use links::LinkResolver;
pub use markdown::{Heading, MarkdownRenderer, RenderedMarkdown};
