//! Helper functions shared by the renderer and the layouts

mod html;
mod toc;
mod url;

pub use html::*;
pub use toc::*;
pub use url::*;
