//! consoul-core: render Markdown as styled terminal text
//!
//! The pipeline is [`lex`] (markdown to block tokens plus link table) followed
//! by [`BlockRenderer::parse`] (tokens to text). Token documents can also be
//! produced elsewhere and loaded with [`Document::from_json`].

pub mod block;
pub mod cursor;
pub mod error;
pub mod highlight;
pub mod inline;
pub mod lexer;
pub mod options;
pub mod style;
pub mod token;

pub use block::BlockRenderer;
pub use error::{RenderError, Result};
pub use highlight::{HighlightKind, Highlighter, SyntectHighlighter};
pub use inline::InlineRenderer;
pub use lexer::lex;
pub use options::RenderOptions;
pub use style::Styles;
pub use token::{Align, Document, LinkDef, LinkTable, Token};

/// Render markdown text with the given options
pub fn render_markdown(markdown: &str, options: &RenderOptions) -> Result<String> {
    BlockRenderer::new(options.clone()).render(markdown)
}
