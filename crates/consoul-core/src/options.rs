//! Render options

use serde::{Deserialize, Serialize};

/// Options shared by the lexer, the block renderer and the inline renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// GitHub Flavored Markdown: tables, strikethrough, bare URLs
    pub gfm: bool,
    /// Treat a single newline inside a paragraph as a line break (needs `gfm`)
    pub breaks: bool,
    /// Original Markdown emphasis rules; html blocks are emitted verbatim
    pub pedantic: bool,
    /// Typographic quotes, dashes and ellipses in plain text
    pub smartypants: bool,
    /// Obfuscate email autolinks as character references
    pub mangle: bool,
    /// Emit ANSI escape sequences
    pub color: bool,
    /// Wrap link text in OSC 8 hyperlinks
    pub hyperlinks: bool,
    /// Syntax highlight fenced code with a language tag
    pub highlight: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            breaks: false,
            pedantic: false,
            smartypants: true,
            mangle: true,
            color: true,
            hyperlinks: false,
            highlight: true,
        }
    }
}

impl RenderOptions {
    /// Defaults without color, highlighting or mangling: output is plain and deterministic
    pub fn plain() -> Self {
        Self {
            color: false,
            highlight: false,
            mangle: false,
            ..Self::default()
        }
    }
}
