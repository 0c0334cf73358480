//! Block rendering
//!
//! Drains a token stream front to back, dispatching on each token kind.
//! Group tokens (blockquotes, lists, list items) recurse through the same
//! dispatch until their end token is consumed.

use crate::cursor::TokenStream;
use crate::error::Result;
use crate::highlight::{Highlighter, SyntectHighlighter};
use crate::inline::InlineRenderer;
use crate::lexer;
use crate::options::RenderOptions;
use crate::style::{uppercase, Styles};
use crate::token::{Align, LinkTable, Token};

const HR_WIDTH: usize = 79;
const QUOTE_PREFIX: &str = "|    ";

/// Renders block tokens to styled terminal text
pub struct BlockRenderer {
    options: RenderOptions,
    styles: Styles,
    highlighter: Option<Box<dyn Highlighter>>,
}

impl BlockRenderer {
    /// Create a renderer; code is highlighted with syntect when `options.highlight` is set
    pub fn new(options: RenderOptions) -> Self {
        let highlighter: Option<Box<dyn Highlighter>> = if options.highlight {
            Some(Box::new(SyntectHighlighter::new()))
        } else {
            None
        };

        Self {
            styles: Styles::new(options.color),
            options,
            highlighter,
        }
    }

    /// Use a custom highlighter for fenced code
    pub fn with_highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.highlighter = Some(Box::new(highlighter));
        self
    }

    pub fn without_highlighter(mut self) -> Self {
        self.highlighter = None;
        self
    }

    /// Lex and render markdown text
    pub fn render(&self, markdown: &str) -> Result<String> {
        let doc = lexer::lex(markdown, &self.options);
        self.parse(doc.tokens, &doc.links)
    }

    /// Render a token sequence, resolving reference links against `links`
    pub fn parse(&self, tokens: Vec<Token>, links: &LinkTable) -> Result<String> {
        let count = tokens.len();
        let mut pass = Pass {
            renderer: self,
            inline: InlineRenderer::new(links, &self.options),
            tokens: TokenStream::new(tokens),
        };

        let mut out = String::new();
        while let Some(token) = pass.tokens.advance() {
            out.push_str(&pass.tok(token)?);
        }

        tracing::debug!(tokens = count, bytes = out.len(), "Rendered document");
        Ok(out)
    }

    /// Highlight `code`, or `None` without a highlighter or for an unknown language
    fn highlight(&self, lang: &str, code: &str) -> Option<String> {
        let highlighter = self.highlighter.as_ref()?;
        let highlighted =
            highlighter.highlight(lang, code, &|kind, run| kind.paint(&self.styles, run));
        if highlighted.is_none() {
            tracing::debug!(lang, "No syntax for language, emitting raw code");
        }
        highlighted
    }
}

/// Token groups and the token that closes each
#[derive(Debug, Clone, Copy)]
enum Group {
    Blockquote,
    List,
    Item,
}

impl Group {
    fn is_end(self, token: &Token) -> bool {
        matches!(
            (self, token),
            (Self::Blockquote, Token::BlockquoteEnd)
                | (Self::List, Token::ListEnd)
                | (Self::Item, Token::ListItemEnd)
        )
    }
}

/// State of one `parse` call
struct Pass<'r> {
    renderer: &'r BlockRenderer,
    inline: InlineRenderer<'r>,
    tokens: TokenStream,
}

impl Pass<'_> {
    fn tok(&mut self, token: Token) -> Result<String> {
        match token {
            Token::Space => Ok(String::new()),
            Token::Hr => Ok(format!("{}\n\n", "-".repeat(HR_WIDTH))),
            Token::Heading { depth, text } => {
                let styles = &self.renderer.styles;
                let title = if depth == 1 {
                    styles.underline(&uppercase(&text))
                } else {
                    styles.underline(&text)
                };
                Ok(format!("{title}\n\n"))
            }
            Token::Code { lang, text } => Ok(self.code(lang.as_deref(), &text)),
            Token::Table {
                header,
                align,
                cells,
            } => self.table(&header, &align, &cells),
            Token::BlockquoteStart => {
                let mut body = String::new();
                while let Some(token) = self.next_in(Group::Blockquote) {
                    body.push_str(&self.tok(token)?);
                }
                Ok(quote(&body))
            }
            Token::ListStart { ordered } => self.list(ordered),
            Token::ListItemStart => self.item(false),
            Token::LooseItemStart => self.item(true),
            Token::Html { pre, text } => {
                if pre || self.renderer.options.pedantic {
                    Ok(text)
                } else {
                    self.inline.output(&text)
                }
            }
            Token::Paragraph { text } => Ok(format!("{}\n\n", self.inline.output(&text)?)),
            Token::Text { text } => {
                let merged = self.merge_text(text);
                Ok(format!("{}\n", self.inline.output(&merged)?))
            }
            // end tokens outside their group render nothing
            Token::BlockquoteEnd | Token::ListEnd | Token::ListItemEnd => Ok(String::new()),
        }
    }

    /// Next token inside `group`, or `None` once its end token is consumed
    fn next_in(&mut self, group: Group) -> Option<Token> {
        match self.tokens.advance() {
            Some(token) if group.is_end(&token) => None,
            Some(token) => Some(token),
            None => {
                tracing::warn!(?group, "Token stream ended inside an unterminated group");
                None
            }
        }
    }

    /// Join `first` with the bodies of the text tokens directly after it
    fn merge_text(&mut self, mut first: String) -> String {
        while let Some(next) = self.tokens.advance_text() {
            first.push('\n');
            first.push_str(&next);
        }
        first
    }

    fn list(&mut self, ordered: bool) -> Result<String> {
        let mut out = String::new();
        let mut counter = 0usize;

        while let Some(token) = self.next_in(Group::List) {
            match token {
                Token::ListItemStart | Token::LooseItemStart => {
                    counter += 1;
                    let marker = if ordered {
                        format!("{counter}. ")
                    } else {
                        "* ".to_string()
                    };
                    let item = self.tok(token)?;
                    out.push_str(&hang(&marker, &item));
                }
                other => out.push_str(&self.tok(other)?),
            }
        }

        out.push('\n');
        Ok(out)
    }

    fn item(&mut self, loose: bool) -> Result<String> {
        let mut body = String::new();

        while let Some(token) = self.next_in(Group::Item) {
            match token {
                Token::Text { text } if !loose => {
                    let merged = self.merge_text(text);
                    body.push_str(&self.inline.output(&merged)?);
                }
                other => {
                    if !body.is_empty() && !body.ends_with('\n') {
                        body.push('\n');
                    }
                    body.push_str(&self.tok(other)?);
                }
            }
        }

        body.push('\n');
        Ok(body)
    }

    fn code(&self, lang: Option<&str>, text: &str) -> String {
        let styles = &self.renderer.styles;
        match lang.filter(|lang| !lang.is_empty()) {
            None => format!("{}\n{text}\n", styles.inverse("CODE:")),
            Some(lang) => {
                let body = self
                    .renderer
                    .highlight(lang, text)
                    .unwrap_or_else(|| text.to_string());
                format!("{}\n{body}\n", styles.inverse(&format!("{lang}:")))
            }
        }
    }

    fn table(
        &self,
        header: &[String],
        align: &[Option<Align>],
        cells: &[Vec<String>],
    ) -> Result<String> {
        let column_align = |idx: usize| align.get(idx).copied().flatten();

        let mut out = String::from("<table>\n<thead>\n<tr>\n");
        for (idx, cell) in header.iter().enumerate() {
            out.push_str(&self.cell("th", cell, column_align(idx))?);
        }
        out.push_str("</tr>\n</thead>\n<tbody>\n");

        for row in cells {
            out.push_str("<tr>\n");
            for (idx, cell) in row.iter().enumerate() {
                out.push_str(&self.cell("td", cell, column_align(idx))?);
            }
            out.push_str("</tr>\n");
        }

        out.push_str("</tbody>\n</table>\n");
        Ok(out)
    }

    fn cell(&self, tag: &str, text: &str, align: Option<Align>) -> Result<String> {
        let content = self.inline.output(text)?;
        Ok(match align {
            Some(align) => format!("<{tag} align=\"{}\">{content}</{tag}>\n", align.as_str()),
            None => format!("<{tag}>{content}</{tag}>\n"),
        })
    }
}

/// Prefix every non-blank line with the quote marker
fn quote(body: &str) -> String {
    body.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{QUOTE_PREFIX}{line}")
            }
        })
        .collect()
}

/// Put `marker` before the first line and indent the non-blank rest to match
fn hang(marker: &str, body: &str) -> String {
    let indent = " ".repeat(marker.chars().count());
    body.split_inclusive('\n')
        .enumerate()
        .map(|(idx, line)| {
            if idx == 0 {
                format!("{marker}{line}")
            } else if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect()
}
