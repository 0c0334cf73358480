//! Markdown lexing using pulldown-cmark
//!
//! Flattens pulldown-cmark's event stream into the block token sequence the
//! renderer consumes. Inline content is not parsed here: paragraphs, headings,
//! table cells and list item text carry their raw source markup, and the
//! inline renderer takes it from there.

use std::ops::Range;

use once_cell::sync::Lazy;
use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::options::RenderOptions;
use crate::token::{Align, Document, LinkDef, LinkTable, Token};

/// HTML blocks whose content is literal
static PRE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*<(?:pre|script|style)\b").unwrap());

/// Lex markdown text into block tokens and the link reference table
pub fn lex(markdown: &str, options: &RenderOptions) -> Document {
    let src = normalize(markdown);
    let parser = Parser::new_ext(&src, parser_options(options));

    let mut links = LinkTable::new();
    for (label, def) in parser.reference_definitions().iter() {
        links.insert(
            label,
            LinkDef {
                href: def.dest.to_string(),
                title: def.title.as_ref().map(|title| title.to_string()),
            },
        );
    }

    let events: Vec<(Event<'_>, Range<usize>)> = parser.into_offset_iter().collect();
    let mut builder = Builder::new(&src);
    for (idx, (event, range)) in events.iter().enumerate() {
        builder.event(event, range.clone(), &events[idx + 1..]);
    }
    let tokens = builder.finish();

    tracing::debug!(
        tokens = tokens.len(),
        links = links.len(),
        "Lexed markdown document"
    );
    Document { tokens, links }
}

fn parser_options(options: &RenderOptions) -> Options {
    if options.gfm {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
    } else {
        Options::empty()
    }
}

/// Unify line endings and whitespace oddities before parsing
fn normalize(markdown: &str) -> String {
    markdown
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', "    ")
        .replace('\u{a0}', " ")
        .replace('\u{2424}', "\n")
}

/// Block containers the lexer is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Quote,
    Item,
}

/// Leaf block whose content is collected from several events
#[derive(Debug, Default)]
enum Leaf {
    #[default]
    None,
    Code {
        lang: Option<String>,
        text: String,
    },
    Html {
        text: String,
    },
    Table(TableBuilder),
}

#[derive(Debug, Default)]
struct TableBuilder {
    align: Vec<Option<Align>>,
    header: Vec<String>,
    cells: Vec<Vec<String>>,
    row: Vec<String>,
}

struct Builder<'s> {
    src: &'s str,
    tokens: Vec<Token>,
    containers: Vec<Container>,
    /// Source range covered by the inline content seen so far
    span: Option<Range<usize>>,
    leaf: Leaf,
}

impl<'s> Builder<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            tokens: Vec::new(),
            containers: Vec::new(),
            span: None,
            leaf: Leaf::None,
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.flush_text();
        self.tokens
    }

    fn event(&mut self, event: &Event<'_>, range: Range<usize>, rest: &[(Event<'_>, Range<usize>)]) {
        match event {
            Event::Start(tag) => self.start(tag, range, rest),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match &mut self.leaf {
                Leaf::Code { text: code, .. } => code.push_str(text),
                _ => self.extend(range),
            },
            Event::Html(html) => match &mut self.leaf {
                Leaf::Html { text } => text.push_str(html),
                _ => self.extend(range),
            },
            Event::Rule => {
                self.flush_text();
                self.tokens.push(Token::Hr);
            }
            // Remaining events are inline content
            _ => self.extend(range),
        }
    }

    fn start(&mut self, tag: &Tag<'_>, range: Range<usize>, rest: &[(Event<'_>, Range<usize>)]) {
        match tag {
            Tag::Paragraph | Tag::Heading { .. } => {
                self.flush_text();
                self.span = None;
            }
            Tag::TableCell => self.span = None,
            Tag::CodeBlock(kind) => {
                self.flush_text();
                self.leaf = Leaf::Code {
                    lang: fence_lang(kind),
                    text: String::new(),
                };
            }
            Tag::HtmlBlock => {
                self.flush_text();
                self.leaf = Leaf::Html {
                    text: String::new(),
                };
            }
            Tag::BlockQuote(_) => {
                self.flush_text();
                self.containers.push(Container::Quote);
                self.tokens.push(Token::BlockquoteStart);
            }
            Tag::List(first) => {
                self.flush_text();
                self.tokens.push(Token::ListStart {
                    ordered: first.is_some(),
                });
            }
            Tag::Item => {
                self.flush_text();
                self.containers.push(Container::Item);
                self.tokens.push(if is_loose(rest) {
                    Token::LooseItemStart
                } else {
                    Token::ListItemStart
                });
            }
            Tag::Table(alignments) => {
                self.flush_text();
                self.leaf = Leaf::Table(TableBuilder {
                    align: alignments.iter().map(to_align).collect(),
                    ..TableBuilder::default()
                });
            }
            Tag::TableHead | Tag::TableRow => {
                if let Leaf::Table(table) = &mut self.leaf {
                    table.row.clear();
                }
            }
            Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Link { .. }
            | Tag::Image { .. } => self.extend(range),
            // Footnotes, definition lists and metadata have no token kind
            _ => {}
        }
    }

    fn end(&mut self, tag: &TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                let text = self.take_span();
                if self.in_item() {
                    self.tokens.push(Token::Text { text });
                } else {
                    self.tokens.push(Token::Paragraph { text });
                }
            }
            TagEnd::Heading(level) => {
                let text = self.take_span();
                self.tokens.push(Token::Heading {
                    depth: *level as u8,
                    text,
                });
            }
            TagEnd::TableCell => {
                let cell = self.take_span();
                if let Leaf::Table(table) = &mut self.leaf {
                    table.row.push(cell);
                }
            }
            TagEnd::TableHead => {
                if let Leaf::Table(table) = &mut self.leaf {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Leaf::Table(table) = &mut self.leaf {
                    let row = std::mem::take(&mut table.row);
                    table.cells.push(row);
                }
            }
            TagEnd::Table => {
                if let Leaf::Table(table) = std::mem::take(&mut self.leaf) {
                    self.tokens.push(Token::Table {
                        header: table.header,
                        align: table.align,
                        cells: table.cells,
                    });
                }
            }
            TagEnd::CodeBlock => {
                if let Leaf::Code { lang, text } = std::mem::take(&mut self.leaf) {
                    self.tokens.push(Token::Code {
                        lang,
                        text: text.trim_end_matches('\n').to_string(),
                    });
                }
            }
            TagEnd::HtmlBlock => {
                if let Leaf::Html { text } = std::mem::take(&mut self.leaf) {
                    let pre = PRE_BLOCK.is_match(&text);
                    self.tokens.push(Token::Html { pre, text });
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_text();
                self.containers.pop();
                self.tokens.push(Token::BlockquoteEnd);
            }
            TagEnd::List(_) => {
                self.flush_text();
                self.tokens.push(Token::ListEnd);
            }
            TagEnd::Item => {
                self.flush_text();
                self.containers.pop();
                self.tokens.push(Token::ListItemEnd);
            }
            _ => {}
        }
    }

    fn extend(&mut self, range: Range<usize>) {
        self.span = Some(match self.span.take() {
            Some(span) => span.start.min(range.start)..span.end.max(range.end),
            None => range,
        });
    }

    /// Emit inline content collected directly inside a tight list item
    fn flush_text(&mut self) {
        if self.span.is_some() && self.in_item() {
            let text = self.take_span();
            self.tokens.push(Token::Text { text });
        }
    }

    fn take_span(&mut self) -> String {
        self.span
            .take()
            .map(|span| self.inline_source(span))
            .unwrap_or_default()
    }

    fn in_item(&self) -> bool {
        self.containers.contains(&Container::Item)
    }

    /// Raw markup for `span`, with container prefixes removed from continuation lines
    fn inline_source(&self, span: Range<usize>) -> String {
        let quotes = self
            .containers
            .iter()
            .filter(|container| **container == Container::Quote)
            .count();

        let mut lines = self.src[span].split('\n');
        let mut out = lines.next().unwrap_or_default().to_string();
        for line in lines {
            out.push('\n');
            out.push_str(strip_quote_markers(line, quotes).trim_start());
        }
        out.trim_end().to_string()
    }
}

/// Remove up to `depth` leading `>` markers (lazy lines may have fewer)
fn strip_quote_markers(mut line: &str, depth: usize) -> &str {
    for _ in 0..depth {
        match line.trim_start_matches(' ').strip_prefix('>') {
            Some(after) => line = after.strip_prefix(' ').unwrap_or(after),
            None => break,
        }
    }
    line
}

/// Whether the item starting before `rest` directly holds a paragraph
fn is_loose(rest: &[(Event<'_>, Range<usize>)]) -> bool {
    let mut depth = 0usize;
    for (event, _) in rest {
        match event {
            Event::Start(Tag::Paragraph) if depth == 0 => return true,
            Event::Start(Tag::BlockQuote(_) | Tag::List(_)) => depth += 1,
            Event::End(TagEnd::BlockQuote(_) | TagEnd::List(_)) => {
                depth = depth.saturating_sub(1)
            }
            Event::End(TagEnd::Item) if depth == 0 => return false,
            _ => {}
        }
    }
    false
}

fn fence_lang(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
        CodeBlockKind::Indented => None,
    }
}

fn to_align(alignment: &Alignment) -> Option<Align> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some(Align::Left),
        Alignment::Center => Some(Align::Center),
        Alignment::Right => Some(Align::Right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(markdown: &str) -> Vec<Token> {
        lex(markdown, &RenderOptions::default()).tokens
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(
            tokens("# Title #\n\nSome *text*.\n"),
            vec![
                Token::Heading {
                    depth: 1,
                    text: "Title".to_string()
                },
                Token::paragraph("Some *text*."),
            ]
        );
    }

    #[test]
    fn test_tight_list_items_are_text() {
        assert_eq!(
            tokens("- a\n- **b**\n"),
            vec![
                Token::ListStart { ordered: false },
                Token::ListItemStart,
                Token::text("a"),
                Token::ListItemEnd,
                Token::ListItemStart,
                Token::text("**b**"),
                Token::ListItemEnd,
                Token::ListEnd,
            ]
        );
    }

    #[test]
    fn test_loose_list_items() {
        assert_eq!(
            tokens("1. a\n\n2. b\n"),
            vec![
                Token::ListStart { ordered: true },
                Token::LooseItemStart,
                Token::text("a"),
                Token::ListItemEnd,
                Token::LooseItemStart,
                Token::text("b"),
                Token::ListItemEnd,
                Token::ListEnd,
            ]
        );
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            tokens("- a\n  - b\n"),
            vec![
                Token::ListStart { ordered: false },
                Token::ListItemStart,
                Token::text("a"),
                Token::ListStart { ordered: false },
                Token::ListItemStart,
                Token::text("b"),
                Token::ListItemEnd,
                Token::ListEnd,
                Token::ListItemEnd,
                Token::ListEnd,
            ]
        );
    }

    #[test]
    fn test_continuation_lines_lose_indentation() {
        assert_eq!(
            tokens("- a\n  b\n")[2],
            Token::text("a\nb"),
        );
    }

    #[test]
    fn test_blockquote_markers_stripped() {
        assert_eq!(
            tokens("> a *b*\n> c\n"),
            vec![
                Token::BlockquoteStart,
                Token::paragraph("a *b*\nc"),
                Token::BlockquoteEnd,
            ]
        );
    }

    #[test]
    fn test_code_blocks() {
        assert_eq!(
            tokens("```rust ignore\nfn x() {}\n```\n"),
            vec![Token::Code {
                lang: Some("rust".to_string()),
                text: "fn x() {}".to_string()
            }]
        );
        assert_eq!(
            tokens("    indented\n"),
            vec![Token::Code {
                lang: None,
                text: "indented".to_string()
            }]
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            tokens("| a | *b* |\n|:-:|---|\n| 1 | 2 |\n"),
            vec![Token::Table {
                header: vec!["a".to_string(), "*b*".to_string()],
                align: vec![Some(Align::Center), None],
                cells: vec![vec!["1".to_string(), "2".to_string()]],
            }]
        );
    }

    #[test]
    fn test_table_needs_gfm() {
        let options = RenderOptions {
            gfm: false,
            ..RenderOptions::default()
        };
        let doc = lex("| a |\n|---|\n| 1 |\n", &options);
        assert!(matches!(doc.tokens[0], Token::Paragraph { .. }));
    }

    #[test]
    fn test_reference_definitions() {
        let doc = lex(
            "[x][site]\n\n[Site]: https://example.com \"Home\"\n",
            &RenderOptions::default(),
        );
        assert_eq!(doc.tokens, vec![Token::paragraph("[x][site]")]);
        let site = doc.links.get("site").unwrap();
        assert_eq!(site.href, "https://example.com");
        assert_eq!(site.title.as_deref(), Some("Home"));
    }

    #[test]
    fn test_html_blocks() {
        match &tokens("<pre>\nx\n</pre>\n")[0] {
            Token::Html { pre, text } => {
                assert!(pre);
                assert!(text.starts_with("<pre>"));
            }
            other => panic!("Expected Html, got {:?}", other),
        }
        match &tokens("<div>\nhi\n</div>\n")[0] {
            Token::Html { pre, .. } => assert!(!pre),
            other => panic!("Expected Html, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_and_line_endings() {
        assert_eq!(
            tokens("a\r\nb\r\n\r\n***\r\n"),
            vec![Token::paragraph("a\nb"), Token::Hr]
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a\tb\u{a0}c\rd\u{2424}e"), "a    b c\nd\ne");
    }
}
