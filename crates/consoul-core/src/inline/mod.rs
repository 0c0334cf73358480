//! Inline markup rendering
//!
//! Scans inline markup left to right, applying the first rule that matches
//! at the current position (see [`rules`]). Emphasis, strikethrough and link
//! bodies are rendered by re-entering [`InlineRenderer::output`].

mod punctuation;
mod rules;

pub use punctuation::{mangle, mangle_with, smartypants};

use crate::error::{RenderError, Result};
use crate::options::RenderOptions;
use crate::style::Styles;
use crate::token::LinkTable;

use rules::{Grammar, Inline};

/// Renders inline markup to styled text, resolving reference links against a link table
pub struct InlineRenderer<'a> {
    links: &'a LinkTable,
    options: &'a RenderOptions,
    styles: Styles,
    grammar: Grammar,
}

impl<'a> InlineRenderer<'a> {
    pub fn new(links: &'a LinkTable, options: &'a RenderOptions) -> Self {
        Self {
            links,
            options,
            styles: Styles::new(options.color),
            grammar: Grammar::new(options),
        }
    }

    /// Render `src` to styled text.
    ///
    /// Fails only when the text holds a character no rule accepts.
    pub fn output(&self, src: &str) -> Result<String> {
        let mut out = String::with_capacity(src.len());
        let mut rest = src;

        while !rest.is_empty() {
            let scan = rules::scan(&self.grammar, rest).ok_or_else(|| RenderError::unmatched(rest))?;
            let consumed = self.emit(scan.inline, scan.len, &mut out)?;
            rest = &rest[consumed..];
        }

        Ok(out)
    }

    /// Append the rendering of one match, returning how many bytes it consumed
    fn emit(&self, inline: Inline<'_>, len: usize, out: &mut String) -> Result<usize> {
        match inline {
            Inline::Escape(ch) => out.push_str(ch),
            Inline::Autolink { text, email } => {
                let (href, shown) = if email {
                    let address = text.strip_prefix("mailto:").unwrap_or(text);
                    (format!("mailto:{address}"), self.obfuscate(address))
                } else {
                    (text.to_string(), text.to_string())
                };
                out.push_str(&self.hyperlink(&href, self.styles.underline(&shown)));
            }
            Inline::Url(url) => {
                let styled = self.styles.inverse(&self.styles.underline(url));
                out.push_str(&self.hyperlink(url, styled));
            }
            Inline::Tag(tag) => out.push_str(tag),
            Inline::Link { text, href } => out.push_str(&self.link(text, href)?),
            Inline::RefLink { text, label, raw } => {
                match self.links.get(label).filter(|def| !def.href.is_empty()) {
                    Some(def) => out.push_str(&self.link(text, &def.href)?),
                    None => {
                        // not a link after all: keep the bracket, rescan after it
                        let Some(first) = raw.chars().next() else {
                            return Ok(len);
                        };
                        out.push(first);
                        return Ok(first.len_utf8());
                    }
                }
            }
            Inline::Strong(body) => out.push_str(&self.styles.bold(&self.output(body)?)),
            Inline::Em(body) => out.push_str(&self.styles.italic(&self.output(body)?)),
            Inline::Code(code) => {
                out.push('`');
                out.push_str(code);
                out.push('`');
            }
            Inline::Br => out.push_str("\n\n"),
            Inline::Del(body) => {
                out.push('~');
                out.push_str(&self.output(body)?);
                out.push('~');
            }
            Inline::Text(text) => {
                if self.options.smartypants {
                    out.push_str(&smartypants(text));
                } else {
                    out.push_str(text);
                }
            }
        }
        Ok(len)
    }

    /// Link text, rendered and underlined; the target only shows up as an OSC 8 hyperlink
    fn link(&self, text: &str, href: &str) -> Result<String> {
        let styled = self.styles.underline(&self.output(text)?);
        Ok(self.hyperlink(href, styled))
    }

    fn hyperlink(&self, href: &str, text: String) -> String {
        if self.options.hyperlinks && self.styles.is_enabled() {
            format!("\x1b]8;;{href}\x1b\\{text}\x1b]8;;\x1b\\")
        } else {
            text
        }
    }

    fn obfuscate(&self, address: &str) -> String {
        if self.options.mangle {
            mangle(address)
        } else {
            address.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::LinkDef;

    fn links() -> LinkTable {
        let mut links = LinkTable::new();
        links.insert(
            "Site",
            LinkDef {
                href: "https://example.com".to_string(),
                title: Some("Home".to_string()),
            },
        );
        links.insert(
            "empty",
            LinkDef {
                href: String::new(),
                title: None,
            },
        );
        links
    }

    fn render_with(options: &RenderOptions, src: &str) -> String {
        let links = links();
        InlineRenderer::new(&links, options).output(src).unwrap()
    }

    fn plain(src: &str) -> String {
        render_with(&RenderOptions::plain(), src)
    }

    fn colored(src: &str) -> String {
        render_with(
            &RenderOptions {
                mangle: false,
                ..RenderOptions::default()
            },
            src,
        )
    }

    #[test]
    fn test_plain_text_only_gets_smartypants() {
        for s in ["hello world", "it's -- fine...", "a \"quote\"", "x\ny", "3 + 4 = 7"] {
            assert_eq!(plain(s), smartypants(s));
            assert_eq!(colored(s), smartypants(s));
        }
    }

    #[test]
    fn test_smartypants_can_be_disabled() {
        let options = RenderOptions {
            smartypants: false,
            ..RenderOptions::plain()
        };
        assert_eq!(render_with(&options, "it's -- fine"), "it's -- fine");
    }

    #[test]
    fn test_emphasis_nests() {
        let styles = Styles::new(true);
        assert_eq!(colored("**bold**"), styles.bold("bold"));
        assert_eq!(colored("*it*"), styles.italic("it"));
        assert_eq!(
            colored("**a *b* c**"),
            styles.bold(&format!("a {} c", styles.italic("b")))
        );
        assert_eq!(plain("**a *b* c**"), "a b c");
    }

    #[test]
    fn test_strikethrough_and_code() {
        assert_eq!(plain("~~gone~~"), "~gone~");
        assert_eq!(plain("use `x -- y` here"), "use `x -- y` here");
    }

    #[test]
    fn test_escape_is_literal() {
        assert_eq!(plain(r"\*not em\*"), "*not em*");
    }

    #[test]
    fn test_line_break() {
        assert_eq!(plain("one  \ntwo"), "one\n\ntwo");
    }

    #[test]
    fn test_tag_passthrough() {
        assert_eq!(plain("a <b>bold</b>"), "a <b>bold</b>");
    }

    #[test]
    fn test_links_show_text_only() {
        let styles = Styles::new(true);
        assert_eq!(plain("[the site](https://example.com \"Home\")"), "the site");
        assert_eq!(
            colored("[*x*](https://example.com)"),
            styles.underline(&styles.italic("x"))
        );
        assert_eq!(plain("[text][site]"), "text");
        assert_eq!(plain("[Site]"), "Site");
    }

    #[test]
    fn test_missing_reference_degrades_to_text() {
        assert_eq!(plain("[x][missing]"), "[x][missing]");
        assert_eq!(plain("[nothing here]"), "[nothing here]");
        assert_eq!(plain("![alt][missing]"), "![alt][missing]");
        // empty href counts as missing
        assert_eq!(plain("[empty]"), "[empty]");
    }

    #[test]
    fn test_urls() {
        let styles = Styles::new(true);
        assert_eq!(plain("see https://example.com."), "see https://example.com.");
        assert_eq!(
            colored("https://example.com"),
            styles.inverse(&styles.underline("https://example.com"))
        );
        assert_eq!(
            colored("<https://example.com>"),
            styles.underline("https://example.com")
        );
    }

    #[test]
    fn test_email_autolink() {
        assert_eq!(plain("<mailto:me@example.com>"), "me@example.com");

        let options = RenderOptions {
            mangle: true,
            ..RenderOptions::plain()
        };
        let out = render_with(&options, "<me@example.com>");
        assert!(out.starts_with("&#"));
        assert!(!out.contains('@'));
    }

    #[test]
    fn test_hyperlinks_wrap_link_text() {
        let options = RenderOptions {
            hyperlinks: true,
            ..RenderOptions::default()
        };
        let out = render_with(&options, "[a](https://example.com)");
        assert!(out.starts_with("\x1b]8;;https://example.com\x1b\\"));
        assert!(out.ends_with("\x1b]8;;\x1b\\"));

        // no escape sequences at all without color
        let options = RenderOptions {
            hyperlinks: true,
            ..RenderOptions::plain()
        };
        assert_eq!(render_with(&options, "[a](https://example.com)"), "a");
    }

    #[test]
    fn test_unmatched_control_byte_is_fatal() {
        let links = links();
        let options = RenderOptions::plain();
        let inline = InlineRenderer::new(&links, &options);

        for _ in 0..3 {
            let err = inline.output("ok \u{1}").unwrap_err();
            assert!(matches!(err, RenderError::UnmatchedInput { byte: 1 }));
        }

        // faults inside nested emphasis propagate too
        let err = inline.output("**a\u{0}b**").unwrap_err();
        assert!(matches!(err, RenderError::UnmatchedInput { byte: 0 }));
    }

    #[test]
    fn test_long_paragraphs_render_in_linear_time() {
        let start = std::time::Instant::now();
        assert_eq!(plain(&"*a* ".repeat(32_000)), "a ".repeat(32_000));
        assert_eq!(plain(&"foo_bar ".repeat(32_000)), "foo_bar ".repeat(32_000));
        assert!(
            start.elapsed() < std::time::Duration::from_secs(5),
            "took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_pedantic_emphasis() {
        let options = RenderOptions {
            pedantic: true,
            ..RenderOptions::plain()
        };
        assert_eq!(render_with(&options, "* not em*"), "* not em*");
        assert_eq!(render_with(&options, "*em*"), "em");
    }
}
