//! Inline rule matchers
//!
//! Each matcher looks at the front of the remaining text and, on a match,
//! reports how many bytes it spans and what it captured. [`RULES`] fixes the
//! precedence: the first matcher that succeeds wins.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::RenderOptions;

static ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\\([\\`*{}\[\]()#+\-.!_>])").unwrap());

static ESCAPE_GFM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\\([\\`*{}\[\]()#+\-.!_>~|])").unwrap());

static AUTOLINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<([^ >]+(@|:/)[^ >]+)>").unwrap());

/// Bare URL, not ending in trailing punctuation
static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^https?://[^\s<]+[^<.,:;"')\]\s]"#).unwrap());

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:<!--[\s\S]*?-->|</?[A-Za-z0-9_]+(?:"[^"]*"|'[^']*'|[^'">])*?>)"#).unwrap()
});

static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^!?\[((?:\[[^\]]*\]|[^\[\]])*)\]\(\s*<?([\s\S]*?)>?(?:\s+['"]([\s\S]*?)['"])?\s*\)"#,
    )
    .unwrap()
});

static REFLINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!?\[((?:\[[^\]]*\]|[^\[\]])*)\]\s*\[([^\]]*)\]").unwrap());

static NOLINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!?\[((?:\[[^\]]*\]|[^\[\]])*)\]").unwrap());

/// Rule variants selected by the render options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Grammar {
    pub gfm: bool,
    pub breaks: bool,
    pub pedantic: bool,
}

impl Grammar {
    pub fn new(options: &RenderOptions) -> Self {
        Self {
            gfm: options.gfm,
            breaks: options.gfm && options.breaks,
            pedantic: options.pedantic,
        }
    }

    /// Spaces required before a newline for it to be a line break
    fn min_break_spaces(&self) -> usize {
        if self.breaks {
            0
        } else {
            2
        }
    }

    /// Whether `rest` begins with `spaces newline`
    fn line_break_at(&self, rest: &str) -> bool {
        let spaces = rest.bytes().take_while(|b| *b == b' ').count();
        spaces >= self.min_break_spaces() && rest.as_bytes().get(spaces) == Some(&b'\n')
    }

    /// Whether a plain-text run has to stop in front of `rest`
    fn text_stops_at(&self, rest: &str) -> bool {
        let Some(first) = rest.chars().next() else {
            return true;
        };
        if is_raw_control(first) {
            return true;
        }
        if matches!(first, '\\' | '<' | '!' | '[' | '_' | '*' | '`') {
            return true;
        }
        if self.gfm
            && (first == '~' || rest.starts_with("http://") || rest.starts_with("https://"))
        {
            return true;
        }
        self.line_break_at(rest)
    }
}

/// What an inline rule captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inline<'a> {
    /// The escaped character
    Escape(&'a str),
    Autolink {
        text: &'a str,
        email: bool,
    },
    Url(&'a str),
    Tag(&'a str),
    Link {
        text: &'a str,
        href: &'a str,
    },
    /// `[text][label]` or `[label]`; `raw` is the whole match
    RefLink {
        text: &'a str,
        label: &'a str,
        raw: &'a str,
    },
    Strong(&'a str),
    Em(&'a str),
    Code(&'a str),
    Br,
    Del(&'a str),
    Text(&'a str),
}

/// A successful match: byte length and capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scan<'a> {
    pub len: usize,
    pub inline: Inline<'a>,
}

impl<'a> Scan<'a> {
    fn new(len: usize, inline: Inline<'a>) -> Self {
        Self { len, inline }
    }
}

type Matcher = for<'a> fn(&Grammar, &'a str) -> Option<Scan<'a>>;

/// Matchers in precedence order
pub(crate) static RULES: [Matcher; 13] = [
    escape, autolink, url, tag, link, reflink, nolink, strong, em, code, br, del, text,
];

/// Run the rules in order against the front of `src`
pub(crate) fn scan<'a>(grammar: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    RULES.iter().find_map(|rule| rule(grammar, src))
}

fn escape<'a>(grammar: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let re = if grammar.gfm { &*ESCAPE_GFM } else { &*ESCAPE };
    let cap = re.captures(src)?;
    Some(Scan::new(cap[0].len(), Inline::Escape(cap.get(1)?.as_str())))
}

fn autolink<'a>(_: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let cap = AUTOLINK.captures(src)?;
    Some(Scan::new(
        cap[0].len(),
        Inline::Autolink {
            text: cap.get(1)?.as_str(),
            email: &cap[2] == "@",
        },
    ))
}

fn url<'a>(grammar: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    if !grammar.gfm {
        return None;
    }
    let m = URL.find(src)?;
    Some(Scan::new(m.len(), Inline::Url(m.as_str())))
}

fn tag<'a>(_: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let m = TAG.find(src)?;
    Some(Scan::new(m.len(), Inline::Tag(m.as_str())))
}

fn link<'a>(_: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let cap = LINK.captures(src)?;
    Some(Scan::new(
        cap[0].len(),
        Inline::Link {
            text: cap.get(1)?.as_str(),
            href: cap.get(2)?.as_str(),
        },
    ))
}

fn reflink<'a>(_: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let cap = REFLINK.captures(src)?;
    let text = cap.get(1)?.as_str();
    // `[text][]` refers to its own text
    let label = cap
        .get(2)
        .map(|m| m.as_str())
        .filter(|label| !label.is_empty())
        .unwrap_or(text);
    let raw = cap.get(0)?.as_str();
    Some(Scan::new(raw.len(), Inline::RefLink { text, label, raw }))
}

fn nolink<'a>(_: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let cap = NOLINK.captures(src)?;
    let text = cap.get(1)?.as_str();
    let raw = cap.get(0)?.as_str();
    Some(Scan::new(
        raw.len(),
        Inline::RefLink {
            text,
            label: text,
            raw,
        },
    ))
}

fn strong<'a>(grammar: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let (len, body) = ["__", "**"].iter().find_map(|delim| {
        let forbid = delim.chars().next();
        delimited(src, delim, forbid, grammar.pedantic)
    })?;
    Some(Scan::new(len, Inline::Strong(body)))
}

fn em<'a>(grammar: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let (len, body) = if grammar.pedantic {
        ["_", "*"].iter().find_map(|delim| {
            let forbid = delim.chars().next();
            delimited(src, delim, forbid, true)
        })?
    } else {
        emphasis(src)?
    };
    Some(Scan::new(len, Inline::Em(body)))
}

fn code<'a>(_: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let run = src.bytes().take_while(|b| *b == b'`').count();
    // a shorter opening fence may still close when the full run cannot
    let (len, body) = (1..=run).rev().find_map(|fence| code_span(src, fence))?;
    Some(Scan::new(len, Inline::Code(body)))
}

fn br<'a>(grammar: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    if !grammar.line_break_at(src) {
        return None;
    }
    let len = src.find('\n')? + 1;
    // a break at the very end of the text stays plain text
    if src[len..].trim().is_empty() {
        return None;
    }
    Some(Scan::new(len, Inline::Br))
}

fn del<'a>(grammar: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    if !grammar.gfm {
        return None;
    }
    let (len, body) = delimited(src, "~~", None, true)?;
    Some(Scan::new(len, Inline::Del(body)))
}

fn text<'a>(grammar: &Grammar, src: &'a str) -> Option<Scan<'a>> {
    let mut chars = src.char_indices();
    let (_, first) = chars.next()?;
    if is_raw_control(first) {
        return None;
    }
    let end = chars
        .find(|(i, _)| grammar.text_stops_at(&src[*i..]) && !is_intraword_underscore(src, *i))
        .map_or(src.len(), |(i, _)| i);
    Some(Scan::new(end, Inline::Text(&src[..end])))
}

/// Control characters no rule accepts as text
fn is_raw_control(ch: char) -> bool {
    ch.is_ascii_control() && !matches!(ch, '\t' | '\n' | '\r')
}

/// An underscore inside a word never opens emphasis, so text runs over it
fn is_intraword_underscore(src: &str, i: usize) -> bool {
    let bytes = src.as_bytes();
    i > 0 && bytes[i] == b'_' && is_word_byte(bytes[i - 1])
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `delim body delim` with the shortest non-empty body whose closing
/// delimiter is not followed by `forbid`. With `tight`, the body has to start
/// and end with non-whitespace.
fn delimited<'a>(
    src: &'a str,
    delim: &str,
    forbid: Option<char>,
    tight: bool,
) -> Option<(usize, &'a str)> {
    let rest = src.strip_prefix(delim)?;
    let first = rest.chars().next()?;
    if tight && first.is_whitespace() {
        return None;
    }

    rest.char_indices().skip(1).find_map(|(i, _)| {
        let close = rest[i..].strip_prefix(delim)?;
        let body = &rest[..i];
        if tight && body.chars().next_back().is_some_and(char::is_whitespace) {
            return None;
        }
        if forbid.is_some_and(|f| close.starts_with(f)) {
            return None;
        }
        Some((delim.len() + i + delim.len(), body))
    })
}

/// `_body_` or `*body*`, where the body may swallow doubled delimiters.
///
/// The body is the first one a lazy left-to-right search reaches, trying a
/// doubled delimiter before a single character at each step. An underscore
/// only closes in front of a non-word character; an asterisk only closes when
/// not followed by another asterisk.
fn emphasis(src: &str) -> Option<(usize, &str)> {
    let bytes = src.as_bytes();
    let delim = *bytes.first()?;
    if delim != b'_' && delim != b'*' {
        return None;
    }

    let closes = |pos: usize| {
        bytes.get(pos) == Some(&delim)
            && match bytes.get(pos + 1) {
                None => true,
                Some(&next) if delim == b'_' => !is_word_byte(next),
                Some(&next) => next != delim,
            }
    };
    // next body positions, doubled delimiter last so it is popped first
    let steps = |pos: usize| {
        let single = src[pos..].chars().next().map(|c| pos + c.len_utf8());
        let doubled = bytes.get(pos) == Some(&delim) && bytes.get(pos + 1) == Some(&delim);
        let double = doubled.then_some(pos + 2);
        [single, double]
    };

    // Positions only move forward, so one expanded before has already failed
    let mut expanded = HashSet::new();
    let mut pending: Vec<usize> = steps(1).into_iter().flatten().collect();
    while let Some(pos) = pending.pop() {
        if closes(pos) {
            return Some((pos + 1, &src[1..pos]));
        }
        if expanded.insert(pos) {
            pending.extend(steps(pos).into_iter().flatten());
        }
    }
    None
}

/// Code span opened by exactly `fence` backticks and closed by a run of the
/// same length after a non-empty body
fn code_span(src: &str, fence: usize) -> Option<(usize, &str)> {
    let bytes = src.as_bytes();
    let mut i = fence;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        if start > fence && i - start == fence {
            let inner = &src[fence..start];
            let trimmed = inner.trim();
            let body = if trimmed.is_empty() {
                // whitespace-only spans keep their last character
                let last = inner.chars().next_back()?;
                &inner[inner.len() - last.len_utf8()..]
            } else {
                trimmed
            };
            return Some((i, body));
        }
    }
    None
}
