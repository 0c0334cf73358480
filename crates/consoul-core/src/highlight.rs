//! Syntax highlighting using syntect
//!
//! Highlighters report each run of code with a coarse [`HighlightKind`] and
//! let the caller decide how the run is painted.

use once_cell::sync::Lazy;
use syntect::easy::ScopeRangeIterator;
use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::style::Styles;

/// Global syntax set - loaded once on first use
static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Scope prefixes mapped to highlight kinds, checked in order for each scope
static SCOPE_KINDS: Lazy<Vec<(Scope, HighlightKind)>> = Lazy::new(|| {
    [
        ("keyword", HighlightKind::Keyword),
        ("storage", HighlightKind::Keyword),
        ("string", HighlightKind::String),
        ("constant.numeric", HighlightKind::Literal),
        ("constant.language", HighlightKind::Literal),
        ("constant.character", HighlightKind::Literal),
        ("variable.parameter", HighlightKind::Params),
        ("meta.function.parameters", HighlightKind::Params),
        ("meta.parameters", HighlightKind::Params),
    ]
    .into_iter()
    .filter_map(|(name, kind)| Scope::new(name).ok().map(|scope| (scope, kind)))
    .collect()
});

/// Coarse token classes a highlighter reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Keyword,
    String,
    Literal,
    /// A parameter list, delimiters included
    Params,
    Other,
}

impl HighlightKind {
    /// Paint a run of code: keywords cyan, strings red, literals yellow,
    /// parameter lists green inside their delimiters
    pub fn paint(self, styles: &Styles, text: &str) -> String {
        match self {
            Self::Keyword => styles.cyan(text),
            Self::String => styles.red(text),
            Self::Literal => styles.yellow(text),
            Self::Params => paint_params(styles, text),
            Self::Other => text.to_string(),
        }
    }
}

fn paint_params(styles: &Styles, text: &str) -> String {
    let mut chars = text.char_indices();
    let (Some((_, first)), Some((last_idx, last))) = (chars.next(), chars.next_back()) else {
        return text.to_string();
    };

    let inner = &text[first.len_utf8()..last_idx];
    if inner.is_empty() {
        return text.to_string();
    }
    format!("{first}{}{last}", styles.green(inner))
}

/// Callback used to paint a classified run of code
pub type Paint<'a> = dyn Fn(HighlightKind, &str) -> String + 'a;

/// Language-aware code highlighter
pub trait Highlighter {
    /// Highlight `code` written in `lang`, painting each run through `paint`.
    ///
    /// Returns `None` when the language is unknown.
    fn highlight(&self, lang: &str, code: &str, paint: &Paint<'_>) -> Option<String>;
}

/// Highlighter backed by syntect's default syntax definitions
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, lang: &str, code: &str, paint: &Paint<'_>) -> Option<String> {
        // Matches by extension first, then by name
        let syntax = SYNTAX_SET.find_syntax_by_token(lang)?;

        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut runs = Runs::default();

        for line in LinesWithEndings::from(code) {
            let ops = match state.parse_line(line, &SYNTAX_SET) {
                Ok(ops) => ops,
                Err(e) => {
                    tracing::debug!(lang, error = %e, "Highlighting failed, using raw code");
                    return None;
                }
            };

            for (range, op) in ScopeRangeIterator::new(&ops, line) {
                if let Err(e) = stack.apply(op) {
                    tracing::debug!(lang, error = ?e, "Scope stack rejected op");
                    return None;
                }
                if !range.is_empty() {
                    runs.push(classify(&stack), &line[range]);
                }
            }
        }

        Some(runs.finish(paint))
    }
}

/// Classify a scope stack, innermost scope first
fn classify(stack: &ScopeStack) -> HighlightKind {
    stack
        .as_slice()
        .iter()
        .rev()
        .find_map(|scope| {
            SCOPE_KINDS
                .iter()
                .find(|(prefix, _)| prefix.is_prefix_of(*scope))
                .map(|(_, kind)| *kind)
        })
        .unwrap_or(HighlightKind::Other)
}

/// Adjacent runs of the same kind, merged so each is painted once
#[derive(Default)]
struct Runs {
    done: Vec<(HighlightKind, String)>,
}

impl Runs {
    fn push(&mut self, kind: HighlightKind, text: &str) {
        match self.done.last_mut() {
            Some((last, buf)) if *last == kind => buf.push_str(text),
            _ => self.done.push((kind, text.to_string())),
        }
    }

    fn finish(self, paint: &Paint<'_>) -> String {
        self.done
            .iter()
            .map(|(kind, text)| paint(*kind, text))
            .collect()
    }
}
