//! Block token types consumed by the renderer
//!
//! The serialized form matches marked-style lexer dumps: one JSON object per
//! token, tagged by a `"type"` field holding the snake_case kind name.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A block-level token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    /// Blank lines between blocks
    Space,
    /// Thematic break
    Hr,
    Heading {
        depth: u8,
        text: String,
    },
    Code {
        #[serde(default)]
        lang: Option<String>,
        text: String,
    },
    Table {
        header: Vec<String>,
        /// Per-column alignment, `None` when unset
        #[serde(default)]
        align: Vec<Option<Align>>,
        #[serde(default)]
        cells: Vec<Vec<String>>,
    },
    BlockquoteStart,
    BlockquoteEnd,
    ListStart {
        #[serde(default)]
        ordered: bool,
    },
    ListEnd,
    ListItemStart,
    /// List item whose content renders as full blocks
    LooseItemStart,
    ListItemEnd,
    Html {
        /// Literal block (`<pre>`, `<script>`, `<style>`), never inline rendered
        #[serde(default)]
        pre: bool,
        text: String,
    },
    Paragraph {
        text: String,
    },
    Text {
        text: String,
    },
}

impl Token {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }
}

/// Table column alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    /// Value of the `align` attribute in table output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Target of a reference-style link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDef {
    pub href: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Link reference definitions keyed by normalized label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkTable {
    links: HashMap<String, LinkDef>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition; the label is normalized first
    pub fn insert(&mut self, label: &str, def: LinkDef) {
        self.links.insert(normalize_label(label), def);
    }

    /// Look up a label, normalizing it the same way as on insert
    pub fn get(&self, label: &str) -> Option<&LinkDef> {
        self.links.get(&normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Collapse whitespace runs to one space and lowercase
pub fn normalize_label(label: &str) -> String {
    WHITESPACE_RUN.replace_all(label, " ").to_lowercase()
}

/// A lexed document: block tokens plus the link table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub links: LinkTable,
}

impl Document {
    /// Read a token document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the document as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
