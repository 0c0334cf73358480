//! ANSI style primitives
//!
//! Every style wraps its text in its own SGR on/off pair instead of a full
//! reset, so styled strings can be nested: `bold(&italic("x"))` keeps the
//! bold after the italic span closes.

use std::fmt::Display;

use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};

/// String styling functions, or identity functions when color is off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styles {
    enabled: bool,
}

impl Styles {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Styles that leave text untouched
    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn bold(&self, text: &str) -> String {
        self.attribute(text, Attribute::Bold, Attribute::NormalIntensity)
    }

    pub fn italic(&self, text: &str) -> String {
        self.attribute(text, Attribute::Italic, Attribute::NoItalic)
    }

    pub fn underline(&self, text: &str) -> String {
        self.attribute(text, Attribute::Underlined, Attribute::NoUnderline)
    }

    pub fn inverse(&self, text: &str) -> String {
        self.attribute(text, Attribute::Reverse, Attribute::NoReverse)
    }

    pub fn cyan(&self, text: &str) -> String {
        self.foreground(text, Color::DarkCyan)
    }

    pub fn red(&self, text: &str) -> String {
        self.foreground(text, Color::DarkRed)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.foreground(text, Color::DarkYellow)
    }

    pub fn green(&self, text: &str) -> String {
        self.foreground(text, Color::DarkGreen)
    }

    fn attribute(&self, text: &str, on: Attribute, off: Attribute) -> String {
        self.wrap(text, SetAttribute(on), SetAttribute(off))
    }

    fn foreground(&self, text: &str, color: Color) -> String {
        self.wrap(
            text,
            SetForegroundColor(color),
            SetForegroundColor(Color::Reset),
        )
    }

    fn wrap(&self, text: &str, on: impl Display, off: impl Display) -> String {
        if self.enabled {
            format!("{on}{text}{off}")
        } else {
            text.to_string()
        }
    }
}

/// Uppercase transform, applied regardless of color support
pub fn uppercase(text: &str) -> String {
    text.to_uppercase()
}
