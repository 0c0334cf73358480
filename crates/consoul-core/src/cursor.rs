//! Forward cursor over a token sequence with single-token lookahead

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::token::Token;

/// Token cursor owned by one render pass.
///
/// Nested group renderers share and advance the same cursor.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Peekable<IntoIter<Token>>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    /// Consume and return the next token
    pub fn advance(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    /// View the next token without consuming it
    pub fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    /// Consume the next token only if it is `text`, returning its body
    pub fn advance_text(&mut self) -> Option<String> {
        match self.tokens.next_if(|token| matches!(token, Token::Text { .. })) {
            Some(Token::Text { text }) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_order() {
        let mut stream = TokenStream::new(vec![Token::Hr, Token::Space, Token::text("a")]);

        assert_eq!(stream.peek(), Some(&Token::Hr));
        assert_eq!(stream.advance(), Some(Token::Hr));
        assert_eq!(stream.advance(), Some(Token::Space));
        assert_eq!(stream.peek(), Some(&Token::text("a")));
        assert_eq!(stream.advance(), Some(Token::text("a")));
        assert_eq!(stream.peek(), None);
        assert_eq!(stream.advance(), None);
    }

    #[test]
    fn test_advance_text_only_takes_text() {
        let mut stream = TokenStream::new(vec![Token::text("a"), Token::Hr]);

        assert_eq!(stream.advance_text(), Some("a".to_string()));
        assert_eq!(stream.advance_text(), None);
        assert_eq!(stream.advance(), Some(Token::Hr));
    }
}
