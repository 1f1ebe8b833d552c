//! Lexer for Jovian source text.
//!
//! Built on logos. Produces `(Token, Span)` pairs terminated by `Token::Eof`;
//! line and column numbers are recovered from a table of line starts.

use crate::parser::token::{Span, Token};
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r"//[^\n]*", logos::skip, priority = 5)]
    LineComment,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"-?[0-9]+", priority = 3)]
    Number,

    #[regex(r#""[^"]*""#)]
    String,

    #[regex(r"[A-Za-z_+\-*/=!<>%.?:][A-Za-z0-9_+\-*/=!<>%.?:]*")]
    Symbol,
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { char: char, span: Span },
    UnterminatedString { span: Span },
    InvalidNumber { text: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidNumber { span, .. } => *span,
        }
    }

    pub fn description(&self) -> String {
        match self {
            LexError::UnexpectedCharacter { char, .. } => {
                format!("Unexpected character '{}'", char)
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
            LexError::InvalidNumber { text, .. } => {
                format!("Number '{}' does not fit in a 32-bit integer", text)
            }
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.description(),
            self.span().line,
            self.span().column
        )
    }
}

impl std::error::Error for LexError {}

pub struct Lexer<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    fn span(&self, range: std::ops::Range<usize>) -> Span {
        let line_index = match self.line_starts.binary_search(&range.start) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = self.source[self.line_starts[line_index]..range.start]
            .chars()
            .count();
        Span::new(range.start, range.end, line_index as u32 + 1, column as u32 + 1)
    }

    /// Tokenize the whole source, collecting every error instead of stopping at the first.
    pub fn tokenize(self) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut lex = LogosToken::lexer(self.source);

        while let Some(result) = lex.next() {
            let span = self.span(lex.span());
            let text = lex.slice();
            match result {
                Ok(LogosToken::LParen) => tokens.push((Token::LParen, span)),
                Ok(LogosToken::RParen) => tokens.push((Token::RParen, span)),
                Ok(LogosToken::Number) => match text.parse::<i32>() {
                    Ok(n) => tokens.push((Token::Number(n), span)),
                    Err(_) => errors.push(LexError::InvalidNumber {
                        text: text.to_string(),
                        span,
                    }),
                },
                Ok(LogosToken::String) => {
                    let inner = &text[1..text.len() - 1];
                    tokens.push((Token::String(inner.to_string()), span));
                }
                Ok(LogosToken::Symbol) => tokens.push((Token::Symbol(text.to_string()), span)),
                Ok(LogosToken::Whitespace) | Ok(LogosToken::LineComment) => {}
                Err(()) => {
                    if text.starts_with('"') {
                        let span = self.span(lex.span().start..self.source.len());
                        errors.push(LexError::UnterminatedString { span });
                        break;
                    }
                    let char = text.chars().next().unwrap_or('\0');
                    errors.push(LexError::UnexpectedCharacter { char, span });
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let end = self.source.len();
        tokens.push((Token::Eof, self.span(end..end)));
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .expect("should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_lex_simple_list() {
        assert_eq!(
            kinds("(+ 1 2)"),
            vec![
                Token::LParen,
                Token::Symbol("+".to_string()),
                Token::Number(1),
                Token::Number(2),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_negative_number_vs_minus() {
        assert_eq!(
            kinds("(- -1 x)"),
            vec![
                Token::LParen,
                Token::Symbol("-".to_string()),
                Token::Number(-1),
                Token::Symbol("x".to_string()),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_string_keeps_escapes() {
        assert_eq!(
            kinds(r#"(printf "Value: %d\n" 42)"#)[2],
            Token::String(r"Value: %d\n".to_string())
        );
    }

    #[test]
    fn test_lex_comments_and_operators() {
        let tokens = kinds("// header\n(>= a_b ->) // trailing");
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Symbol(">=".to_string()),
                Token::Symbol("a_b".to_string()),
                Token::Symbol("->".to_string()),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_span_line_and_column() {
        let tokens = Lexer::new("(begin\n  foo)").tokenize().expect("should lex");
        let (token, span) = &tokens[2];
        assert_eq!(token, &Token::Symbol("foo".to_string()));
        assert_eq!((span.line, span.column), (2, 3));
        assert_eq!(span.slice("(begin\n  foo)"), "foo");
    }

    #[test]
    fn test_lex_number_overflow() {
        let errors = Lexer::new("(+ 99999999999 1)").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::InvalidNumber { .. }));
    }

    #[test]
    fn test_lex_unterminated_string() {
        let errors = Lexer::new("(printf \"oops)").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_lex_unexpected_character() {
        let errors = Lexer::new("(x # y)").tokenize().unwrap_err();
        assert_eq!(
            errors[0],
            LexError::UnexpectedCharacter {
                char: '#',
                span: Span::new(3, 4, 1, 4)
            }
        );
    }
}
