//! Recursive-descent parser from tokens to `Expression`.

use super::ast::Expression;
use super::lexer::{LexError, Lexer};
use super::token::{Span, Token};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("{0}")]
    Lex(LexError),

    #[error("Unexpected {found} at {span}")]
    UnexpectedToken { found: String, span: Span },

    #[error("Unclosed '(' opened at {span}")]
    UnclosedList { span: Span },

    #[error("Empty program")]
    EmptyProgram,
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Lex(err) => Some(err.span()),
            ParseError::UnexpectedToken { span, .. } | ParseError::UnclosedList { span } => {
                Some(*span)
            }
            ParseError::EmptyProgram => None,
        }
    }
}

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source).tokenize().map_err(|mut errors| {
            // tokenize never returns an empty error list
            ParseError::Lex(errors.remove(0))
        })?;
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> &(Token, Span) {
        // The token stream always ends with Eof, and advance() never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> (Token, Span) {
        let token = self.peek().clone();
        if !token.0.is_eof() {
            self.pos += 1;
        }
        token
    }

    pub fn at_end(&self) -> bool {
        self.peek().0.is_eof()
    }

    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let (token, span) = self.advance();
        match token {
            Token::Number(n) => Ok(Expression::Number(n)),
            Token::String(s) => Ok(Expression::String(s)),
            Token::Symbol(s) => Ok(Expression::Symbol(s)),
            Token::LParen => {
                let mut items = Vec::new();
                loop {
                    match &self.peek().0 {
                        Token::RParen => {
                            self.advance();
                            return Ok(Expression::List(items));
                        }
                        Token::Eof => return Err(ParseError::UnclosedList { span }),
                        _ => items.push(self.parse_expression()?),
                    }
                }
            }
            Token::RParen | Token::Eof => Err(ParseError::UnexpectedToken {
                found: token.to_string(),
                span,
            }),
        }
    }

    /// Parse every remaining top-level expression.
    pub fn parse_all(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut exprs = Vec::new();
        while !self.at_end() {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }
}

/// Parse exactly one expression.
pub fn parse_expression(source: &str) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(source)?;
    if parser.at_end() {
        return Err(ParseError::EmptyProgram);
    }
    let expr = parser.parse_expression()?;
    if !parser.at_end() {
        let (token, span) = parser.advance();
        return Err(ParseError::UnexpectedToken {
            found: token.to_string(),
            span,
        });
    }
    Ok(expr)
}

/// Parse a whole program and wrap its top-level expressions in `(begin ...)`.
pub fn parse_program(source: &str) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(source)?;
    let mut items = vec![Expression::symbol("begin")];
    items.extend(parser.parse_all()?);
    Ok(Expression::List(items))
}
