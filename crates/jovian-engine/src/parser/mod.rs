//! Jovian parser
//!
//! Turns source text into `Expression` trees. Source is a sequence of
//! parenthesized prefix expressions; `parse_program` wraps them in an
//! implicit `(begin ...)` block.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Expression;
pub use lexer::{LexError, Lexer};
pub use parser::{parse_expression, parse_program, ParseError, Parser};
pub use token::{Span, Token};
