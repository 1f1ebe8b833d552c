//! Expression tree produced by the parser.

use std::fmt;

/// An s-expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(i32),
    String(String),
    Symbol(String),
    List(Vec<Expression>),
}

impl Expression {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expression::Symbol(name.into())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expression::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Expression]> {
        match self {
            Expression::List(items) => Some(items),
            _ => None,
        }
    }

    /// The head symbol of a list, e.g. `if` for `(if c a b)`
    pub fn head(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(Expression::as_symbol)
    }

    /// True for a list whose head is the symbol `tag`
    pub fn is_tagged(&self, tag: &str) -> bool {
        self.head() == Some(tag)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{}", n),
            Expression::String(s) => write!(f, "\"{}\"", s),
            Expression::Symbol(s) => write!(f, "{}", s),
            Expression::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}
