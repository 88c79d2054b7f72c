//! Recursive descent parser that turns lexer tokens into [`IsaDocument`](crate::isa::ast::IsaDocument).

mod attributes;
mod body;
mod directives;
mod spans;
mod specification;

pub use specification::{Parser, parse_str};

pub(super) use super::lexer::{Lexer, Token, TokenKind};
