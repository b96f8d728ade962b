//! Zerotape parser module
//!
//! Parses the token stream into an arena-backed syntax tree. Nodes are
//! reached through borrowed views ([`Statements`], [`Expr`], [`Elements`])
//! that live as long as the [`Ast`].

mod ast;
#[allow(clippy::module_inception)]
mod parser;

pub use ast::{Assignment, Ast, Elements, Expr, ExprKind, Statements, Value};
pub use parser::{parse_file, parse_str, parse_str_with, Parser};
