use crate::arena::{Arena, ArenaStats, NodeId};
use crate::error::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Integer in any of the plain, `$hex` or `0xhex` forms
    Integer(u64),
    /// `D.DD` decimal, stored in hundredths
    Decimal(u32),
    /// `nil`
    Nil,
}

impl Value {
    /// Short name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Nil => "nil",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}.{:02}", d / 100, d % 100),
            Value::Nil => f.write_str("nil"),
        }
    }
}

/// Node stored in the document arena
///
/// Lists are singly linked through `next` so that a node never owns another.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    /// `name = expr ;`
    Statement {
        name: String,
        position: Position,
        expr: NodeId,
        next: Option<NodeId>,
    },
    Value {
        value: Value,
        position: Position,
    },
    /// `{ statement* }`
    Scope {
        first: Option<NodeId>,
        position: Position,
    },
    /// `[ element, ... ]`
    Array {
        first: Option<NodeId>,
        position: Position,
    },
    /// One array element with its optional `INT :` prefix
    Element {
        index: Option<usize>,
        expr: NodeId,
        next: Option<NodeId>,
    },
}

/// One parsed document
///
/// All nodes live in a single arena and are dropped together with the `Ast`.
pub struct Ast {
    pub(crate) arena: Arena<Node>,
    pub(crate) program: Option<NodeId>,
}

impl Ast {
    /// Top-level statements in source order
    pub fn statements(&self) -> Statements<'_> {
        Statements {
            ast: self,
            next: self.program,
        }
    }

    /// Whether the document had no statements
    pub fn is_empty(&self) -> bool {
        self.program.is_none()
    }

    /// Statistics of the backing arena
    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    fn node(&self, id: NodeId) -> &Node {
        self.arena.get(id)
    }
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.statements()).finish()
    }
}

/// Iterator over a list of assignments
#[derive(Clone, Copy)]
pub struct Statements<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl<'a> Iterator for Statements<'a> {
    type Item = Assignment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        match self.ast.node(id) {
            Node::Statement {
                name,
                position,
                expr,
                next,
            } => {
                self.next = *next;
                Some(Assignment {
                    name,
                    position: *position,
                    expr: Expr {
                        ast: self.ast,
                        id: *expr,
                    },
                })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Statements<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(*self).finish()
    }
}

/// `name = expr ;`
#[derive(Clone, Copy)]
pub struct Assignment<'a> {
    /// Field name on the left-hand side
    pub name: &'a str,
    /// Position of the field name
    pub position: Position,
    /// Right-hand side
    pub expr: Expr<'a>,
}

impl fmt::Debug for Assignment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:?}", self.name, self.expr)
    }
}

/// Handle to an expression inside an [`Ast`]
#[derive(Clone, Copy)]
pub struct Expr<'a> {
    ast: &'a Ast,
    id: NodeId,
}

/// Shape of an expression
///
/// Arrays are classified from their contents: all values make an integer
/// array, all scopes make a scope array, anything else is mixed. An empty
/// array counts as an integer array.
#[derive(Debug, Clone, Copy)]
pub enum ExprKind<'a> {
    /// A single literal
    Value(Value),
    /// `{ ... }`
    Scope(Statements<'a>),
    /// `[ v, v, ... ]`
    IntArray(Elements<'a>),
    /// `[ { ... }, { ... } ]`
    ScopeArray(Elements<'a>),
    /// Array whose elements are not all values or all scopes
    MixedArray(Elements<'a>),
}

impl<'a> Expr<'a> {
    /// Position of the first token of the expression
    pub fn position(&self) -> Position {
        match self.ast.node(self.id) {
            Node::Value { position, .. }
            | Node::Scope { position, .. }
            | Node::Array { position, .. }
            | Node::Statement { position, .. } => *position,
            Node::Element { expr, .. } => Expr {
                ast: self.ast,
                id: *expr,
            }
            .position(),
        }
    }

    /// Classify the expression
    pub fn kind(&self) -> ExprKind<'a> {
        match self.ast.node(self.id) {
            Node::Value { value, .. } => ExprKind::Value(*value),
            Node::Scope { first, .. } => ExprKind::Scope(Statements {
                ast: self.ast,
                next: *first,
            }),
            Node::Array { first, .. } => {
                let elements = Elements {
                    ast: self.ast,
                    next: *first,
                    last_index: None,
                };
                let mut values = true;
                let mut scopes = true;
                for (_, element) in elements {
                    match self.ast.node(element.id) {
                        Node::Value { .. } => scopes = false,
                        Node::Scope { .. } => values = false,
                        _ => {
                            values = false;
                            scopes = false;
                        }
                    }
                }
                if values {
                    ExprKind::IntArray(elements)
                } else if scopes {
                    ExprKind::ScopeArray(elements)
                } else {
                    ExprKind::MixedArray(elements)
                }
            }
            Node::Statement { .. } | Node::Element { .. } => ExprKind::MixedArray(Elements {
                ast: self.ast,
                next: None,
                last_index: None,
            }),
        }
    }

    /// The literal, if this is a value expression
    pub fn value(&self) -> Option<Value> {
        match self.ast.node(self.id) {
            Node::Value { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Integer literal, if this is one
    pub fn as_integer(&self) -> Option<u64> {
        match self.value() {
            Some(Value::Integer(n)) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Debug for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Value(value) => write!(f, "{}", value),
            ExprKind::Scope(statements) => {
                f.write_str("{")?;
                for statement in statements {
                    write!(f, " {:?};", statement)?;
                }
                f.write_str(" }")
            }
            ExprKind::IntArray(elements)
            | ExprKind::ScopeArray(elements)
            | ExprKind::MixedArray(elements) => {
                f.write_str("[")?;
                for (i, (index, expr)) in elements.enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: {:?}", index, expr)?;
                }
                f.write_str(" ]")
            }
        }
    }
}

/// Iterator over array elements, yielding each with its resolved index
///
/// An element with an explicit `INT :` prefix takes that index; any other
/// element takes the previous index plus one, starting from zero.
#[derive(Clone, Copy)]
pub struct Elements<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
    last_index: Option<usize>,
}

impl<'a> Elements<'a> {
    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.next.is_none()
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = (usize, Expr<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        match self.ast.node(id) {
            Node::Element { index, expr, next } => {
                let resolved = match index {
                    Some(explicit) => *explicit,
                    None => self.last_index.map_or(0, |last| last.saturating_add(1)),
                };
                self.last_index = Some(resolved);
                self.next = *next;
                Some((
                    resolved,
                    Expr {
                        ast: self.ast,
                        id: *expr,
                    },
                ))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Elements<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(*self).finish()
    }
}
