use super::ast::{Ast, Node, Value};
use crate::arena::{Arena, NodeId};
use crate::config::ParseOptions;
use crate::error::{Error, Position, Result};
use crate::lexer::{Scanner, Token, TokenKind};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Recursive descent parser for the zerotape format
///
/// Tokens are pulled from the scanner only as the grammar needs them, so a
/// lexical error is reported only if it comes before any grammar error.
pub struct Parser {
    scanner: Scanner,
    lookahead: VecDeque<Token>,
    arena: Arena<Node>,
    max_depth: usize,
    depth: usize,
}

impl Parser {
    /// Creates a parser with default options
    pub fn new(scanner: Scanner) -> Self {
        Self::with_options(scanner, &ParseOptions::default())
    }

    /// Creates a parser with explicit options
    pub fn with_options(scanner: Scanner, options: &ParseOptions) -> Self {
        Parser {
            scanner,
            lookahead: VecDeque::with_capacity(2),
            arena: Arena::with_options(options),
            max_depth: options.max_depth,
            depth: 0,
        }
    }

    /// Parses the whole document
    pub fn parse(mut self) -> Result<Ast> {
        match self.parse_program() {
            Ok(program) => {
                let stats = self.arena.stats();
                debug!(
                    nodes = stats.total_allocs,
                    bytes = stats.total_allocated,
                    slabs = stats.slabs,
                    "parsed document"
                );
                Ok(Ast {
                    arena: self.arena,
                    program,
                })
            }
            Err(err) => {
                let pending = self.scanner.pending();
                if pending > 0 {
                    warn!(pending, "parse abandoned with input pending");
                }
                Err(err)
            }
        }
    }

    /// program := statement*
    fn parse_program(&mut self) -> Result<Option<NodeId>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::Eof)? {
            statements.push(self.parse_statement()?);
        }
        self.link_statements(statements)
    }

    /// statement := IDENT '=' expr ';'
    fn parse_statement(&mut self) -> Result<(String, Position, NodeId)> {
        let name = self.consume(TokenKind::Name, "a field name")?;
        self.consume(TokenKind::Equals, "`=`")?;
        let expr = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "`;` after assignment")?;
        let position = name.position();
        Ok((name.lexeme, position, expr))
    }

    /// expr := value | '[' elements ']' | '{' statement* '}'
    fn parse_expression(&mut self) -> Result<NodeId> {
        let kind = self.peek()?.kind;
        match kind {
            TokenKind::LeftBracket => self.parse_array(),
            TokenKind::LeftBrace => self.parse_scope(),
            k if k.is_value() => self.parse_value(),
            _ => Err(self.expected_error("a value, `[` or `{`")?),
        }
    }

    fn parse_value(&mut self) -> Result<NodeId> {
        let token = self.advance()?;
        let value = Self::literal(&token)?;
        self.arena.alloc(Node::Value {
            value,
            position: token.position(),
        })
    }

    fn parse_scope(&mut self) -> Result<NodeId> {
        let open = self.consume(TokenKind::LeftBrace, "`{`")?;
        self.enter(&open)?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace)? {
            if self.check(TokenKind::Eof)? {
                return Err(self.expected_error("`}` to close the scope")?);
            }
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace, "`}`")?;
        self.depth -= 1;

        let first = self.link_statements(statements)?;
        self.arena.alloc(Node::Scope {
            first,
            position: open.position(),
        })
    }

    /// elements := element (',' element)*
    /// element  := INT ':' expr | expr
    fn parse_array(&mut self) -> Result<NodeId> {
        let open = self.consume(TokenKind::LeftBracket, "`[`")?;
        self.enter(&open)?;

        let mut elements = Vec::new();
        if !self.check(TokenKind::RightBracket)? {
            loop {
                let index = if self.check(TokenKind::Integer)?
                    && self.peek_second()?.kind == TokenKind::Colon
                {
                    let token = self.advance()?;
                    self.advance()?;
                    Some(Self::array_index(&token)?)
                } else {
                    None
                };
                let expr = self.parse_expression()?;
                elements.push((index, expr));

                if !self.check(TokenKind::Comma)? {
                    break;
                }
                self.advance()?;
            }
        }
        self.consume(TokenKind::RightBracket, "`,` or `]`")?;
        self.depth -= 1;

        let mut next = None;
        for (index, expr) in elements.into_iter().rev() {
            next = Some(self.arena.alloc(Node::Element { index, expr, next })?);
        }
        self.arena.alloc(Node::Array {
            first: next,
            position: open.position(),
        })
    }

    fn link_statements(
        &mut self,
        statements: Vec<(String, Position, NodeId)>,
    ) -> Result<Option<NodeId>> {
        let mut next = None;
        for (name, position, expr) in statements.into_iter().rev() {
            next = Some(self.arena.alloc(Node::Statement {
                name,
                position,
                expr,
                next,
            })?);
        }
        Ok(next)
    }

    fn enter(&mut self, open: &Token) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::Parse {
                message: format!("nesting deeper than {} levels", self.max_depth),
                position: open.position(),
            });
        }
        Ok(())
    }

    fn literal(token: &Token) -> Result<Value> {
        let lexeme = token.lexeme.as_str();
        let parsed = match token.kind {
            TokenKind::Integer => lexeme.parse::<u64>().ok(),
            TokenKind::DollarHex => u64::from_str_radix(&lexeme[1..], 16).ok(),
            TokenKind::Hex => u64::from_str_radix(&lexeme[2..], 16).ok(),
            TokenKind::Decimal => {
                let digits: Vec<u32> = lexeme.chars().filter_map(|c| c.to_digit(10)).collect();
                return match digits.as_slice() {
                    [units, tenths, hundredths] => {
                        Ok(Value::Decimal(units * 100 + tenths * 10 + hundredths))
                    }
                    _ => Err(Error::Parse {
                        message: format!("malformed decimal '{}'", lexeme),
                        position: token.position(),
                    }),
                };
            }
            TokenKind::Nil => return Ok(Value::Nil),
            _ => {
                return Err(Error::Parse {
                    message: format!("expected a value, found {}", token.kind.describe()),
                    position: token.position(),
                })
            }
        };
        parsed.map(Value::Integer).ok_or_else(|| Error::Parse {
            message: format!("integer literal '{}' is too large", lexeme),
            position: token.position(),
        })
    }

    fn array_index(token: &Token) -> Result<usize> {
        token.lexeme.parse::<usize>().map_err(|_| Error::Parse {
            message: format!("array index '{}' is too large", token.lexeme),
            position: token.position(),
        })
    }

    fn fill(&mut self, count: usize) -> Result<()> {
        while self.lookahead.len() < count {
            let token = match self.scanner.next_token()? {
                Some(token) => token,
                None => {
                    let position = self.scanner.position();
                    Token::new(TokenKind::Eof, String::new(), position.line, position.column)
                }
            };
            self.lookahead.push_back(token);
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token> {
        self.fill(1)?;
        Ok(&self.lookahead[0])
    }

    fn peek_second(&mut self) -> Result<&Token> {
        self.fill(2)?;
        Ok(&self.lookahead[1])
    }

    fn advance(&mut self) -> Result<Token> {
        self.fill(1)?;
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => Err(self.expected_error("a token")?),
        }
    }

    fn check(&mut self, kind: TokenKind) -> Result<bool> {
        Ok(self.peek()?.kind == kind)
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind)? {
            self.advance()
        } else {
            Err(self.expected_error(expected)?)
        }
    }

    /// Builds an "expected X, found Y" error at the current token
    fn expected_error(&mut self, expected: &str) -> Result<Error> {
        let token = self.peek()?;
        let found = match token.kind {
            TokenKind::Name => format!("identifier `{}`", token.lexeme),
            kind if kind.is_value() => format!("{} `{}`", kind.describe(), token.lexeme),
            kind => kind.describe().to_string(),
        };
        Ok(Error::Parse {
            message: format!("expected {}, found {}", expected, found),
            position: token.position(),
        })
    }
}

/// Parse a document held in memory
pub fn parse_str(source: &str) -> Result<Ast> {
    Parser::new(Scanner::new(source)).parse()
}

/// Parse a document held in memory with explicit options
pub fn parse_str_with(source: &str, options: &ParseOptions) -> Result<Ast> {
    Parser::with_options(Scanner::new(source), options).parse()
}

/// Parse a document from a file
pub fn parse_file(path: impl AsRef<std::path::Path>, options: &ParseOptions) -> Result<Ast> {
    Parser::with_options(Scanner::from_file(path)?, options).parse()
}
