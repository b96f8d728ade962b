//! Error types for zerotape

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Position of a token in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Position {
    /// Creates a new position
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Diagnostics raised while applying a parsed document to a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A version field was given something other than a `D.DD` decimal
    NeedDecimal,
    /// A scalar field was given something other than an integer
    NeedInteger,
    /// An array field was given something other than an integer array
    NeedIntegerArray,
    /// A struct field was given something other than `{ ... }`
    NeedScope,
    /// A struct array field was given something other than `[ { ... }, ... ]`
    NeedScopeArray,
    /// A single value was expected but an array or scope was supplied
    NeedValue,
    /// The value literal is not acceptable for this field
    UnexpectedValueType,
    /// No field with this name exists in the descriptor
    UnknownField,
    /// The field shape cannot be loaded
    Unsupported,
    /// The value does not fit the destination
    ValueRange,
    /// Text produced by a custom decoder
    Custom(String),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyntaxErrorKind::NeedDecimal => "decimal type required",
            SyntaxErrorKind::NeedInteger => "integer type required",
            SyntaxErrorKind::NeedIntegerArray => "integer array required",
            SyntaxErrorKind::NeedScope => "scope required",
            SyntaxErrorKind::NeedScopeArray => "scope array required",
            SyntaxErrorKind::NeedValue => "value type required",
            SyntaxErrorKind::UnexpectedValueType => "unexpected value type",
            SyntaxErrorKind::UnknownField => "unknown field",
            SyntaxErrorKind::Unsupported => "unsupported",
            SyntaxErrorKind::ValueRange => "value out of range",
            SyntaxErrorKind::Custom(message) => message,
        };
        f.write_str(text)
    }
}

/// Symbolic result codes with stable numeric values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    /// Success
    Ok = 0x00,
    /// Allocation failed or the arena budget was exhausted
    OutOfMemory = 0x10,
    /// A region-indexed field named a region that was not supplied
    UnknownRegion = 0x20,
    /// A document was well formed but did not fit the descriptor
    SyntaxError = 0x30,
    /// The document contained no statements
    NoProgram = 0x40,
    /// The file could not be opened
    BadFileOpen = 0x50,
    /// The descriptor named a field kind that cannot be handled
    UnknownFieldType = 0x60,
    /// The lexer or parser rejected the document
    ParseFail = 0x70,
    /// A pointer lies outside its array
    BadPointer = 0x80,
    /// A field descriptor disagrees with the live data
    BadField = 0x90,
    /// No custom type is registered under the requested id
    BadCustomId = 0xA0,
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Zerotape errors
#[derive(Error, Debug)]
pub enum Error {
    /// Arena allocation failed
    ///
    /// **Triggered by:** the allocator refusing memory, or
    /// `ParseOptions::max_arena_bytes` being exceeded
    #[error("Out of memory: failed to allocate {requested} bytes")]
    OutOfMemory {
        /// Bytes requested by the failing allocation
        requested: usize,
    },

    /// A runtime-array-index field referred to a region that was not supplied
    #[error("Unknown region: {id}")]
    UnknownRegion {
        /// Region id from the field descriptor
        id: String,
    },

    /// Document did not fit the descriptor
    ///
    /// **Triggered by:** type/shape mismatch, range overflow, or an unknown
    /// field name while loading
    /// **Example:** `flag = 256;` for a byte-wide field
    #[error("{}", render_syntax(.kind, .field, .position))]
    Syntax {
        /// What went wrong
        kind: SyntaxErrorKind,
        /// Field being assigned, when known
        field: Option<String>,
        /// Position of the offending statement or value
        position: Option<Position>,
    },

    /// The loaded document had no statements
    #[error("No program: document contains no statements")]
    NoProgram,

    /// Opening a file failed
    #[error("Cannot open {}: {source}", .path.display())]
    FileOpen {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A field kind that cannot be handled was requested
    ///
    /// Stock descriptors never produce this since `FieldKind` is closed. It is
    /// kept so that [`CustomType`](crate::CustomType) implementations can
    /// report a value shape they do not support under code 0x60.
    #[error("Unknown field type for '{field}'")]
    UnknownFieldType {
        /// Field name
        field: String,
    },

    /// The lexer or parser rejected the source text
    ///
    /// **Triggered by:** unrecognised characters, grammar violations
    /// **Example:** `a = 1` (missing `;`)
    #[error("Parse error at {position}: {message}")]
    Parse {
        /// Error description
        message: String,
        /// Where the problem was detected
        position: Position,
    },

    /// A pointer does not lie inside the array it should index
    #[error("Bad pointer in field '{field}': address {address:#x} is outside its array")]
    BadPointer {
        /// Field name
        field: String,
        /// Offending address (0 when the pointee is absent)
        address: usize,
    },

    /// The field descriptor disagrees with the live data
    #[error("Bad field '{field}': {reason}")]
    BadField {
        /// Field name
        field: String,
        /// Error description
        reason: String,
    },

    /// No custom type registered under this id
    #[error("Bad custom type id {id} in field '{field}'")]
    BadCustomId {
        /// Field name
        field: String,
        /// Requested id
        id: u16,
    },

    /// Reading or writing failed after the stream was open
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn render_syntax(
    kind: &SyntaxErrorKind,
    field: &Option<String>,
    position: &Option<Position>,
) -> String {
    let mut message = String::new();
    if let Some(position) = position {
        message.push_str(&format!("{}: ", position));
    }
    message.push_str(&kind.to_string());
    if let Some(field) = field {
        message.push_str(&format!(" (field '{}')", field));
    }
    message
}

impl Error {
    /// Create a syntax error with no field or position attached
    pub fn syntax(kind: SyntaxErrorKind) -> Self {
        Error::Syntax {
            kind,
            field: None,
            position: None,
        }
    }

    /// Create a decoder-authored syntax error
    pub fn custom_syntax(message: impl Into<String>) -> Self {
        Error::syntax(SyntaxErrorKind::Custom(message.into()))
    }

    /// Create a bad-field error
    pub fn bad_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::BadField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach a field name and position to a syntax error that lacks them
    ///
    /// Innermost context wins: values set deeper in the recursion are kept.
    pub fn at(self, name: &str, pos: Position) -> Self {
        match self {
            Error::Syntax {
                kind,
                field,
                position,
            } => Error::Syntax {
                kind,
                field: field.or_else(|| Some(name.to_string())),
                position: position.or(Some(pos)),
            },
            other => other,
        }
    }

    /// Symbolic result code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::OutOfMemory { .. } => ErrorCode::OutOfMemory,
            Error::UnknownRegion { .. } => ErrorCode::UnknownRegion,
            Error::Syntax { .. } => ErrorCode::SyntaxError,
            Error::NoProgram => ErrorCode::NoProgram,
            Error::FileOpen { .. } => ErrorCode::BadFileOpen,
            Error::UnknownFieldType { .. } => ErrorCode::UnknownFieldType,
            Error::Parse { .. } => ErrorCode::ParseFail,
            Error::BadPointer { .. } => ErrorCode::BadPointer,
            Error::BadField { .. } => ErrorCode::BadField,
            Error::BadCustomId { .. } => ErrorCode::BadCustomId,
            Error::Io(_) => ErrorCode::BadFileOpen,
        }
    }

    /// Human-readable diagnostic for parse and syntax errors
    ///
    /// Structural errors carry no diagnostic and return `None`.
    pub fn syntax_message(&self) -> Option<String> {
        match self {
            Error::Syntax { .. } | Error::Parse { .. } => Some(self.to_string()),
            _ => None,
        }
    }

    /// Source position of the diagnostic, if one was recorded
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Syntax { position, .. } => *position,
            Error::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Result type for zerotape operations
pub type Result<T> = std::result::Result<T, Error>;
