//! # zerotape - Text Serialisation for Described Structs
//!
//! zerotape saves a struct to a small, human-editable text format and loads
//! it back. The struct is described once with a [`StructDescriptor`] listing
//! the fields to persist; values are reached through the [`Reflect`] trait.
//!
//! ## Features
//!
//! - **Scalars and arrays** of 8, 16 and 32 bit unsigned integers, with
//!   multi-row layout for grids
//! - **Nested structs** and arrays of structs, with partial input tolerated
//! - **Pointers as indices** into fixed arrays or regions supplied per call
//! - **Version numbers** written as `x.yz`
//! - **Custom types** through a registry of encoder/decoder pairs
//! - **Precise diagnostics** with line and column on the first error
//!
//! ## Text Format
//!
//! ```text
//! // comments run to end of line
//! count = 42;
//! weights = [ 1, 2, 3 ];
//! sparse = [ 5: 10, 20 ];        // explicit index, then ascending
//! inner = { x = 1; y = $FF; };
//! points = [ { x = 1; }, { x = 2; } ];
//! cursor = nil;
//! version = 1.05;
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use zerotape::{
//!     FieldDescriptor, FieldMut, FieldRef, Reflect, ScalarWidth, StructDescriptor, Tape,
//! };
//!
//! # fn main() -> zerotape::Result<()> {
//! #[derive(Debug, Default, PartialEq)]
//! struct Player {
//!     lives: u8,
//!     score: u32,
//! }
//!
//! impl Reflect for Player {
//!     fn field(&self, name: &str) -> Option<FieldRef<'_>> {
//!         match name {
//!             "lives" => Some(FieldRef::scalar(&self.lives)),
//!             "score" => Some(FieldRef::scalar(&self.score)),
//!             _ => None,
//!         }
//!     }
//!
//!     fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
//!         match name {
//!             "lives" => Some(FieldMut::scalar(&mut self.lives)),
//!             "score" => Some(FieldMut::scalar(&mut self.score)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let desc = StructDescriptor::new(vec![
//!     FieldDescriptor::scalar("lives", ScalarWidth::Byte),
//!     FieldDescriptor::scalar("score", ScalarWidth::Word),
//! ]);
//!
//! let tape = Tape::new();
//! let text = tape.save_to_string(&desc, &Player { lives: 3, score: 1200 })?;
//!
//! let mut loaded = Player::default();
//! tape.load_str(&desc, &mut loaded, &text)?;
//! assert_eq!(loaded, Player { lives: 3, score: 1200 });
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Loading stops at the first problem. Diagnostics carry the field and
//! position:
//!
//! ```rust
//! # use zerotape::{ErrorCode, FieldDescriptor, FieldMut, FieldRef, Reflect, ScalarWidth, StructDescriptor, Tape};
//! # struct Lives(u8);
//! # impl Reflect for Lives {
//! #     fn field(&self, name: &str) -> Option<FieldRef<'_>> {
//! #         (name == "lives").then(|| FieldRef::scalar(&self.0))
//! #     }
//! #     fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
//! #         if name == "lives" { Some(FieldMut::scalar(&mut self.0)) } else { None }
//! #     }
//! # }
//! let desc = StructDescriptor::new(vec![FieldDescriptor::scalar("lives", ScalarWidth::Byte)]);
//! let mut record = Lives(0);
//!
//! let err = Tape::new().load_str(&desc, &mut record, "lives = 256;").unwrap_err();
//! assert_eq!(err.code(), ErrorCode::SyntaxError);
//! assert_eq!(
//!     err.syntax_message().unwrap(),
//!     "line 1, column 9: value out of range (field 'lives')"
//! );
//! ```
//!
//! ## Architecture
//!
//! ```text
//! save: struct → walk → Emitter → text
//! load: text → Scanner → Parser → Ast (arena) → Interpreter → struct
//! ```
//!
//! - [`Scanner`] - Tokenizes source text
//! - [`Parser`] - Builds the arena-backed [`Ast`]
//! - [`Interpreter`] - Applies an [`Ast`] to a struct
//! - [`walk`] / [`Emitter`] - Visit a struct and write it as text
//! - [`Tape`] - Facade holding configuration, regions and custom types

/// Version of the zerotape library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod arena;
pub mod config;
pub mod custom;
pub mod error;
pub mod lexer;
pub mod meta;
pub mod parser;
pub mod runtime;

// Re-export main types
pub use arena::{Arena, ArenaStats, NodeId};
pub use config::{Config, IntegerFormat, ParseOptions, SaveOptions};
pub use custom::{CustomRegistry, CustomType, CustomTypeId, TableEntry};
pub use error::{Error, ErrorCode, Position, Result, SyntaxErrorKind};
pub use lexer::{Scanner, Token, TokenKind};
pub use meta::{
    AddressSlot, ArraySpec, FieldDescriptor, FieldKind, FieldMut, FieldRef, Reflect, Region,
    Regions, ScalarWidth, StructDescriptor,
};
pub use parser::{parse_file, parse_str, Ast, Expr, ExprKind, Parser, Value};
pub use runtime::{load, save, walk, Emitter, Interpreter, Tape, WalkHandler};
