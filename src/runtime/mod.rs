//! Saving structs as text and loading text back into structs

mod emitter;
mod interpreter;
mod tape;
mod walker;

pub use emitter::Emitter;
pub use interpreter::Interpreter;
pub use tape::{load, save, Tape};
pub use walker::{walk, WalkHandler};
