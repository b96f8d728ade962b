//! Configuration for saving and loading

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default size in bytes of one arena slab
pub const DEFAULT_SLAB_SIZE: usize = 4000;

/// Default nesting limit for `{` and `[`
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Literal form used for integers when saving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegerFormat {
    /// Plain decimal (`42`)
    Decimal,
    /// Dollar-prefixed upper-case hex (`$2A`)
    Hex,
}

impl Default for IntegerFormat {
    fn default() -> Self {
        if cfg!(feature = "hex-integers") {
            IntegerFormat::Hex
        } else {
            IntegerFormat::Decimal
        }
    }
}

/// Options affecting the text written by `save`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// Literal form for integers
    pub integer_format: IntegerFormat,
    /// Spaces per nesting level
    pub indent_width: usize,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            integer_format: IntegerFormat::default(),
            indent_width: 2,
        }
    }
}

/// Options affecting parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Maximum nesting of scopes and arrays
    pub max_depth: usize,
    /// Arena slab size in bytes
    pub slab_size: usize,
    /// Upper bound on arena memory, `None` for unlimited
    pub max_arena_bytes: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            slab_size: DEFAULT_SLAB_SIZE,
            max_arena_bytes: None,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Save options
    pub save: SaveOptions,
    /// Parse options
    pub parse: ParseOptions,
}

impl Config {
    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::bad_field("config", e.to_string()))
    }

    /// Serialize this configuration to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::bad_field("config", e.to_string()))
    }
}
