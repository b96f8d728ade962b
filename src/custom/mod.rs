//! Custom field types
//!
//! A field declared with [`FieldKind::Custom`](crate::meta::FieldKind::Custom)
//! is encoded and decoded by a [`CustomType`] looked up by id in a
//! [`CustomRegistry`].

use crate::error::{Error, Result, SyntaxErrorKind};
use crate::parser::{Expr, ExprKind, Value};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of a registered custom type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomTypeId(pub u16);

impl fmt::Display for CustomTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoder/decoder pair for one custom field type
pub trait CustomType: Send + Sync {
    /// Name for logs
    fn name(&self) -> &str;

    /// Renders the raw field value as the text written after `name = `
    fn encode(&self, value: &dyn Any) -> Result<String>;

    /// Interprets `expr` and stores the result into the raw field value
    ///
    /// The expression may have any shape the parser accepts, so it must be
    /// validated here. Errors should be syntax errors carrying their own text.
    fn decode(&self, expr: Expr<'_>, value: &mut dyn Any) -> Result<()>;
}

/// Custom types by id
pub struct CustomRegistry {
    types: HashMap<CustomTypeId, Arc<dyn CustomType>>,
}

impl CustomRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        CustomRegistry {
            types: HashMap::new(),
        }
    }

    /// Register a custom type, replacing any previous one with this id
    pub fn register(&mut self, id: CustomTypeId, custom: Arc<dyn CustomType>) {
        self.types.insert(id, custom);
    }

    /// Builder form of [`CustomRegistry::register`]
    pub fn with(mut self, id: CustomTypeId, custom: impl CustomType + 'static) -> Self {
        self.register(id, Arc::new(custom));
        self
    }

    /// Get a custom type by id
    pub fn get(&self, id: CustomTypeId) -> Option<Arc<dyn CustomType>> {
        self.types.get(&id).cloned()
    }

    /// Check if an id is registered
    pub fn has(&self, id: CustomTypeId) -> bool {
        self.types.contains_key(&id)
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<CustomTypeId> {
        let mut ids: Vec<CustomTypeId> = self.types.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for CustomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CustomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.ids().into_iter().filter_map(|id| {
                self.types.get(&id).map(|custom| (id, custom.name().to_string()))
            }))
            .finish()
    }
}

/// Stores a value as its position in a fixed table
///
/// The field holds one of `entries`; the text holds its index. Useful for
/// pointers into string tables and similar lookups.
pub struct TableEntry<T: 'static> {
    name: String,
    entries: &'static [T],
}

impl<T: PartialEq + Copy + Send + Sync + 'static> TableEntry<T> {
    /// Creates a table-backed custom type
    pub fn new(name: impl Into<String>, entries: &'static [T]) -> Self {
        TableEntry {
            name: name.into(),
            entries,
        }
    }

    fn mismatch(&self) -> Error {
        Error::bad_field(
            self.name.clone(),
            format!("custom value is not a {}", std::any::type_name::<T>()),
        )
    }
}

impl<T: PartialEq + Copy + Send + Sync + 'static> CustomType for TableEntry<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, value: &dyn Any) -> Result<String> {
        let value = value.downcast_ref::<T>().ok_or_else(|| self.mismatch())?;
        let index = self
            .entries
            .iter()
            .position(|entry| entry == value)
            .ok_or_else(|| Error::BadPointer {
                field: self.name.clone(),
                address: 0,
            })?;
        Ok(index.to_string())
    }

    fn decode(&self, expr: Expr<'_>, value: &mut dyn Any) -> Result<()> {
        let index = match expr.kind() {
            ExprKind::Value(Value::Integer(index)) => index,
            ExprKind::Value(_) => return Err(Error::syntax(SyntaxErrorKind::NeedInteger)),
            _ => return Err(Error::syntax(SyntaxErrorKind::NeedValue)),
        };
        let entry = usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| Error::syntax(SyntaxErrorKind::ValueRange))?;
        let slot = value.downcast_mut::<T>().ok_or_else(|| self.mismatch())?;
        *slot = *entry;
        Ok(())
    }
}
