//! Field and struct descriptors
//!
//! Descriptors stand in for reflection: a [`StructDescriptor`] lists the
//! members of a struct that should be persisted and what kind each one is.
//! The values themselves are reached through the [`Reflect`] trait.

mod reflect;

pub use reflect::{AddressSlot, FieldMut, FieldRef, Reflect, Scalar, Scalars, ScalarsMut};

use crate::custom::CustomTypeId;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Width of an unsigned scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarWidth {
    /// 8 bits
    Byte,
    /// 16 bits
    Halfword,
    /// 32 bits
    Word,
}

impl ScalarWidth {
    /// Largest value the width can hold
    pub fn max(self) -> u64 {
        match self {
            ScalarWidth::Byte => u8::MAX as u64,
            ScalarWidth::Halfword => u16::MAX as u64,
            ScalarWidth::Word => u32::MAX as u64,
        }
    }

    /// Size in bytes
    pub fn bytes(self) -> usize {
        match self {
            ScalarWidth::Byte => 1,
            ScalarWidth::Halfword => 2,
            ScalarWidth::Word => 4,
        }
    }
}

impl fmt::Display for ScalarWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarWidth::Byte => "byte",
            ScalarWidth::Halfword => "halfword",
            ScalarWidth::Word => "word",
        })
    }
}

/// What a field holds, and how it is saved and loaded
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Unsigned integer(s) stored inline
    Scalar(ScalarWidth),
    /// Unsigned integer(s) behind a pointer
    ScalarPtr(ScalarWidth),
    /// Nested struct(s) stored inline
    Struct(Arc<StructDescriptor>),
    /// Nested struct(s) behind a pointer
    StructPtr(Arc<StructDescriptor>),
    /// Pointer into a fixed array, persisted as an index
    StaticArrayIndex(ArraySpec),
    /// Pointer into a region supplied at call time, persisted as an index
    ArrayIndex(String),
    /// Version number stored in hundredths, persisted as `x.yz`
    Version,
    /// Delegated to a registered custom type
    Custom(CustomTypeId),
}

impl FieldKind {
    /// Short name for logs and diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Scalar(_) => "scalar",
            FieldKind::ScalarPtr(_) => "scalar pointer",
            FieldKind::Struct(_) => "struct",
            FieldKind::StructPtr(_) => "struct pointer",
            FieldKind::StaticArrayIndex(_) => "static array index",
            FieldKind::ArrayIndex(_) => "region index",
            FieldKind::Version => "version",
            FieldKind::Custom(_) => "custom",
        }
    }

    /// Whether the field is reached through a pointer that may be absent
    pub fn is_pointer(&self) -> bool {
        matches!(self, FieldKind::ScalarPtr(_) | FieldKind::StructPtr(_))
    }
}

/// One persisted member of a struct
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name as it appears in the text
    pub name: String,
    /// What the field holds
    pub kind: FieldKind,
    /// Number of elements (1 for a single value)
    pub count: usize,
    /// Elements per output row for arrays, defaulting to `count`
    pub stride: Option<usize>,
}

impl FieldDescriptor {
    /// Creates a descriptor; a zero count is treated as one
    pub fn new(name: impl Into<String>, kind: FieldKind, count: usize) -> Self {
        FieldDescriptor {
            name: name.into(),
            kind,
            count: count.max(1),
            stride: None,
        }
    }

    /// A single inline integer
    pub fn scalar(name: impl Into<String>, width: ScalarWidth) -> Self {
        Self::new(name, FieldKind::Scalar(width), 1)
    }

    /// A fixed inline integer array
    pub fn scalar_array(name: impl Into<String>, width: ScalarWidth, count: usize) -> Self {
        Self::new(name, FieldKind::Scalar(width), count)
    }

    /// A fixed inline integer array written `stride` values per row
    pub fn scalar_grid(
        name: impl Into<String>,
        width: ScalarWidth,
        count: usize,
        stride: usize,
    ) -> Self {
        Self::scalar_array(name, width, count).with_stride(stride)
    }

    /// An integer behind a pointer
    pub fn scalar_ptr(name: impl Into<String>, width: ScalarWidth) -> Self {
        Self::new(name, FieldKind::ScalarPtr(width), 1)
    }

    /// An integer array behind a pointer
    pub fn scalar_ptr_array(name: impl Into<String>, width: ScalarWidth, count: usize) -> Self {
        Self::new(name, FieldKind::ScalarPtr(width), count)
    }

    /// A nested struct
    pub fn record(name: impl Into<String>, desc: Arc<StructDescriptor>) -> Self {
        Self::new(name, FieldKind::Struct(desc), 1)
    }

    /// A fixed array of nested structs
    pub fn record_array(name: impl Into<String>, desc: Arc<StructDescriptor>, count: usize) -> Self {
        Self::new(name, FieldKind::Struct(desc), count)
    }

    /// A nested struct behind a pointer
    pub fn record_ptr(name: impl Into<String>, desc: Arc<StructDescriptor>) -> Self {
        Self::new(name, FieldKind::StructPtr(desc), 1)
    }

    /// An array of pointers to nested structs
    pub fn record_ptr_array(
        name: impl Into<String>,
        desc: Arc<StructDescriptor>,
        count: usize,
    ) -> Self {
        Self::new(name, FieldKind::StructPtr(desc), count)
    }

    /// A pointer into a fixed array
    pub fn static_index(name: impl Into<String>, array: ArraySpec) -> Self {
        Self::new(name, FieldKind::StaticArrayIndex(array), 1)
    }

    /// A pointer into a region named at call time
    pub fn region_index(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(name, FieldKind::ArrayIndex(region.into()), 1)
    }

    /// A version number in hundredths
    pub fn version(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Version, 1)
    }

    /// A custom-encoded value
    pub fn custom(name: impl Into<String>, id: CustomTypeId) -> Self {
        Self::new(name, FieldKind::Custom(id), 1)
    }

    /// Sets the number of values written per row
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride.max(1));
        self
    }

    /// Values per output row
    pub fn row_stride(&self) -> usize {
        self.stride.unwrap_or(self.count).max(1)
    }
}

/// Ordered list of persisted fields for one struct type
///
/// Need not cover every member of the struct.
#[derive(Debug, Clone, Default)]
pub struct StructDescriptor {
    fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    /// Creates a descriptor from fields in declaration order
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        StructDescriptor { fields }
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are described
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<FieldDescriptor> for StructDescriptor {
    fn from_iter<I: IntoIterator<Item = FieldDescriptor>>(iter: I) -> Self {
        StructDescriptor::new(iter.into_iter().collect())
    }
}

/// A contiguous block whose addresses can be turned into indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArraySpec {
    /// Address of the first element
    pub base: usize,
    /// Total length in bytes
    pub length: usize,
    /// Number of elements
    pub count: usize,
}

impl ArraySpec {
    /// Creates a spec, checking that `length` divides evenly into `count` elements
    /// and that the block fits in the address space
    pub fn new(base: usize, length: usize, count: usize) -> Result<Self> {
        if count == 0 || length % count != 0 {
            return Err(Error::bad_field(
                "array",
                format!("length {} does not divide into {} elements", length, count),
            ));
        }
        if base.checked_add(length).is_none() {
            return Err(Error::bad_field(
                "array",
                format!("block of {} bytes at {:#x} overflows the address space", length, base),
            ));
        }
        Ok(ArraySpec {
            base,
            length,
            count,
        })
    }

    /// Describes a live slice
    pub fn of<T>(slice: &[T]) -> Self {
        ArraySpec {
            base: slice.as_ptr() as usize,
            length: std::mem::size_of_val(slice),
            count: slice.len(),
        }
    }

    /// Size of one element in bytes
    pub fn element_size(&self) -> usize {
        self.length.checked_div(self.count).unwrap_or(0)
    }

    /// Whether `address` lies within `[base, base + length)`
    pub fn contains(&self, address: usize) -> bool {
        address >= self.base && address - self.base < self.length
    }

    /// Index of the element containing `address`
    pub fn index_of(&self, address: usize) -> Option<usize> {
        if !self.contains(address) {
            return None;
        }
        (address - self.base).checked_div(self.element_size())
    }

    /// Address of element `index`
    pub fn address_of(&self, index: usize) -> Option<usize> {
        if index >= self.count {
            return None;
        }
        index
            .checked_mul(self.element_size())
            .and_then(|offset| self.base.checked_add(offset))
    }
}

/// A named array supplied at call time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Id matched against `FieldKind::ArrayIndex`
    pub id: String,
    /// The block itself
    pub spec: ArraySpec,
}

impl Region {
    /// Creates a region
    pub fn new(id: impl Into<String>, spec: ArraySpec) -> Self {
        Region {
            id: id.into(),
            spec,
        }
    }
}

/// Regions available to one save or load, keyed by id text
#[derive(Debug, Clone, Default)]
pub struct Regions {
    regions: HashMap<String, ArraySpec>,
}

impl Regions {
    /// Creates an empty set
    pub fn new() -> Self {
        Regions {
            regions: HashMap::new(),
        }
    }

    /// Adds or replaces a region, returning the previous spec
    pub fn insert(&mut self, region: Region) -> Option<ArraySpec> {
        self.regions.insert(region.id, region.spec)
    }

    /// Builder form of [`Regions::insert`]
    pub fn with(mut self, id: impl Into<String>, spec: ArraySpec) -> Self {
        self.insert(Region::new(id, spec));
        self
    }

    /// Looks up a region by id
    pub fn get(&self, id: &str) -> Option<&ArraySpec> {
        self.regions.get(id)
    }

    /// Removes a region
    pub fn remove(&mut self, id: &str) -> Option<ArraySpec> {
        self.regions.remove(id)
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether there are no regions
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl FromIterator<Region> for Regions {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut regions = Regions::new();
        for region in iter {
            regions.insert(region);
        }
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_spec_translates_addresses() {
        let data = [10u32, 20, 30, 40];
        let spec = ArraySpec::of(&data);
        assert_eq!(spec.count, 4);
        assert_eq!(spec.element_size(), 4);

        let third = &data[3] as *const u32 as usize;
        assert_eq!(spec.index_of(third), Some(3));
        assert_eq!(spec.address_of(3), Some(third));
        assert_eq!(spec.address_of(4), None);
        assert_eq!(spec.index_of(spec.base + spec.length), None);
        assert_eq!(spec.index_of(spec.base.wrapping_sub(1)), None);
    }

    #[test]
    fn array_spec_rejects_uneven_length() {
        assert!(ArraySpec::new(0x1000, 10, 3).is_err());
        assert!(ArraySpec::new(0x1000, 10, 0).is_err());
        let spec = ArraySpec::new(0x1000, 12, 3).unwrap();
        assert_eq!(spec.index_of(0x1007), Some(1));
    }

    #[test]
    fn array_spec_near_top_of_address_space() {
        assert!(ArraySpec::new(usize::MAX - 1, 4, 2).is_err());

        let spec = ArraySpec::new(usize::MAX - 4, 4, 2).unwrap();
        assert_eq!(spec.address_of(1), Some(usize::MAX - 2));
        assert_eq!(spec.address_of(2), None);

        let unchecked = ArraySpec {
            base: usize::MAX - 1,
            length: 4,
            count: 2,
        };
        assert_eq!(unchecked.address_of(1), None);
        assert_eq!(unchecked.address_of(0), Some(usize::MAX - 1));
    }

    #[test]
    fn regions_match_by_content() {
        let id = String::from("some array");
        let regions = Regions::new().with(id.clone(), ArraySpec::new(0x100, 10, 10).unwrap());
        let other_allocation = format!("some {}", "array");
        assert!(regions.get(&other_allocation).is_some());
        assert!(regions.get("another").is_none());
    }

    #[test]
    fn descriptor_lookup_and_stride() {
        let desc: StructDescriptor = vec![
            FieldDescriptor::scalar("a", ScalarWidth::Byte),
            FieldDescriptor::scalar_grid("grid", ScalarWidth::Word, 6, 3),
            FieldDescriptor::scalar_array("row", ScalarWidth::Halfword, 4),
        ]
        .into_iter()
        .collect();

        assert_eq!(desc.len(), 3);
        assert_eq!(desc.field("grid").unwrap().row_stride(), 3);
        assert_eq!(desc.field("row").unwrap().row_stride(), 4);
        assert!(desc.field("missing").is_none());
    }

    #[test]
    fn width_limits() {
        assert_eq!(ScalarWidth::Byte.max(), 255);
        assert_eq!(ScalarWidth::Halfword.max(), 65535);
        assert_eq!(ScalarWidth::Word.max(), 4294967295);
    }
}
