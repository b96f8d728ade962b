//! Accessor trait that exposes struct members to the walker and interpreter

use super::ScalarWidth;
use std::any::Any;
use std::ptr::NonNull;

/// Field access for a persisted struct
///
/// Implemented once per struct type. Each method returns a view of the named
/// member, or `None` if the struct has no such member. The view must agree
/// with the member's [`FieldDescriptor`](super::FieldDescriptor): scalars of
/// the declared width and count, one record or `count` records, an address
/// for index fields, or the raw value for custom fields. Pointer members
/// whose pointee is absent return [`FieldRef::Null`] / [`FieldMut::Null`].
pub trait Reflect {
    /// Read access to a member
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Write access to a member
    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>>;
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// Unsigned integer types that can back a scalar field
pub trait Scalar: sealed::Sealed + Copy + 'static {
    /// Width of this type
    const WIDTH: ScalarWidth;

    /// Wraps a slice of this type
    fn wrap(values: &[Self]) -> Scalars<'_>;

    /// Wraps a mutable slice of this type
    fn wrap_mut(values: &mut [Self]) -> ScalarsMut<'_>;
}

impl Scalar for u8 {
    const WIDTH: ScalarWidth = ScalarWidth::Byte;

    fn wrap(values: &[Self]) -> Scalars<'_> {
        Scalars::Bytes(values)
    }

    fn wrap_mut(values: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Bytes(values)
    }
}

impl Scalar for u16 {
    const WIDTH: ScalarWidth = ScalarWidth::Halfword;

    fn wrap(values: &[Self]) -> Scalars<'_> {
        Scalars::Halfwords(values)
    }

    fn wrap_mut(values: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Halfwords(values)
    }
}

impl Scalar for u32 {
    const WIDTH: ScalarWidth = ScalarWidth::Word;

    fn wrap(values: &[Self]) -> Scalars<'_> {
        Scalars::Words(values)
    }

    fn wrap_mut(values: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Words(values)
    }
}

/// Read-only run of scalars
#[derive(Debug, Clone, Copy)]
pub enum Scalars<'a> {
    /// 8-bit values
    Bytes(&'a [u8]),
    /// 16-bit values
    Halfwords(&'a [u16]),
    /// 32-bit values
    Words(&'a [u32]),
}

impl<'a> Scalars<'a> {
    /// Width of the values
    pub fn width(&self) -> ScalarWidth {
        match self {
            Scalars::Bytes(_) => ScalarWidth::Byte,
            Scalars::Halfwords(_) => ScalarWidth::Halfword,
            Scalars::Words(_) => ScalarWidth::Word,
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            Scalars::Bytes(v) => v.len(),
            Scalars::Halfwords(v) => v.len(),
            Scalars::Words(v) => v.len(),
        }
    }

    /// Whether there are no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`, widened
    pub fn get(&self, index: usize) -> Option<u64> {
        match self {
            Scalars::Bytes(v) => v.get(index).map(|&x| x as u64),
            Scalars::Halfwords(v) => v.get(index).map(|&x| x as u64),
            Scalars::Words(v) => v.get(index).map(|&x| x as u64),
        }
    }

    /// All values, widened
    pub fn iter(&self) -> impl Iterator<Item = u64> + 'a {
        let this = *self;
        (0..this.len()).filter_map(move |i| this.get(i))
    }
}

/// Writable run of scalars
#[derive(Debug)]
pub enum ScalarsMut<'a> {
    /// 8-bit values
    Bytes(&'a mut [u8]),
    /// 16-bit values
    Halfwords(&'a mut [u16]),
    /// 32-bit values
    Words(&'a mut [u32]),
}

impl ScalarsMut<'_> {
    /// Width of the values
    pub fn width(&self) -> ScalarWidth {
        match self {
            ScalarsMut::Bytes(_) => ScalarWidth::Byte,
            ScalarsMut::Halfwords(_) => ScalarWidth::Halfword,
            ScalarsMut::Words(_) => ScalarWidth::Word,
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            ScalarsMut::Bytes(v) => v.len(),
            ScalarsMut::Halfwords(v) => v.len(),
            ScalarsMut::Words(v) => v.len(),
        }
    }

    /// Whether there are no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `value` at `index`. Returns false if the index is out of
    /// bounds or the value does not fit the width.
    pub fn set(&mut self, index: usize, value: u64) -> bool {
        match self {
            ScalarsMut::Bytes(v) => store(v, index, value),
            ScalarsMut::Halfwords(v) => store(v, index, value),
            ScalarsMut::Words(v) => store(v, index, value),
        }
    }
}

fn store<T: TryFrom<u64>>(values: &mut [T], index: usize, value: u64) -> bool {
    match (values.get_mut(index), T::try_from(value)) {
        (Some(slot), Ok(value)) => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// A pointer member that can be read and written as an address
pub trait AddressSlot {
    /// Current address, `None` for null
    fn address(&self) -> Option<usize>;

    /// Points the member at `address`, or null
    fn set_address(&mut self, address: Option<usize>);
}

impl<T> AddressSlot for *const T {
    fn address(&self) -> Option<usize> {
        (!self.is_null()).then_some(*self as usize)
    }

    fn set_address(&mut self, address: Option<usize>) {
        *self = address.map_or(std::ptr::null(), |a| a as *const T);
    }
}

impl<T> AddressSlot for *mut T {
    fn address(&self) -> Option<usize> {
        (!self.is_null()).then_some(*self as usize)
    }

    fn set_address(&mut self, address: Option<usize>) {
        *self = address.map_or(std::ptr::null_mut(), |a| a as *mut T);
    }
}

impl<T> AddressSlot for Option<NonNull<T>> {
    fn address(&self) -> Option<usize> {
        self.map(|p| p.as_ptr() as usize)
    }

    fn set_address(&mut self, address: Option<usize>) {
        *self = address.and_then(|a| NonNull::new(a as *mut T));
    }
}

/// Read view of one member
pub enum FieldRef<'a> {
    /// Integer values
    Scalars(Scalars<'a>),
    /// One nested struct
    Record(&'a dyn Reflect),
    /// An array of nested structs
    Records(Vec<&'a dyn Reflect>),
    /// Pointer value for index fields, `None` for null
    Address(Option<usize>),
    /// Raw value for a custom field
    Custom(&'a dyn Any),
    /// Absent pointee
    Null,
}

impl<'a> FieldRef<'a> {
    /// View of a single integer
    pub fn scalar<T: Scalar>(value: &'a T) -> Self {
        FieldRef::Scalars(T::wrap(std::slice::from_ref(value)))
    }

    /// View of an integer array
    pub fn scalars<T: Scalar>(values: &'a [T]) -> Self {
        FieldRef::Scalars(T::wrap(values))
    }

    /// View of an optional integer, `Null` when absent
    pub fn scalar_or_null<T: Scalar>(value: Option<&'a T>) -> Self {
        value.map_or(FieldRef::Null, |v| FieldRef::scalar(v))
    }

    /// View of a nested struct
    pub fn record<R: Reflect>(record: &'a R) -> Self {
        FieldRef::Record(record)
    }

    /// View of an optional nested struct, `Null` when absent
    pub fn record_or_null<R: Reflect>(record: Option<&'a R>) -> Self {
        record.map_or(FieldRef::Null, |r| FieldRef::Record(r))
    }

    /// View of an array of nested structs
    pub fn records<R: Reflect>(records: &'a [R]) -> Self {
        FieldRef::Records(records.iter().map(|r| r as &dyn Reflect).collect())
    }

    /// View of a pointer member
    pub fn pointer<P: AddressSlot>(slot: &P) -> Self {
        FieldRef::Address(slot.address())
    }

    /// View of a custom value
    pub fn custom<T: Any>(value: &'a T) -> Self {
        FieldRef::Custom(value)
    }

    /// Short description for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            FieldRef::Scalars(_) => "scalars",
            FieldRef::Record(_) => "record",
            FieldRef::Records(_) => "records",
            FieldRef::Address(_) => "address",
            FieldRef::Custom(_) => "custom value",
            FieldRef::Null => "null",
        }
    }
}

/// Write view of one member
pub enum FieldMut<'a> {
    /// Integer values
    Scalars(ScalarsMut<'a>),
    /// One nested struct
    Record(&'a mut dyn Reflect),
    /// An array of nested structs
    Records(Vec<&'a mut dyn Reflect>),
    /// Pointer member for index fields
    Address(&'a mut dyn AddressSlot),
    /// Raw value for a custom field
    Custom(&'a mut dyn Any),
    /// Absent pointee
    Null,
}

impl<'a> FieldMut<'a> {
    /// View of a single integer
    pub fn scalar<T: Scalar>(value: &'a mut T) -> Self {
        FieldMut::Scalars(T::wrap_mut(std::slice::from_mut(value)))
    }

    /// View of an integer array
    pub fn scalars<T: Scalar>(values: &'a mut [T]) -> Self {
        FieldMut::Scalars(T::wrap_mut(values))
    }

    /// View of an optional integer, `Null` when absent
    pub fn scalar_or_null<T: Scalar>(value: Option<&'a mut T>) -> Self {
        value.map_or(FieldMut::Null, |v| FieldMut::scalar(v))
    }

    /// View of a nested struct
    pub fn record<R: Reflect>(record: &'a mut R) -> Self {
        FieldMut::Record(record)
    }

    /// View of an optional nested struct, `Null` when absent
    pub fn record_or_null<R: Reflect>(record: Option<&'a mut R>) -> Self {
        record.map_or(FieldMut::Null, |r| FieldMut::Record(r))
    }

    /// View of an array of nested structs
    pub fn records<R: Reflect>(records: &'a mut [R]) -> Self {
        FieldMut::Records(records.iter_mut().map(|r| r as &mut dyn Reflect).collect())
    }

    /// View of a pointer member
    pub fn pointer<P: AddressSlot>(slot: &'a mut P) -> Self {
        FieldMut::Address(slot)
    }

    /// View of a custom value
    pub fn custom<T: Any>(value: &'a mut T) -> Self {
        FieldMut::Custom(value)
    }

    /// Short description for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            FieldMut::Scalars(_) => "scalars",
            FieldMut::Record(_) => "record",
            FieldMut::Records(_) => "records",
            FieldMut::Address(_) => "address",
            FieldMut::Custom(_) => "custom value",
            FieldMut::Null => "null",
        }
    }
}
