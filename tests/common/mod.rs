//! Shared fixture: a struct exercising every field kind

#![allow(dead_code)]

use lazy_static::lazy_static;
use std::sync::Arc;
use zerotape::{
    ArraySpec, Config, CustomTypeId, FieldDescriptor, FieldMut, FieldRef, IntegerFormat, Reflect,
    Region, ScalarWidth, StructDescriptor, TableEntry, Tape,
};

/// Table indexed by the custom field
pub static POPULAR_BEAT_COMBO: [&str; 4] = ["John", "Paul", "George", "Ringo"];

/// Array indexed by the static-index fields
pub static EXAMPLE_ARRAY: [u8; 3] = [44, 55, 66];

/// Region id for the heap block
pub const TENBYTE_ID: &str = "some array";

/// Custom type id of the band member field
pub const BAND_MEMBER: CustomTypeId = CustomTypeId(0);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sub {
    pub value: u8,
}

impl Reflect for Sub {
    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "value" => Some(FieldRef::scalar(&self.value)),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        match name {
            "value" => Some(FieldMut::scalar(&mut self.value)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub integer: u32,
    pub pointer_to_integer: Option<Box<u32>>,
    pub integer_array: [u32; 3],
    pub inline_sub: Sub,
    pub pointer_to_sub: Option<Box<Sub>>,
    pub array_of_sub: [Sub; 3],
    pub static_pointer: *const u8,
    pub static_nullpointer: *const u8,
    pub pointer: *const u8,
    pub nullpointer: *const u8,
    pub string_in_array: &'static str,
}

impl Reflect for Example {
    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        let view = match name {
            "integer" => FieldRef::scalar(&self.integer),
            "pointer_to_integer" => FieldRef::scalar_or_null(self.pointer_to_integer.as_deref()),
            "integer_array" => FieldRef::scalars(&self.integer_array),
            "inline_sub" => FieldRef::record(&self.inline_sub),
            "pointer_to_sub" => FieldRef::record_or_null(self.pointer_to_sub.as_deref()),
            "array_of_sub" => FieldRef::records(&self.array_of_sub),
            "static_pointer" => FieldRef::pointer(&self.static_pointer),
            "static_nullpointer" => FieldRef::pointer(&self.static_nullpointer),
            "pointer" => FieldRef::pointer(&self.pointer),
            "nullpointer" => FieldRef::pointer(&self.nullpointer),
            "string_in_array" => FieldRef::custom(&self.string_in_array),
            _ => return None,
        };
        Some(view)
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        let view = match name {
            "integer" => FieldMut::scalar(&mut self.integer),
            "pointer_to_integer" => FieldMut::scalar_or_null(self.pointer_to_integer.as_deref_mut()),
            "integer_array" => FieldMut::scalars(&mut self.integer_array),
            "inline_sub" => FieldMut::record(&mut self.inline_sub),
            "pointer_to_sub" => FieldMut::record_or_null(self.pointer_to_sub.as_deref_mut()),
            "array_of_sub" => FieldMut::records(&mut self.array_of_sub),
            "static_pointer" => FieldMut::pointer(&mut self.static_pointer),
            "static_nullpointer" => FieldMut::pointer(&mut self.static_nullpointer),
            "pointer" => FieldMut::pointer(&mut self.pointer),
            "nullpointer" => FieldMut::pointer(&mut self.nullpointer),
            "string_in_array" => FieldMut::custom(&mut self.string_in_array),
            _ => return None,
        };
        Some(view)
    }
}

lazy_static! {
    pub static ref SUB_DESC: Arc<StructDescriptor> = Arc::new(StructDescriptor::new(vec![
        FieldDescriptor::scalar("value", ScalarWidth::Byte),
    ]));
    pub static ref EXAMPLE_DESC: StructDescriptor = {
        let example_array = ArraySpec::of(&EXAMPLE_ARRAY);
        StructDescriptor::new(vec![
            FieldDescriptor::scalar("integer", ScalarWidth::Word),
            FieldDescriptor::scalar_ptr("pointer_to_integer", ScalarWidth::Word),
            FieldDescriptor::scalar_array("integer_array", ScalarWidth::Word, 3),
            FieldDescriptor::record("inline_sub", SUB_DESC.clone()),
            FieldDescriptor::record_ptr("pointer_to_sub", SUB_DESC.clone()),
            FieldDescriptor::record_array("array_of_sub", SUB_DESC.clone(), 3),
            FieldDescriptor::static_index("static_pointer", example_array),
            FieldDescriptor::static_index("static_nullpointer", example_array),
            FieldDescriptor::region_index("pointer", TENBYTE_ID),
            FieldDescriptor::region_index("nullpointer", TENBYTE_ID),
            FieldDescriptor::custom("string_in_array", BAND_MEMBER),
        ])
    };
}

/// The populated example, with `pointer` aimed into `tenbyte`
pub fn example(tenbyte: &[u8]) -> Example {
    Example {
        integer: 42,
        pointer_to_integer: Some(Box::new(33)),
        integer_array: [61, 62, 63],
        inline_sub: Sub { value: 43 },
        pointer_to_sub: Some(Box::new(Sub { value: 51 })),
        array_of_sub: [Sub { value: 44 }, Sub { value: 45 }, Sub { value: 46 }],
        static_pointer: &EXAMPLE_ARRAY[2],
        static_nullpointer: std::ptr::null(),
        pointer: &tenbyte[5],
        nullpointer: std::ptr::null(),
        string_in_array: POPULAR_BEAT_COMBO[3],
    }
}

/// Every value overwritten with junk, pointees still allocated
pub fn scrambled(tenbyte: &[u8]) -> Example {
    Example {
        integer: 0x5555_5555,
        pointer_to_integer: Some(Box::new(0x5555_5555)),
        integer_array: [0x5555_5555; 3],
        inline_sub: Sub { value: 0x55 },
        pointer_to_sub: Some(Box::new(Sub { value: 0x55 })),
        array_of_sub: [Sub { value: 0x55 }, Sub { value: 0x55 }, Sub { value: 0x55 }],
        static_pointer: &EXAMPLE_ARRAY[0],
        static_nullpointer: &EXAMPLE_ARRAY[0],
        pointer: &tenbyte[0],
        nullpointer: &tenbyte[0],
        string_in_array: POPULAR_BEAT_COMBO[0],
    }
}

/// A decimal-output tape with the region and custom type registered
pub fn tape(tenbyte: &[u8]) -> Tape {
    let mut config = Config::default();
    config.save.integer_format = IntegerFormat::Decimal;
    let mut tape = Tape::with_config(config);
    tape.register_region(Region::new(TENBYTE_ID, ArraySpec::of(tenbyte)));
    tape.register_custom(BAND_MEMBER, TableEntry::new("band member", &POPULAR_BEAT_COMBO));
    tape
}

/// Saved form of [`example`]
pub const EXAMPLE_TEXT: &str = "\
integer = 42;
pointer_to_integer = 33;
integer_array = [
  61, 62, 63
];
inline_sub = {
  value = 43;
};
pointer_to_sub = {
  value = 51;
};
array_of_sub = [
  {
    value = 44;
  },
  {
    value = 45;
  },
  {
    value = 46;
  }
];
static_pointer = 2;
static_nullpointer = nil;
pointer = 5;
nullpointer = nil;
string_in_array = 3;
";
