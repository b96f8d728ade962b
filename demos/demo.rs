//! Saves a struct that uses every field kind, scrambles it, and loads it back
//!
//! Run with `RUST_LOG=zerotape=debug cargo run --example demo` to see the
//! walker and interpreter at work.

use anyhow::{ensure, Context};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use zerotape::{
    ArraySpec, CustomTypeId, FieldDescriptor, FieldMut, FieldRef, Reflect, Region, ScalarWidth,
    StructDescriptor, TableEntry, Tape,
};

/// A table of strings used by the custom field
static POPULAR_BEAT_COMBO: [&str; 4] = ["John", "Paul", "George", "Ringo"];

/// An array that `static_pointer` indexes
static EXAMPLE_ARRAY: [u8; 3] = [44, 55, 66];

/// Identifies an array unknown until run time
const TENBYTE_ID: &str = "some array";

/// Id of the band member custom type
const BAND_MEMBER: CustomTypeId = CustomTypeId(0);

struct Sub {
    value: u8,
}

impl Reflect for Sub {
    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        (name == "value").then(|| FieldRef::scalar(&self.value))
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        if name == "value" {
            Some(FieldMut::scalar(&mut self.value))
        } else {
            None
        }
    }
}

struct Example {
    integer: u32,
    pointer_to_integer: Box<u32>,
    integer_array: [u32; 3],
    inline_sub: Sub,
    pointer_to_sub: Box<Sub>,
    array_of_sub: [Sub; 3],
    static_pointer: *const u8,
    static_nullpointer: *const u8,
    pointer: *const u8,
    nullpointer: *const u8,
    // Not representable with stock field kinds: saved as its index in POPULAR_BEAT_COMBO
    string_in_array: &'static str,
}

impl Reflect for Example {
    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        let view = match name {
            "integer" => FieldRef::scalar(&self.integer),
            "pointer_to_integer" => FieldRef::scalar(&*self.pointer_to_integer),
            "integer_array" => FieldRef::scalars(&self.integer_array),
            "inline_sub" => FieldRef::record(&self.inline_sub),
            "pointer_to_sub" => FieldRef::record(&*self.pointer_to_sub),
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
            "pointer_to_integer" => FieldMut::scalar(&mut *self.pointer_to_integer),
            "integer_array" => FieldMut::scalars(&mut self.integer_array),
            "inline_sub" => FieldMut::record(&mut self.inline_sub),
            "pointer_to_sub" => FieldMut::record(&mut *self.pointer_to_sub),
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

fn example_desc() -> StructDescriptor {
    let sub = Arc::new(StructDescriptor::new(vec![FieldDescriptor::scalar(
        "value",
        ScalarWidth::Byte,
    )]));
    let example_array = ArraySpec::of(&EXAMPLE_ARRAY);

    // Need not cover every member, only those to preserve
    StructDescriptor::new(vec![
        FieldDescriptor::scalar("integer", ScalarWidth::Word),
        FieldDescriptor::scalar_ptr("pointer_to_integer", ScalarWidth::Word),
        FieldDescriptor::scalar_array("integer_array", ScalarWidth::Word, 3),
        FieldDescriptor::record("inline_sub", sub.clone()),
        FieldDescriptor::record_ptr("pointer_to_sub", sub.clone()),
        FieldDescriptor::record_array("array_of_sub", sub, 3),
        FieldDescriptor::static_index("static_pointer", example_array),
        FieldDescriptor::static_index("static_nullpointer", example_array),
        FieldDescriptor::region_index("pointer", TENBYTE_ID),
        FieldDescriptor::region_index("nullpointer", TENBYTE_ID),
        FieldDescriptor::custom("string_in_array", BAND_MEMBER),
    ])
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let testfile = std::env::temp_dir().join("demo.zt");
    let tenbyte = vec![0u8; 10];
    let desc = example_desc();

    let mut tape = Tape::new();
    tape.register_region(Region::new(TENBYTE_ID, ArraySpec::of(&tenbyte)));
    tape.register_custom(BAND_MEMBER, TableEntry::new("band member", &POPULAR_BEAT_COMBO));

    let mut example = Example {
        integer: 42,
        pointer_to_integer: Box::new(33),
        integer_array: [61, 62, 63],
        inline_sub: Sub { value: 43 },
        pointer_to_sub: Box::new(Sub { value: 51 }),
        array_of_sub: [Sub { value: 44 }, Sub { value: 45 }, Sub { value: 46 }],
        static_pointer: &EXAMPLE_ARRAY[2],
        static_nullpointer: std::ptr::null(),
        pointer: &tenbyte[5],
        nullpointer: std::ptr::null(),
        string_in_array: POPULAR_BEAT_COMBO[3],
    };

    tape.save(&desc, &example, &testfile)
        .with_context(|| format!("saving {}", testfile.display()))?;
    println!("{}", std::fs::read_to_string(&testfile)?);

    // Scramble the values but keep the pointees
    example.integer = 0x5555_5555;
    *example.pointer_to_integer = 0x5555_5555;
    example.integer_array = [0x5555_5555; 3];
    example.inline_sub.value = 0x55;
    example.pointer_to_sub.value = 0x55;
    for sub in &mut example.array_of_sub {
        sub.value = 0x55;
    }
    example.static_pointer = &EXAMPLE_ARRAY[0];
    example.static_nullpointer = &EXAMPLE_ARRAY[0];
    example.pointer = &tenbyte[0];
    example.nullpointer = &tenbyte[0];
    example.string_in_array = POPULAR_BEAT_COMBO[0];

    if let Err(err) = tape.load(&desc, &mut example, &testfile) {
        if let Some(message) = err.syntax_message() {
            eprintln!("syntax error: {}", message);
        }
        let code = err.code().value();
        return Err(err).context(format!("loading failed ({:#04x})", code));
    }

    ensure!(example.integer == 42);
    ensure!(*example.pointer_to_integer == 33);
    ensure!(example.integer_array == [61, 62, 63]);
    ensure!(example.inline_sub.value == 43);
    ensure!(example.pointer_to_sub.value == 51);
    ensure!(example.array_of_sub.iter().map(|s| s.value).eq([44, 45, 46]));
    ensure!(example.static_pointer == &EXAMPLE_ARRAY[2] as *const u8);
    ensure!(example.static_nullpointer.is_null());
    ensure!(example.pointer == &tenbyte[5] as *const u8);
    ensure!(example.nullpointer.is_null());
    ensure!(example.string_in_array == "Ringo");

    println!("round trip ok");
    Ok(())
}
