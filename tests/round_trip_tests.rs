//! Save then load the example struct through files and strings

mod common;

use common::*;
use std::sync::Arc;
use zerotape::{
    load, save, ArraySpec, Config, CustomRegistry, Error, FieldDescriptor, FieldMut, FieldRef,
    IntegerFormat, Reflect, Regions, ScalarWidth, StructDescriptor, TableEntry, Tape,
};

#[test]
fn example_saves_to_expected_text() {
    let tenbyte = vec![0u8; 10];
    let tape = tape(&tenbyte);
    let text = tape.save_to_string(&EXAMPLE_DESC, &example(&tenbyte)).unwrap();
    assert_eq!(text, EXAMPLE_TEXT);
}

#[test]
fn example_round_trips_through_file() {
    let tenbyte = vec![0u8; 10];
    let tape = tape(&tenbyte);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.zt");

    let original = example(&tenbyte);
    tape.save(&EXAMPLE_DESC, &original, &path).unwrap();

    let mut loaded = scrambled(&tenbyte);
    tape.load(&EXAMPLE_DESC, &mut loaded, &path).unwrap();

    assert_eq!(loaded.integer, 42);
    assert_eq!(loaded.pointer_to_integer.as_deref(), Some(&33));
    assert_eq!(loaded.integer_array, [61, 62, 63]);
    assert_eq!(loaded.inline_sub.value, 43);
    assert_eq!(loaded.pointer_to_sub.as_ref().map(|s| s.value), Some(51));
    assert_eq!(loaded.array_of_sub[1].value, 45);
    assert_eq!(loaded.static_pointer, &EXAMPLE_ARRAY[2] as *const u8);
    assert!(loaded.static_nullpointer.is_null());
    assert_eq!(loaded.pointer, &tenbyte[5] as *const u8);
    assert!(loaded.nullpointer.is_null());
    assert_eq!(loaded.string_in_array, "Ringo");
    assert_eq!(loaded, original);
}

#[test]
fn round_trip_in_hex() {
    let tenbyte = vec![0u8; 10];
    let mut tape = tape(&tenbyte);
    tape.config_mut().save.integer_format = zerotape::IntegerFormat::Hex;

    let original = example(&tenbyte);
    let text = tape.save_to_string(&EXAMPLE_DESC, &original).unwrap();
    assert!(text.starts_with("integer = $2A;\npointer_to_integer = $21;\n"));
    // indices are always decimal
    assert!(text.contains("pointer = 5;\n"));

    let mut loaded = scrambled(&tenbyte);
    tape.load_str(&EXAMPLE_DESC, &mut loaded, &text).unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn free_functions_round_trip() {
    let tenbyte = vec![0u8; 10];
    let regions = Regions::new().with(TENBYTE_ID, ArraySpec::of(&tenbyte));
    let customs =
        CustomRegistry::new().with(BAND_MEMBER, TableEntry::new("band member", &POPULAR_BEAT_COMBO));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("free.zt");

    let original = example(&tenbyte);
    save(&EXAMPLE_DESC, &original, &path, &regions, &customs).unwrap();

    let mut loaded = scrambled(&tenbyte);
    load(&EXAMPLE_DESC, &mut loaded, &path, &regions, &customs).unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn hand_written_input_with_comments() {
    let tenbyte = vec![0u8; 10];
    let tape = tape(&tenbyte);
    let source = "
        // edited by hand
        integer = 0x10;            // hex accepted on input
        integer_array = [ 2: $FF, 0: 7 ];
        array_of_sub = [ 1: { value = 9; } ];
        pointer = 9;
        string_in_array = 1;
    ";

    let mut loaded = example(&tenbyte);
    tape.load_str(&EXAMPLE_DESC, &mut loaded, source).unwrap();

    assert_eq!(loaded.integer, 16);
    assert_eq!(loaded.integer_array, [7, 62, 255]);
    assert_eq!(loaded.array_of_sub[0].value, 44);
    assert_eq!(loaded.array_of_sub[1].value, 9);
    assert_eq!(loaded.array_of_sub[2].value, 46);
    assert_eq!(loaded.pointer, &tenbyte[9] as *const u8);
    assert_eq!(loaded.string_in_array, "Paul");
}

#[test]
fn null_struct_pointer_cannot_be_saved() {
    let tenbyte = vec![0u8; 10];
    let tape = tape(&tenbyte);
    let mut record = example(&tenbyte);
    record.pointer_to_sub = None;

    let err = tape.save_to_string(&EXAMPLE_DESC, &record).unwrap_err();
    assert!(matches!(err, Error::BadPointer { ref field, .. } if field == "pointer_to_sub"));
}

/// Arrays reached through a pointer
#[derive(Debug, Default, PartialEq)]
struct Boxed {
    subs: Box<[Sub; 2]>,
    halves: Box<[u16; 3]>,
}

impl Reflect for Boxed {
    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "subs" => Some(FieldRef::records(&self.subs[..])),
            "halves" => Some(FieldRef::scalars(&self.halves[..])),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        match name {
            "subs" => Some(FieldMut::records(&mut self.subs[..])),
            "halves" => Some(FieldMut::scalars(&mut self.halves[..])),
            _ => None,
        }
    }
}

#[test]
fn pointer_arrays_round_trip() {
    let sub = Arc::new(StructDescriptor::new(vec![FieldDescriptor::scalar(
        "value",
        ScalarWidth::Byte,
    )]));
    let desc = StructDescriptor::new(vec![
        FieldDescriptor::record_ptr_array("subs", sub, 2),
        FieldDescriptor::scalar_ptr_array("halves", ScalarWidth::Halfword, 3),
    ]);
    let original = Boxed {
        subs: Box::new([Sub { value: 4 }, Sub { value: 5 }]),
        halves: Box::new([1, 2, 65535]),
    };

    let mut config = Config::default();
    config.save.integer_format = IntegerFormat::Decimal;
    let tape = Tape::with_config(config);
    let text = tape.save_to_string(&desc, &original).unwrap();
    assert!(text.contains("halves = [\n  1, 2, 65535\n];\n"));

    let mut loaded = Boxed::default();
    tape.load_str(&desc, &mut loaded, &text).unwrap();
    assert_eq!(loaded, original);
}
