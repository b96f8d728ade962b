use crate::custom::CustomTypeId;
use crate::error::{Error, Result};
use crate::meta::{
    ArraySpec, FieldDescriptor, FieldKind, FieldRef, Reflect, Regions, ScalarWidth, Scalars,
    StructDescriptor,
};
use std::any::Any;
use tracing::debug;

/// Callbacks driven by [`walk`], one per kind of value visited
pub trait WalkHandler {
    /// A single integer (`values.len() == 1`) or an integer array
    fn scalars(&mut self, name: &str, values: Scalars<'_>, stride: usize) -> Result<()>;

    /// A pointer converted to an index, `None` for null
    fn index(&mut self, name: &str, index: Option<usize>) -> Result<()>;

    /// A version number in hundredths
    fn version(&mut self, name: &str, version: u64) -> Result<()>;

    /// Start of a nested struct; `name` is `None` for an element of a struct array
    fn start_struct(&mut self, name: Option<&str>) -> Result<()>;

    /// End of the innermost nested struct
    fn end_struct(&mut self) -> Result<()>;

    /// Start of a struct array of `count` elements
    fn start_array(&mut self, name: &str, count: usize) -> Result<()>;

    /// End of the innermost struct array
    fn end_array(&mut self) -> Result<()>;

    /// A custom-typed value
    fn custom(&mut self, name: &str, id: CustomTypeId, value: &dyn Any) -> Result<()>;
}

/// Visits every described field of `record` in declaration order
pub fn walk<H: WalkHandler + ?Sized>(
    desc: &StructDescriptor,
    record: &dyn Reflect,
    regions: &Regions,
    handler: &mut H,
) -> Result<()> {
    for field in desc.fields() {
        debug!(field = %field.name, kind = field.kind.type_name(), "save field");
        let value = record
            .field(&field.name)
            .ok_or_else(|| Error::bad_field(&field.name, "struct has no such member"))?;

        match &field.kind {
            FieldKind::Scalar(width) | FieldKind::ScalarPtr(width) => {
                let values = expect_scalars(field, *width, value)?;
                handler.scalars(&field.name, values, field.row_stride())?;
            }

            FieldKind::Struct(sub) | FieldKind::StructPtr(sub) => {
                if field.count == 1 {
                    let inner = match value {
                        FieldRef::Record(inner) => inner,
                        other => return Err(mismatch(field, "record", &other)),
                    };
                    handler.start_struct(Some(&field.name))?;
                    walk(sub, inner, regions, handler)?;
                    handler.end_struct()?;
                } else {
                    let elements = match value {
                        FieldRef::Records(elements) => elements,
                        other => return Err(mismatch(field, "records", &other)),
                    };
                    if elements.len() != field.count {
                        return Err(Error::bad_field(
                            &field.name,
                            format!(
                                "declared {} elements but struct has {}",
                                field.count,
                                elements.len()
                            ),
                        ));
                    }
                    handler.start_array(&field.name, field.count)?;
                    for element in elements {
                        handler.start_struct(None)?;
                        walk(sub, element, regions, handler)?;
                        handler.end_struct()?;
                    }
                    handler.end_array()?;
                }
            }

            FieldKind::StaticArrayIndex(spec) => {
                single(field)?;
                let index = pointer_index(field, spec, value)?;
                handler.index(&field.name, index)?;
            }

            FieldKind::ArrayIndex(id) => {
                single(field)?;
                let spec = regions
                    .get(id)
                    .ok_or_else(|| Error::UnknownRegion { id: id.clone() })?;
                let index = pointer_index(field, spec, value)?;
                handler.index(&field.name, index)?;
            }

            FieldKind::Version => {
                single(field)?;
                let version = match value {
                    FieldRef::Scalars(values) if values.len() == 1 => values.get(0).unwrap_or(0),
                    other => return Err(mismatch(field, "one scalar", &other)),
                };
                handler.version(&field.name, version)?;
            }

            FieldKind::Custom(id) => {
                single(field)?;
                let raw = match value {
                    FieldRef::Custom(raw) => raw,
                    other => return Err(mismatch(field, "custom value", &other)),
                };
                handler.custom(&field.name, *id, raw)?;
            }
        }
    }
    Ok(())
}

fn single(field: &FieldDescriptor) -> Result<()> {
    if field.count != 1 {
        return Err(Error::bad_field(
            &field.name,
            format!("{} fields cannot be arrays", field.kind.type_name()),
        ));
    }
    Ok(())
}

fn mismatch(field: &FieldDescriptor, expected: &str, got: &FieldRef<'_>) -> Error {
    match got {
        FieldRef::Null if field.kind.is_pointer() => Error::BadPointer {
            field: field.name.clone(),
            address: 0,
        },
        _ => Error::bad_field(
            &field.name,
            format!("expected {}, accessor gave {}", expected, got.describe()),
        ),
    }
}

fn expect_scalars<'a>(
    field: &FieldDescriptor,
    width: ScalarWidth,
    value: FieldRef<'a>,
) -> Result<Scalars<'a>> {
    let values = match value {
        FieldRef::Scalars(values) => values,
        other => return Err(mismatch(field, "scalars", &other)),
    };
    if values.width() != width {
        return Err(Error::bad_field(
            &field.name,
            format!("declared {} but accessor gave {}", width, values.width()),
        ));
    }
    if values.len() != field.count {
        return Err(Error::bad_field(
            &field.name,
            format!(
                "declared {} elements but accessor gave {}",
                field.count,
                values.len()
            ),
        ));
    }
    Ok(values)
}

fn pointer_index(
    field: &FieldDescriptor,
    spec: &ArraySpec,
    value: FieldRef<'_>,
) -> Result<Option<usize>> {
    let address = match value {
        FieldRef::Address(address) => address,
        other => return Err(mismatch(field, "address", &other)),
    };
    match address {
        None => Ok(None),
        Some(address) => spec.index_of(address).map(Some).ok_or(Error::BadPointer {
            field: field.name.clone(),
            address,
        }),
    }
}
