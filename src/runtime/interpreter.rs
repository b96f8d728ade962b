use crate::custom::CustomRegistry;
use crate::error::{Error, Result, SyntaxErrorKind};
use crate::meta::{
    ArraySpec, FieldDescriptor, FieldKind, FieldMut, Reflect, Regions, ScalarWidth, ScalarsMut,
    StructDescriptor,
};
use crate::parser::{Ast, Expr, ExprKind, Statements, Value};
use tracing::debug;

/// Largest version, in hundredths, a decimal literal may carry
const MAX_VERSION: u32 = 999;

/// Executes a parsed program against a struct
///
/// Assignments are applied in source order. The first failure stops the run
/// and fields assigned before it keep their new values.
pub struct Interpreter<'a> {
    regions: &'a Regions,
    customs: &'a CustomRegistry,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter that resolves regions and custom types from the given tables
    pub fn new(regions: &'a Regions, customs: &'a CustomRegistry) -> Self {
        Interpreter { regions, customs }
    }

    /// Apply every assignment in `ast` to `record`
    pub fn run(&self, ast: &Ast, desc: &StructDescriptor, record: &mut dyn Reflect) -> Result<()> {
        if ast.is_empty() {
            return Err(Error::NoProgram);
        }
        self.run_statements(ast.statements(), desc, record)
    }

    fn run_statements(
        &self,
        statements: Statements<'_>,
        desc: &StructDescriptor,
        record: &mut dyn Reflect,
    ) -> Result<()> {
        for statement in statements {
            debug!(field = statement.name, position = %statement.position, "assign");
            let field = desc.field(statement.name).ok_or_else(|| {
                Error::syntax(SyntaxErrorKind::UnknownField)
                    .at(statement.name, statement.position)
            })?;
            self.assign(field, statement.expr, record)
                .map_err(|e| e.at(statement.name, statement.expr.position()))?;
        }
        Ok(())
    }

    fn assign(&self, field: &FieldDescriptor, expr: Expr<'_>, record: &mut dyn Reflect) -> Result<()> {
        match &field.kind {
            FieldKind::Scalar(width) | FieldKind::ScalarPtr(width) => {
                let view = member(field, record)?;
                let mut values = expect_scalars(field, *width, view)?;
                if field.count == 1 {
                    let n = integer(expr)?;
                    store(&mut values, 0, n, *width)
                } else {
                    let elements = match expr.kind() {
                        ExprKind::IntArray(elements) => elements,
                        _ => return Err(Error::syntax(SyntaxErrorKind::NeedIntegerArray)),
                    };
                    for (index, element) in elements {
                        let result = if index >= field.count {
                            Err(Error::syntax(SyntaxErrorKind::ValueRange))
                        } else {
                            integer(element).and_then(|n| store(&mut values, index, n, *width))
                        };
                        result.map_err(|e| e.at(&field.name, element.position()))?;
                    }
                    Ok(())
                }
            }

            FieldKind::Struct(sub) | FieldKind::StructPtr(sub) => {
                if field.count == 1 {
                    let statements = match expr.kind() {
                        ExprKind::Scope(statements) => statements,
                        _ => return Err(Error::syntax(SyntaxErrorKind::NeedScope)),
                    };
                    match member(field, record)? {
                        FieldMut::Record(inner) => self.run_statements(statements, sub, inner),
                        other => Err(mismatch(field, "record", &other)),
                    }
                } else {
                    let elements = match expr.kind() {
                        ExprKind::ScopeArray(elements) => elements,
                        ExprKind::IntArray(elements) if elements.is_empty() => {
                            return Err(Error::syntax(SyntaxErrorKind::NeedValue))
                        }
                        _ => return Err(Error::syntax(SyntaxErrorKind::NeedScopeArray)),
                    };
                    let mut list = match member(field, record)? {
                        FieldMut::Records(list) => list,
                        other => return Err(mismatch(field, "records", &other)),
                    };
                    if list.len() != field.count {
                        return Err(Error::bad_field(
                            &field.name,
                            format!(
                                "declared {} elements but struct has {}",
                                field.count,
                                list.len()
                            ),
                        ));
                    }
                    for (index, element) in elements {
                        let inner = list.get_mut(index).ok_or_else(|| {
                            Error::syntax(SyntaxErrorKind::ValueRange)
                                .at(&field.name, element.position())
                        })?;
                        if let ExprKind::Scope(statements) = element.kind() {
                            self.run_statements(statements, sub, &mut **inner)?;
                        }
                    }
                    Ok(())
                }
            }

            FieldKind::StaticArrayIndex(spec) => assign_index(field, spec, expr, record),

            FieldKind::ArrayIndex(id) => {
                let spec = self
                    .regions
                    .get(id)
                    .ok_or_else(|| Error::UnknownRegion { id: id.clone() })?;
                assign_index(field, spec, expr, record)
            }

            FieldKind::Version => {
                let version = match expr.kind() {
                    ExprKind::Value(Value::Decimal(v)) => v,
                    ExprKind::Value(_) => return Err(Error::syntax(SyntaxErrorKind::NeedDecimal)),
                    _ => return Err(Error::syntax(SyntaxErrorKind::NeedValue)),
                };
                if version > MAX_VERSION {
                    return Err(Error::syntax(SyntaxErrorKind::ValueRange));
                }
                if field.count != 1 {
                    return Err(Error::syntax(SyntaxErrorKind::Unsupported));
                }
                match member(field, record)? {
                    FieldMut::Scalars(mut values) if values.len() == 1 => {
                        let width = values.width();
                        store(&mut values, 0, u64::from(version), width)
                    }
                    other => Err(mismatch(field, "one scalar", &other)),
                }
            }

            FieldKind::Custom(id) => {
                if field.count != 1 {
                    return Err(Error::syntax(SyntaxErrorKind::Unsupported));
                }
                let custom = self.customs.get(*id).ok_or_else(|| Error::BadCustomId {
                    field: field.name.clone(),
                    id: id.0,
                })?;
                match member(field, record)? {
                    FieldMut::Custom(raw) => custom.decode(expr, raw),
                    other => Err(mismatch(field, "custom value", &other)),
                }
            }
        }
    }
}

/// Turns an index literal back into an address inside `spec`
fn assign_index(
    field: &FieldDescriptor,
    spec: &ArraySpec,
    expr: Expr<'_>,
    record: &mut dyn Reflect,
) -> Result<()> {
    if field.count != 1 {
        return Err(Error::syntax(SyntaxErrorKind::Unsupported));
    }
    let address = match expr.kind() {
        ExprKind::Value(Value::Integer(n)) => Some(
            usize::try_from(n)
                .ok()
                .and_then(|i| spec.address_of(i))
                .ok_or_else(|| Error::syntax(SyntaxErrorKind::ValueRange))?,
        ),
        ExprKind::Value(Value::Nil) => None,
        ExprKind::Value(_) => return Err(Error::syntax(SyntaxErrorKind::UnexpectedValueType)),
        _ => return Err(Error::syntax(SyntaxErrorKind::NeedValue)),
    };
    match member(field, record)? {
        FieldMut::Address(slot) => {
            slot.set_address(address);
            Ok(())
        }
        other => Err(mismatch(field, "address", &other)),
    }
}

fn member<'r>(field: &FieldDescriptor, record: &'r mut dyn Reflect) -> Result<FieldMut<'r>> {
    record
        .field_mut(&field.name)
        .ok_or_else(|| Error::bad_field(&field.name, "struct has no such member"))
}

fn mismatch(field: &FieldDescriptor, expected: &str, got: &FieldMut<'_>) -> Error {
    match got {
        FieldMut::Null if field.kind.is_pointer() => Error::BadPointer {
            field: field.name.clone(),
            address: 0,
        },
        _ => Error::bad_field(
            &field.name,
            format!("expected {}, accessor gave {}", expected, got.describe()),
        ),
    }
}

fn expect_scalars<'r>(
    field: &FieldDescriptor,
    width: ScalarWidth,
    view: FieldMut<'r>,
) -> Result<ScalarsMut<'r>> {
    let values = match view {
        FieldMut::Scalars(values) => values,
        other => return Err(mismatch(field, "scalars", &other)),
    };
    if values.width() != width || values.len() != field.count {
        return Err(Error::bad_field(
            &field.name,
            format!(
                "declared {} x{} but accessor gave {} x{}",
                width,
                field.count,
                values.width(),
                values.len()
            ),
        ));
    }
    Ok(values)
}

fn integer(expr: Expr<'_>) -> Result<u64> {
    match expr.kind() {
        ExprKind::Value(Value::Integer(n)) => Ok(n),
        ExprKind::Value(_) => Err(Error::syntax(SyntaxErrorKind::NeedInteger)),
        _ => Err(Error::syntax(SyntaxErrorKind::NeedValue)),
    }
}

fn store(values: &mut ScalarsMut<'_>, index: usize, n: u64, width: ScalarWidth) -> Result<()> {
    if n > width.max() || !values.set(index, n) {
        return Err(Error::syntax(SyntaxErrorKind::ValueRange));
    }
    Ok(())
}
