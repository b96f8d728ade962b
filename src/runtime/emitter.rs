use super::walker::WalkHandler;
use crate::config::{IntegerFormat, SaveOptions};
use crate::custom::{CustomRegistry, CustomTypeId};
use crate::error::{Error, Result};
use crate::meta::Scalars;
use std::any::Any;
use std::io::Write;

/// Largest version, in hundredths, that can be read back
const MAX_VERSION: u64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Struct,
    Array,
}

/// One open `{` or `[`
#[derive(Debug, Clone, Copy)]
struct Frame {
    container: Container,
    count: usize,
    index: usize,
}

/// Writes walker events as zerotape text
pub struct Emitter<'a, W: Write> {
    out: W,
    stack: Vec<Frame>,
    indent_due: bool,
    depth: usize,
    options: SaveOptions,
    customs: &'a CustomRegistry,
}

impl<'a, W: Write> Emitter<'a, W> {
    /// Create an emitter writing to `out`
    pub fn new(out: W, options: SaveOptions, customs: &'a CustomRegistry) -> Self {
        Emitter {
            out,
            stack: Vec::new(),
            indent_due: true,
            depth: 0,
            options,
            customs,
        }
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.indent_due {
            let width = self.depth * self.options.indent_width;
            write!(self.out, "{:width$}", "", width = width)?;
        }
        self.out.write_all(text.as_bytes())?;
        self.indent_due = text.ends_with('\n');
        Ok(())
    }

    fn integer(&self, value: u64) -> String {
        match self.options.integer_format {
            IntegerFormat::Decimal => value.to_string(),
            IntegerFormat::Hex => format!("${:X}", value),
        }
    }

    fn in_array(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame {
                container: Container::Array,
                ..
            })
        )
    }
}

impl<W: Write> WalkHandler for Emitter<'_, W> {
    fn scalars(&mut self, name: &str, values: Scalars<'_>, stride: usize) -> Result<()> {
        if values.len() == 1 {
            let text = format!("{} = {};\n", name, self.integer(values.get(0).unwrap_or(0)));
            return self.emit(&text);
        }

        self.emit(&format!("{} = [\n", name))?;
        self.depth += 1;
        let all: Vec<u64> = values.iter().collect();
        let last = all.len().saturating_sub(1);
        for (row, chunk) in all.chunks(stride.max(1)).enumerate() {
            let start = row * stride.max(1);
            let line = chunk
                .iter()
                .enumerate()
                .map(|(k, &v)| {
                    if start + k < last {
                        format!("{},", self.integer(v))
                    } else {
                        self.integer(v)
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            self.emit(&line)?;
            self.emit("\n")?;
        }
        self.depth -= 1;
        self.emit("];\n")
    }

    fn index(&mut self, name: &str, index: Option<usize>) -> Result<()> {
        match index {
            Some(index) => self.emit(&format!("{} = {};\n", name, index)),
            None => self.emit(&format!("{} = nil;\n", name)),
        }
    }

    fn version(&mut self, name: &str, version: u64) -> Result<()> {
        if version > MAX_VERSION {
            return Err(Error::bad_field(
                name,
                format!("version {} exceeds {}", version, MAX_VERSION),
            ));
        }
        self.emit(&format!("{} = {}.{:02};\n", name, version / 100, version % 100))
    }

    fn start_struct(&mut self, name: Option<&str>) -> Result<()> {
        let element = self.in_array();
        if element {
            if let Some(parent) = self.stack.last_mut() {
                parent.index += 1;
            }
        }
        self.stack.push(Frame {
            container: Container::Struct,
            count: 1,
            index: 0,
        });

        match name {
            Some(name) if !element => self.emit(&format!("{} = {{\n", name))?,
            _ => self.emit("{\n")?,
        }
        self.depth += 1;
        Ok(())
    }

    fn end_struct(&mut self) -> Result<()> {
        self.stack.pop();
        self.depth = self.depth.saturating_sub(1);
        let end = match self.stack.last() {
            Some(Frame {
                container: Container::Array,
                count,
                index,
            }) if index < count => "},\n",
            Some(Frame {
                container: Container::Array,
                ..
            }) => "}\n",
            _ => "};\n",
        };
        self.emit(end)
    }

    fn start_array(&mut self, name: &str, count: usize) -> Result<()> {
        self.stack.push(Frame {
            container: Container::Array,
            count,
            index: 0,
        });
        self.emit(&format!("{} = [\n", name))?;
        self.depth += 1;
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.depth = self.depth.saturating_sub(1);
        self.stack.pop();
        self.emit("];\n")
    }

    fn custom(&mut self, name: &str, id: CustomTypeId, value: &dyn Any) -> Result<()> {
        let custom = self.customs.get(id).ok_or_else(|| Error::BadCustomId {
            field: name.to_string(),
            id: id.0,
        })?;
        let text = custom.encode(value)?;
        self.emit(&format!("{} = {};\n", name, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Emitter<'_, Vec<u8>>) -> Result<()>) -> String {
        render_with(SaveOptions::default(), f)
    }

    fn render_with(
        options: SaveOptions,
        f: impl FnOnce(&mut Emitter<'_, Vec<u8>>) -> Result<()>,
    ) -> String {
        let customs = CustomRegistry::new();
        let mut emitter = Emitter::new(Vec::new(), options, &customs);
        f(&mut emitter).unwrap();
        String::from_utf8(emitter.into_inner().unwrap()).unwrap()
    }

    fn decimal() -> SaveOptions {
        SaveOptions {
            integer_format: IntegerFormat::Decimal,
            ..SaveOptions::default()
        }
    }

    #[test]
    fn singles_and_versions() {
        let text = render_with(decimal(), |e| {
            e.scalars("a", Scalars::Bytes(&[42]), 1)?;
            e.index("p", Some(3))?;
            e.index("q", None)?;
            e.version("v", 123)?;
            e.version("w", 5)
        });
        assert_eq!(text, "a = 42;\np = 3;\nq = nil;\nv = 1.23;\nw = 0.05;\n");
    }

    #[test]
    fn arrays_wrap_by_stride() {
        let text = render_with(decimal(), |e| {
            e.scalars("grid", Scalars::Halfwords(&[1, 2, 3, 4, 5]), 2)
        });
        assert_eq!(text, "grid = [\n  1, 2,\n  3, 4,\n  5\n];\n");
    }

    #[test]
    fn hex_integers() {
        let options = SaveOptions {
            integer_format: IntegerFormat::Hex,
            ..SaveOptions::default()
        };
        let text = render_with(options, |e| e.scalars("a", Scalars::Words(&[255]), 1));
        assert_eq!(text, "a = $FF;\n");
    }

    #[test]
    fn nested_structs_and_arrays() {
        let text = render_with(decimal(), |e| {
            e.start_struct(Some("inner"))?;
            e.scalars("x", Scalars::Bytes(&[1]), 1)?;
            e.end_struct()?;
            e.start_array("list", 2)?;
            for v in [7u8, 8] {
                e.start_struct(None)?;
                e.scalars("x", Scalars::Bytes(&[v]), 1)?;
                e.end_struct()?;
            }
            e.end_array()
        });
        assert_eq!(
            text,
            "inner = {\n  x = 1;\n};\nlist = [\n  {\n    x = 7;\n  },\n  {\n    x = 8;\n  }\n];\n"
        );
    }

    #[test]
    fn version_overflow_is_rejected() {
        let customs = CustomRegistry::new();
        let mut emitter = Emitter::new(Vec::new(), SaveOptions::default(), &customs);
        assert!(matches!(emitter.version("v", 1000), Err(Error::BadField { .. })));
    }

    #[test]
    fn unregistered_custom_id() {
        let customs = CustomRegistry::new();
        let mut emitter = Emitter::new(Vec::new(), SaveOptions::default(), &customs);
        let err = emitter.custom("c", CustomTypeId(9), &1u8).unwrap_err();
        assert!(matches!(err, Error::BadCustomId { id: 9, .. }));
    }

    #[test]
    fn indent_width_is_configurable() {
        let options = SaveOptions {
            integer_format: IntegerFormat::Decimal,
            indent_width: 4,
        };
        let text = render_with(options, |e| {
            e.start_struct(Some("s"))?;
            e.scalars("x", Scalars::Bytes(&[1]), 1)?;
            e.end_struct()
        });
        assert_eq!(text, "s = {\n    x = 1;\n};\n");
    }

    #[test]
    fn default_render_is_parseable() {
        let text = render(|e| e.scalars("a", Scalars::Bytes(&[1, 2]), 2));
        assert!(crate::parser::parse_str(&text).is_ok());
    }
}
