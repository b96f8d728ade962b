use super::emitter::Emitter;
use super::interpreter::Interpreter;
use super::walker::walk;
use crate::config::Config;
use crate::custom::{CustomRegistry, CustomType, CustomTypeId};
use crate::error::{Error, Result};
use crate::meta::{Region, Reflect, Regions, StructDescriptor};
use crate::parser::{parse_file, parse_str_with, Ast};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Save and load with a fixed set of options, regions and custom types
///
/// A `Tape` owns no struct data; each call borrows the struct it works on.
#[derive(Debug, Default)]
pub struct Tape {
    config: Config,
    regions: Regions,
    customs: CustomRegistry,
}

impl Tape {
    /// Create a tape with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tape with the given configuration
    pub fn with_config(config: Config) -> Self {
        Tape {
            config,
            ..Self::default()
        }
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Regions used to resolve region-index fields
    pub fn regions(&self) -> &Regions {
        &self.regions
    }

    /// Mutable access to the regions
    pub fn regions_mut(&mut self) -> &mut Regions {
        &mut self.regions
    }

    /// Add or replace a region
    pub fn register_region(&mut self, region: Region) {
        self.regions.insert(region);
    }

    /// Add or replace a custom type
    pub fn register_custom(&mut self, id: CustomTypeId, custom: impl CustomType + 'static) {
        self.customs.register(id, Arc::new(custom));
    }

    /// Custom types used for custom fields
    pub fn customs(&self) -> &CustomRegistry {
        &self.customs
    }

    /// Write `record` to the file at `path`
    ///
    /// On failure the file is left partially written.
    pub fn save(
        &self,
        desc: &StructDescriptor,
        record: &dyn Reflect,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "saving");
        let file = File::create(path).map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        self.save_to_writer(desc, record, BufWriter::new(file))?;
        Ok(())
    }

    /// Write `record` to `out`, returning the flushed writer
    pub fn save_to_writer<W: Write>(
        &self,
        desc: &StructDescriptor,
        record: &dyn Reflect,
        out: W,
    ) -> Result<W> {
        let mut emitter = Emitter::new(out, self.config.save.clone(), &self.customs);
        walk(desc, record, &self.regions, &mut emitter)?;
        emitter.into_inner()
    }

    /// Render `record` as text
    pub fn save_to_string(&self, desc: &StructDescriptor, record: &dyn Reflect) -> Result<String> {
        let bytes = self.save_to_writer(desc, record, Vec::new())?;
        String::from_utf8(bytes)
            .map_err(|e| Error::bad_field("output", format!("custom encoder wrote {}", e)))
    }

    /// Read the file at `path` into `record`
    ///
    /// On failure fields assigned before the error keep their new values.
    pub fn load(
        &self,
        desc: &StructDescriptor,
        record: &mut dyn Reflect,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading");
        let ast = parse_file(path, &self.config.parse)?;
        self.load_ast(&ast, desc, record)
    }

    /// Read `source` into `record`
    pub fn load_str(
        &self,
        desc: &StructDescriptor,
        record: &mut dyn Reflect,
        source: &str,
    ) -> Result<()> {
        let ast = parse_str_with(source, &self.config.parse)?;
        self.load_ast(&ast, desc, record)
    }

    /// Apply an already parsed program to `record`
    pub fn load_ast(&self, ast: &Ast, desc: &StructDescriptor, record: &mut dyn Reflect) -> Result<()> {
        debug!(arena = ?ast.arena_stats(), "running program");
        Interpreter::new(&self.regions, &self.customs).run(ast, desc, record)
    }
}

/// Write `record` to `path` with default options
pub fn save(
    desc: &StructDescriptor,
    record: &dyn Reflect,
    path: impl AsRef<Path>,
    regions: &Regions,
    customs: &CustomRegistry,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut emitter = Emitter::new(BufWriter::new(file), Default::default(), customs);
    walk(desc, record, regions, &mut emitter)?;
    emitter.into_inner()?;
    Ok(())
}

/// Read `path` into `record` with default options
pub fn load(
    desc: &StructDescriptor,
    record: &mut dyn Reflect,
    path: impl AsRef<Path>,
    regions: &Regions,
    customs: &CustomRegistry,
) -> Result<()> {
    let ast = parse_file(path, &Default::default())?;
    Interpreter::new(regions, customs).run(&ast, desc, record)
}
