//! xlbrl - Compile spreadsheet-authored XBRL taxonomy extensions
//!
//! Licensed under AGPL-3.0

pub mod compiler;
pub mod control;
pub mod diagnostics;
pub mod forest;
pub mod header;
pub mod label;
pub mod linkbase;
pub mod model;
pub mod schema;
pub mod sheet;
pub mod taxonomy;
pub mod xbrl;
pub mod xml;

pub use compiler::Compilation;
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use sheet::{Cell, Sheet, Workbook};
pub use taxonomy::Taxonomy;

use schema::{SchemaEmitter, SchemaLoader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compiler facade: runs the sheet passes, then emits the schema and linkbases.
pub struct Compiler {
    config: CompileConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            config: CompileConfig::default(),
        }
    }

    pub fn with_config(config: CompileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Compiles a workbook file. Imported schemas are looked up next to it
    /// unless `base_dir` is configured.
    pub fn compile_file<P: AsRef<Path>>(&self, path: P) -> Result<Taxonomy> {
        let path = path.as_ref();
        let workbook = Workbook::open(path)?;
        let base_dir = self
            .config
            .base_dir
            .clone()
            .or_else(|| path.parent().map(Path::to_path_buf));
        let compilation = compiler::compile_workbook(&workbook)?;
        self.emit_from(compilation, base_dir.as_deref())
    }

    pub fn compile_workbook(&self, workbook: &Workbook) -> Result<Taxonomy> {
        let compilation = compiler::compile_workbook(workbook)?;
        self.emit(compilation)
    }

    /// Emits the documents of an already compiled workbook.
    pub fn emit(&self, compilation: Compilation) -> Result<Taxonomy> {
        self.emit_from(compilation, self.config.base_dir.as_deref())
    }

    fn emit_from(&self, mut compilation: Compilation, base_dir: Option<&Path>) -> Result<Taxonomy> {
        let mut diagnostics = std::mem::take(&mut compilation.diagnostics);
        let mut taxonomy = Taxonomy::new(SchemaEmitter::emit(&compilation));

        if self.config.discover_imports {
            let loader = SchemaLoader::new(base_dir.unwrap_or_else(|| Path::new(".")));
            for info in loader.load_imports(&compilation.directives.imports) {
                taxonomy.register(info);
            }
        }

        label::emit_label_linkbases(&compilation, &mut taxonomy, &mut diagnostics)?;
        linkbase::emit_structural_linkbases(&compilation, &mut taxonomy, &mut diagnostics)?;

        info!(
            entry = taxonomy.entry_uri(),
            documents = taxonomy.documents().count(),
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "Compiled taxonomy"
        );
        if self.config.strict && diagnostics.has_errors() {
            return Err(Error::Compile(diagnostics.error_count()));
        }
        taxonomy.set_diagnostics(diagnostics);
        Ok(taxonomy)
    }
}

/// Compile configuration
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Fail when any row produced an error diagnostic.
    pub strict: bool,
    /// Read imported schemas found on disk for role titles and dimensional arcroles.
    pub discover_imports: bool,
    /// Directory imported schema locations are relative to.
    pub base_dir: Option<PathBuf>,
}

impl CompileConfig {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            strict: false,
            discover_imports: true,
            base_dir: None,
        }
    }
}

/// Compiles `path` if it names a workbook; any other file yields `Ok(None)`.
pub fn load_from_workbook<P: AsRef<Path>>(path: P, config: CompileConfig) -> Result<Option<Taxonomy>> {
    let path = path.as_ref();
    if !sheet::is_workbook_path(path) {
        debug!(path = %path.display(), "Not a workbook, skipping");
        return Ok(None);
    }
    Compiler::with_config(config).compile_file(path).map(Some)
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Workbook has no sheet {0} (sheet 0 holds data, sheet 1 holds control directives)")]
    MissingSheet(usize),

    #[error("Control sheet declares no extension schema prefix, filename and namespace")]
    MissingExtensionSchema,

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Compilation produced {0} error diagnostic(s)")]
    Compile(usize),
}
