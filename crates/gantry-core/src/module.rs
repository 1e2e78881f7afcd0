//! WASM module loading and validation.
//!
//! This module provides types for loading, validating, and inspecting
//! guest modules before instantiation. The extracted import list is what
//! the facade checks against the bridge's call-surface manifest, and the
//! export list is what the CLI's inspect command prints.

use std::path::Path;

use tracing::{debug, info};
use wasmtime::{ExternType, Module};

use crate::engine::SharedEngine;
use crate::error::{ModuleError, ModuleResult};

/// A validated guest module ready for instantiation.
///
/// Wraps a compiled Wasmtime module together with metadata extracted at
/// load time, so validation happens once and instantiation can repeat.
#[derive(Clone)]
pub struct ValidatedModule {
    /// The underlying Wasmtime module.
    inner: Module,
    /// Metadata extracted from the module.
    metadata: ModuleMetadata,
}

impl ValidatedModule {
    /// Get a reference to the underlying Wasmtime module.
    pub fn inner(&self) -> &Module {
        &self.inner
    }

    /// Get the module metadata.
    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    /// Get the module name, if set.
    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    /// Get the list of exports.
    pub fn exports(&self) -> &[ExportInfo] {
        &self.metadata.exports
    }

    /// Get the list of imports.
    pub fn imports(&self) -> &[ImportInfo] {
        &self.metadata.imports
    }

    /// Check if the module has a specific export.
    pub fn has_export(&self, name: &str) -> bool {
        self.metadata.exports.iter().any(|e| e.name == name)
    }

    /// Check if the module requires a specific import.
    pub fn requires_import(&self, module: &str, name: &str) -> bool {
        self.metadata
            .imports
            .iter()
            .any(|i| i.module == module && i.name == name)
    }

    /// Check if the module exports a linear memory under `name`.
    pub fn exports_memory(&self, name: &str) -> bool {
        self.metadata
            .exports
            .iter()
            .any(|e| e.name == name && e.kind == ExportKind::Memory)
    }
}

impl std::fmt::Debug for ValidatedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedModule")
            .field("name", &self.metadata.name)
            .field("exports", &self.metadata.exports.len())
            .field("imports", &self.metadata.imports.len())
            .finish()
    }
}

/// Metadata extracted from a guest module.
#[derive(Debug, Clone, Default)]
pub struct ModuleMetadata {
    /// Module name, if specified.
    pub name: Option<String>,
    /// List of exported items.
    pub exports: Vec<ExportInfo>,
    /// List of required imports.
    pub imports: Vec<ImportInfo>,
    /// Exported memory descriptions.
    pub memories: Vec<MemoryInfo>,
}

/// Information about an exported item.
#[derive(Debug, Clone)]
pub struct ExportInfo {
    /// Export name.
    pub name: String,
    /// Type of the export.
    pub kind: ExportKind,
}

/// The kind of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportKind {
    /// A function export.
    Function {
        /// Number of parameters.
        params: usize,
        /// Number of results.
        results: usize,
    },
    /// A memory export.
    Memory,
    /// A global export.
    Global,
    /// A table export.
    Table,
}

/// Information about a required import.
#[derive(Debug, Clone)]
pub struct ImportInfo {
    /// The import module name.
    pub module: String,
    /// The import name.
    pub name: String,
    /// Type of the import.
    pub kind: ImportKind,
}

/// The kind of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// A function import.
    Function {
        /// Number of parameters.
        params: usize,
        /// Number of results.
        results: usize,
    },
    /// A memory import.
    Memory,
    /// A global import.
    Global,
    /// A table import.
    Table,
}

/// Description of an exported linear memory.
#[derive(Debug, Clone)]
pub struct MemoryInfo {
    /// Minimum memory size in pages (64KB each).
    pub min_pages: u64,
    /// Maximum memory size in pages, if specified.
    pub max_pages: Option<u64>,
}

/// Loader for guest modules.
pub struct ModuleLoader {
    /// Reference to the engine used for compilation.
    engine: SharedEngine,
}

impl ModuleLoader {
    /// Create a new module loader with the given engine.
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    /// Load and validate a module from raw bytes.
    ///
    /// Accepts both the binary format and WAT text (detected by the `wat`
    /// crate).
    pub fn load_bytes(&self, bytes: &[u8]) -> ModuleResult<ValidatedModule> {
        debug!(size = bytes.len(), "Loading module from bytes");

        let wasm = wat::parse_bytes(bytes).map_err(|e| ModuleError::Invalid(e.to_string()))?;
        let module = Module::new(self.engine.inner(), &wasm)?;
        let metadata = extract_metadata(&module);

        info!(
            name = ?metadata.name,
            exports = metadata.exports.len(),
            imports = metadata.imports.len(),
            "Loaded module"
        );

        Ok(ValidatedModule {
            inner: module,
            metadata,
        })
    }

    /// Load and validate a module from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not contain a
    /// valid module.
    pub fn load_file(&self, path: &Path) -> ModuleResult<ValidatedModule> {
        debug!(path = %path.display(), "Loading module from file");
        let bytes = std::fs::read(path)?;
        self.load_bytes(&bytes)
    }

    /// Load and validate a module from WAT text.
    ///
    /// This is primarily useful for testing and development.
    pub fn load_wat(&self, wat: &str) -> ModuleResult<ValidatedModule> {
        self.load_bytes(wat.as_bytes())
    }
}

fn extract_metadata(module: &Module) -> ModuleMetadata {
    let name = module.name().map(String::from);

    let exports = module
        .exports()
        .map(|export| ExportInfo {
            name: export.name().to_string(),
            kind: export_kind(export.ty()),
        })
        .collect();

    let imports = module
        .imports()
        .map(|import| ImportInfo {
            module: import.module().to_string(),
            name: import.name().to_string(),
            kind: import_kind(import.ty()),
        })
        .collect();

    let memories = module
        .exports()
        .filter_map(|export| match export.ty() {
            ExternType::Memory(mem) => Some(MemoryInfo {
                min_pages: mem.minimum(),
                max_pages: mem.maximum(),
            }),
            _ => None,
        })
        .collect();

    ModuleMetadata {
        name,
        exports,
        imports,
        memories,
    }
}

fn export_kind(ty: ExternType) -> ExportKind {
    match ty {
        ExternType::Func(func) => ExportKind::Function {
            params: func.params().len(),
            results: func.results().len(),
        },
        ExternType::Memory(_) => ExportKind::Memory,
        ExternType::Global(_) => ExportKind::Global,
        ExternType::Table(_) => ExportKind::Table,
    }
}

fn import_kind(ty: ExternType) -> ImportKind {
    match ty {
        ExternType::Func(func) => ImportKind::Function {
            params: func.params().len(),
            results: func.results().len(),
        },
        ExternType::Memory(_) => ImportKind::Memory,
        ExternType::Global(_) => ImportKind::Global,
        ExternType::Table(_) => ImportKind::Table,
    }
}
