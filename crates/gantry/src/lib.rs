//! # Gantry - host bridge for sandboxed guest modules
//!
//! Gantry lets a compiled module running in a linear-memory sandbox
//! (WebAssembly under wasmtime) drive a stateful, handle-based
//! canvas/GL/audio/storage API belonging to its host. The guest can only
//! pass integers, pointers, and lengths; the bridge turns those into host
//! objects and back.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gantry::prelude::*;
//! use gantry::surface::Headless;
//!
//! // Assemble a runtime around headless host backends.
//! let state = Headless::state("assets", ".gantry-storage");
//! let mut runtime = Gantry::builder()
//!     .with_max_memory(64 * 1024 * 1024)
//!     .build(state)?;
//!
//! // Load a guest and drive it.
//! let module = runtime.load_file(Path::new("game.wasm"))?;
//! runtime.attach(&module)?;
//! runtime.call_void("init")?;
//! loop {
//!     runtime.call_void("frame")?;
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   guest module                       │
//! ├──────────────────────────────────────────────────────┤
//! │             gantry (facade, this crate)              │
//! ├──────────────┬──────────────┬────────────────────────┤
//! │ gantry-mem   │ gantry-table │ gantry-surface         │
//! │ (marshalling)│ (handles,    │ (entry points,         │
//! │              │  media cache)│  host-API seams)       │
//! ├──────────────┴──────────────┴────────────────────────┤
//! │              gantry-core (engine, runtime)           │
//! ├──────────────────────────────────────────────────────┤
//! │                      wasmtime                        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The facade assembles the pieces: it builds the engine, registers the
//! full call surface on the runtime's linker, and validates a module's
//! imports against the surface manifest before instantiating it.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use gantry_core::{
    BridgeEngine, EngineConfig, EngineError, ExecutionError, InstanceId, IntoShared, ModuleError,
    ModuleLoader, RunMetrics, Runtime, RuntimeConfig, SharedEngine, ValidatedModule,
};
use gantry_mem::MEMORY_EXPORT;
use gantry_surface::{BridgeState, HostBackend, SurfaceError, register_all};

// Re-export sub-crates. `gantry_core` keeps its full name to stay clear of
// the built-in `core` crate.
pub use gantry_core;
pub use gantry_mem as mem;
pub use gantry_surface as surface;
pub use gantry_table as table;

/// Top-level error type for the facade.
#[derive(Debug, Error)]
pub enum GantryError {
    /// Engine construction failed.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Module loading or validation failed.
    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    /// Guest execution failed.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Call-surface registration failed.
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Result type for facade operations.
pub type GantryResult<T> = std::result::Result<T, GantryError>;

/// Main entry point.
pub struct Gantry;

impl Gantry {
    /// Create a new runtime builder.
    pub fn builder() -> GantryBuilder {
        GantryBuilder::new()
    }
}

/// Builder for configuring a bridge runtime.
pub struct GantryBuilder {
    engine_config: EngineConfig,
    runtime_config: RuntimeConfig,
}

impl GantryBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            engine_config: EngineConfig::default(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Replace the engine configuration.
    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    /// Replace the runtime configuration.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Set the guest memory limit in bytes.
    pub fn with_max_memory(mut self, bytes: usize) -> Self {
        self.runtime_config.limits.max_memory_bytes = bytes;
        self
    }

    /// Set the maximum WASM stack size in bytes.
    pub fn with_max_wasm_stack(mut self, bytes: usize) -> Self {
        self.engine_config.max_wasm_stack = bytes;
        self
    }

    /// Enable debug info in compiled guest code.
    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.engine_config.debug_info = enabled;
        self
    }

    /// Build a runtime around the given bridge state.
    ///
    /// Creates the engine, wires the state into a store, and registers the
    /// complete call surface on the linker.
    pub fn build<H: HostBackend>(self, state: BridgeState<H>) -> GantryResult<GantryRuntime<H>> {
        let engine = BridgeEngine::new(self.engine_config)?.into_shared();
        let loader = ModuleLoader::new(Arc::clone(&engine));

        let mut runtime = Runtime::new(Arc::clone(&engine), state, self.runtime_config);
        let registered = register_all::<H>(runtime.linker_mut())?;
        debug!(functions = registered, "Bridge surface ready");

        Ok(GantryRuntime { loader, runtime })
    }
}

impl Default for GantryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully wired bridge runtime: engine, registered surface, and one guest.
pub struct GantryRuntime<H: HostBackend> {
    loader: ModuleLoader,
    runtime: Runtime<BridgeState<H>>,
}

impl<H: HostBackend> GantryRuntime<H> {
    /// Get the instance ID.
    pub fn id(&self) -> InstanceId {
        self.runtime.id()
    }

    /// Get the shared engine.
    pub fn engine(&self) -> &SharedEngine {
        self.runtime.engine()
    }

    /// Load a module from a file (binary or WAT).
    pub fn load_file(&self, path: &Path) -> GantryResult<ValidatedModule> {
        Ok(self.loader.load_file(path)?)
    }

    /// Load a module from raw bytes (binary or WAT).
    pub fn load_bytes(&self, bytes: &[u8]) -> GantryResult<ValidatedModule> {
        Ok(self.loader.load_bytes(bytes)?)
    }

    /// Load a module from WAT text.
    pub fn load_wat(&self, wat: &str) -> GantryResult<ValidatedModule> {
        Ok(self.loader.load_wat(wat)?)
    }

    /// Validate a module against the bridge and instantiate it.
    ///
    /// Every function import must be an entry point of the call surface,
    /// non-function imports are rejected, and the module must export its
    /// linear memory under the expected name.
    pub fn attach(&mut self, module: &ValidatedModule) -> GantryResult<()> {
        validate_module(module)?;
        self.runtime.load_module(module)?;
        Ok(())
    }

    /// Whether a module is attached.
    pub fn is_attached(&self) -> bool {
        self.runtime.is_loaded()
    }

    /// Call an exported guest function.
    pub fn call<P, R>(&mut self, name: &str, params: P) -> GantryResult<R>
    where
        P: wasmtime::WasmParams,
        R: wasmtime::WasmResults,
    {
        Ok(self.runtime.call(name, params)?)
    }

    /// Call an exported guest function with no arguments or results.
    pub fn call_void(&mut self, name: &str) -> GantryResult<()> {
        Ok(self.runtime.call_void(name)?)
    }

    /// Call an exported guest function with dynamic typing.
    pub fn call_dynamic(
        &mut self,
        name: &str,
        params: &[wasmtime::Val],
    ) -> GantryResult<Vec<wasmtime::Val>> {
        Ok(self.runtime.call_dynamic(name, params)?)
    }

    /// Access the bridge state.
    pub fn state(&self) -> &BridgeState<H> {
        self.runtime.state()
    }

    /// Access the bridge state mutably.
    pub fn state_mut(&mut self) -> &mut BridgeState<H> {
        self.runtime.state_mut()
    }

    /// Metrics of the most recent call.
    pub fn metrics(&self) -> &RunMetrics {
        self.runtime.metrics()
    }
}

impl<H: HostBackend> std::fmt::Debug for GantryRuntime<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GantryRuntime")
            .field("id", &self.id())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Imports a module requires that the call surface does not provide.
pub fn unresolved_imports(module: &ValidatedModule) -> Vec<&gantry_core::ImportInfo> {
    module
        .imports()
        .iter()
        .filter(|import| {
            !matches!(import.kind, gantry_core::ImportKind::Function { .. })
                || gantry_surface::find(&import.module, &import.name).is_none()
        })
        .collect()
}

fn validate_module(module: &ValidatedModule) -> GantryResult<()> {
    if let Some(import) = unresolved_imports(module).first() {
        return Err(GantryError::Module(ModuleError::MissingImport {
            module: import.module.clone(),
            name: import.name.clone(),
        }));
    }

    if !module.exports_memory(MEMORY_EXPORT) {
        return Err(GantryError::Module(ModuleError::MissingMemoryExport(
            MEMORY_EXPORT,
        )));
    }

    Ok(())
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{Gantry, GantryBuilder, GantryError, GantryResult, GantryRuntime};
    pub use gantry_core::prelude::*;
    pub use gantry_surface::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_surface::{MemFiles, Offline};

    fn offline_runtime() -> GantryRuntime<Offline> {
        let files = MemFiles::new().with_file("config.txt", "w=320");
        Gantry::builder()
            .build(Offline::state(files, 1_000))
            .unwrap()
    }

    #[test]
    fn test_end_to_end_storage_and_clock() {
        let mut runtime = offline_runtime();
        let module = runtime
            .load_wat(
                r#"
            (module
                (import "io" "writeStorageFile" (func $write (param i32 i32) (result i32)))
                (import "io" "getStorageFileSize" (func $size (param i32) (result i32)))
                (import "sys" "timestampMillis" (func $now (result i64)))
                (memory (export "memory") 1)
                (data (i32.const 0) "save1\00")
                (data (i32.const 8) "abc\00")
                (func (export "save") (result i32)
                    (drop (call $write (i32.const 0) (i32.const 8)))
                    (call $size (i32.const 0))
                )
                (func (export "now") (result i64) (call $now))
            )
        "#,
            )
            .unwrap();

        runtime.attach(&module).unwrap();

        let size: i32 = runtime.call("save", ()).unwrap();
        assert_eq!(size, 3);
        assert_eq!(runtime.state().storage.get("save1"), Some("abc"));

        let now: i64 = runtime.call("now", ()).unwrap();
        assert_eq!(now, 1_000);
    }

    #[test]
    fn test_unknown_import_is_rejected_before_instantiation() {
        let mut runtime = offline_runtime();
        let module = runtime
            .load_wat(
                r#"
            (module
                (import "gl" "nosuchCall" (func))
                (memory (export "memory") 1)
            )
        "#,
            )
            .unwrap();

        let err = runtime.attach(&module).unwrap_err();
        assert!(matches!(
            err,
            GantryError::Module(ModuleError::MissingImport { .. })
        ));
    }

    #[test]
    fn test_missing_memory_export_is_rejected() {
        let mut runtime = offline_runtime();
        let module = runtime
            .load_wat(r#"(module (import "sys" "timestampMillis" (func (result i64))))"#)
            .unwrap();

        let err = runtime.attach(&module).unwrap_err();
        assert!(matches!(
            err,
            GantryError::Module(ModuleError::MissingMemoryExport(_))
        ));
    }

    #[test]
    fn test_unresolved_imports_listing() {
        let runtime = offline_runtime();
        let module = runtime
            .load_wat(
                r#"
            (module
                (import "gl" "createBuffer" (func (result i32)))
                (import "env" "mystery" (func))
                (memory (export "memory") 1)
            )
        "#,
            )
            .unwrap();

        let unresolved = unresolved_imports(&module);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].module, "env");
        assert_eq!(unresolved[0].name, "mystery");
    }

    #[test]
    fn test_remote_file_protocol_through_facade() {
        let mut runtime = offline_runtime();
        let module = runtime
            .load_wat(
                r#"
            (module
                (import "io" "getRemoteFileSize" (func $size (param i32) (result i32)))
                (import "io" "readRemoteFile" (func $read (param i32 i32 i32) (result i32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "config.txt\00")
                (func (export "fetch") (result i32)
                    (local $n i32)
                    (local.set $n (call $size (i32.const 0)))
                    (if (i32.lt_s (local.get $n) (i32.const 0))
                        (then (return (i32.const -1))))
                    (if (i32.eqz (call $read (i32.const 0) (i32.const 64) (local.get $n)))
                        (then (return (i32.const -2))))
                    (local.get $n)
                )
            )
        "#,
            )
            .unwrap();

        runtime.attach(&module).unwrap();

        // Two-call protocol: size first, then an exact-length read.
        let size: i32 = runtime.call("fetch", ()).unwrap();
        assert_eq!(size, 5);
    }
}
