//! Core error types for Gantry.
//!
//! Errors are grouped by origin: engine construction, module loading, and
//! execution. Host-function failures (bad pointers, unknown handles) are
//! raised by the surface crates and arrive here as traps inside
//! [`ExecutionError::Trap`].

use thiserror::Error;

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Error during engine creation or configuration.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error during module loading or validation.
    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    /// Error during guest execution.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Errors during engine creation and configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid engine configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying Wasmtime error.
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),
}

/// Errors during module loading and validation.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The WASM module is invalid or malformed.
    #[error("Invalid WASM module: {0}")]
    Invalid(String),

    /// IO error reading the module.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The module requires an import the bridge does not provide.
    #[error("Unresolved import: module='{module}', name='{name}'")]
    MissingImport {
        /// The import module name.
        module: String,
        /// The import name.
        name: String,
    },

    /// The module does not export a linear memory under the expected name.
    #[error("Module does not export a '{0}' memory")]
    MissingMemoryExport(&'static str),

    /// Underlying Wasmtime error.
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),
}

/// Errors during guest execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A WASM trap occurred during execution.
    ///
    /// Host-function protocol desyncs (out-of-bounds pointers, unknown
    /// handles) surface here: the failing entry point's error becomes the
    /// trap message.
    #[error("WASM trap: {0}")]
    Trap(#[from] TrapInfo),

    /// Memory limit was exceeded.
    #[error("Memory limit exceeded: used {used} bytes, limit {limit} bytes")]
    MemoryExceeded {
        /// Memory used in bytes.
        used: usize,
        /// Memory limit in bytes.
        limit: usize,
    },

    /// The requested function was not found in the module.
    #[error("Function not found: '{0}'")]
    FunctionNotFound(String),

    /// Type mismatch when calling a function.
    #[error("Type mismatch for '{function}': guest signature is {signature}")]
    TypeMismatch {
        /// The function name.
        function: String,
        /// The guest's actual signature.
        signature: String,
    },

    /// The module has not been loaded yet.
    #[error("Module not loaded")]
    ModuleNotLoaded,

    /// Underlying Wasmtime error.
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),
}

/// Information about a WASM trap.
#[derive(Debug, Clone)]
pub struct TrapInfo {
    /// The trap code name, if available.
    pub code: Option<String>,
    /// Human-readable trap message.
    pub message: String,
}

impl std::fmt::Display for TrapInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "[{}] {}", code, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for TrapInfo {}

impl From<wasmtime::Trap> for TrapInfo {
    fn from(trap: wasmtime::Trap) -> Self {
        Self {
            code: None,
            message: trap.to_string(),
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Result type alias for module operations.
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;

/// Result type alias for execution operations.
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
