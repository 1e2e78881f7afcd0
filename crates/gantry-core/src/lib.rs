//! Gantry Core - runtime driver for the host bridge
//!
//! This crate provides the execution side of the Gantry bridge:
//!
//! - [`BridgeEngine`]: configured Wasmtime engine shared across instances
//! - [`ModuleLoader`]: loading and validating guest modules
//! - [`Runtime`]: a store + linker pair driving one instantiated guest
//!
//! The crate is generic over the user state `S` carried in the store; it
//! knows nothing about the call surface. The surface crate registers the
//! bridge's host functions on [`Runtime::linker_mut`], and the facade crate
//! wires the two together.
//!
//! # Quick Start
//!
//! ```ignore
//! use gantry_core::prelude::*;
//!
//! let engine = BridgeEngine::default_engine()?.into_shared();
//! let loader = ModuleLoader::new(engine.clone());
//! let module = loader.load_file(Path::new("game.wasm"))?;
//!
//! let mut runtime = Runtime::new(engine, MyState::default(), RuntimeConfig::default());
//! // register host functions ...
//! runtime.load_module(&module)?;
//! runtime.call_void("init")?;
//! ```
//!
//! # Execution model
//!
//! Strictly synchronous: guest calls run to completion on the calling
//! thread, host functions never suspend, and there is no interruption or
//! cancellation mechanism. Guest memory growth is bounded via store limits.

pub mod config;
pub mod engine;
pub mod error;
pub mod module;
pub mod runtime;

// Re-export main types at crate root
pub use config::{EngineConfig, MemoryLimits, RuntimeConfig};
pub use engine::{BridgeEngine, IntoShared, SharedEngine};
pub use error::{
    BridgeError, EngineError, ExecutionError, ModuleError, Result, TrapInfo,
};
pub use module::{
    ExportInfo, ExportKind, ImportInfo, ImportKind, MemoryInfo, ModuleLoader, ModuleMetadata,
    ValidatedModule,
};
pub use runtime::{InstanceData, InstanceId, RunMetrics, Runtime, RuntimeBuilder};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```ignore
/// use gantry_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{EngineConfig, MemoryLimits, RuntimeConfig};
    pub use crate::engine::{BridgeEngine, IntoShared, SharedEngine};
    pub use crate::error::{BridgeError, ExecutionError, ModuleError, Result};
    pub use crate::module::{ModuleLoader, ValidatedModule};
    pub use crate::runtime::{InstanceData, Runtime, RuntimeBuilder};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_end_to_end() {
        let engine = BridgeEngine::default_engine().unwrap().into_shared();

        let loader = ModuleLoader::new(Arc::clone(&engine));
        let module = loader
            .load_wat(
                r#"
            (module
                (func (export "double") (param i32) (result i32)
                    local.get 0
                    i32.const 2
                    i32.mul
                )
            )
        "#,
            )
            .unwrap();

        let mut runtime = RuntimeBuilder::<()>::new(engine).build();
        runtime.load_module(&module).unwrap();

        let result: i32 = runtime.call("double", (21i32,)).unwrap();
        assert_eq!(result, 42);
    }
}
