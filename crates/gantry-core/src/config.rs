//! Configuration types for the Gantry runtime.

/// Configuration for the engine.
///
/// This controls how the underlying Wasmtime engine is configured. Gantry
/// runs guests synchronously to completion on the calling thread, so there
/// is deliberately no interruption or metering knob here.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum WASM stack size in bytes.
    ///
    /// Defaults to 1MB.
    pub max_wasm_stack: usize,

    /// Enable debug information in compiled code.
    ///
    /// This increases compilation time and memory usage but provides
    /// better trap messages and backtraces.
    pub debug_info: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_wasm_stack: 1024 * 1024, // 1MB
            debug_info: false,
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum WASM stack size.
    pub fn with_max_wasm_stack(mut self, bytes: usize) -> Self {
        self.max_wasm_stack = bytes;
        self
    }

    /// Enable debug information.
    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.debug_info = enabled;
        self
    }
}

/// Configuration for a runtime instance.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Memory and table limits for the guest.
    pub limits: MemoryLimits,
}

impl RuntimeConfig {
    /// Create a new runtime configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the memory limits.
    pub fn with_limits(mut self, limits: MemoryLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Limits on guest memory growth.
///
/// The guest's linear memory can grow at runtime; these bounds keep that
/// growth finite. They are enforced through Wasmtime's store limiter.
#[derive(Debug, Clone)]
pub struct MemoryLimits {
    /// Maximum linear memory in bytes.
    ///
    /// Defaults to 64MB.
    pub max_memory_bytes: usize,

    /// Maximum number of memory instances.
    ///
    /// Defaults to 1: bridge guests export exactly one memory.
    pub max_memories: u32,

    /// Maximum table elements.
    ///
    /// Defaults to 10,000.
    pub max_table_elements: u32,

    /// Maximum number of tables.
    ///
    /// Defaults to 10.
    pub max_tables: u32,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            max_memory_bytes: 64 * 1024 * 1024, // 64MB
            max_memories: 1,
            max_table_elements: 10_000,
            max_tables: 10,
        }
    }
}

impl MemoryLimits {
    /// Create memory limits with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum memory limit.
    pub fn with_max_memory(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Create minimal limits for testing.
    pub fn minimal() -> Self {
        Self {
            max_memory_bytes: 1024 * 1024, // 1MB
            max_memories: 1,
            max_table_elements: 1_000,
            max_tables: 2,
        }
    }
}
