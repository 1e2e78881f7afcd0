//! Runtime instance driving a guest module.
//!
//! This module provides the `Runtime` type: a Wasmtime store plus linker
//! holding one instantiated guest and its bridge state. The runtime is
//! strictly synchronous — every call runs to completion on the caller's
//! thread, and host functions never suspend. The external driver (a frame
//! loop, a CLI invocation) decides when and how often guest entry points
//! run.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;
use wasmtime::{Instance, Linker, Store, StoreLimits, StoreLimitsBuilder};

use crate::config::{MemoryLimits, RuntimeConfig};
use crate::engine::SharedEngine;
use crate::error::{ExecutionError, ExecutionResult, TrapInfo};
use crate::module::ValidatedModule;

/// Unique identifier for a runtime instance, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Create a new random instance ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Data stored in the Wasmtime store.
///
/// `S` is the user state — for a full bridge this is the surface's state
/// struct (handle tables, media caches, host backends), reached from host
/// functions through `Caller::data_mut`.
pub struct InstanceData<S> {
    /// Unique identifier for this instance.
    pub id: InstanceId,
    /// User-provided state.
    user_state: S,
    /// Store limits enforcing the memory bounds.
    pub(crate) limits: StoreLimits,
    /// Execution metrics for the most recent call.
    pub(crate) metrics: RunMetrics,
}

impl<S> InstanceData<S> {
    /// Access the user state.
    pub fn state(&self) -> &S {
        &self.user_state
    }

    /// Access the user state mutably.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.user_state
    }
}

/// Metrics for the most recent guest call.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    /// When the call started.
    pub start_time: Option<Instant>,
    /// When the call ended.
    pub end_time: Option<Instant>,
}

impl RunMetrics {
    /// Duration of the most recent call.
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }
}

/// A runtime instance for one guest module.
///
/// # Type Parameters
///
/// - `S`: user state reachable from host functions.
///
/// # Example
///
/// ```ignore
/// let engine = BridgeEngine::default_engine()?.into_shared();
/// let mut runtime = Runtime::new(engine, MyState::new(), RuntimeConfig::default())?;
/// // register host functions on runtime.linker_mut(), then:
/// runtime.load_module(&module)?;
/// let result: i32 = runtime.call("frame", (16i32,))?;
/// ```
pub struct Runtime<S> {
    /// Shared engine reference.
    engine: SharedEngine,
    /// Wasmtime store with instance data.
    store: Store<InstanceData<S>>,
    /// Wasmtime linker for host function registration.
    linker: Linker<InstanceData<S>>,
    /// Currently loaded instance.
    instance: Option<Instance>,
    /// Currently loaded module.
    module: Option<ValidatedModule>,
}

impl<S: 'static> Runtime<S> {
    /// Create a new runtime with the given engine and user state.
    pub fn new(engine: SharedEngine, user_state: S, config: RuntimeConfig) -> Self {
        let id = InstanceId::new();
        let limits = build_limits(&config.limits);

        let data = InstanceData {
            id,
            user_state,
            limits,
            metrics: RunMetrics::default(),
        };

        let mut store = Store::new(engine.inner(), data);
        store.limiter(|data| &mut data.limits);

        let linker = Linker::new(engine.inner());

        info!(instance_id = %id, "Created runtime instance");

        Self {
            engine,
            store,
            linker,
            instance: None,
            module: None,
        }
    }

    /// Get the instance ID.
    pub fn id(&self) -> InstanceId {
        self.store.data().id
    }

    /// Get the shared engine.
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Access the user state.
    pub fn state(&self) -> &S {
        self.store.data().state()
    }

    /// Access the user state mutably.
    pub fn state_mut(&mut self) -> &mut S {
        self.store.data_mut().state_mut()
    }

    /// Get the metrics of the most recent call.
    pub fn metrics(&self) -> &RunMetrics {
        &self.store.data().metrics
    }

    /// Get a mutable reference to the linker for registering host functions.
    ///
    /// All registration must happen before [`Runtime::load_module`].
    pub fn linker_mut(&mut self) -> &mut Linker<InstanceData<S>> {
        &mut self.linker
    }

    /// Register a single host function.
    pub fn register_func<Params, Results>(
        &mut self,
        module: &str,
        name: &str,
        func: impl wasmtime::IntoFunc<InstanceData<S>, Params, Results>,
    ) -> ExecutionResult<()> {
        self.linker.func_wrap(module, name, func)?;
        debug!(module, name, "Registered host function");
        Ok(())
    }

    /// Instantiate a validated module, linking registered host functions.
    pub fn load_module(&mut self, module: &ValidatedModule) -> ExecutionResult<()> {
        debug!(
            instance_id = %self.id(),
            module_name = ?module.name(),
            "Instantiating module"
        );

        let instance = self.linker.instantiate(&mut self.store, module.inner())?;

        self.instance = Some(instance);
        self.module = Some(module.clone());

        info!(
            instance_id = %self.id(),
            module_name = ?module.name(),
            "Module instantiated"
        );

        Ok(())
    }

    /// Check if a module is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.instance.is_some()
    }

    /// Get the loaded module, if any.
    pub fn loaded_module(&self) -> Option<&ValidatedModule> {
        self.module.as_ref()
    }

    /// Call an exported function with no arguments and no return value.
    pub fn call_void(&mut self, name: &str) -> ExecutionResult<()> {
        self.call::<(), ()>(name, ())
    }

    /// Call an exported function.
    ///
    /// # Type Parameters
    ///
    /// - `P`: parameter tuple (must implement `WasmParams`)
    /// - `R`: return type (must implement `WasmResults`)
    pub fn call<P, R>(&mut self, name: &str, params: P) -> ExecutionResult<R>
    where
        P: wasmtime::WasmParams,
        R: wasmtime::WasmResults,
    {
        let instance = self
            .instance
            .as_ref()
            .ok_or(ExecutionError::ModuleNotLoaded)?;

        let func = instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| ExecutionError::FunctionNotFound(name.to_string()))?;

        let typed = func
            .typed::<P, R>(&self.store)
            .map_err(|_| ExecutionError::TypeMismatch {
                function: name.to_string(),
                signature: format!("{:?}", func.ty(&self.store)),
            })?;

        self.store.data_mut().metrics = RunMetrics {
            start_time: Some(Instant::now()),
            end_time: None,
        };

        debug!(instance_id = %self.id(), function = name, "Calling guest function");

        let result = typed.call(&mut self.store, params);

        self.store.data_mut().metrics.end_time = Some(Instant::now());

        self.finish_call(name, result)
    }

    /// Call an exported function with dynamic typing.
    ///
    /// Useful for CLI tools where the signature is not known at compile
    /// time. Returns the function's results as a vector of values.
    pub fn call_dynamic(
        &mut self,
        name: &str,
        params: &[wasmtime::Val],
    ) -> ExecutionResult<Vec<wasmtime::Val>> {
        let instance = self
            .instance
            .as_ref()
            .ok_or(ExecutionError::ModuleNotLoaded)?;

        let func = instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| ExecutionError::FunctionNotFound(name.to_string()))?;

        let result_count = func.ty(&self.store).results().len();
        let mut results = vec![wasmtime::Val::I32(0); result_count];

        self.store.data_mut().metrics = RunMetrics {
            start_time: Some(Instant::now()),
            end_time: None,
        };

        debug!(instance_id = %self.id(), function = name, "Calling guest function (dynamic)");

        let result = func.call(&mut self.store, params, &mut results);

        self.store.data_mut().metrics.end_time = Some(Instant::now());

        self.finish_call(name, result.map(|()| results))
    }

    fn finish_call<R>(
        &mut self,
        name: &str,
        result: std::result::Result<R, wasmtime::Error>,
    ) -> ExecutionResult<R> {
        match result {
            Ok(value) => {
                debug!(
                    instance_id = %self.id(),
                    function = name,
                    duration = ?self.store.data().metrics.duration(),
                    "Guest call completed"
                );
                Ok(value)
            }
            Err(err) => {
                if let Some(trap) = err.downcast_ref::<wasmtime::Trap>() {
                    warn!(
                        instance_id = %self.id(),
                        function = name,
                        trap = %trap,
                        "Guest call trapped"
                    );
                    return Err(ExecutionError::Trap(TrapInfo::from(*trap)));
                }

                // Host-function errors (protocol desyncs) arrive as plain
                // errors with the failing entry point's message.
                warn!(
                    instance_id = %self.id(),
                    function = name,
                    error = %err,
                    "Guest call failed"
                );
                Err(ExecutionError::Trap(TrapInfo {
                    code: None,
                    message: err.to_string(),
                }))
            }
        }
    }

    /// Reset the runtime for reuse.
    ///
    /// Clears the current instance and metrics but preserves registered
    /// host functions and user state.
    pub fn reset(&mut self) {
        self.instance = None;
        self.module = None;
        self.store.data_mut().metrics = RunMetrics::default();
        debug!(instance_id = %self.id(), "Runtime reset");
    }
}

impl<S: 'static> std::fmt::Debug for Runtime<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.id())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

fn build_limits(limits: &MemoryLimits) -> StoreLimits {
    StoreLimitsBuilder::new()
        .memory_size(limits.max_memory_bytes)
        .table_elements(limits.max_table_elements as usize)
        .instances(1)
        .tables(limits.max_tables as usize)
        .memories(limits.max_memories as usize)
        .build()
}

/// Builder for creating runtimes with custom configuration.
pub struct RuntimeBuilder<S> {
    engine: SharedEngine,
    user_state: Option<S>,
    config: RuntimeConfig,
}

impl<S: 'static> RuntimeBuilder<S> {
    /// Create a new runtime builder.
    pub fn new(engine: SharedEngine) -> Self {
        Self {
            engine,
            user_state: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the user state.
    pub fn with_state(mut self, state: S) -> Self {
        self.user_state = Some(state);
        self
    }

    /// Set the runtime configuration.
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the memory limit in bytes.
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.config.limits.max_memory_bytes = bytes;
        self
    }

    /// Build the runtime.
    pub fn build(self) -> Runtime<S>
    where
        S: Default,
    {
        let state = self.user_state.unwrap_or_default();
        Runtime::new(self.engine, state, self.config)
    }

    /// Build the runtime with the provided state.
    pub fn build_with_state(self, state: S) -> Runtime<S> {
        Runtime::new(self.engine, state, self.config)
    }
}
