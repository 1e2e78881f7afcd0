//! Run command - execute a guest module headlessly.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::{Deserialize, Serialize};

use gantry::prelude::*;
use gantry::surface::Headless;
use gantry_core::ExportKind;

use crate::OutputFormat;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Path to the guest module (.wasm or .wat)
    #[arg(required = true)]
    pub module: PathBuf,

    /// Function to execute (default: main, _start, or the first export)
    #[arg(short = 'e', long)]
    pub invoke: Option<String>,

    /// Arguments to pass to the function (integers, or floats with a '.')
    #[arg(last = true)]
    pub args: Vec<String>,

    /// Directory served to the guest as remote files
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Directory backing the guest's persistent storage
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Guest memory limit in bytes (default: 64MB)
    #[arg(long)]
    pub memory_limit: Option<usize>,

    /// Show execution metrics
    #[arg(long)]
    pub metrics: bool,
}

/// Optional TOML configuration, overridden by explicit flags.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Directory served to the guest as remote files.
    pub assets: Option<PathBuf>,
    /// Directory backing the guest's persistent storage.
    pub storage: Option<PathBuf>,
    /// Guest memory limit in bytes.
    pub memory_limit: Option<usize>,
    /// Maximum WASM stack size in bytes.
    pub max_wasm_stack: Option<usize>,
}

impl ConfigFile {
    fn load(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

/// Execution report for JSON output.
#[derive(Debug, Serialize)]
struct RunReport {
    module: String,
    function: String,
    results: Vec<String>,
    duration_ms: f64,
    ok: bool,
    error: Option<String>,
}

/// Execute the run command.
pub fn execute(
    args: RunArgs,
    config: Option<PathBuf>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let config = ConfigFile::load(config.as_ref())?;

    let assets = args
        .assets
        .or(config.assets)
        .unwrap_or_else(|| PathBuf::from("."));
    let storage = args
        .storage
        .or(config.storage)
        .unwrap_or_else(|| PathBuf::from(".gantry-storage"));

    let mut builder = Gantry::builder();
    if let Some(limit) = args.memory_limit.or(config.memory_limit) {
        builder = builder.with_max_memory(limit);
    }
    if let Some(stack) = config.max_wasm_stack {
        builder = builder.with_max_wasm_stack(stack);
    }

    let mut runtime = builder
        .build(Headless::state(assets, storage))
        .context("Failed to create runtime")?;

    let module = runtime
        .load_file(&args.module)
        .context("Failed to load module")?;

    let function = match args.invoke.as_deref() {
        Some(name) => name.to_string(),
        None => default_function(&module)?,
    };

    let params = parse_args(&args.args)?;

    if !quiet {
        tracing::info!(
            module = %args.module.display(),
            function,
            "Executing module"
        );
    }

    runtime.attach(&module).context("Failed to attach module")?;

    let result = runtime.call_dynamic(&function, &params);
    let duration = runtime.metrics().duration().unwrap_or_default();

    let report = RunReport {
        module: args.module.display().to_string(),
        function: function.clone(),
        results: match &result {
            Ok(values) => values.iter().map(format_val).collect(),
            Err(_) => Vec::new(),
        },
        duration_ms: duration.as_secs_f64() * 1000.0,
        ok: result.is_ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
    };

    match format {
        OutputFormat::Human => {
            match &result {
                Ok(values) => {
                    if !quiet {
                        println!("Execution completed in {duration:?}");
                    }
                    if !values.is_empty() {
                        println!("Results: {}", report.results.join(", "));
                    }
                }
                Err(err) => println!("Execution failed: {err}"),
            }
            if args.metrics {
                println!("\nMetrics:");
                println!("  Duration: {duration:?}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&report)?),
    }

    result
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("Execution failed: {e}"))
}

fn default_function(module: &gantry_core::ValidatedModule) -> Result<String> {
    for candidate in ["main", "_start"] {
        if module.has_export(candidate) {
            return Ok(candidate.to_string());
        }
    }

    module
        .exports()
        .iter()
        .find(|e| matches!(e.kind, ExportKind::Function { .. }))
        .map(|e| e.name.clone())
        .context("Module exports no functions")
}

fn parse_args(args: &[String]) -> Result<Vec<wasmtime::Val>> {
    args.iter()
        .map(|arg| {
            if arg.contains('.') {
                let value: f32 = arg
                    .parse()
                    .with_context(|| format!("Invalid float argument '{arg}'"))?;
                Ok(wasmtime::Val::F32(value.to_bits()))
            } else if let Ok(value) = arg.parse::<i32>() {
                Ok(wasmtime::Val::I32(value))
            } else if let Ok(value) = arg.parse::<i64>() {
                Ok(wasmtime::Val::I64(value))
            } else {
                bail!("Invalid argument '{arg}' (expected an integer or float)")
            }
        })
        .collect()
}

fn format_val(val: &wasmtime::Val) -> String {
    match val {
        wasmtime::Val::I32(v) => v.to_string(),
        wasmtime::Val::I64(v) => v.to_string(),
        wasmtime::Val::F32(bits) => f32::from_bits(*bits).to_string(),
        wasmtime::Val::F64(bits) => f64::from_bits(*bits).to_string(),
        other => format!("{other:?}"),
    }
}
