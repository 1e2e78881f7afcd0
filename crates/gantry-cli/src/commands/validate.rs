//! Validate command - check a guest module against the bridge surface.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;

use gantry_core::{BridgeEngine, IntoShared, ModuleLoader};

use crate::OutputFormat;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the guest module (.wasm or .wat)
    #[arg(required = true)]
    pub module: PathBuf,
}

/// Validation result.
#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    path: String,
    module_name: Option<String>,
    exports: usize,
    imports: usize,
    unresolved_imports: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

/// Execute the validate command.
pub fn execute(args: ValidateArgs, format: OutputFormat) -> Result<()> {
    let engine = BridgeEngine::default_engine()
        .context("Failed to create engine")?
        .into_shared();
    let loader = ModuleLoader::new(engine);

    let mut report = ValidationReport {
        valid: true,
        path: args.module.display().to_string(),
        module_name: None,
        exports: 0,
        imports: 0,
        unresolved_imports: Vec::new(),
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    match loader.load_file(&args.module) {
        Ok(module) => {
            report.module_name = module.name().map(String::from);
            report.exports = module.exports().len();
            report.imports = module.imports().len();

            for import in gantry::unresolved_imports(&module) {
                report
                    .unresolved_imports
                    .push(format!("{}::{}", import.module, import.name));
            }
            if !report.unresolved_imports.is_empty() {
                report.valid = false;
                report.errors.push(format!(
                    "{} import(s) are not provided by the bridge",
                    report.unresolved_imports.len()
                ));
            }

            if !module.exports_memory(gantry::mem::MEMORY_EXPORT) {
                report.valid = false;
                report
                    .errors
                    .push("Module does not export a 'memory'".to_string());
            }

            if module.exports().is_empty() {
                report.warnings.push("Module has no exports".to_string());
            }
        }
        Err(err) => {
            report.valid = false;
            report.errors.push(err.to_string());
        }
    }

    match format {
        OutputFormat::Human => {
            if report.valid {
                println!("{}: OK", report.path);
                if report.imports > 0 {
                    println!("  {} import(s), all resolved", report.imports);
                }
            } else {
                println!("{}: INVALID", report.path);
                for error in &report.errors {
                    println!("  error: {error}");
                }
                for name in &report.unresolved_imports {
                    println!("  unresolved: {name}");
                }
            }
            for warning in &report.warnings {
                println!("  warning: {warning}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&report)?),
    }

    if !report.valid {
        bail!("Validation failed");
    }
    Ok(())
}
