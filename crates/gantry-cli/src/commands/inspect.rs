//! Inspect command - show a guest module's interface to the bridge.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use gantry_core::{BridgeEngine, ExportKind, ImportKind, IntoShared, ModuleLoader};
use gantry_surface::find;

use crate::OutputFormat;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Path to the guest module (.wasm or .wat)
    #[arg(required = true)]
    pub module: PathBuf,
}

#[derive(Debug, Serialize)]
struct ImportRow {
    module: String,
    name: String,
    kind: String,
    subsystem: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ExportRow {
    name: String,
    kind: String,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    path: String,
    module_name: Option<String>,
    memories: Vec<MemoryRow>,
    imports: Vec<ImportRow>,
    exports: Vec<ExportRow>,
}

#[derive(Debug, Serialize)]
struct MemoryRow {
    min_pages: u64,
    max_pages: Option<u64>,
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let engine = BridgeEngine::default_engine()
        .context("Failed to create engine")?
        .into_shared();
    let loader = ModuleLoader::new(engine);

    let module = loader
        .load_file(&args.module)
        .context("Failed to load module")?;

    let report = InspectReport {
        path: args.module.display().to_string(),
        module_name: module.name().map(String::from),
        memories: module
            .metadata()
            .memories
            .iter()
            .map(|m| MemoryRow {
                min_pages: m.min_pages,
                max_pages: m.max_pages,
            })
            .collect(),
        imports: module
            .imports()
            .iter()
            .map(|import| ImportRow {
                module: import.module.clone(),
                name: import.name.clone(),
                kind: import_kind(&import.kind),
                subsystem: find(&import.module, &import.name).map(|e| e.subsystem.as_str()),
            })
            .collect(),
        exports: module
            .exports()
            .iter()
            .map(|export| ExportRow {
                name: export.name.clone(),
                kind: export_kind(&export.kind),
            })
            .collect(),
    };

    match format {
        OutputFormat::Human => print_human(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&report)?),
    }

    Ok(())
}

fn print_human(report: &InspectReport) {
    println!("Module: {}", report.path);
    if let Some(name) = &report.module_name {
        println!("Name: {name}");
    }

    for memory in &report.memories {
        match memory.max_pages {
            Some(max) => println!("Memory: {} pages (max {max})", memory.min_pages),
            None => println!("Memory: {} pages", memory.min_pages),
        }
    }

    println!("\nImports ({}):", report.imports.len());
    for import in &report.imports {
        let label = import.subsystem.unwrap_or("unresolved");
        println!(
            "  [{label}] {}::{} ({})",
            import.module, import.name, import.kind
        );
    }

    println!("\nExports ({}):", report.exports.len());
    for export in &report.exports {
        println!("  {} ({})", export.name, export.kind);
    }
}

fn import_kind(kind: &ImportKind) -> String {
    match kind {
        ImportKind::Function { params, results } => {
            format!("func: {params} param(s), {results} result(s)")
        }
        ImportKind::Memory => "memory".to_string(),
        ImportKind::Global => "global".to_string(),
        ImportKind::Table => "table".to_string(),
    }
}

fn export_kind(kind: &ExportKind) -> String {
    match kind {
        ExportKind::Function { params, results } => {
            format!("func: {params} param(s), {results} result(s)")
        }
        ExportKind::Memory => "memory".to_string(),
        ExportKind::Global => "global".to_string(),
        ExportKind::Table => "table".to_string(),
    }
}
