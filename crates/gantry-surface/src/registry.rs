//! The enumerated call surface and its registration machinery.
//!
//! The surface is a fixed set: every entry point the guest may import is
//! listed in [`MANIFEST`], and [`register_all`] registers exactly that set
//! on a linker. The manifest doubles as the validation source for loaders
//! (is this import one of ours?) and the inspect tooling (which subsystem
//! does it belong to?).

use thiserror::Error;
use tracing::debug;
use wasmtime::Linker;

use crate::api::HostBackend;
use crate::state::BridgeData;
use crate::{audio, canvas, gl, input, io, sys};

/// The subsystem an entry point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// 2D drawing primitives.
    Canvas,
    /// Named sound resources.
    Audio,
    /// GPU pipeline calls.
    Gl,
    /// Blocking file and storage transfers.
    Io,
    /// Diagnostics and time.
    Sys,
    /// Input mapping.
    Input,
}

impl Subsystem {
    /// Subsystem name, matching its wasm import module.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subsystem::Canvas => "canvas",
            Subsystem::Audio => "audio",
            Subsystem::Gl => "gl",
            Subsystem::Io => "io",
            Subsystem::Sys => "sys",
            Subsystem::Input => "input",
        }
    }
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry point of the call surface.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoint {
    /// Wasm import module.
    pub module: &'static str,
    /// Wasm import name.
    pub name: &'static str,
    /// Owning subsystem.
    pub subsystem: Subsystem,
}

macro_rules! entries {
    ($module:literal, $subsystem:expr, [$($name:literal),* $(,)?]) => {
        &[$(EntryPoint { module: $module, name: $name, subsystem: $subsystem }),*]
    };
}

const CANVAS_ENTRIES: &[EntryPoint] = entries!("canvas", Subsystem::Canvas, [
    "clear", "fillRect", "roundRect", "setFillStyle", "setStrokeStyle",
    "setLineWidth", "beginPath", "closePath", "moveTo", "lineTo", "fill",
    "stroke", "ellipse", "setFont", "setTextAlign", "fillText", "setCursor",
    "drawImage",
]);

const AUDIO_ENTRIES: &[EntryPoint] = entries!("audio", Subsystem::Audio, [
    "loadSound", "playSound", "pauseSound", "setSoundVolume",
]);

const GL_ENTRIES: &[EntryPoint] = entries!("gl", Subsystem::Gl, [
    "createShader", "shaderSource", "compileShader", "deleteShader",
    "createProgram", "attachShader", "linkProgram", "useProgram",
    "createBuffer", "genBuffers", "bindBuffer", "bufferData",
    "createVertexArray", "genVertexArrays", "bindVertexArray",
    "vertexAttribPointer", "enableVertexAttribArray",
    "createTexture", "genTextures", "bindTexture", "texImage2D",
    "texParameteri", "getUniformLocation", "uniform1i", "drawElements",
    "clearColor", "clear", "viewport", "enable", "disable", "blendFunc",
    "depthFunc", "colorMask", "activeTexture", "bindFramebuffer",
]);

const IO_ENTRIES: &[EntryPoint] = entries!("io", Subsystem::Io, [
    "getRemoteFileSize", "readRemoteFile", "getStorageFileSize",
    "readStorageFile", "writeStorageFile",
]);

const SYS_ENTRIES: &[EntryPoint] = entries!("sys", Subsystem::Sys, [
    "debugPrint", "timestampMillis",
]);

const INPUT_ENTRIES: &[EntryPoint] = entries!("input", Subsystem::Input, [
    "keycodeOf",
]);

/// Every entry point of the call surface, grouped by subsystem.
pub const MANIFEST: &[&[EntryPoint]] = &[
    CANVAS_ENTRIES,
    AUDIO_ENTRIES,
    GL_ENTRIES,
    IO_ENTRIES,
    SYS_ENTRIES,
    INPUT_ENTRIES,
];

/// Iterate over every entry point.
pub fn manifest() -> impl Iterator<Item = &'static EntryPoint> {
    MANIFEST.iter().flat_map(|group| group.iter())
}

/// Look up an entry point by import module and name.
pub fn find(module: &str, name: &str) -> Option<&'static EntryPoint> {
    manifest().find(|e| e.module == module && e.name == name)
}

/// Errors during surface registration.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// Function registration on the linker failed.
    #[error("Failed to register '{module}::{name}': {reason}")]
    Registration {
        /// The import module name.
        module: &'static str,
        /// The function name.
        name: &'static str,
        /// The reason for failure.
        reason: String,
    },

    /// The same entry point was registered twice.
    #[error("Entry point already registered: {module}::{name}")]
    AlreadyRegistered {
        /// The import module name.
        module: &'static str,
        /// The function name.
        name: &'static str,
    },
}

/// Result type for surface operations.
pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// Registration helper that tracks what has been registered.
pub struct Registrar<'l, T> {
    linker: &'l mut Linker<T>,
    registered: Vec<(&'static str, &'static str)>,
}

impl<'l, T> Registrar<'l, T> {
    /// Wrap a linker for surface registration.
    pub fn new(linker: &'l mut Linker<T>) -> Self {
        Self {
            linker,
            registered: Vec::new(),
        }
    }

    /// Register one entry point, rejecting duplicates.
    pub fn func_wrap<Params, Results>(
        &mut self,
        module: &'static str,
        name: &'static str,
        func: impl wasmtime::IntoFunc<T, Params, Results>,
    ) -> SurfaceResult<&mut Self> {
        if self.registered.contains(&(module, name)) {
            return Err(SurfaceError::AlreadyRegistered { module, name });
        }

        self.linker
            .func_wrap(module, name, func)
            .map_err(|e| SurfaceError::Registration {
                module,
                name,
                reason: e.to_string(),
            })?;

        self.registered.push((module, name));
        Ok(self)
    }

    /// The `(module, name)` pairs registered so far.
    pub fn registered(&self) -> &[(&'static str, &'static str)] {
        &self.registered
    }
}

/// Register the complete call surface on a linker.
///
/// Returns the number of entry points registered, which always equals the
/// manifest length.
pub fn register_all<H: HostBackend>(
    linker: &mut Linker<BridgeData<H>>,
) -> SurfaceResult<usize> {
    let mut reg = Registrar::new(linker);

    canvas::register::<H>(&mut reg)?;
    audio::register::<H>(&mut reg)?;
    gl::register::<H>(&mut reg)?;
    io::register::<H>(&mut reg)?;
    sys::register::<H>(&mut reg)?;
    input::register::<H>(&mut reg)?;

    let count = reg.registered().len();
    debug!(functions = count, "Registered call surface");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_has_no_duplicates() {
        let all: Vec<_> = manifest().map(|e| (e.module, e.name)).collect();
        let mut deduped = all.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(all.len(), deduped.len());
    }

    #[test]
    fn test_module_matches_subsystem() {
        for entry in manifest() {
            assert_eq!(entry.module, entry.subsystem.as_str());
        }
    }

    #[test]
    fn test_find() {
        let entry = find("gl", "bindFramebuffer").unwrap();
        assert_eq!(entry.subsystem, Subsystem::Gl);
        assert!(find("gl", "nosuch").is_none());
        assert!(find("canvas", "bindFramebuffer").is_none());
    }
}
