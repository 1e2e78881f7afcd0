//! Bridge state owned by the store.

use gantry_core::InstanceData;
use gantry_table::{HandleTable, MediaCache};

use crate::api::{AudioApi, CanvasApi, GlApi, HostBackend};

/// The six GPU resource categories, each with its own numbering space.
pub struct GlTables<G: GlApi> {
    /// Shader objects.
    pub shaders: HandleTable<G::Shader>,
    /// Program objects.
    pub programs: HandleTable<G::Program>,
    /// Buffer objects.
    pub buffers: HandleTable<G::Buffer>,
    /// Texture objects.
    pub textures: HandleTable<G::Texture>,
    /// Vertex array objects.
    pub vertex_arrays: HandleTable<G::VertexArray>,
    /// Uniform locations.
    pub uniform_locations: HandleTable<G::UniformLocation>,
}

impl<G: GlApi> GlTables<G> {
    /// Create six empty tables.
    pub fn new() -> Self {
        Self {
            shaders: HandleTable::new("shader"),
            programs: HandleTable::new("program"),
            buffers: HandleTable::new("buffer"),
            textures: HandleTable::new("texture"),
            vertex_arrays: HandleTable::new("vertex array"),
            uniform_locations: HandleTable::new("uniform location"),
        }
    }
}

impl<G: GlApi> Default for GlTables<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the call surface touches, owned by the store.
///
/// One instance per runtime, private to the thread driving the guest — no
/// locking, by design. The tables and caches grow append-only; the host
/// backends are whatever the embedder supplied.
pub struct BridgeState<H: HostBackend> {
    /// 2D canvas backend.
    pub canvas: H::Canvas,
    /// GPU pipeline backend.
    pub gl: H::Gl,
    /// Audio backend.
    pub audio: H::Audio,
    /// Remote-file backend.
    pub files: H::Files,
    /// Persistent storage backend.
    pub storage: H::Storage,
    /// Clock backend.
    pub clock: H::Clock,
    /// GPU resource handle tables.
    pub tables: GlTables<H::Gl>,
    /// Image cache keyed by path.
    pub images: MediaCache<<H::Canvas as CanvasApi>::Image>,
    /// Sound cache keyed by path.
    pub sounds: MediaCache<<H::Audio as AudioApi>::Sound>,
}

impl<H: HostBackend> BridgeState<H> {
    /// Assemble a bridge state from its host backends.
    pub fn new(
        canvas: H::Canvas,
        gl: H::Gl,
        audio: H::Audio,
        files: H::Files,
        storage: H::Storage,
        clock: H::Clock,
    ) -> Self {
        Self {
            canvas,
            gl,
            audio,
            files,
            storage,
            clock,
            tables: GlTables::new(),
            images: MediaCache::new("image"),
            sounds: MediaCache::new("sound"),
        }
    }
}

/// Store data type every entry point is registered against.
pub type BridgeData<H> = InstanceData<BridgeState<H>>;
