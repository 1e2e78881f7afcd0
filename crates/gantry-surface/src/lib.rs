//! Gantry Call Surface
//!
//! The enumerated set of entry points a sandboxed guest module may invoke,
//! and everything they need: host-API trait seams, the bridge state living
//! in the store, and registration onto a wasmtime linker.
//!
//! # Shape of an entry point
//!
//! Every entry point is a thin, stateless wrapper with the same three
//! steps: decode arguments out of guest memory (via `gantry-mem`), resolve
//! or allocate resources (via `gantry-table`), forward to the host backend
//! trait. Results flow back as a return integer or through guest memory.
//! Nothing suspends; nothing is buffered.
//!
//! # Import modules
//!
//! Entry points are grouped into wasm import modules by subsystem:
//!
//! | module   | contents                               |
//! |----------|----------------------------------------|
//! | `canvas` | 2D drawing primitives, image blits     |
//! | `audio`  | named sound load/play/pause/volume     |
//! | `gl`     | GPU pipeline calls and resource tables |
//! | `io`     | blocking file and storage transfers    |
//! | `sys`    | debug printing, wall-clock time        |
//! | `input`  | key name to keycode mapping            |
//!
//! The full set is enumerated in [`registry::MANIFEST`].
//!
//! # Failure policy
//!
//! Three kinds of failure, three behaviors:
//!
//! 1. **Protocol desync** (bad pointer, unknown handle, unloaded sound) —
//!    the entry point returns an error, which traps the guest.
//! 2. **Resource unavailable** (missing file, failed storage write) — a
//!    `0`/`-1` failure signal the guest can branch on; never a trap.
//! 3. **Unsupported usage** (multi-fragment shader source) — a warning log
//!    and a degraded forward; progress over strictness.

pub mod api;
pub mod audio;
pub mod canvas;
pub mod fs;
pub mod gl;
pub mod headless;
pub mod input;
pub mod io;
pub mod registry;
pub mod state;
pub mod sys;

// Re-export main types
pub use api::{
    AudioApi, BufferPayload, CanvasApi, ClockApi, FileApi, FixedClock, GlApi, HostBackend, Rect,
    StorageApi, SystemClock,
};
pub use fs::{DirFiles, DiskStorage, MemFiles, MemStorage};
pub use gl::{ARRAY_BUFFER, ELEMENT_ARRAY_BUFFER};
pub use headless::{Headless, Offline};
pub use registry::{
    EntryPoint, MANIFEST, Registrar, Subsystem, SurfaceError, SurfaceResult, find, manifest,
    register_all,
};
pub use state::{BridgeData, BridgeState, GlTables};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::api::{
        AudioApi, CanvasApi, ClockApi, FileApi, GlApi, HostBackend, StorageApi,
    };
    pub use crate::registry::{SurfaceError, SurfaceResult, manifest, register_all};
    pub use crate::state::{BridgeData, BridgeState};
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use gantry_core::{
        BridgeEngine, ExecutionError, IntoShared, ModuleLoader, Runtime, RuntimeConfig,
    };
    use wasmtime::Linker;

    use crate::api::{AudioApi, BufferPayload, FixedClock, GlApi, HostBackend};
    use crate::fs::{MemFiles, MemStorage};
    use crate::headless::TraceCanvas;
    use crate::registry::{Registrar, manifest, register_all};
    use crate::state::{BridgeData, BridgeState};
    use crate::{ARRAY_BUFFER, ELEMENT_ARRAY_BUFFER};

    /// Recording GL backend: remembers uploads and binds for assertions.
    #[derive(Default)]
    struct RecGl {
        next: u32,
        bound_array_buffer: Option<u32>,
        bound_element_buffer: Option<u32>,
        array_data: HashMap<u32, Vec<f32>>,
        index_data: HashMap<u32, Vec<u32>>,
        framebuffer_binds: Vec<Option<u32>>,
        shader_sources: HashMap<u32, String>,
        uniform_sets: Vec<(u32, i32)>,
    }

    impl RecGl {
        fn issue(&mut self) -> u32 {
            let id = self.next;
            self.next += 1;
            id
        }
    }

    impl GlApi for RecGl {
        type Shader = u32;
        type Program = u32;
        type Buffer = u32;
        type Texture = u32;
        type VertexArray = u32;
        type UniformLocation = u32;

        fn create_shader(&mut self, _kind: u32) -> u32 {
            self.issue()
        }
        fn shader_source(&mut self, shader: &u32, source: &str) {
            self.shader_sources.insert(*shader, source.to_string());
        }
        fn compile_shader(&mut self, _shader: &u32) {}
        fn create_program(&mut self) -> u32 {
            self.issue()
        }
        fn attach_shader(&mut self, _program: &u32, _shader: &u32) {}
        fn link_program(&mut self, _program: &u32) {}
        fn use_program(&mut self, _program: &u32) {}

        fn create_buffer(&mut self) -> u32 {
            self.issue()
        }
        fn bind_buffer(&mut self, target: u32, buffer: &u32) {
            match target {
                ARRAY_BUFFER => self.bound_array_buffer = Some(*buffer),
                ELEMENT_ARRAY_BUFFER => self.bound_element_buffer = Some(*buffer),
                _ => {}
            }
        }
        fn buffer_data(&mut self, target: u32, data: BufferPayload<'_>, _usage: u32) {
            match (target, data) {
                (ARRAY_BUFFER, BufferPayload::F32(floats)) => {
                    self.array_data
                        .insert(self.bound_array_buffer.unwrap(), floats.to_vec());
                }
                (ELEMENT_ARRAY_BUFFER, BufferPayload::U32(indices)) => {
                    self.index_data
                        .insert(self.bound_element_buffer.unwrap(), indices.to_vec());
                }
                _ => {}
            }
        }

        fn create_vertex_array(&mut self) -> u32 {
            self.issue()
        }
        fn bind_vertex_array(&mut self, _vertex_array: &u32) {}
        fn vertex_attrib_pointer(
            &mut self,
            _location: u32,
            _size: i32,
            _ty: u32,
            _normalized: bool,
            _stride: i32,
            _offset: i32,
        ) {
        }
        fn enable_vertex_attrib_array(&mut self, _location: u32) {}

        fn create_texture(&mut self) -> u32 {
            self.issue()
        }
        fn bind_texture(&mut self, _target: u32, _texture: &u32) {}
        fn tex_image_2d(
            &mut self,
            _target: u32,
            _level: i32,
            _internal_format: i32,
            _width: u32,
            _height: u32,
            _border: i32,
            _format: u32,
            _ty: u32,
            _pixels: &[u8],
        ) {
        }
        fn tex_parameter_i(&mut self, _target: u32, _pname: u32, _param: i32) {}

        fn get_uniform_location(&mut self, _program: &u32, _name: &str) -> u32 {
            self.issue()
        }
        fn uniform_1i(&mut self, location: &u32, value: i32) {
            self.uniform_sets.push((*location, value));
        }

        fn draw_elements(&mut self, _mode: u32, _count: i32, _ty: u32, _offset: i32) {}
        fn clear_color(&mut self, _r: f32, _g: f32, _b: f32, _a: f32) {}
        fn clear(&mut self, _mask: u32) {}
        fn viewport(&mut self, _x: i32, _y: i32, _width: i32, _height: i32) {}
        fn enable(&mut self, _capability: u32) {}
        fn disable(&mut self, _capability: u32) {}
        fn blend_func(&mut self, _sfactor: u32, _dfactor: u32) {}
        fn depth_func(&mut self, _func: u32) {}
        fn color_mask(&mut self, _r: bool, _g: bool, _b: bool, _a: bool) {}
        fn active_texture(&mut self, _unit: u32) {}
        fn bind_framebuffer(&mut self, _target: u32, framebuffer: Option<u32>) {
            self.framebuffer_binds.push(framebuffer);
        }
    }

    /// Recording audio backend: counts play-from-start transitions.
    #[derive(Default)]
    struct RecAudio;

    struct RecSound {
        playing: bool,
        plays: u32,
        looped: bool,
        volume: f32,
    }

    impl AudioApi for RecAudio {
        type Sound = RecSound;

        fn load(&mut self, _path: &str, looped: bool) -> RecSound {
            RecSound {
                playing: false,
                plays: 0,
                looped,
                volume: 1.0,
            }
        }
        fn set_loop(&mut self, sound: &mut RecSound, looped: bool) {
            sound.looped = looped;
        }
        fn is_playing(&self, sound: &RecSound) -> bool {
            sound.playing
        }
        fn play_from_start(&mut self, sound: &mut RecSound) {
            sound.playing = true;
            sound.plays += 1;
        }
        fn pause(&mut self, sound: &mut RecSound) {
            sound.playing = false;
        }
        fn set_volume(&mut self, sound: &mut RecSound, volume: f32) {
            sound.volume = volume;
        }
    }

    struct RecHost;

    impl HostBackend for RecHost {
        type Canvas = TraceCanvas;
        type Gl = RecGl;
        type Audio = RecAudio;
        type Files = MemFiles;
        type Storage = MemStorage;
        type Clock = FixedClock;
    }

    fn bridge_with(files: MemFiles) -> Runtime<BridgeState<RecHost>> {
        let engine = BridgeEngine::default_engine().unwrap().into_shared();
        let state = BridgeState::<RecHost>::new(
            TraceCanvas,
            RecGl::default(),
            RecAudio,
            files,
            MemStorage::new(),
            FixedClock(42),
        );
        let mut runtime = Runtime::new(engine, state, RuntimeConfig::default());
        register_all::<RecHost>(runtime.linker_mut()).unwrap();
        runtime
    }

    fn bridge() -> Runtime<BridgeState<RecHost>> {
        bridge_with(MemFiles::new())
    }

    fn load(runtime: &mut Runtime<BridgeState<RecHost>>, wat: &str) {
        let loader = ModuleLoader::new(Arc::clone(runtime.engine()));
        let module = loader.load_wat(wat).unwrap();
        runtime.load_module(&module).unwrap();
    }

    #[test]
    fn test_registration_matches_manifest() {
        let engine = BridgeEngine::default_engine().unwrap().into_shared();
        let mut linker = Linker::<BridgeData<RecHost>>::new(engine.inner());
        let mut reg = Registrar::new(&mut linker);

        crate::canvas::register::<RecHost>(&mut reg).unwrap();
        crate::audio::register::<RecHost>(&mut reg).unwrap();
        crate::gl::register::<RecHost>(&mut reg).unwrap();
        crate::io::register::<RecHost>(&mut reg).unwrap();
        crate::sys::register::<RecHost>(&mut reg).unwrap();
        crate::input::register::<RecHost>(&mut reg).unwrap();

        let mut registered: Vec<_> = reg.registered().to_vec();
        let mut expected: Vec<_> = manifest().map(|e| (e.module, e.name)).collect();
        registered.sort();
        expected.sort();
        assert_eq!(registered, expected);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let engine = BridgeEngine::default_engine().unwrap().into_shared();
        let mut linker = Linker::<BridgeData<RecHost>>::new(engine.inner());
        let mut reg = Registrar::new(&mut linker);

        reg.func_wrap("sys", "extra", || {}).unwrap();
        assert!(reg.func_wrap("sys", "extra", || {}).is_err());
    }

    #[test]
    fn test_buffer_upload_scenario() {
        // createBuffer -> handle 0; bindBuffer; bufferData with 12 bytes of
        // float data -> the host buffer holds exactly those 3 floats.
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "gl" "createBuffer" (func $create_buffer (result i32)))
                (import "gl" "bindBuffer" (func $bind_buffer (param i32 i32)))
                (import "gl" "bufferData" (func $buffer_data (param i32 i32 i32 i32)))
                (memory (export "memory") 1)
                (data (i32.const 16) "\00\00\80\3f\00\00\00\40\00\00\40\40")
                (func (export "setup") (result i32)
                    (local $buf i32)
                    (local.set $buf (call $create_buffer))
                    (call $bind_buffer (i32.const 0x8892) (local.get $buf))
                    (call $buffer_data
                        (i32.const 0x8892) (i32.const 16) (i32.const 12) (i32.const 35044))
                    (local.get $buf)
                )
            )
        "#,
        );

        let handle: i32 = runtime.call("setup", ()).unwrap();
        assert_eq!(handle, 0);

        let state = runtime.state();
        assert_eq!(state.tables.buffers.len(), 1);
        let host_buffer = state.gl.bound_array_buffer.unwrap();
        assert_eq!(state.gl.array_data[&host_buffer], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_gen_buffers_writes_handles_in_order() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "gl" "genBuffers" (func $gen (param i32 i32)))
                (import "gl" "createBuffer" (func $create (result i32)))
                (memory (export "memory") 1)
                (func (export "setup") (result i32)
                    (call $gen (i32.const 3) (i32.const 16))
                    (call $create)
                )
                (func (export "peek_u32") (param i32) (result i32)
                    (i32.load (local.get 0))
                )
            )
        "#,
        );

        // The create after the batch continues the same numbering space.
        let next: i32 = runtime.call("setup", ()).unwrap();
        assert_eq!(next, 3);

        for (offset, expected) in [(16, 0), (20, 1), (24, 2)] {
            let value: i32 = runtime.call("peek_u32", (offset,)).unwrap();
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn test_unknown_handle_traps() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "gl" "compileShader" (func $compile (param i32)))
                (memory (export "memory") 1)
                (func (export "go") (call $compile (i32.const 3)))
            )
        "#,
        );

        assert!(matches!(
            runtime.call_void("go"),
            Err(ExecutionError::Trap(_))
        ));
    }

    #[test]
    fn test_framebuffer_zero_is_no_object() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "gl" "bindFramebuffer" (func $bind (param i32 i32)))
                (memory (export "memory") 1)
                (func (export "go")
                    (call $bind (i32.const 0x8d40) (i32.const 0))
                    (call $bind (i32.const 0x8d40) (i32.const 2))
                )
            )
        "#,
        );

        runtime.call_void("go").unwrap();
        assert_eq!(runtime.state().gl.framebuffer_binds, vec![None, Some(2)]);
    }

    #[test]
    fn test_shader_source_reaches_backend() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "gl" "createShader" (func $create (param i32) (result i32)))
                (import "gl" "shaderSource" (func $source (param i32 i32 i32 i32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "void main() {}")
                (func (export "go") (result i32)
                    (local $s i32)
                    (local.set $s (call $create (i32.const 0x8b31)))
                    (call $source (local.get $s) (i32.const 1) (i32.const 0) (i32.const 14))
                    (local.get $s)
                )
            )
        "#,
        );

        let handle: i32 = runtime.call("go", ()).unwrap();
        assert_eq!(handle, 0);

        let state = runtime.state();
        let host_shader = 0u32; // first object the backend issued
        assert_eq!(state.gl.shader_sources[&host_shader], "void main() {}");
    }

    #[test]
    fn test_play_sound_idempotent_until_restart() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "audio" "loadSound" (func $load (param i32 i32)))
                (import "audio" "playSound" (func $play (param i32 i32)))
                (import "audio" "pauseSound" (func $pause (param i32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "bgm.ogg\00")
                (func (export "start") (call $load (i32.const 0) (i32.const 1)))
                (func (export "frame") (call $play (i32.const 0) (i32.const 0)))
                (func (export "restart") (call $play (i32.const 0) (i32.const 1)))
                (func (export "halt") (call $pause (i32.const 0)))
            )
        "#,
        );

        runtime.call_void("start").unwrap();

        // Per-frame play calls only start the sound once.
        for _ in 0..3 {
            runtime.call_void("frame").unwrap();
        }
        assert_eq!(runtime.state().sounds.get("bgm.ogg").unwrap().plays, 1);

        // An explicit restart always plays from the top.
        runtime.call_void("restart").unwrap();
        assert_eq!(runtime.state().sounds.get("bgm.ogg").unwrap().plays, 2);

        // After a pause the next frame play starts again.
        runtime.call_void("halt").unwrap();
        runtime.call_void("frame").unwrap();
        let sound = runtime.state().sounds.get("bgm.ogg").unwrap();
        assert_eq!(sound.plays, 3);
        assert!(sound.looped);
    }

    #[test]
    fn test_play_without_load_traps() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "audio" "playSound" (func $play (param i32 i32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "never.ogg\00")
                (func (export "go") (call $play (i32.const 0) (i32.const 0)))
            )
        "#,
        );

        assert!(matches!(
            runtime.call_void("go"),
            Err(ExecutionError::Trap(_))
        ));
    }

    #[test]
    fn test_storage_round_trip() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "io" "writeStorageFile" (func $write (param i32 i32) (result i32)))
                (import "io" "getStorageFileSize" (func $size (param i32) (result i32)))
                (import "io" "readStorageFile" (func $read (param i32 i32 i32) (result i32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "save1\00")
                (data (i32.const 8) "abc\00")
                (func (export "missing_size") (result i32)
                    (call $size (i32.const 0))
                )
                (func (export "round_trip") (result i32)
                    (local $n i32)
                    (if (i32.eqz (call $write (i32.const 0) (i32.const 8)))
                        (then (return (i32.const -10))))
                    (local.set $n (call $size (i32.const 0)))
                    (if (i32.ne (local.get $n) (i32.const 3))
                        (then (return (i32.const -11))))
                    (if (i32.eqz (call $read (i32.const 0) (i32.const 64) (i32.const 3)))
                        (then (return (i32.const -12))))
                    (i32.add
                        (i32.add
                            (i32.load8_u (i32.const 64))
                            (i32.load8_u (i32.const 65)))
                        (i32.load8_u (i32.const 66)))
                )
            )
        "#,
        );

        // Never-written key reports the missing sentinel.
        let size: i32 = runtime.call("missing_size", ()).unwrap();
        assert_eq!(size, -1);

        // Write "abc", read it back, sum the copied bytes.
        let sum: i32 = runtime.call("round_trip", ()).unwrap();
        assert_eq!(sum, (b'a' + b'b') as i32 + b'c' as i32);
        assert_eq!(runtime.state().storage.get("save1"), Some("abc"));
    }

    #[test]
    fn test_remote_read_length_mismatch_leaves_memory_untouched() {
        let files = MemFiles::new().with_file("data.txt", "hello");
        let mut runtime = bridge_with(files);
        load(
            &mut runtime,
            r#"
            (module
                (import "io" "getRemoteFileSize" (func $fsize (param i32) (result i32)))
                (import "io" "readRemoteFile" (func $read (param i32 i32 i32) (result i32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "data.txt\00")
                (data (i32.const 16) "missing.txt\00")
                (func (export "size") (result i32) (call $fsize (i32.const 0)))
                (func (export "missing_size") (result i32) (call $fsize (i32.const 16)))
                (func (export "read_wrong_len") (result i32)
                    (call $read (i32.const 0) (i32.const 64) (i32.const 2))
                )
                (func (export "read_missing") (result i32)
                    (call $read (i32.const 16) (i32.const 64) (i32.const 5))
                )
                (func (export "read_right_len") (result i32)
                    (call $read (i32.const 0) (i32.const 64) (i32.const 5))
                )
                (func (export "peek") (param i32) (result i32)
                    (i32.load8_u (local.get 0))
                )
            )
        "#,
        );

        let size: i32 = runtime.call("size", ()).unwrap();
        assert_eq!(size, 5);
        let missing: i32 = runtime.call("missing_size", ()).unwrap();
        assert_eq!(missing, -1);

        // Wrong expected length: failure signal, destination untouched.
        let ok: i32 = runtime.call("read_wrong_len", ()).unwrap();
        assert_eq!(ok, 0);
        let byte: i32 = runtime.call("peek", (64,)).unwrap();
        assert_eq!(byte, 0);

        // Missing file: failure signal.
        let ok: i32 = runtime.call("read_missing", ()).unwrap();
        assert_eq!(ok, 0);

        // Exact length: content lands at the destination.
        let ok: i32 = runtime.call("read_right_len", ()).unwrap();
        assert_eq!(ok, 1);
        let byte: i32 = runtime.call("peek", (64,)).unwrap();
        assert_eq!(byte, b'h' as i32);
    }

    #[test]
    fn test_draw_image_caches_by_path() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "canvas" "drawImage"
                    (func $draw (param i32 f32 f32 f32 f32 f32 f32 f32 f32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "img/ship.png\00")
                (func (export "frame")
                    (call $draw (i32.const 0)
                        (f32.const 0) (f32.const 0) (f32.const 16) (f32.const 16)
                        (f32.const 10) (f32.const 10) (f32.const 32) (f32.const 32))
                )
            )
        "#,
        );

        runtime.call_void("frame").unwrap();
        runtime.call_void("frame").unwrap();
        assert_eq!(runtime.state().images.len(), 1);
        assert!(runtime.state().images.contains("img/ship.png"));
    }

    #[test]
    fn test_keycode_over_the_wire() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "input" "keycodeOf" (func $key (param i32) (result i32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "escape\00")
                (data (i32.const 16) "f13\00")
                (func (export "escape") (result i32) (call $key (i32.const 0)))
                (func (export "unknown") (result i32) (call $key (i32.const 16)))
            )
        "#,
        );

        let code: i32 = runtime.call("escape", ()).unwrap();
        assert_eq!(code, 12);

        let code: i32 = runtime.call("unknown", ()).unwrap();
        assert_eq!(code, crate::input::KEYS.len() as i32 + 20);
    }

    #[test]
    fn test_timestamp_uses_clock_backend() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "sys" "timestampMillis" (func $now (result i64)))
                (memory (export "memory") 1)
                (func (export "now") (result i64) (call $now))
            )
        "#,
        );

        let now: i64 = runtime.call("now", ()).unwrap();
        assert_eq!(now, 42);
    }

    #[test]
    fn test_uniform_value_passes_through() {
        let mut runtime = bridge();
        load(
            &mut runtime,
            r#"
            (module
                (import "gl" "createProgram" (func $program (result i32)))
                (import "gl" "getUniformLocation" (func $loc (param i32 i32) (result i32)))
                (import "gl" "uniform1i" (func $set (param i32 i32)))
                (memory (export "memory") 1)
                (data (i32.const 0) "u_texture\00")
                (func (export "go") (result i32)
                    (local $p i32)
                    (local $l i32)
                    (local.set $p (call $program))
                    (local.set $l (call $loc (local.get $p) (i32.const 0)))
                    (call $set (local.get $l) (i32.const 7))
                    (local.get $l)
                )
            )
        "#,
        );

        let location: i32 = runtime.call("go", ()).unwrap();
        assert_eq!(location, 0);

        // The value argument is forwarded as-is, not resolved through any
        // table.
        let state = runtime.state();
        assert_eq!(state.gl.uniform_sets, vec![(1, 7)]);
    }
}
