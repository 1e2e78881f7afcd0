//! Headless host backends.
//!
//! These run real guest modules with no display or audio device: drawing
//! and pipeline calls are logged at trace level, sounds track their
//! playing/volume state without producing audio, and the file/storage
//! subsystems use the real backends from [`crate::fs`].
//!
//! Two compositions are provided: [`Headless`] (disk-backed assets and
//! storage, system clock) for the CLI, and [`Offline`] (in-memory files and
//! storage, fixed clock) for fully deterministic runs.

use std::path::PathBuf;

use tracing::trace;

use crate::api::{
    AudioApi, BufferPayload, CanvasApi, FixedClock, GlApi, HostBackend, Rect, SystemClock,
};
use crate::fs::{DirFiles, DiskStorage, MemFiles, MemStorage};
use crate::state::BridgeState;

/// Canvas backend that logs every call.
#[derive(Debug, Default)]
pub struct TraceCanvas;

/// An image as the headless canvas sees it: just its source path.
#[derive(Debug, Clone)]
pub struct TraceImage {
    /// The path the guest referenced.
    pub path: String,
}

impl CanvasApi for TraceCanvas {
    type Image = TraceImage;

    fn clear(&mut self, color: &str) {
        trace!(target: "gantry::canvas", color, "clear");
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        trace!(target: "gantry::canvas", x, y, w, h, "fillRect");
    }

    fn round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32) {
        trace!(target: "gantry::canvas", x, y, w, h, radius, "roundRect");
    }

    fn set_fill_style(&mut self, color: &str) {
        trace!(target: "gantry::canvas", color, "setFillStyle");
    }

    fn set_stroke_style(&mut self, color: &str) {
        trace!(target: "gantry::canvas", color, "setStrokeStyle");
    }

    fn set_line_width(&mut self, width: f32) {
        trace!(target: "gantry::canvas", width, "setLineWidth");
    }

    fn begin_path(&mut self) {
        trace!(target: "gantry::canvas", "beginPath");
    }

    fn close_path(&mut self) {
        trace!(target: "gantry::canvas", "closePath");
    }

    fn move_to(&mut self, x: f32, y: f32) {
        trace!(target: "gantry::canvas", x, y, "moveTo");
    }

    fn line_to(&mut self, x: f32, y: f32) {
        trace!(target: "gantry::canvas", x, y, "lineTo");
    }

    fn fill(&mut self) {
        trace!(target: "gantry::canvas", "fill");
    }

    fn stroke(&mut self) {
        trace!(target: "gantry::canvas", "stroke");
    }

    fn ellipse(
        &mut self,
        x: f32,
        y: f32,
        radius_x: f32,
        radius_y: f32,
        rotation: f32,
        start_angle: f32,
        end_angle: f32,
        counterclockwise: bool,
    ) {
        trace!(
            target: "gantry::canvas",
            x, y, radius_x, radius_y, rotation, start_angle, end_angle, counterclockwise,
            "ellipse"
        );
    }

    fn set_font(&mut self, font: &str) {
        trace!(target: "gantry::canvas", font, "setFont");
    }

    fn set_text_align(&mut self, align: &str) {
        trace!(target: "gantry::canvas", align, "setTextAlign");
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, max_width: f32) {
        trace!(target: "gantry::canvas", text, x, y, max_width, "fillText");
    }

    fn set_cursor(&mut self, style: &str) {
        trace!(target: "gantry::canvas", style, "setCursor");
    }

    fn load_image(&mut self, path: &str) -> TraceImage {
        trace!(target: "gantry::canvas", path, "loadImage");
        TraceImage {
            path: path.to_string(),
        }
    }

    fn draw_image(&mut self, image: &TraceImage, src: Rect, dst: Rect) {
        trace!(target: "gantry::canvas", path = image.path, ?src, ?dst, "drawImage");
    }
}

/// GPU object issued by [`TraceGl`]: its creation sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceObject(pub u32);

/// Pipeline backend that logs every call.
///
/// Objects carry a global creation sequence number so trace output can
/// distinguish them.
#[derive(Debug, Default)]
pub struct TraceGl {
    created: u32,
}

impl TraceGl {
    fn next(&mut self, kind: &str) -> TraceObject {
        let object = TraceObject(self.created);
        self.created += 1;
        trace!(target: "gantry::gl", kind, sequence = object.0, "create");
        object
    }
}

impl GlApi for TraceGl {
    type Shader = TraceObject;
    type Program = TraceObject;
    type Buffer = TraceObject;
    type Texture = TraceObject;
    type VertexArray = TraceObject;
    type UniformLocation = TraceObject;

    fn create_shader(&mut self, kind: u32) -> TraceObject {
        trace!(target: "gantry::gl", kind, "createShader");
        self.next("shader")
    }

    fn shader_source(&mut self, shader: &TraceObject, source: &str) {
        trace!(target: "gantry::gl", shader = shader.0, len = source.len(), "shaderSource");
    }

    fn compile_shader(&mut self, shader: &TraceObject) {
        trace!(target: "gantry::gl", shader = shader.0, "compileShader");
    }

    fn create_program(&mut self) -> TraceObject {
        self.next("program")
    }

    fn attach_shader(&mut self, program: &TraceObject, shader: &TraceObject) {
        trace!(target: "gantry::gl", program = program.0, shader = shader.0, "attachShader");
    }

    fn link_program(&mut self, program: &TraceObject) {
        trace!(target: "gantry::gl", program = program.0, "linkProgram");
    }

    fn use_program(&mut self, program: &TraceObject) {
        trace!(target: "gantry::gl", program = program.0, "useProgram");
    }

    fn create_buffer(&mut self) -> TraceObject {
        self.next("buffer")
    }

    fn bind_buffer(&mut self, target: u32, buffer: &TraceObject) {
        trace!(target: "gantry::gl", gl_target = target, buffer = buffer.0, "bindBuffer");
    }

    fn buffer_data(&mut self, target: u32, data: BufferPayload<'_>, usage: u32) {
        let len = match data {
            BufferPayload::F32(v) => v.len(),
            BufferPayload::U32(v) => v.len(),
            BufferPayload::Bytes(v) => v.len(),
        };
        trace!(target: "gantry::gl", gl_target = target, elements = len, usage, "bufferData");
    }

    fn create_vertex_array(&mut self) -> TraceObject {
        self.next("vertex array")
    }

    fn bind_vertex_array(&mut self, vertex_array: &TraceObject) {
        trace!(target: "gantry::gl", vertex_array = vertex_array.0, "bindVertexArray");
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        trace!(
            target: "gantry::gl",
            location, size, ty, normalized, stride, offset,
            "vertexAttribPointer"
        );
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        trace!(target: "gantry::gl", location, "enableVertexAttribArray");
    }

    fn create_texture(&mut self) -> TraceObject {
        self.next("texture")
    }

    fn bind_texture(&mut self, target: u32, texture: &TraceObject) {
        trace!(target: "gantry::gl", gl_target = target, texture = texture.0, "bindTexture");
    }

    fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: u32,
        height: u32,
        border: i32,
        format: u32,
        ty: u32,
        pixels: &[u8],
    ) {
        trace!(
            target: "gantry::gl",
            gl_target = target, level, internal_format, width, height, border, format, ty,
            bytes = pixels.len(),
            "texImage2D"
        );
    }

    fn tex_parameter_i(&mut self, target: u32, pname: u32, param: i32) {
        trace!(target: "gantry::gl", gl_target = target, pname, param, "texParameteri");
    }

    fn get_uniform_location(&mut self, program: &TraceObject, name: &str) -> TraceObject {
        trace!(target: "gantry::gl", program = program.0, name, "getUniformLocation");
        self.next("uniform location")
    }

    fn uniform_1i(&mut self, location: &TraceObject, value: i32) {
        trace!(target: "gantry::gl", location = location.0, value, "uniform1i");
    }

    fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, offset: i32) {
        trace!(target: "gantry::gl", mode, count, ty, offset, "drawElements");
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        trace!(target: "gantry::gl", r, g, b, a, "clearColor");
    }

    fn clear(&mut self, mask: u32) {
        trace!(target: "gantry::gl", mask, "clear");
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        trace!(target: "gantry::gl", x, y, width, height, "viewport");
    }

    fn enable(&mut self, capability: u32) {
        trace!(target: "gantry::gl", capability, "enable");
    }

    fn disable(&mut self, capability: u32) {
        trace!(target: "gantry::gl", capability, "disable");
    }

    fn blend_func(&mut self, sfactor: u32, dfactor: u32) {
        trace!(target: "gantry::gl", sfactor, dfactor, "blendFunc");
    }

    fn depth_func(&mut self, func: u32) {
        trace!(target: "gantry::gl", func, "depthFunc");
    }

    fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        trace!(target: "gantry::gl", r, g, b, a, "colorMask");
    }

    fn active_texture(&mut self, unit: u32) {
        trace!(target: "gantry::gl", unit, "activeTexture");
    }

    fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<u32>) {
        trace!(target: "gantry::gl", gl_target = target, ?framebuffer, "bindFramebuffer");
    }
}

/// A sound as the headless mixer sees it.
#[derive(Debug, Clone)]
pub struct TraceSound {
    /// The path the guest loaded.
    pub path: String,
    /// Whether the sound is currently "playing".
    pub playing: bool,
    /// Loop flag.
    pub looped: bool,
    /// Volume in `[0.0, 1.0]`.
    pub volume: f32,
}

/// Audio backend that tracks state without producing sound.
#[derive(Debug, Default)]
pub struct TraceAudio;

impl AudioApi for TraceAudio {
    type Sound = TraceSound;

    fn load(&mut self, path: &str, looped: bool) -> TraceSound {
        trace!(target: "gantry::audio", path, looped, "loadSound");
        TraceSound {
            path: path.to_string(),
            playing: false,
            looped,
            volume: 1.0,
        }
    }

    fn set_loop(&mut self, sound: &mut TraceSound, looped: bool) {
        sound.looped = looped;
    }

    fn is_playing(&self, sound: &TraceSound) -> bool {
        sound.playing
    }

    fn play_from_start(&mut self, sound: &mut TraceSound) {
        trace!(target: "gantry::audio", path = sound.path, "play");
        sound.playing = true;
    }

    fn pause(&mut self, sound: &mut TraceSound) {
        trace!(target: "gantry::audio", path = sound.path, "pause");
        sound.playing = false;
    }

    fn set_volume(&mut self, sound: &mut TraceSound, volume: f32) {
        trace!(target: "gantry::audio", path = sound.path, volume, "setVolume");
        sound.volume = volume;
    }
}

/// Disk-backed headless composition: trace rendering, real assets and
/// storage, system clock.
pub struct Headless;

impl HostBackend for Headless {
    type Canvas = TraceCanvas;
    type Gl = TraceGl;
    type Audio = TraceAudio;
    type Files = DirFiles;
    type Storage = DiskStorage;
    type Clock = SystemClock;
}

impl Headless {
    /// Assemble a headless bridge state.
    pub fn state(
        assets: impl Into<PathBuf>,
        storage: impl Into<PathBuf>,
    ) -> BridgeState<Headless> {
        BridgeState::new(
            TraceCanvas,
            TraceGl::default(),
            TraceAudio,
            DirFiles::new(assets),
            DiskStorage::new(storage),
            SystemClock,
        )
    }
}

/// Fully in-memory composition: deterministic clock, no disk access.
pub struct Offline;

impl HostBackend for Offline {
    type Canvas = TraceCanvas;
    type Gl = TraceGl;
    type Audio = TraceAudio;
    type Files = MemFiles;
    type Storage = MemStorage;
    type Clock = FixedClock;
}

impl Offline {
    /// Assemble an offline bridge state around the given file set.
    pub fn state(files: MemFiles, now_millis: i64) -> BridgeState<Offline> {
        BridgeState::new(
            TraceCanvas,
            TraceGl::default(),
            TraceAudio,
            files,
            MemStorage::new(),
            FixedClock(now_millis),
        )
    }
}
