//! Host-API trait seams.
//!
//! The bridge never talks to a renderer, mixer, or storage engine directly;
//! it talks to these traits. Each trait owns the opaque object types the
//! guest can only refer to by handle or path. Implementations decide what
//! an object actually is — a GPU resource, an audio element, or a logging
//! stub (see [`crate::headless`]).
//!
//! All methods are synchronous and infallible from the bridge's point of
//! view except where a failure signal is part of the wire contract
//! ([`FileApi::fetch`], [`StorageApi::write`]).

use std::time::{SystemTime, UNIX_EPOCH};

/// An axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Create a rectangle from its components.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Immediate-mode 2D drawing surface.
///
/// Mirrors a stateful 2D canvas context: style setters persist until
/// changed, path construction spans several calls, and every draw mutates
/// visible output immediately.
pub trait CanvasApi {
    /// A decoded image, keyed host-side by its source path.
    type Image: 'static;

    /// Fill the whole surface with a solid color.
    fn clear(&mut self, color: &str);
    /// Fill a rectangle with the current fill style.
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    /// Add a rounded rectangle to the current path.
    fn round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32);
    /// Set the fill style (CSS-style color string).
    fn set_fill_style(&mut self, color: &str);
    /// Set the stroke style (CSS-style color string).
    fn set_stroke_style(&mut self, color: &str);
    /// Set the stroke line width.
    fn set_line_width(&mut self, width: f32);
    /// Begin a new path.
    fn begin_path(&mut self);
    /// Close the current path.
    fn close_path(&mut self);
    /// Move the path cursor without drawing.
    fn move_to(&mut self, x: f32, y: f32);
    /// Add a line segment to the current path.
    fn line_to(&mut self, x: f32, y: f32);
    /// Fill the current path.
    fn fill(&mut self);
    /// Stroke the current path.
    fn stroke(&mut self);
    /// Add an elliptical arc to the current path.
    #[allow(clippy::too_many_arguments)]
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
    );
    /// Set the text font.
    fn set_font(&mut self, font: &str);
    /// Set the text alignment.
    fn set_text_align(&mut self, align: &str);
    /// Draw filled text, constrained to `max_width`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, max_width: f32);
    /// Set the pointer cursor style.
    fn set_cursor(&mut self, style: &str);
    /// Decode (or begin decoding) the image at `path`.
    fn load_image(&mut self, path: &str) -> Self::Image;
    /// Blit a sub-rectangle of `image` to a destination rectangle.
    fn draw_image(&mut self, image: &Self::Image, src: Rect, dst: Rect);
}

/// Payload for a GPU buffer upload, reinterpreted per bind target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferPayload<'a> {
    /// 32-bit float vertex data.
    F32(&'a [f32]),
    /// 32-bit unsigned index data.
    U32(&'a [u32]),
    /// Raw bytes for targets without a defined element type.
    Bytes(&'a [u8]),
}

/// GPU pipeline seam.
///
/// One method per pipeline call the guest can make; object-typed arguments
/// arrive already resolved through the handle tables. `bind_framebuffer`
/// takes an `Option` because framebuffer slot 0 means "default
/// framebuffer", not "object with handle 0".
pub trait GlApi {
    /// A compiled shader object.
    type Shader: 'static;
    /// A linked program object.
    type Program: 'static;
    /// A data buffer object.
    type Buffer: 'static;
    /// A texture object.
    type Texture: 'static;
    /// A vertex array object.
    type VertexArray: 'static;
    /// A uniform location within a program.
    type UniformLocation: 'static;

    /// Create a shader of the given kind.
    fn create_shader(&mut self, kind: u32) -> Self::Shader;
    /// Replace a shader's source text.
    fn shader_source(&mut self, shader: &Self::Shader, source: &str);
    /// Compile a shader.
    fn compile_shader(&mut self, shader: &Self::Shader);
    /// Create an empty program.
    fn create_program(&mut self) -> Self::Program;
    /// Attach a shader to a program.
    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    /// Link a program.
    fn link_program(&mut self, program: &Self::Program);
    /// Select a program for subsequent draws.
    fn use_program(&mut self, program: &Self::Program);

    /// Create a buffer object.
    fn create_buffer(&mut self) -> Self::Buffer;
    /// Bind a buffer to a target.
    fn bind_buffer(&mut self, target: u32, buffer: &Self::Buffer);
    /// Upload data to the buffer bound at `target`.
    fn buffer_data(&mut self, target: u32, data: BufferPayload<'_>, usage: u32);

    /// Create a vertex array object.
    fn create_vertex_array(&mut self) -> Self::VertexArray;
    /// Bind a vertex array object.
    fn bind_vertex_array(&mut self, vertex_array: &Self::VertexArray);
    /// Describe a vertex attribute's layout.
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    /// Enable a vertex attribute.
    fn enable_vertex_attrib_array(&mut self, location: u32);

    /// Create a texture object.
    fn create_texture(&mut self) -> Self::Texture;
    /// Bind a texture to a target.
    fn bind_texture(&mut self, target: u32, texture: &Self::Texture);
    /// Upload a single-channel image to the texture bound at `target`.
    #[allow(clippy::too_many_arguments)]
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
    );
    /// Set a texture parameter.
    fn tex_parameter_i(&mut self, target: u32, pname: u32, param: i32);

    /// Look up a uniform location by name.
    fn get_uniform_location(&mut self, program: &Self::Program, name: &str)
    -> Self::UniformLocation;
    /// Set an integer uniform.
    fn uniform_1i(&mut self, location: &Self::UniformLocation, value: i32);

    /// Draw indexed primitives.
    fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, offset: i32);

    /// Set the clear color.
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    /// Clear the buffers selected by `mask`.
    fn clear(&mut self, mask: u32);
    /// Set the viewport.
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    /// Enable a capability.
    fn enable(&mut self, capability: u32);
    /// Disable a capability.
    fn disable(&mut self, capability: u32);
    /// Set the blend function.
    fn blend_func(&mut self, sfactor: u32, dfactor: u32);
    /// Set the depth comparison function.
    fn depth_func(&mut self, func: u32);
    /// Set the color write mask.
    fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool);
    /// Select the active texture unit.
    fn active_texture(&mut self, unit: u32);
    /// Bind a framebuffer, or the default framebuffer when `None`.
    fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<u32>);
}

/// Audio playback seam.
///
/// One sound object per path; a sound cannot overlap itself. The playing
/// flag backs the idempotent-play contract: a repeated play call while the
/// sound is already playing must be observable as a no-op.
pub trait AudioApi {
    /// A loaded sound, keyed host-side by its source path.
    type Sound: 'static;

    /// Load the sound at `path` with the given loop flag.
    fn load(&mut self, path: &str, looped: bool) -> Self::Sound;
    /// Update a sound's loop flag.
    fn set_loop(&mut self, sound: &mut Self::Sound, looped: bool);
    /// Whether the sound is currently playing.
    fn is_playing(&self, sound: &Self::Sound) -> bool;
    /// Start (or restart) playback from position zero.
    fn play_from_start(&mut self, sound: &mut Self::Sound);
    /// Pause playback.
    fn pause(&mut self, sound: &mut Self::Sound);
    /// Set the playback volume in `[0.0, 1.0]`.
    fn set_volume(&mut self, sound: &mut Self::Sound, volume: f32);
}

/// Remote-file delivery seam.
///
/// The fetch blocks the calling thread until content arrives or fails;
/// the guest has no way to await, so the bridge waits for it.
pub trait FileApi {
    /// Fetch the full text of the file at `path`, or `None` if it does not
    /// exist or cannot be retrieved.
    fn fetch(&mut self, path: &str) -> Option<String>;
}

/// Persistent key-value storage seam.
pub trait StorageApi {
    /// Read the text stored under `path`, if any.
    fn read(&self, path: &str) -> Option<String>;
    /// Store `text` under `path`. Returns `false` on failure (quota,
    /// unavailable backend) — never panics or traps.
    fn write(&mut self, path: &str, text: &str) -> bool;
}

/// Wall-clock seam.
pub trait ClockApi {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockApi for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl ClockApi for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// The full set of host backends behind the bridge.
///
/// Implementors pick one concrete backend per subsystem; the bridge state
/// and every registered entry point are generic over this trait.
pub trait HostBackend: 'static {
    /// 2D canvas backend.
    type Canvas: CanvasApi + 'static;
    /// GPU pipeline backend.
    type Gl: GlApi + 'static;
    /// Audio backend.
    type Audio: AudioApi + 'static;
    /// Remote-file backend.
    type Files: FileApi + 'static;
    /// Persistent storage backend.
    type Storage: StorageApi + 'static;
    /// Clock backend.
    type Clock: ClockApi + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(1_700_000_000_000);
        assert_eq!(clock.now_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_system_clock_is_past_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
