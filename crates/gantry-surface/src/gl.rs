//! GPU pipeline entry points (`gl` import module).
//!
//! Create calls allocate a handle in the matching category table; every
//! other object-referencing call resolves its handle before forwarding.
//! The pipeline itself (compilation results, draw output) belongs to the
//! [`GlApi`] backend — nothing here inspects it.

use tracing::{debug, warn};
use wasmtime::Caller;

use gantry_mem::split;
use gantry_table::Handle;

use crate::api::{BufferPayload, GlApi, HostBackend};
use crate::registry::{Registrar, SurfaceResult};
use crate::state::BridgeData;

/// Bind target for vertex data buffers.
pub const ARRAY_BUFFER: u32 = 0x8892;
/// Bind target for index data buffers.
pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;

pub(crate) fn register<H: HostBackend>(
    reg: &mut Registrar<'_, BridgeData<H>>,
) -> SurfaceResult<()> {
    reg.func_wrap(
        "gl",
        "createShader",
        |mut caller: Caller<'_, BridgeData<H>>, kind: u32| -> u32 {
            let state = caller.data_mut().state_mut();
            let shader = state.gl.create_shader(kind);
            state.tables.shaders.create(shader).raw()
        },
    )?;

    reg.func_wrap(
        "gl",
        "shaderSource",
        |mut caller: Caller<'_, BridgeData<H>>,
         shader: u32,
         count: u32,
         ptr: u32,
         len: u32|
         -> wasmtime::Result<()> {
            if count != 1 {
                // Multi-fragment submission is not supported; degrade to
                // the single fragment the wire actually carries.
                warn!(count, "shaderSource supports a single fragment; using the first");
            }
            let (view, data) = split(&mut caller)?;
            let source = view.read_bytes(ptr as usize, len as usize)?;
            let source = gantry_mem::decode_latin1(source);

            let state = data.state_mut();
            let shader = state.tables.shaders.resolve(Handle::from(shader))?;
            state.gl.shader_source(shader, &source);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "compileShader",
        |mut caller: Caller<'_, BridgeData<H>>, shader: u32| -> wasmtime::Result<()> {
            let state = caller.data_mut().state_mut();
            let shader = state.tables.shaders.resolve(Handle::from(shader))?;
            state.gl.compile_shader(shader);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "deleteShader",
        |mut caller: Caller<'_, BridgeData<H>>, shader: u32| {
            caller
                .data_mut()
                .state_mut()
                .tables
                .shaders
                .delete(Handle::from(shader));
        },
    )?;

    reg.func_wrap(
        "gl",
        "createProgram",
        |mut caller: Caller<'_, BridgeData<H>>| -> u32 {
            let state = caller.data_mut().state_mut();
            let program = state.gl.create_program();
            state.tables.programs.create(program).raw()
        },
    )?;

    reg.func_wrap(
        "gl",
        "attachShader",
        |mut caller: Caller<'_, BridgeData<H>>, program: u32, shader: u32| -> wasmtime::Result<()> {
            let state = caller.data_mut().state_mut();
            let program = state.tables.programs.resolve(Handle::from(program))?;
            let shader = state.tables.shaders.resolve(Handle::from(shader))?;
            state.gl.attach_shader(program, shader);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "linkProgram",
        |mut caller: Caller<'_, BridgeData<H>>, program: u32| -> wasmtime::Result<()> {
            let state = caller.data_mut().state_mut();
            let program = state.tables.programs.resolve(Handle::from(program))?;
            state.gl.link_program(program);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "useProgram",
        |mut caller: Caller<'_, BridgeData<H>>, program: u32| -> wasmtime::Result<()> {
            let state = caller.data_mut().state_mut();
            let program = state.tables.programs.resolve(Handle::from(program))?;
            state.gl.use_program(program);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "createBuffer",
        |mut caller: Caller<'_, BridgeData<H>>| -> u32 {
            let state = caller.data_mut().state_mut();
            let buffer = state.gl.create_buffer();
            state.tables.buffers.create(buffer).raw()
        },
    )?;

    reg.func_wrap(
        "gl",
        "genBuffers",
        |mut caller: Caller<'_, BridgeData<H>>, count: u32, out: u32| -> wasmtime::Result<()> {
            let (mut view, data) = split(&mut caller)?;
            let state = data.state_mut();

            let buffers: Vec<_> = (0..count).map(|_| state.gl.create_buffer()).collect();
            let handles = state.tables.buffers.create_many(buffers);
            let raw: Vec<u32> = handles.iter().map(|h| h.raw()).collect();
            view.write_u32s(out as usize, &raw)?;
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "bindBuffer",
        |mut caller: Caller<'_, BridgeData<H>>, target: u32, buffer: u32| -> wasmtime::Result<()> {
            let state = caller.data_mut().state_mut();
            let buffer = state.tables.buffers.resolve(Handle::from(buffer))?;
            state.gl.bind_buffer(target, buffer);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "bufferData",
        |mut caller: Caller<'_, BridgeData<H>>,
         target: u32,
         ptr: u32,
         len: u32,
         usage: u32|
         -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let state = data.state_mut();
            let (ptr, len) = (ptr as usize, len as usize);

            match target {
                ARRAY_BUFFER => {
                    let floats = view.read_f32s(ptr, len)?;
                    state
                        .gl
                        .buffer_data(target, BufferPayload::F32(&floats), usage);
                }
                ELEMENT_ARRAY_BUFFER => {
                    let indices = view.read_u32s(ptr, len)?;
                    state
                        .gl
                        .buffer_data(target, BufferPayload::U32(&indices), usage);
                }
                _ => {
                    debug!(target, "bufferData to a target without an element type");
                    let bytes = view.read_bytes(ptr, len)?;
                    state
                        .gl
                        .buffer_data(target, BufferPayload::Bytes(bytes), usage);
                }
            }
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "createVertexArray",
        |mut caller: Caller<'_, BridgeData<H>>| -> u32 {
            let state = caller.data_mut().state_mut();
            let vertex_array = state.gl.create_vertex_array();
            state.tables.vertex_arrays.create(vertex_array).raw()
        },
    )?;

    reg.func_wrap(
        "gl",
        "genVertexArrays",
        |mut caller: Caller<'_, BridgeData<H>>, count: u32, out: u32| -> wasmtime::Result<()> {
            let (mut view, data) = split(&mut caller)?;
            let state = data.state_mut();

            let arrays: Vec<_> = (0..count).map(|_| state.gl.create_vertex_array()).collect();
            let handles = state.tables.vertex_arrays.create_many(arrays);
            let raw: Vec<u32> = handles.iter().map(|h| h.raw()).collect();
            view.write_u32s(out as usize, &raw)?;
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "bindVertexArray",
        |mut caller: Caller<'_, BridgeData<H>>, vertex_array: u32| -> wasmtime::Result<()> {
            let state = caller.data_mut().state_mut();
            let vertex_array = state
                .tables
                .vertex_arrays
                .resolve(Handle::from(vertex_array))?;
            state.gl.bind_vertex_array(vertex_array);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "vertexAttribPointer",
        |mut caller: Caller<'_, BridgeData<H>>,
         location: u32,
         size: i32,
         ty: u32,
         normalized: u32,
         stride: i32,
         offset: i32| {
            caller.data_mut().state_mut().gl.vertex_attrib_pointer(
                location,
                size,
                ty,
                normalized != 0,
                stride,
                offset,
            );
        },
    )?;

    reg.func_wrap(
        "gl",
        "enableVertexAttribArray",
        |mut caller: Caller<'_, BridgeData<H>>, location: u32| {
            caller
                .data_mut()
                .state_mut()
                .gl
                .enable_vertex_attrib_array(location);
        },
    )?;

    reg.func_wrap(
        "gl",
        "createTexture",
        |mut caller: Caller<'_, BridgeData<H>>| -> u32 {
            let state = caller.data_mut().state_mut();
            let texture = state.gl.create_texture();
            state.tables.textures.create(texture).raw()
        },
    )?;

    reg.func_wrap(
        "gl",
        "genTextures",
        |mut caller: Caller<'_, BridgeData<H>>, count: u32, out: u32| -> wasmtime::Result<()> {
            let (mut view, data) = split(&mut caller)?;
            let state = data.state_mut();

            let textures: Vec<_> = (0..count).map(|_| state.gl.create_texture()).collect();
            let handles = state.tables.textures.create_many(textures);
            let raw: Vec<u32> = handles.iter().map(|h| h.raw()).collect();
            view.write_u32s(out as usize, &raw)?;
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "bindTexture",
        |mut caller: Caller<'_, BridgeData<H>>, target: u32, texture: u32| -> wasmtime::Result<()> {
            let state = caller.data_mut().state_mut();
            let texture = state.tables.textures.resolve(Handle::from(texture))?;
            state.gl.bind_texture(target, texture);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "texImage2D",
        |mut caller: Caller<'_, BridgeData<H>>,
         target: u32,
         level: i32,
         internal_format: i32,
         width: u32,
         height: u32,
         border: i32,
         format: u32,
         ty: u32,
         ptr: u32|
         -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            // Single-channel payload: one byte per texel.
            let len = width as usize * height as usize;
            let pixels = view.read_bytes(ptr as usize, len)?;
            data.state_mut().gl.tex_image_2d(
                target,
                level,
                internal_format,
                width,
                height,
                border,
                format,
                ty,
                pixels,
            );
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "texParameteri",
        |mut caller: Caller<'_, BridgeData<H>>, target: u32, pname: u32, param: i32| {
            caller
                .data_mut()
                .state_mut()
                .gl
                .tex_parameter_i(target, pname, param);
        },
    )?;

    reg.func_wrap(
        "gl",
        "getUniformLocation",
        |mut caller: Caller<'_, BridgeData<H>>, program: u32, name: u32| -> wasmtime::Result<u32> {
            let (view, data) = split(&mut caller)?;
            let name = view.read_cstring(name as usize)?;

            let state = data.state_mut();
            let program = state.tables.programs.resolve(Handle::from(program))?;
            let location = state.gl.get_uniform_location(program, &name);
            Ok(state.tables.uniform_locations.create(location).raw())
        },
    )?;

    reg.func_wrap(
        "gl",
        "uniform1i",
        |mut caller: Caller<'_, BridgeData<H>>, location: u32, value: i32| -> wasmtime::Result<()> {
            let state = caller.data_mut().state_mut();
            let location = state
                .tables
                .uniform_locations
                .resolve(Handle::from(location))?;
            state.gl.uniform_1i(location, value);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "gl",
        "drawElements",
        |mut caller: Caller<'_, BridgeData<H>>, mode: u32, count: i32, ty: u32, offset: i32| {
            caller
                .data_mut()
                .state_mut()
                .gl
                .draw_elements(mode, count, ty, offset);
        },
    )?;

    reg.func_wrap(
        "gl",
        "clearColor",
        |mut caller: Caller<'_, BridgeData<H>>, r: f32, g: f32, b: f32, a: f32| {
            caller.data_mut().state_mut().gl.clear_color(r, g, b, a);
        },
    )?;

    reg.func_wrap(
        "gl",
        "clear",
        |mut caller: Caller<'_, BridgeData<H>>, mask: u32| {
            caller.data_mut().state_mut().gl.clear(mask);
        },
    )?;

    reg.func_wrap(
        "gl",
        "viewport",
        |mut caller: Caller<'_, BridgeData<H>>, x: i32, y: i32, width: i32, height: i32| {
            caller.data_mut().state_mut().gl.viewport(x, y, width, height);
        },
    )?;

    reg.func_wrap(
        "gl",
        "enable",
        |mut caller: Caller<'_, BridgeData<H>>, capability: u32| {
            caller.data_mut().state_mut().gl.enable(capability);
        },
    )?;

    reg.func_wrap(
        "gl",
        "disable",
        |mut caller: Caller<'_, BridgeData<H>>, capability: u32| {
            caller.data_mut().state_mut().gl.disable(capability);
        },
    )?;

    reg.func_wrap(
        "gl",
        "blendFunc",
        |mut caller: Caller<'_, BridgeData<H>>, sfactor: u32, dfactor: u32| {
            caller.data_mut().state_mut().gl.blend_func(sfactor, dfactor);
        },
    )?;

    reg.func_wrap(
        "gl",
        "depthFunc",
        |mut caller: Caller<'_, BridgeData<H>>, func: u32| {
            caller.data_mut().state_mut().gl.depth_func(func);
        },
    )?;

    reg.func_wrap(
        "gl",
        "colorMask",
        |mut caller: Caller<'_, BridgeData<H>>, r: u32, g: u32, b: u32, a: u32| {
            caller
                .data_mut()
                .state_mut()
                .gl
                .color_mask(r != 0, g != 0, b != 0, a != 0);
        },
    )?;

    reg.func_wrap(
        "gl",
        "activeTexture",
        |mut caller: Caller<'_, BridgeData<H>>, unit: u32| {
            caller.data_mut().state_mut().gl.active_texture(unit);
        },
    )?;

    reg.func_wrap(
        "gl",
        "bindFramebuffer",
        |mut caller: Caller<'_, BridgeData<H>>, target: u32, framebuffer: u32| {
            // Slot 0 is "no object bound" — the default framebuffer — and
            // must never resolve to an allocated object. Nonzero values
            // pass through untranslated; no framebuffer table exists on
            // this surface.
            let framebuffer = (framebuffer != 0).then_some(framebuffer);
            caller
                .data_mut()
                .state_mut()
                .gl
                .bind_framebuffer(target, framebuffer);
        },
    )?;

    Ok(())
}
