//! 2D drawing entry points (`canvas` import module).
//!
//! Thin forwarding: decode up to one string argument, pass numbers through,
//! call the canvas backend. The only stateful member is `drawImage`, which
//! resolves its path through the image cache (one decoded image per path,
//! created on first draw).

use wasmtime::Caller;

use gantry_mem::split;

use crate::api::{CanvasApi, HostBackend, Rect};
use crate::registry::{Registrar, SurfaceResult};
use crate::state::BridgeData;

pub(crate) fn register<H: HostBackend>(
    reg: &mut Registrar<'_, BridgeData<H>>,
) -> SurfaceResult<()> {
    reg.func_wrap(
        "canvas",
        "clear",
        |mut caller: Caller<'_, BridgeData<H>>, color: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let color = view.read_cstring(color as usize)?;
            data.state_mut().canvas.clear(&color);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "canvas",
        "fillRect",
        |mut caller: Caller<'_, BridgeData<H>>, x: f32, y: f32, w: f32, h: f32| {
            caller.data_mut().state_mut().canvas.fill_rect(x, y, w, h);
        },
    )?;

    reg.func_wrap(
        "canvas",
        "roundRect",
        |mut caller: Caller<'_, BridgeData<H>>, x: f32, y: f32, w: f32, h: f32, radius: f32| {
            caller
                .data_mut()
                .state_mut()
                .canvas
                .round_rect(x, y, w, h, radius);
        },
    )?;

    reg.func_wrap(
        "canvas",
        "setFillStyle",
        |mut caller: Caller<'_, BridgeData<H>>, color: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let color = view.read_cstring(color as usize)?;
            data.state_mut().canvas.set_fill_style(&color);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "canvas",
        "setStrokeStyle",
        |mut caller: Caller<'_, BridgeData<H>>, color: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let color = view.read_cstring(color as usize)?;
            data.state_mut().canvas.set_stroke_style(&color);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "canvas",
        "setLineWidth",
        |mut caller: Caller<'_, BridgeData<H>>, width: f32| {
            caller.data_mut().state_mut().canvas.set_line_width(width);
        },
    )?;

    reg.func_wrap(
        "canvas",
        "beginPath",
        |mut caller: Caller<'_, BridgeData<H>>| {
            caller.data_mut().state_mut().canvas.begin_path();
        },
    )?;

    reg.func_wrap(
        "canvas",
        "closePath",
        |mut caller: Caller<'_, BridgeData<H>>| {
            caller.data_mut().state_mut().canvas.close_path();
        },
    )?;

    reg.func_wrap(
        "canvas",
        "moveTo",
        |mut caller: Caller<'_, BridgeData<H>>, x: f32, y: f32| {
            caller.data_mut().state_mut().canvas.move_to(x, y);
        },
    )?;

    reg.func_wrap(
        "canvas",
        "lineTo",
        |mut caller: Caller<'_, BridgeData<H>>, x: f32, y: f32| {
            caller.data_mut().state_mut().canvas.line_to(x, y);
        },
    )?;

    reg.func_wrap("canvas", "fill", |mut caller: Caller<'_, BridgeData<H>>| {
        caller.data_mut().state_mut().canvas.fill();
    })?;

    reg.func_wrap("canvas", "stroke", |mut caller: Caller<'_, BridgeData<H>>| {
        caller.data_mut().state_mut().canvas.stroke();
    })?;

    reg.func_wrap(
        "canvas",
        "ellipse",
        |mut caller: Caller<'_, BridgeData<H>>,
         x: f32,
         y: f32,
         radius_x: f32,
         radius_y: f32,
         rotation: f32,
         start_angle: f32,
         end_angle: f32,
         counterclockwise: u32| {
            caller.data_mut().state_mut().canvas.ellipse(
                x,
                y,
                radius_x,
                radius_y,
                rotation,
                start_angle,
                end_angle,
                counterclockwise != 0,
            );
        },
    )?;

    reg.func_wrap(
        "canvas",
        "setFont",
        |mut caller: Caller<'_, BridgeData<H>>, font: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let font = view.read_cstring(font as usize)?;
            data.state_mut().canvas.set_font(&font);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "canvas",
        "setTextAlign",
        |mut caller: Caller<'_, BridgeData<H>>, align: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let align = view.read_cstring(align as usize)?;
            data.state_mut().canvas.set_text_align(&align);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "canvas",
        "fillText",
        |mut caller: Caller<'_, BridgeData<H>>,
         text: u32,
         x: f32,
         y: f32,
         max_width: f32|
         -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let text = view.read_cstring(text as usize)?;
            data.state_mut().canvas.fill_text(&text, x, y, max_width);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "canvas",
        "setCursor",
        |mut caller: Caller<'_, BridgeData<H>>, style: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            // Guests name cursors with underscores; hosts expect dashes.
            let style = view.read_cstring(style as usize)?.replace('_', "-");
            data.state_mut().canvas.set_cursor(&style);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "canvas",
        "drawImage",
        |mut caller: Caller<'_, BridgeData<H>>,
         path: u32,
         sx: f32,
         sy: f32,
         sw: f32,
         sh: f32,
         dx: f32,
         dy: f32,
         dw: f32,
         dh: f32|
         -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;

            let state = data.state_mut();
            let canvas = &mut state.canvas;
            let image = state
                .images
                .get_or_insert_with(&path, || canvas.load_image(&path));
            canvas.draw_image(image, Rect::new(sx, sy, sw, sh), Rect::new(dx, dy, dw, dh));
            Ok(())
        },
    )?;

    Ok(())
}
