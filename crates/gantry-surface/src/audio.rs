//! Named sound entry points (`audio` import module).
//!
//! Sounds are keyed by path and created by `loadSound`; one live sound per
//! path, so a sound cannot overlap itself. Referencing a path that was
//! never loaded is a protocol desync and traps.

use wasmtime::Caller;

use gantry_mem::split;

use crate::api::{AudioApi, HostBackend};
use crate::registry::{Registrar, SurfaceResult};
use crate::state::BridgeData;

pub(crate) fn register<H: HostBackend>(
    reg: &mut Registrar<'_, BridgeData<H>>,
) -> SurfaceResult<()> {
    reg.func_wrap(
        "audio",
        "loadSound",
        |mut caller: Caller<'_, BridgeData<H>>, path: u32, looped: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;
            let looped = looped != 0;

            let state = data.state_mut();
            let audio = &mut state.audio;
            let sound = state
                .sounds
                .get_or_insert_with(&path, || audio.load(&path, looped));
            // A repeated load keeps the cached sound; only the loop flag
            // is refreshed.
            audio.set_loop(sound, looped);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "audio",
        "playSound",
        |mut caller: Caller<'_, BridgeData<H>>, path: u32, restart: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;

            let state = data.state_mut();
            let sound = state.sounds.get_mut(&path)?;
            // Guests call this every frame; restarting a long sound each
            // time would reduce it to a stutter. Only a stopped sound (or
            // an explicit restart request) plays from the top.
            if restart != 0 || !state.audio.is_playing(sound) {
                state.audio.play_from_start(sound);
            }
            Ok(())
        },
    )?;

    reg.func_wrap(
        "audio",
        "pauseSound",
        |mut caller: Caller<'_, BridgeData<H>>, path: u32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;

            let state = data.state_mut();
            let sound = state.sounds.get_mut(&path)?;
            state.audio.pause(sound);
            Ok(())
        },
    )?;

    reg.func_wrap(
        "audio",
        "setSoundVolume",
        |mut caller: Caller<'_, BridgeData<H>>, path: u32, volume: f32| -> wasmtime::Result<()> {
            let (view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;

            let state = data.state_mut();
            let sound = state.sounds.get_mut(&path)?;
            state.audio.set_volume(sound, volume);
            Ok(())
        },
    )?;

    Ok(())
}
