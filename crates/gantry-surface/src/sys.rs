//! Diagnostics and time entry points (`sys` import module).

use tracing::info;
use wasmtime::Caller;

use gantry_mem::split;

use crate::api::{ClockApi, HostBackend};
use crate::registry::{Registrar, SurfaceResult};
use crate::state::BridgeData;

pub(crate) fn register<H: HostBackend>(
    reg: &mut Registrar<'_, BridgeData<H>>,
) -> SurfaceResult<()> {
    reg.func_wrap(
        "sys",
        "debugPrint",
        |mut caller: Caller<'_, BridgeData<H>>, message: u32| -> wasmtime::Result<()> {
            let (view, _) = split(&mut caller)?;
            let message = view.read_cstring(message as usize)?;
            info!(target: "guest", "{message}");
            Ok(())
        },
    )?;

    reg.func_wrap(
        "sys",
        "timestampMillis",
        |mut caller: Caller<'_, BridgeData<H>>| -> i64 {
            caller.data_mut().state_mut().clock.now_millis()
        },
    )?;

    Ok(())
}
