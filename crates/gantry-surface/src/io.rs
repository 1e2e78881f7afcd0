//! Blocking file and storage entry points (`io` import module).
//!
//! These are the bridge's only slow operations, and they block the calling
//! thread on purpose: the guest cannot await, so the read either completes
//! before the call returns or reports failure.
//!
//! Transfers follow a two-call protocol. The guest first asks for the size
//! (`-1` if the resource does not exist), allocates a buffer of exactly
//! that size, then requests the read with the expected length. A read whose
//! actual content length differs from the expected length fails without
//! touching guest memory — the guest's view of the resource is stale and
//! truncating or padding would hide it.

use tracing::{debug, warn};
use wasmtime::Caller;

use gantry_mem::{MemoryError, encode_latin1, split};

use crate::api::{FileApi, HostBackend, StorageApi};
use crate::registry::{Registrar, SurfaceResult};
use crate::state::BridgeData;

/// Sentinel size for a resource that does not exist.
const NO_SUCH_RESOURCE: i32 = -1;

fn text_size(text: &str) -> i32 {
    encode_latin1(text).len() as i32
}

/// Copy `text` into guest memory iff its wire length equals `len`.
///
/// Returns the wire failure signal (`0`) on a length mismatch, and
/// propagates anything else (an out-of-bounds destination is a desync, not
/// a recoverable miss).
fn copy_payload(
    view: &mut gantry_mem::MemoryView<'_>,
    path: &str,
    text: &str,
    ptr: u32,
    len: u32,
) -> wasmtime::Result<i32> {
    let payload = encode_latin1(text);
    match view.write_exact(ptr as usize, len as usize, &payload) {
        Ok(()) => Ok(1),
        Err(MemoryError::LengthMismatch { expected, actual }) => {
            warn!(path, expected, actual, "Resource length does not match requested length");
            Ok(0)
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn register<H: HostBackend>(
    reg: &mut Registrar<'_, BridgeData<H>>,
) -> SurfaceResult<()> {
    reg.func_wrap(
        "io",
        "getRemoteFileSize",
        |mut caller: Caller<'_, BridgeData<H>>, path: u32| -> wasmtime::Result<i32> {
            let (view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;

            match data.state_mut().files.fetch(&path) {
                Some(text) => Ok(text_size(&text)),
                None => {
                    debug!(path, "Remote file not found");
                    Ok(NO_SUCH_RESOURCE)
                }
            }
        },
    )?;

    reg.func_wrap(
        "io",
        "readRemoteFile",
        |mut caller: Caller<'_, BridgeData<H>>,
         path: u32,
         ptr: u32,
         len: u32|
         -> wasmtime::Result<i32> {
            let (mut view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;

            let Some(text) = data.state_mut().files.fetch(&path) else {
                debug!(path, "Remote file not found");
                return Ok(0);
            };
            copy_payload(&mut view, &path, &text, ptr, len)
        },
    )?;

    reg.func_wrap(
        "io",
        "getStorageFileSize",
        |mut caller: Caller<'_, BridgeData<H>>, path: u32| -> wasmtime::Result<i32> {
            let (view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;

            match data.state_mut().storage.read(&path) {
                Some(text) => Ok(text_size(&text)),
                None => Ok(NO_SUCH_RESOURCE),
            }
        },
    )?;

    reg.func_wrap(
        "io",
        "readStorageFile",
        |mut caller: Caller<'_, BridgeData<H>>,
         path: u32,
         ptr: u32,
         len: u32|
         -> wasmtime::Result<i32> {
            let (mut view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;

            let Some(text) = data.state_mut().storage.read(&path) else {
                debug!(path, "Storage key not found");
                return Ok(0);
            };
            copy_payload(&mut view, &path, &text, ptr, len)
        },
    )?;

    reg.func_wrap(
        "io",
        "writeStorageFile",
        |mut caller: Caller<'_, BridgeData<H>>, path: u32, text: u32| -> wasmtime::Result<i32> {
            let (view, data) = split(&mut caller)?;
            let path = view.read_cstring(path as usize)?;
            let text = view.read_cstring(text as usize)?;

            let ok = data.state_mut().storage.write(&path, &text);
            if !ok {
                warn!(path, "Storage write failed");
            }
            Ok(ok as i32)
        },
    )?;

    Ok(())
}
