//! Input mapping entry point (`input` import module).

use std::collections::HashMap;
use std::sync::OnceLock;

use wasmtime::Caller;

use gantry_mem::split;

use crate::api::HostBackend;
use crate::registry::{Registrar, SurfaceResult};
use crate::state::BridgeData;

/// The fixed, ordered key list. A key's code is its position here; the
/// order is wire contract and must never change.
pub const KEYS: &[&str] = &[
    " ",
    "alt",
    "control",
    "shift",
    "enter",
    "tab",
    "arrowdown",
    "arrowup",
    "arrowleft",
    "arrowright",
    "backspace",
    "delete",
    "escape",
    "meta",
    "a",
    "b",
    "c",
    "d",
    "e",
    "f",
    "g",
    "h",
    "i",
    "j",
    "k",
    "l",
    "m",
    "n",
    "o",
    "p",
    "q",
    "r",
    "s",
    "t",
    "u",
    "v",
    "w",
    "x",
    "y",
    "z",
    "1",
    "2",
    "3",
    "4",
    "5",
    "6",
    "7",
    "8",
    "9",
    "0",
    "[",
    "]",
    ";",
    "'",
    "\\",
    "/",
    ".",
    ",",
    "`",
];

/// Offset past the list end for keys that are not mapped.
const UNKNOWN_KEY_OFFSET: i32 = 20;

/// Map a key name to its code; unknown keys land outside the valid range.
pub fn keycode(key: &str) -> i32 {
    static INDEX: OnceLock<HashMap<&'static str, i32>> = OnceLock::new();
    let index = INDEX.get_or_init(|| {
        KEYS.iter()
            .enumerate()
            .map(|(i, &key)| (key, i as i32))
            .collect()
    });

    let lowered = key.to_lowercase();
    index
        .get(lowered.as_str())
        .copied()
        .unwrap_or(KEYS.len() as i32 + UNKNOWN_KEY_OFFSET)
}

pub(crate) fn register<H: HostBackend>(
    reg: &mut Registrar<'_, BridgeData<H>>,
) -> SurfaceResult<()> {
    reg.func_wrap(
        "input",
        "keycodeOf",
        |mut caller: Caller<'_, BridgeData<H>>, key: u32| -> wasmtime::Result<i32> {
            let (view, _) = split(&mut caller)?;
            let key = view.read_cstring(key as usize)?;
            Ok(keycode(&key))
        },
    )?;

    Ok(())
}
