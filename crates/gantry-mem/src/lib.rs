//! Gantry Memory View
//!
//! This crate provides the marshalling layer between host-native strings and
//! byte buffers and a guest module's linear memory. It includes:
//!
//! - [`MemoryView`]: bounded reads and writes over the guest's memory region
//! - [`split`]: per-call derivation of a view plus the store state
//! - [`decode_latin1`] / [`encode_latin1`]: the single-byte text wire codec
//!
//! # The memory region is not stable
//!
//! Guest linear memory can grow, and growth may move the backing allocation.
//! A `MemoryView` therefore only lives for the duration of one host call:
//! every entry point re-derives its view from the live [`wasmtime::Memory`]
//! via [`split`], and nothing in this crate caches a pointer across calls.
//!
//! # Text encoding
//!
//! The wire contract for guest strings is one byte per character: a C string
//! in guest memory is a NUL-terminated run of bytes, each decoded as the
//! Unicode scalar with the same value (Latin-1). This is deliberately not
//! UTF-8 — guests pair every string with an exact byte length, and a
//! multi-byte decode would break the strict-length transfer contract.
//!
//! # Example
//!
//! ```ignore
//! use gantry_mem::split;
//!
//! linker.func_wrap("canvas", "setFillStyle", |mut caller: Caller<'_, State>, ptr: u32| {
//!     let (view, state) = split(&mut caller)?;
//!     let color = view.read_cstring(ptr as usize)?;
//!     state.canvas.set_fill_style(&color);
//!     Ok(())
//! })?;
//! ```

pub mod error;
pub mod view;

pub use error::{MemoryError, MemoryResult};
pub use view::{MEMORY_EXPORT, MemoryView, decode_latin1, encode_latin1, split};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MemoryError, MemoryResult};
    pub use crate::view::{MemoryView, split};
}
