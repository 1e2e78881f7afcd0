//! Error types for linear-memory marshalling.
//!
//! Every variant here is a protocol desync: the guest handed the bridge a
//! pointer or length that disagrees with the actual state of its memory.
//! These errors are not recoverable at this layer — callers propagate them
//! out of the host function, which traps the guest.

use thiserror::Error;

/// Errors raised while marshalling data across the guest memory boundary.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The module does not export a memory under the expected name.
    #[error("Guest memory export '{0}' not found")]
    MissingMemory(&'static str),

    /// A pointer/length pair reaches past the end of the memory region.
    #[error("Memory access out of bounds: ptr={ptr}, len={len}, memory_size={memory_size}")]
    OutOfBounds {
        /// The offset requested.
        ptr: usize,
        /// The length requested.
        len: usize,
        /// The current size of the memory region.
        memory_size: usize,
    },

    /// A C-string scan reached the end of memory without finding a NUL byte.
    #[error("Unterminated string at ptr={ptr} (scanned to end of memory, size={memory_size})")]
    Unterminated {
        /// The offset the scan started at.
        ptr: usize,
        /// The current size of the memory region.
        memory_size: usize,
    },

    /// A strict-length transfer was attempted with a source of a different size.
    #[error("Transfer length mismatch: expected {expected} bytes, source has {actual}")]
    LengthMismatch {
        /// The length the caller committed to.
        expected: usize,
        /// The actual source length.
        actual: usize,
    },

    /// A typed payload read with a byte length that is not a whole number of elements.
    #[error("Byte length {len} is not a multiple of the {element}-byte element size")]
    Misaligned {
        /// The byte length requested.
        len: usize,
        /// The element size in bytes.
        element: usize,
    },
}

/// Result type for memory operations.
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;
