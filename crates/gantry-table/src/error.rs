//! Error types for resource lookup.

use thiserror::Error;

/// Errors raised when resolving guest-supplied resource references.
///
/// Both variants mean the guest referenced something it never created —
/// a protocol desync that this layer cannot recover from. Callers propagate
/// these out of the host function, trapping the guest.
#[derive(Debug, Error)]
pub enum TableError {
    /// A handle outside the range this category has ever allocated.
    #[error("Unknown {category} handle {handle} (only {live} allocated)")]
    UnknownHandle {
        /// The resource category name.
        category: &'static str,
        /// The handle value the guest passed.
        handle: u32,
        /// How many handles this category has allocated.
        live: usize,
    },

    /// A named media path that was never loaded.
    #[error("Unknown {kind} path '{path}' (never loaded)")]
    UnknownMedia {
        /// The media kind ("image", "sound").
        kind: &'static str,
        /// The path the guest passed.
        path: String,
    },
}

/// Result type for table operations.
pub type TableResult<T> = std::result::Result<T, TableError>;
