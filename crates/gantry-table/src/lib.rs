//! Gantry Handle Tables
//!
//! This crate owns the bookkeeping that lets a guest module refer to
//! host-side objects it cannot hold directly:
//!
//! - [`HandleTable`]: one per resource category, mapping dense integer
//!   handles to host objects
//! - [`MediaCache`]: path-keyed lazy cache for named media (images, sounds)
//!
//! # Handle discipline
//!
//! Handles are small non-negative integers, unique within their category,
//! assigned in creation order starting at zero. They are never recycled:
//! [`HandleTable::delete`] is accepted and logged but releases nothing, so a
//! handle stays valid for the life of the process. Guests rely on this
//! stability — they pair batch-created handles positionally with their own
//! bookkeeping and never expect an index to be reused.
//!
//! The cost is unbounded growth in long sessions that create and discard
//! many resources. That leak is inherited from the wire contract and is the
//! documented trade-off, not an oversight.

pub mod error;
pub mod media;
pub mod table;

pub use error::{TableError, TableResult};
pub use media::MediaCache;
pub use table::{Handle, HandleTable};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{TableError, TableResult};
    pub use crate::media::MediaCache;
    pub use crate::table::{Handle, HandleTable};
}
