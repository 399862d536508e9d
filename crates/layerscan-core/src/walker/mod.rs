//! Walkers feeding entries to analysis callbacks.
//!
//! - [`LayerWalker`] makes one forward pass over a layer tar stream, records
//!   whiteout and opaque markers and delivers every remaining entry that
//!   survives the skip policy.
//! - [`FsWalker`] walks a local directory tree with the same skip policy.
//!
//! Both hand each delivered entry to a callback together with its metadata
//! and a [`ContentAccessor`](crate::ContentAccessor). Returning an error from
//! the callback aborts the walk.

mod fs;
mod layer;

pub use fs::FsWalker;
pub use layer::LayerChanges;
pub use layer::LayerWalker;

/// Name of the marker entry hiding a directory's lower-layer contents.
pub const OPAQUE_MARKER: &str = ".wh..wh..opq";

/// Name prefix of marker entries deleting a lower-layer path.
pub const WHITEOUT_PREFIX: &str = ".wh.";
