//! Entry metadata types shared by the walkers and their callbacks.

pub mod entry_kind;
pub mod file_info;

pub use entry_kind::EntryKind;
pub use file_info::FileInfo;
