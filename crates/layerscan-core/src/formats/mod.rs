//! Layer blob decoding.
//!
//! Image layers are distributed as plain, gzip-compressed or
//! zstd-compressed tar streams. The codec is detected from the leading magic
//! bytes, never from the file name, since blobs are usually named by digest.

pub mod compression;
pub mod detect;

pub use compression::CompressionCodec;
pub use detect::decode_layer;
pub use detect::detect_compression;
pub use detect::open_layer;
