//! Compression codecs used for layer blobs.
//!
//! # Supported Codecs
//!
//! - **Gzip**: the historical default of image builders
//! - **Zstd**: accepted by OCI runtimes, faster to decompress

use std::fmt;
use std::io::Read;
use std::io::{self};

use flate2::read::MultiGzDecoder;

/// Compression codec of a layer blob.
///
/// # Examples
///
/// ```
/// use layerscan_core::formats::CompressionCodec;
///
/// assert_eq!(CompressionCodec::Gzip.name(), "gzip");
/// assert_eq!(CompressionCodec::Zstd.to_string(), "zstd");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionCodec {
    /// Gzip compression (deflate algorithm).
    Gzip,

    /// Zstd compression (Zstandard algorithm).
    Zstd,
}

impl CompressionCodec {
    /// Leading bytes identifying a stream compressed with this codec.
    #[must_use]
    pub const fn magic(self) -> &'static [u8] {
        match self {
            Self::Gzip => &[0x1f, 0x8b],
            Self::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
        }
    }

    /// Short lowercase name of the codec.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// Wraps `reader` in a decoder for this codec.
    ///
    /// Gzip streams with several members are decoded as one stream.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the decoder cannot be initialized.
    pub fn decoder<'a, R>(self, reader: R) -> io::Result<Box<dyn Read + Send + 'a>>
    where
        R: Read + Send + 'a,
    {
        Ok(match self {
            Self::Gzip => Box::new(MultiGzDecoder::new(reader)),
            Self::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_gzip_decoder() {
        let data = test_utils::gzip(b"layer bytes");
        let mut out = Vec::new();
        CompressionCodec::Gzip
            .decoder(data.as_slice())
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"layer bytes");
    }

    #[test]
    fn test_zstd_decoder() {
        let data = test_utils::zstd(b"layer bytes");
        let mut out = Vec::new();
        CompressionCodec::Zstd
            .decoder(data.as_slice())
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"layer bytes");
    }

    #[test]
    fn test_multi_member_gzip() {
        let mut data = test_utils::gzip(b"first ");
        data.extend(test_utils::gzip(b"second"));
        let mut out = String::new();
        CompressionCodec::Gzip
            .decoder(data.as_slice())
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "first second");
    }

    #[test]
    fn test_magic() {
        assert_eq!(CompressionCodec::Gzip.magic(), &[0x1f, 0x8b]);
        assert_eq!(CompressionCodec::Zstd.magic().len(), 4);
    }
}
