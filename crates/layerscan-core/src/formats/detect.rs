//! Layer compression detection.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use crate::Result;
use crate::WalkError;
use crate::formats::CompressionCodec;

/// Detects the compression codec from the leading bytes of a blob.
///
/// Returns `None` for anything that is not gzip or zstd; such blobs are read
/// as plain tar.
///
/// # Examples
///
/// ```
/// use layerscan_core::formats::CompressionCodec;
/// use layerscan_core::formats::detect_compression;
///
/// assert_eq!(detect_compression(&[0x1f, 0x8b, 0x08]), Some(CompressionCodec::Gzip));
/// assert_eq!(detect_compression(&[0x28, 0xb5, 0x2f, 0xfd]), Some(CompressionCodec::Zstd));
/// assert_eq!(detect_compression(b"etc/"), None);
/// ```
#[must_use]
pub fn detect_compression(head: &[u8]) -> Option<CompressionCodec> {
    [CompressionCodec::Gzip, CompressionCodec::Zstd]
        .into_iter()
        .find(|codec| head.starts_with(codec.magic()))
}

/// Wraps a layer stream in the decoder matching its leading bytes.
///
/// Returns the detected codec along with the uncompressed tar stream.
///
/// # Errors
///
/// Returns an I/O error if the leading bytes cannot be read or the decoder
/// cannot be initialized.
pub fn decode_layer<'a, R>(reader: R) -> Result<(Option<CompressionCodec>, Box<dyn Read + Send + 'a>)>
where
    R: Read + Send + 'a,
{
    let mut reader = BufReader::new(reader);
    let codec = detect_compression(reader.fill_buf()?);

    let decoded: Box<dyn Read + Send + 'a> = match codec {
        Some(codec) => codec.decoder(reader)?,
        None => Box::new(reader),
    };
    Ok((codec, decoded))
}

/// Opens a layer blob on disk as an uncompressed tar stream.
///
/// # Errors
///
/// Returns [`WalkError::SourceNotFound`] if the file does not exist and an
/// I/O error if it cannot be opened or decoded.
pub fn open_layer(path: &Path) -> Result<(Option<CompressionCodec>, Box<dyn Read + Send>)> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WalkError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            WalkError::Io(e)
        }
    })?;
    decode_layer(file)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use tempfile::TempDir;

    fn decoded(data: &[u8]) -> (Option<CompressionCodec>, Vec<u8>) {
        let (codec, mut reader) = decode_layer(data).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        (codec, out)
    }

    #[test]
    fn test_plain_tar() {
        let layer = test_utils::create_test_layer(vec![("a", b"1")]);
        let (codec, out) = decoded(&layer);
        assert_eq!(codec, None);
        assert_eq!(out, layer);
    }

    #[test]
    fn test_gzip_layer() {
        let layer = test_utils::create_test_layer(vec![("a", b"1")]);
        let (codec, out) = decoded(&test_utils::gzip(&layer));
        assert_eq!(codec, Some(CompressionCodec::Gzip));
        assert_eq!(out, layer);
    }

    #[test]
    fn test_zstd_layer() {
        let layer = test_utils::create_test_layer(vec![("a", b"1")]);
        let (codec, out) = decoded(&test_utils::zstd(&layer));
        assert_eq!(codec, Some(CompressionCodec::Zstd));
        assert_eq!(out, layer);
    }

    #[test]
    fn test_empty_input() {
        let (codec, out) = decoded(&[]);
        assert_eq!(codec, None);
        assert!(out.is_empty());
    }

    #[test]
    fn test_short_prefix_is_not_zstd() {
        assert_eq!(detect_compression(&[0x28, 0xb5]), None);
    }

    #[test]
    fn test_open_layer_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sha256-abc");
        let layer = test_utils::create_test_layer(vec![("etc/hostname", b"box")]);
        std::fs::write(&path, test_utils::gzip(&layer)).unwrap();

        let (codec, mut reader) = open_layer(&path).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(codec, Some(CompressionCodec::Gzip));
        assert_eq!(out, layer);
    }

    #[test]
    fn test_open_layer_missing() {
        let result = open_layer(Path::new("/nonexistent/layer.tar"));
        assert!(matches!(result, Err(WalkError::SourceNotFound { .. })));
    }
}
