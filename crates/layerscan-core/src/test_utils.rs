//! Test utilities for building in-memory layers.
//!
//! Used by unit tests, integration tests and benches to assemble tar streams
//! with whiteout markers, opaque markers, links and special files.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::walker::OPAQUE_MARKER;
use crate::walker::WHITEOUT_PREFIX;

/// Creates an in-memory layer from a list of regular files.
///
/// # Examples
///
/// ```
/// use layerscan_core::test_utils::create_test_layer;
///
/// let layer = create_test_layer(vec![("etc/hostname", b"box\n"), ("etc/motd", b"hi\n")]);
/// assert!(!layer.is_empty());
/// ```
#[must_use]
pub fn create_test_layer(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    entries
        .into_iter()
        .fold(TarTestBuilder::new(), |builder, (path, data)| {
            builder.add_file(path, data)
        })
        .build()
}

/// Compresses a layer with gzip.
#[must_use]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Compresses a layer with zstd.
#[must_use]
pub fn zstd(data: &[u8]) -> Vec<u8> {
    zstd::encode_all(data, 0).unwrap()
}

/// Builder for layers with every entry kind the walker distinguishes.
///
/// # Examples
///
/// ```
/// use layerscan_core::test_utils::TarTestBuilder;
///
/// let layer = TarTestBuilder::new()
///     .add_directory("etc/")
///     .add_file("etc/os-release", b"ID=alpine\n")
///     .add_whiteout("etc/", "hostname")
///     .add_opaque("var/cache/")
///     .add_symlink("bin/sh", "busybox")
///     .build();
/// assert!(!layer.is_empty());
/// ```
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    /// Creates a new layer builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Adds a regular file.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a regular file with custom mode.
    #[must_use]
    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_mtime(1_700_000_000);
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a regular file whose name is carried by a PAX `path` record.
    #[must_use]
    pub fn add_pax_file(mut self, path: &str, data: &[u8]) -> Self {
        self.builder
            .append_pax_extensions([("path", path.as_bytes())])
            .unwrap();
        let mut header = tar::Header::new_ustar();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.builder
            .append_data(&mut header, "pax-placeholder", data)
            .unwrap();
        self
    }

    /// Adds a regular file with the name written verbatim into the header.
    ///
    /// Allows names such as `/etc/passwd` or `./a/../b` that the `tar`
    /// builder refuses. `path` must fit in 100 bytes.
    #[must_use]
    pub fn add_raw_file(mut self, path: &str, data: &[u8]) -> Self {
        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..path.len()].copy_from_slice(path.as_bytes());
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Adds a symlink.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.add_link(path, target, tar::EntryType::Symlink, 0o777)
    }

    /// Adds a hard link.
    #[must_use]
    pub fn add_hardlink(self, path: &str, target: &str) -> Self {
        self.add_link(path, target, tar::EntryType::Link, 0o644)
    }

    fn add_link(mut self, path: &str, target: &str, kind: tar::EntryType, mode: u32) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(mode);
        header.set_entry_type(kind);
        self.builder.append_link(&mut header, path, target).unwrap();
        self
    }

    /// Adds a named pipe.
    #[must_use]
    pub fn add_fifo(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Fifo);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Adds a whiteout marker deleting `name` inside `dir`.
    ///
    /// `dir` is either empty or ends with `/`.
    #[must_use]
    pub fn add_whiteout(self, dir: &str, name: &str) -> Self {
        let path = format!("{dir}{WHITEOUT_PREFIX}{name}");
        self.add_file(&path, b"")
    }

    /// Adds an opaque marker for `dir`.
    ///
    /// `dir` is either empty or ends with `/`.
    #[must_use]
    pub fn add_opaque(self, dir: &str) -> Self {
        let path = format!("{dir}{OPAQUE_MARKER}");
        self.add_file(&path, b"")
    }

    /// Builds and returns the layer bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

impl Default for TarTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
