//! Forward-only tar decoding.
//!
//! [`TarStream`] reads one header at a time from any `Read` source and exposes
//! the entry body as a bounded reader. GNU long names (`L`), GNU long links
//! (`K`) and PAX extended headers (`x`) are folded into the entry they
//! describe; PAX global headers (`g`) are skipped.
//!
//! Unlike `tar::Archive`, the body reader only needs `R: Send`, so it can sit
//! behind a [`ContentAccessor`](crate::ContentAccessor) shared across threads.

use std::io::Read;
use std::io::{self};

use tar::EntryType;
use tar::Header;

use crate::Result;
use crate::WalkError;
use crate::types::EntryKind;
use crate::types::FileInfo;

/// Size of a tar block in bytes.
pub const BLOCK_SIZE: u64 = 512;

const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;
const MAX_METADATA_SIZE: u64 = 1 << 20;

/// Decoded header of one real entry.
///
/// `path` and `link_target` are raw, as recorded in the archive after GNU and
/// PAX overrides; callers normalize them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Entry name as recorded in the archive.
    pub path: String,
    /// Tar entry type.
    pub entry_type: EntryType,
    /// Size of the entry body in bytes.
    pub size: u64,
    /// Permission bits.
    pub mode: u32,
    /// Owner user id.
    pub uid: u64,
    /// Owner group id.
    pub gid: u64,
    /// Modification time in seconds since the epoch.
    pub mtime: u64,
    /// Link target for symlinks and hard links.
    pub link_target: Option<String>,
}

impl EntryHeader {
    /// Entry kind derived from the tar type.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        EntryKind::from(self.entry_type)
    }

    /// Builds the metadata handed to walk callbacks.
    #[must_use]
    pub fn file_info(&self, name: &str) -> FileInfo {
        FileInfo {
            name: name.to_string(),
            size: self.size,
            mode: self.mode,
            uid: self.uid,
            gid: self.gid,
            modified: FileInfo::mtime_to_system_time(self.mtime),
            kind: self.kind(),
            link_target: self.link_target.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Pending {
    long_name: Option<String>,
    long_link: Option<String>,
    pax_path: Option<String>,
    pax_link: Option<String>,
    pax_size: Option<u64>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.long_name.is_none()
            && self.long_link.is_none()
            && self.pax_path.is_none()
            && self.pax_link.is_none()
            && self.pax_size.is_none()
    }
}

/// Sequential tar header reader.
///
/// # Examples
///
/// ```
/// use layerscan_core::stream::TarStream;
/// use layerscan_core::test_utils::TarTestBuilder;
/// use std::io::Read;
///
/// let layer = TarTestBuilder::new()
///     .add_file("etc/hostname", b"box\n")
///     .build();
///
/// let mut stream = TarStream::new(layer.as_slice());
/// while let Some((header, mut body)) = stream.next_entry()? {
///     let mut content = String::new();
///     body.read_to_string(&mut content)?;
///     assert_eq!(header.path, "etc/hostname");
///     assert_eq!(content, "box\n");
///     body.finish()?;
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct TarStream<R> {
    reader: R,
    pos: u64,
    done: bool,
}

impl<R: Read> TarStream<R> {
    /// Creates a decoder positioned at the start of `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pos: 0,
            done: false,
        }
    }

    /// Byte offset of the decoder in the uncompressed stream.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.pos
    }

    /// Reads the next real entry.
    ///
    /// Returns `Ok(None)` at the end-of-archive marker or a clean end of
    /// stream. The body must be read or [`finish`](EntryBody::finish)ed
    /// before the next call, otherwise the decoder loses its position.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::Stream`] when the underlying reader fails or the
    /// stream ends mid-header, and [`WalkError::InvalidArchive`] when a
    /// header is malformed.
    pub fn next_entry(&mut self) -> Result<Option<(EntryHeader, EntryBody<'_, R>)>> {
        if self.done {
            return Ok(None);
        }

        let mut pending = Pending::default();
        loop {
            let mut block = [0u8; BLOCK_SIZE as usize];
            if !self.read_block(&mut block)? {
                self.done = true;
                return finish_archive(&pending);
            }

            if block.iter().all(|&b| b == 0) {
                self.done = true;
                return finish_archive(&pending);
            }

            let mut header = Header::new_old();
            header.as_mut_bytes().copy_from_slice(&block);
            verify_checksum(&header, &block)?;

            let entry_type = header.entry_type();
            let size = header_size(&header)?;

            match entry_type {
                EntryType::GNULongName => {
                    pending.long_name = Some(self.read_long_string(size)?);
                }
                EntryType::GNULongLink => {
                    pending.long_link = Some(self.read_long_string(size)?);
                }
                EntryType::XHeader => {
                    let data = self.read_metadata(size)?;
                    apply_pax(&mut pending, &data)?;
                }
                EntryType::XGlobalHeader => {
                    self.skip(padded(size)?)?;
                }
                _ => {
                    let entry = resolve(&header, entry_type, pending)?;
                    let body_size = entry.size;
                    let padding = padded(body_size)? - body_size;
                    let body = EntryBody {
                        reader: &mut self.reader,
                        pos: &mut self.pos,
                        remaining: body_size,
                        padding,
                    };
                    return Ok(Some((entry, body)));
                }
            }
        }
    }

    fn read_block(&mut self, block: &mut [u8]) -> Result<bool> {
        let mut filled = 0;
        while filled < block.len() {
            match self.reader.read(&mut block[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(self.stream_error(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "truncated tar header",
                    )));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.stream_error(e)),
            }
        }
        self.pos += BLOCK_SIZE;
        Ok(true)
    }

    fn read_metadata(&mut self, size: u64) -> Result<Vec<u8>> {
        if size > MAX_METADATA_SIZE {
            return Err(WalkError::InvalidArchive(format!(
                "extended header of {size} bytes exceeds {MAX_METADATA_SIZE} bytes"
            )));
        }
        let len = usize::try_from(size)
            .map_err(|_| WalkError::InvalidArchive(format!("invalid extended header size {size}")))?;
        let mut data = vec![0u8; len];
        if let Err(e) = self.reader.read_exact(&mut data) {
            return Err(self.stream_error(e));
        }
        self.pos += size;
        self.skip(padded(size)? - size)?;
        Ok(data)
    }

    fn read_long_string(&mut self, size: u64) -> Result<String> {
        let mut data = self.read_metadata(size)?;
        while data.last() == Some(&0) {
            data.pop();
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        match io::copy(&mut (&mut self.reader).take(len), &mut io::sink()) {
            Ok(n) if n == len => {
                self.pos += len;
                Ok(())
            }
            Ok(n) => {
                self.pos += n;
                Err(self.stream_error(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated tar stream",
                )))
            }
            Err(e) => Err(self.stream_error(e)),
        }
    }

    fn stream_error(&self, source: io::Error) -> WalkError {
        WalkError::Stream {
            offset: self.pos,
            source,
        }
    }
}

/// Bounded reader over the body of the current entry.
///
/// Reports a stream that ends before the declared size as
/// `UnexpectedEof`.
#[derive(Debug)]
pub struct EntryBody<'a, R> {
    reader: &'a mut R,
    pos: &'a mut u64,
    remaining: u64,
    padding: u64,
}

impl<R: Read> EntryBody<'_, R> {
    /// Bytes of the body not read yet.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Discards the unread rest of the body and the block padding, leaving
    /// the decoder at the next header.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::Stream`] if the stream fails or ends early.
    pub fn finish(mut self) -> Result<()> {
        if let Err(e) = io::copy(&mut self, &mut io::sink()) {
            return Err(WalkError::Stream {
                offset: *self.pos,
                source: e,
            });
        }

        let padding = self.padding;
        match io::copy(&mut (&mut *self.reader).take(padding), &mut io::sink()) {
            Ok(n) => {
                *self.pos += n;
                if n == padding {
                    Ok(())
                } else {
                    Err(WalkError::Stream {
                        offset: *self.pos,
                        source: io::Error::new(io::ErrorKind::UnexpectedEof, "truncated tar stream"),
                    })
                }
            }
            Err(e) => Err(WalkError::Stream {
                offset: *self.pos,
                source: e,
            }),
        }
    }
}

impl<R: Read> Read for EntryBody<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.reader.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry body truncated with {} bytes missing", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        *self.pos += n as u64;
        Ok(n)
    }
}

fn finish_archive<T>(pending: &Pending) -> Result<Option<T>> {
    if pending.is_empty() {
        Ok(None)
    } else {
        Err(WalkError::InvalidArchive(
            "archive ends after an extended header".to_string(),
        ))
    }
}

fn resolve(header: &Header, entry_type: EntryType, pending: Pending) -> Result<EntryHeader> {
    let path = pending
        .pax_path
        .or(pending.long_name)
        .unwrap_or_else(|| String::from_utf8_lossy(&header.path_bytes()).into_owned());

    let link_target = pending.pax_link.or(pending.long_link).or_else(|| {
        header
            .link_name_bytes()
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    });

    let size = match pending.pax_size {
        Some(size) => size,
        None => header_size(header)?,
    };

    // Metadata never affects classification; blank or garbled fields read as 0.
    Ok(EntryHeader {
        path,
        entry_type,
        size,
        mode: header.mode().unwrap_or(0),
        uid: header.uid().unwrap_or(0),
        gid: header.gid().unwrap_or(0),
        mtime: header.mtime().unwrap_or(0),
        link_target,
    })
}

/// Reads the size field, treating an all-NUL or all-space field as 0.
fn header_size(header: &Header) -> Result<u64> {
    let field = &header.as_old().size;
    if field.iter().all(|&b| b == 0 || b == b' ') {
        return Ok(0);
    }
    header.entry_size().map_err(invalid)
}

fn verify_checksum(header: &Header, block: &[u8]) -> Result<()> {
    let recorded = header.cksum().map_err(invalid)?;

    let mut unsigned: u32 = 0;
    let mut signed: i64 = 0;
    for (i, &b) in block.iter().enumerate() {
        let b = if CHECKSUM_RANGE.contains(&i) { b' ' } else { b };
        unsigned += u32::from(b);
        signed += i64::from(b.cast_signed());
    }

    if recorded == unsigned || i64::from(recorded) == signed {
        Ok(())
    } else {
        Err(WalkError::InvalidArchive(format!(
            "header checksum mismatch: recorded {recorded}, computed {unsigned}"
        )))
    }
}

fn apply_pax(pending: &mut Pending, data: &[u8]) -> Result<()> {
    for record in pax_records(data)? {
        let (key, value) = record;
        match key {
            "path" => pending.pax_path = Some(value.to_string()),
            "linkpath" => pending.pax_link = Some(value.to_string()),
            "size" => {
                let size = value
                    .parse()
                    .map_err(|_| WalkError::InvalidArchive(format!("invalid PAX size {value:?}")))?;
                pending.pax_size = Some(size);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Splits PAX extended header data into `key=value` records.
///
/// Each record has the form `<len> <key>=<value>\n`, where `<len>` counts the
/// whole record including itself and the trailing newline.
fn pax_records(data: &[u8]) -> Result<Vec<(&str, &str)>> {
    let mut records = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let malformed = || WalkError::InvalidArchive("malformed PAX record".to_string());

        let space = rest.iter().position(|&b| b == b' ').ok_or_else(malformed)?;
        let len: usize = std::str::from_utf8(&rest[..space])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(malformed)?;
        if len <= space + 1 || len > rest.len() || rest[len - 1] != b'\n' {
            return Err(malformed());
        }

        let record = std::str::from_utf8(&rest[space + 1..len - 1]).map_err(|_| malformed())?;
        let (key, value) = record.split_once('=').ok_or_else(malformed)?;
        records.push((key, value));
        rest = &rest[len..];
    }

    Ok(records)
}

/// Rounds `size` up to a whole number of blocks.
fn padded(size: u64) -> Result<u64> {
    size.div_ceil(BLOCK_SIZE)
        .checked_mul(BLOCK_SIZE)
        .ok_or_else(|| WalkError::InvalidArchive(format!("entry size {size} is out of range")))
}

fn invalid(e: io::Error) -> WalkError {
    WalkError::InvalidArchive(e.to_string())
}
