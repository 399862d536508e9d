//! Once-only access to an entry's content.
//!
//! A tar layer can only be read forward, yet several analyzers may want the
//! bytes of the same entry. [`ContentAccessor`] materializes the entry body
//! on first request and serves every later request from that copy:
//!
//! - entries smaller than [`SPOOL_THRESHOLD`] are drained into a shared
//!   in-memory buffer,
//! - larger entries are copied into a file inside a fresh temporary
//!   directory, and each request opens an independent handle on it.
//!
//! Materialization runs at most once per entry, also when several threads
//! request the content concurrently. Its outcome, success or failure, is
//! cached and observed identically by every caller.

use std::fmt;
use std::fs::File;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::{self};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::sync::RwLock;

use tempfile::TempDir;

use crate::Result;
use crate::WalkError;
use crate::error::MaterializeStage;

/// Entries at least this large are spooled to disk instead of memory (200 MiB).
pub const SPOOL_THRESHOLD: u64 = 200 << 20;

const SPOOL_PREFIX: &str = "layerscan-";
const SPOOL_FILE_NAME: &str = "content";

/// Lazily materialized content of one walked entry.
///
/// Handed to walk callbacks by reference. Call [`open`](Self::open) any number
/// of times, from any number of threads; the underlying entry body is read
/// exactly once.
///
/// # Examples
///
/// ```
/// use layerscan_core::ContentAccessor;
/// use std::io::Read;
///
/// let mut body: &[u8] = b"ID=alpine\n";
/// let accessor = ContentAccessor::from_stream("etc/os-release", 10, &mut body);
///
/// let (mut first, _release) = accessor.open()?;
/// let (mut second, release) = accessor.open()?;
///
/// let mut a = String::new();
/// let mut b = String::new();
/// first.read_to_string(&mut a)?;
/// second.read_to_string(&mut b)?;
/// assert_eq!(a, b);
///
/// release.release()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ContentAccessor<'a> {
    path: String,
    size: u64,
    backing: Backing<'a>,
}

enum Backing<'a> {
    /// Forward-only entry body, materialized on first open.
    Stream {
        threshold: u64,
        source: Mutex<Option<&'a mut (dyn Read + Send + 'a)>>,
        outcome: OnceLock<Outcome>,
    },
    /// File on a local filesystem, reopened on every request.
    File(PathBuf),
}

type Outcome = std::result::Result<Arc<Materialized>, Failure>;

#[derive(Debug, Clone)]
struct Failure {
    stage: MaterializeStage,
    source: Arc<io::Error>,
}

impl Failure {
    fn new(stage: MaterializeStage, source: io::Error) -> Self {
        Self {
            stage,
            source: Arc::new(source),
        }
    }
}

#[derive(Debug)]
enum Materialized {
    InMemory(RwLock<Arc<[u8]>>),
    Spooled {
        file: PathBuf,
        dir: Mutex<Option<TempDir>>,
    },
}

impl<'a> ContentAccessor<'a> {
    /// Creates an accessor over a forward-only entry body of `size` bytes.
    ///
    /// Nothing is read from `source` until the first call to
    /// [`open`](Self::open).
    #[must_use]
    pub fn from_stream(
        path: impl Into<String>,
        size: u64,
        source: &'a mut (dyn Read + Send + 'a),
    ) -> Self {
        Self::with_threshold(path, size, source, SPOOL_THRESHOLD)
    }

    fn with_threshold(
        path: impl Into<String>,
        size: u64,
        source: &'a mut (dyn Read + Send + 'a),
        threshold: u64,
    ) -> Self {
        Self {
            path: path.into(),
            size,
            backing: Backing::Stream {
                threshold,
                source: Mutex::new(Some(source)),
                outcome: OnceLock::new(),
            },
        }
    }

    /// Creates an accessor over a file that can be reopened at will.
    #[must_use]
    pub fn from_file(path: impl Into<String>, size: u64, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size,
            backing: Backing::File(disk_path.into()),
        }
    }

    /// Normalized path of the entry.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared size of the entry body in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` once the entry body has been materialized, successfully
    /// or not.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        match &self.backing {
            Backing::Stream { outcome, .. } => outcome.get().is_some(),
            Backing::File(_) => false,
        }
    }

    /// Opens a fresh reader positioned at the start of the content.
    ///
    /// The first call materializes the entry body; concurrent first calls
    /// wait for that single materialization. The returned [`Release`] frees
    /// the materialized copy early; if it is never called the copy is freed
    /// once the accessor and every outstanding `Release` have been dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::Materialize`] if the temporary directory or file
    /// cannot be created, the body cannot be copied or read, or the spool
    /// file cannot be reopened. A materialization failure is cached: every
    /// later call returns the same error.
    pub fn open(&self) -> Result<(ContentReader, Release)> {
        match &self.backing {
            Backing::File(disk_path) => {
                let file = File::open(disk_path)
                    .map_err(|e| self.error(&Failure::new(MaterializeStage::Open, e)))?;
                Ok((ContentReader::new(ReaderInner::Local(file)), Release::noop()))
            }
            Backing::Stream {
                threshold,
                source,
                outcome,
            } => {
                let materialized = outcome
                    .get_or_init(|| materialize(&self.path, self.size, *threshold, source))
                    .as_ref()
                    .map_err(|failure| self.error(failure))?;

                let inner = match materialized.as_ref() {
                    Materialized::InMemory(buffer) => {
                        let bytes = Arc::clone(&buffer.read().unwrap_or_else(PoisonError::into_inner));
                        ReaderInner::Memory(Cursor::new(bytes))
                    }
                    Materialized::Spooled { file, .. } => {
                        let handle = File::open(file)
                            .map_err(|e| self.error(&Failure::new(MaterializeStage::Open, e)))?;
                        ReaderInner::Spooled(handle)
                    }
                };

                Ok((
                    ContentReader::new(inner),
                    Release {
                        target: Some(Arc::clone(materialized)),
                    },
                ))
            }
        }
    }

    fn error(&self, failure: &Failure) -> WalkError {
        WalkError::Materialize {
            path: self.path.clone(),
            stage: failure.stage,
            source: Arc::clone(&failure.source),
        }
    }

    #[cfg(test)]
    fn spool_dir(&self) -> Option<PathBuf> {
        match &self.backing {
            Backing::Stream { outcome, .. } => match outcome.get() {
                Some(Ok(m)) => match m.as_ref() {
                    Materialized::Spooled { file, .. } => file.parent().map(PathBuf::from),
                    Materialized::InMemory(_) => None,
                },
                _ => None,
            },
            Backing::File(_) => None,
        }
    }
}

impl fmt::Debug for ContentAccessor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAccessor")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("materialized", &self.is_materialized())
            .finish_non_exhaustive()
    }
}

fn materialize(
    path: &str,
    size: u64,
    threshold: u64,
    source: &Mutex<Option<&mut (dyn Read + Send + '_)>>,
) -> Outcome {
    let mut guard = lock(source);
    let Some(reader) = guard.take() else {
        return Err(Failure::new(
            MaterializeStage::Read,
            io::Error::other("entry content already consumed"),
        ));
    };

    if size >= threshold {
        tracing::debug!(path, size, "spooling entry content to disk");
        spool(reader)
    } else {
        buffer(reader, size)
    }
}

fn spool(reader: &mut (dyn Read + Send + '_)) -> Outcome {
    let dir = tempfile::Builder::new()
        .prefix(SPOOL_PREFIX)
        .tempdir()
        .map_err(|e| Failure::new(MaterializeStage::CreateTempDir, e))?;

    let file_path = dir.path().join(SPOOL_FILE_NAME);
    let mut file =
        File::create(&file_path).map_err(|e| Failure::new(MaterializeStage::CreateTempFile, e))?;
    io::copy(reader, &mut file).map_err(|e| Failure::new(MaterializeStage::Copy, e))?;

    Ok(Arc::new(Materialized::Spooled {
        file: file_path,
        dir: Mutex::new(Some(dir)),
    }))
}

fn buffer(reader: &mut (dyn Read + Send + '_), size: u64) -> Outcome {
    let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Failure::new(MaterializeStage::Read, e))?;
    Ok(Arc::new(Materialized::InMemory(RwLock::new(Arc::from(bytes)))))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reader over materialized entry content.
///
/// Every call to [`ContentAccessor::open`] yields an independent reader
/// positioned at offset 0.
#[derive(Debug)]
pub struct ContentReader {
    inner: ReaderInner,
}

#[derive(Debug)]
enum ReaderInner {
    Memory(Cursor<Arc<[u8]>>),
    Spooled(File),
    Local(File),
}

impl ContentReader {
    const fn new(inner: ReaderInner) -> Self {
        Self { inner }
    }

    /// Returns `true` if the content is served from a spooled temporary file.
    #[must_use]
    pub const fn is_spooled(&self) -> bool {
        matches!(self.inner, ReaderInner::Spooled(_))
    }

    /// Returns `true` if the content is served from the shared memory buffer.
    #[must_use]
    pub const fn is_in_memory(&self) -> bool {
        matches!(self.inner, ReaderInner::Memory(_))
    }
}

impl Read for ContentReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            ReaderInner::Memory(cursor) => cursor.read(buf),
            ReaderInner::Spooled(file) | ReaderInner::Local(file) => file.read(buf),
        }
    }
}

impl Seek for ContentReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.inner {
            ReaderInner::Memory(cursor) => cursor.seek(pos),
            ReaderInner::Spooled(file) | ReaderInner::Local(file) => file.seek(pos),
        }
    }
}

/// Early release of materialized content.
///
/// For spooled content, releasing removes the whole temporary directory. For
/// buffered content, it drops the retained buffer; readers already handed
/// out keep their own reference. Opening the accessor again after a release
/// yields an error (spooled) or empty content (buffered).
#[derive(Debug)]
pub struct Release {
    target: Option<Arc<Materialized>>,
}

impl Release {
    const fn noop() -> Self {
        Self { target: None }
    }

    /// Frees the materialized copy.
    ///
    /// Calling it through several handles of the same entry is harmless; only
    /// the first call does any work.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the temporary directory cannot be removed.
    pub fn release(self) -> Result<()> {
        let Some(target) = self.target else {
            return Ok(());
        };

        match target.as_ref() {
            Materialized::InMemory(buffer) => {
                *buffer.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(Vec::new());
            }
            Materialized::Spooled { dir, .. } => {
                let taken = lock(dir).take();
                if let Some(dir) = taken {
                    dir.close()?;
                }
            }
        }
        Ok(())
    }
}
