//! Document access for commands.
//!
//! Commands talk to documents through [`DocumentHost`] so the update cycle
//! can run against the filesystem or an in-memory set of notes in tests.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

/// One-line user notification about an update cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Updated { elapsed: String },
    NoActiveDocument,
    NoTrackers,
    HeaderParseError,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated { elapsed } => write!(f, "Elapsed time updated: {elapsed}"),
            Self::NoActiveDocument => f.write_str("No active document"),
            Self::NoTrackers => f.write_str("No trackers found"),
            Self::HeaderParseError => f.write_str("Header parse error, document not updated"),
        }
    }
}

/// Where documents come from and where notices go.
pub trait DocumentHost {
    /// Held for the duration of one update cycle; released on drop.
    type Lock;

    fn active_document(&self) -> Option<&Path>;

    /// Takes the per-document update lock, `None` when another cycle holds it.
    fn try_lock(&self, path: &Path) -> io::Result<Option<Self::Lock>>;

    fn read(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send;

    /// Replaces the document. Readers never observe a partial write.
    fn write(&self, path: &Path, contents: &str) -> impl Future<Output = io::Result<()>> + Send;

    fn notify(&self, notice: &Notice);
}

/// Documents on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsHost {
    active: Option<PathBuf>,
}

impl FsHost {
    pub const fn new(active: Option<PathBuf>) -> Self {
        Self { active }
    }
}

/// Advisory lock on a document's sibling lock file.
#[derive(Debug)]
pub struct DocumentLock {
    file: File,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release document lock");
        }
    }
}

/// Returns `.<name>.nt-lock` next to the document.
fn lock_path(path: &Path) -> io::Result<PathBuf> {
    let name = file_name(path)?;
    Ok(path.with_file_name(format!(".{name}.nt-lock")))
}

/// Returns `.<name>.nt-tmp` next to the document.
fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = file_name(path)?;
    Ok(path.with_file_name(format!(".{name}.nt-tmp")))
}

fn file_name(path: &Path) -> io::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", path.display()),
            )
        })
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl DocumentHost for FsHost {
    type Lock = DocumentLock;

    fn active_document(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    fn try_lock(&self, path: &Path) -> io::Result<Option<DocumentLock>> {
        let lock_path = lock_path(path)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(DocumentLock { file })),
            Err(e) if is_contended(&e) => {
                tracing::debug!(lock = %lock_path.display(), "document lock is held");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn read(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let temp = temp_path(path)?;
        tokio::fs::write(&temp, contents).await?;
        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote document");
        Ok(())
    }

    fn notify(&self, notice: &Notice) {
        eprintln!("{notice}");
    }
}
