//! External archiver capability
//!
//! The codec never compresses or repairs anything itself. Compression, the
//! recovery record and repair are delegated to an [`Archiver`], normally the
//! `rar` command line tool driven through [`RarArchiver`].

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};

/// Prefix the archiver gives to a repaired copy of a damaged archive
pub const REPAIRED_PREFIX: &str = "fixed.";

/// Exit status reported by an archiver operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiverStatus {
    /// Process exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ArchiverStatus {
    /// Status of an operation that exited cleanly
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    /// Whether the process exited with code 0
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl std::fmt::Display for ArchiverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Compression, recovery record, repair and extraction of archive files
pub trait Archiver {
    /// Compress `source` into a new archive at `archive`.
    ///
    /// `archive` is expected to be an absolute path.
    fn compress(&self, source: &Path, archive: &Path) -> Result<ArchiverStatus>;

    /// Attach a recovery record of `percent` percent to `archive`
    fn add_recovery(&self, archive: &Path, percent: u8) -> Result<ArchiverStatus>;

    /// Try to repair `archive`; a repaired copy named
    /// `fixed.<name>` is left beside it when damage was found
    fn repair(&self, archive: &Path) -> Result<ArchiverStatus>;

    /// Extract the contents of `archive` into `destination`, overwriting files.
    ///
    /// `archive` is expected to be an absolute path.
    fn extract(&self, archive: &Path, destination: &Path) -> Result<ArchiverStatus>;
}

/// Path of the repaired copy [`Archiver::repair`] may produce
pub fn repaired_path(archive: &Path) -> Option<PathBuf> {
    let name = archive.file_name()?.to_string_lossy();
    Some(archive.with_file_name(format!("{}{}", REPAIRED_PREFIX, name)))
}

/// [`Archiver`] backed by the `rar` command line tool
#[derive(Debug, Clone)]
pub struct RarArchiver {
    /// Executable to run
    pub program: PathBuf,
    /// Compression method, 0 (store) to 5 (best)
    pub method: u8,
}

impl RarArchiver {
    /// Drive `program` with the best compression method
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), method: 5 }
    }

    /// Whether the executable can be started at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok()
    }

    fn run(&self, operation: &str, args: &[&OsStr], work_dir: &Path) -> Result<ArchiverStatus> {
        log::debug!("{} {:?} in {}", self.program.display(), args, work_dir.display());

        let status = Command::new(&self.program)
            .args(args)
            .current_dir(work_dir)
            .stdout(std::process::Stdio::null())
            .status()
            .with_context(|| format!("Failed to start {}", self.program.display()))?;

        let status = ArchiverStatus { code: status.code() };
        log::info!("{} {}: {}", self.program.display(), operation, status);
        Ok(status)
    }
}

impl Default for RarArchiver {
    fn default() -> Self {
        Self::new("rar")
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn file_name(path: &Path) -> Result<&OsStr> {
    path.file_name()
        .ok_or_else(|| anyhow!("Invalid archive path: {}", path.display()))
}

impl Archiver for RarArchiver {
    fn compress(&self, source: &Path, archive: &Path) -> Result<ArchiverStatus> {
        let method = format!("-m{}", self.method);
        let args = [
            OsStr::new("a"),
            OsStr::new(&method),
            OsStr::new("-ma5"),
            OsStr::new("-ep"),
            archive.as_os_str(),
            file_name(source)?,
        ];
        self.run("compress", &args, parent_dir(source))
    }

    fn add_recovery(&self, archive: &Path, percent: u8) -> Result<ArchiverStatus> {
        let record = format!("rr{}%", percent);
        let args = [OsStr::new(&record), file_name(archive)?];
        self.run("add recovery record", &args, parent_dir(archive))
    }

    fn repair(&self, archive: &Path) -> Result<ArchiverStatus> {
        // The repaired copy lands in the working directory
        let args = [OsStr::new("r"), file_name(archive)?];
        self.run("repair", &args, parent_dir(archive))
    }

    fn extract(&self, archive: &Path, destination: &Path) -> Result<ArchiverStatus> {
        let args = [OsStr::new("e"), OsStr::new("-kb"), OsStr::new("-o+"), archive.as_os_str()];
        self.run("extract", &args, destination)
    }
}
