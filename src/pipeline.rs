//! File-level pack and unpack
//!
//! Packing compresses the source with an [`Archiver`], attaches a recovery
//! record and encodes the archive as text. Unpacking decodes the text, lets
//! the archiver repair whatever the transport damaged and extracts the result.
//! Intermediate archives live in a private temporary directory that is removed
//! when the operation finishes, successfully or not.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::archiver::{repaired_path, Archiver, ArchiverStatus};
use crate::config::SyncConfig;
use crate::decoder::{DecodeReport, Decoder};
use crate::encoder::Encoder;

/// Extension marking encoded artifacts
pub const ENCODED_EXTENSION: &str = ".RARBase64";

/// Name of the intermediate archive inside the work directory
const ARCHIVE_NAME: &str = "payload.rar";

/// Default size of the recovery record, in percent of the archive
pub const DEFAULT_RECOVERY_PERCENT: u8 = 100;

/// Whether `path` names an encoded artifact (extension compared case-insensitively)
pub fn is_encoded_path(path: &Path) -> bool {
    let name = path.as_os_str().as_encoded_bytes();
    name.len() >= ENCODED_EXTENSION.len()
        && name[name.len() - ENCODED_EXTENSION.len()..]
            .eq_ignore_ascii_case(ENCODED_EXTENSION.as_bytes())
}

/// Raw output path for an artifact: the artifact path without the extension
pub fn decoded_path(source: &Path) -> Option<PathBuf> {
    if !is_encoded_path(source) {
        return None;
    }
    let name = source.to_string_lossy();
    let stem = &name[..name.len() - ENCODED_EXTENSION.len()];
    if stem.is_empty() {
        return None;
    }
    Some(PathBuf::from(stem))
}

/// Artifact path for `source`: the source path with the extension appended
pub fn encoded_path(source: &Path) -> PathBuf {
    let mut path = source.as_os_str().to_owned();
    path.push(ENCODED_EXTENSION);
    PathBuf::from(path)
}

fn ensure_success(status: ArchiverStatus, operation: &str) -> Result<()> {
    if !status.is_success() {
        bail!("Archiver failed to {}: {}", operation, status);
    }
    Ok(())
}

fn work_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("rarbase64-")
        .tempdir()
        .context("Failed to create work directory")
}

/// Archive-then-encode and decode-then-extract around an [`Archiver`]
pub struct Pipeline<A: Archiver> {
    archiver: A,
    encoder: Encoder,
    decoder: Decoder,
    recovery_percent: u8,
}

impl<A: Archiver> Pipeline<A> {
    /// Pipeline producing standard RARBase64 artifacts
    pub fn new(archiver: A) -> Self {
        Self::with_config(archiver, SyncConfig::default())
    }

    /// Pipeline with custom framing for both directions
    pub fn with_config(archiver: A, config: SyncConfig) -> Self {
        Self {
            archiver,
            encoder: Encoder::with_config(config.clone()),
            decoder: Decoder::with_config(config),
            recovery_percent: DEFAULT_RECOVERY_PERCENT,
        }
    }

    /// Set the recovery record size
    pub fn with_recovery_percent(mut self, percent: u8) -> Self {
        self.recovery_percent = percent;
        self
    }

    /// The archiver driven by this pipeline
    pub fn archiver(&self) -> &A {
        &self.archiver
    }

    /// Compress `source`, add a recovery record and write the encoded archive to `output`
    pub fn pack(&self, source: &Path, output: &Path) -> Result<()> {
        if !source.is_file() {
            bail!("Not a file: {}", source.display());
        }

        let work = work_dir()?;
        let archive = work.path().join(ARCHIVE_NAME);

        ensure_success(self.archiver.compress(source, &archive)?, "compress")?;
        ensure_success(
            self.archiver.add_recovery(&archive, self.recovery_percent)?,
            "add recovery record",
        )?;
        if !archive.is_file() {
            bail!("Archiver produced no archive for: {}", source.display());
        }

        self.encoder.encode_file(&archive, output)?;
        log::info!("Packed {} into {}", source.display(), output.display());
        Ok(())
    }

    /// Decode `source`, repair the recovered archive and extract it into `destination`
    pub fn unpack(&self, source: &Path, destination: &Path) -> Result<DecodeReport> {
        let work = work_dir()?;
        let archive = work.path().join(ARCHIVE_NAME);

        let report = self.decoder.decode_file(source, &archive)?;

        let status = self.archiver.repair(&archive)?;
        if !status.is_success() {
            log::warn!("Repair of {} reported {}", source.display(), status);
        }

        let repaired = repaired_path(&archive).filter(|path| path.is_file());
        let chosen = match &repaired {
            Some(path) => {
                log::info!("Archive was damaged in transport, using repaired copy");
                path.as_path()
            }
            None => archive.as_path(),
        };

        std::fs::create_dir_all(destination)
            .with_context(|| format!("Failed to create: {}", destination.display()))?;
        ensure_success(self.archiver.extract(chosen, destination)?, "extract")?;

        log::info!("Unpacked {} into {}", source.display(), destination.display());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Stands in for the real tool: archives are plain copies of the source
    #[derive(Default)]
    struct CopyArchiver {
        calls: RefCell<Vec<String>>,
        repaired_contents: Option<Vec<u8>>,
        fail_compress: bool,
    }

    impl Archiver for CopyArchiver {
        fn compress(&self, source: &Path, archive: &Path) -> Result<ArchiverStatus> {
            self.calls.borrow_mut().push("compress".to_string());
            if self.fail_compress {
                return Ok(ArchiverStatus { code: Some(9) });
            }
            std::fs::copy(source, archive)?;
            Ok(ArchiverStatus::success())
        }

        fn add_recovery(&self, _archive: &Path, percent: u8) -> Result<ArchiverStatus> {
            self.calls.borrow_mut().push(format!("rr{}", percent));
            Ok(ArchiverStatus::success())
        }

        fn repair(&self, archive: &Path) -> Result<ArchiverStatus> {
            self.calls.borrow_mut().push("repair".to_string());
            if let Some(contents) = &self.repaired_contents {
                std::fs::write(repaired_path(archive).unwrap(), contents)?;
            }
            Ok(ArchiverStatus::success())
        }

        fn extract(&self, archive: &Path, destination: &Path) -> Result<ArchiverStatus> {
            self.calls.borrow_mut().push("extract".to_string());
            std::fs::copy(archive, destination.join("extracted.bin"))?;
            Ok(ArchiverStatus::success())
        }
    }

    #[test]
    fn test_is_encoded_path() {
        assert!(is_encoded_path(Path::new("photo.jpg.RARBase64")));
        assert!(is_encoded_path(Path::new("photo.jpg.rarbase64")));
        assert!(!is_encoded_path(Path::new("photo.jpg")));
        assert!(!is_encoded_path(Path::new("a")));
    }

    #[test]
    fn test_encoded_path() {
        assert_eq!(
            encoded_path(Path::new("dir/photo.jpg")),
            PathBuf::from("dir/photo.jpg.RARBase64")
        );
    }

    #[test]
    fn test_decoded_path() {
        assert_eq!(
            decoded_path(Path::new("dir/photo.jpg.rarBASE64")),
            Some(PathBuf::from("dir/photo.jpg"))
        );
        assert_eq!(decoded_path(Path::new("photo.jpg")), None);
        assert_eq!(decoded_path(Path::new(".RARBase64")), None);
    }

    #[test]
    fn test_pack_unpack() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"hello world payload").unwrap();
        let artifact = encoded_path(&source);
        let out = dir.path().join("out");

        let pipeline = Pipeline::new(CopyArchiver::default()).with_recovery_percent(50);
        pipeline.pack(&source, &artifact).unwrap();
        assert!(std::fs::read_to_string(&artifact).unwrap().contains("BEGIN RARBase64 MESSAGE"));

        let report = pipeline.unpack(&artifact, &out).unwrap();
        assert!(report.is_clean());
        assert_eq!(std::fs::read(out.join("extracted.bin")).unwrap(), b"hello world payload");
        assert_eq!(
            *pipeline.archiver().calls.borrow(),
            vec!["compress", "rr50", "repair", "extract"]
        );
    }

    #[test]
    fn test_unpack_prefers_repaired_archive() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("data.RARBase64");
        std::fs::write(&artifact, Encoder::new().encode(b"damaged archive").unwrap()).unwrap();

        let archiver = CopyArchiver {
            repaired_contents: Some(b"repaired archive".to_vec()),
            ..CopyArchiver::default()
        };
        let pipeline = Pipeline::new(archiver);
        pipeline.unpack(&artifact, dir.path()).unwrap();

        assert_eq!(std::fs::read(dir.path().join("extracted.bin")).unwrap(), b"repaired archive");
    }

    #[test]
    fn test_failed_compress_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"payload").unwrap();
        let artifact = encoded_path(&source);

        let archiver = CopyArchiver { fail_compress: true, ..CopyArchiver::default() };
        let err = Pipeline::new(archiver).pack(&source, &artifact).unwrap_err();

        assert!(err.to_string().contains("compress"));
        assert!(!artifact.exists());
    }

    #[test]
    fn test_pack_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(CopyArchiver::default());
        let err = pipeline
            .pack(&dir.path().join("missing"), &dir.path().join("missing.RARBase64"))
            .unwrap_err();
        assert!(err.to_string().contains("Not a file"));
        assert!(pipeline.archiver().calls.borrow().is_empty());
    }
}
