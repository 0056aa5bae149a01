//! RARBase64 decoder
//!
//! Decoding is a single forward pass over sync-separated lines. Each line is
//! judged on its own: page markers are skipped, everything else is sanitized
//! and cut down to whole base64 groups, and the surviving groups are
//! concatenated. Damage to one line therefore costs at most that line.

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::alphabet::{padding, sanitize, symbol_value};
use crate::config::{SyncConfig, PAD_SYMBOL, QUANTUM};
use crate::error::CodecError;

/// Standard alphabet, lenient about trailing bits left behind by damaged tails
const SYNC_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// What happened to the input lines during a decode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Lines that contributed base64 groups
    pub lines_kept: usize,
    /// Page marker lines skipped
    pub markers_skipped: usize,
    /// Lines with fewer than one whole group after sanitizing
    pub lines_discarded: usize,
    /// Characters removed because they are not base64 symbols
    pub chars_sanitized: usize,
    /// Characters dropped to align lines to whole groups (or from discarded lines)
    pub chars_trimmed: usize,
}

impl DecodeReport {
    /// Whether every line was taken as-is
    pub fn is_clean(&self) -> bool {
        self.lines_discarded == 0 && self.chars_sanitized == 0 && self.chars_trimmed == 0
    }
}

/// Decodes sync-framed base64 text back into the payload
pub struct Decoder {
    config: SyncConfig,
}

impl Decoder {
    /// Create a decoder for standard RARBase64 artifacts
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Create a decoder with custom framing
    pub fn with_config(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Framing used by this decoder
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Decode an artifact, absorbing line-level damage.
    ///
    /// Fails with [`CodecError::InvalidConfig`] for unusable framing, and with
    /// [`CodecError::InvalidEncoding`] when the reassembled groups do not form
    /// legal base64.
    pub fn decode(&self, input: &str) -> Result<Vec<u8>, CodecError> {
        self.decode_with_report(input).map(|(data, _)| data)
    }

    /// Decode an artifact and report how much of it had to be discarded
    pub fn decode_with_report(
        &self,
        input: &str,
    ) -> Result<(Vec<u8>, DecodeReport), CodecError> {
        let config = &self.config;
        config.validate()?;

        let mut report = DecodeReport::default();

        // Sentinels are removed wherever they occur
        let mut text = input.to_string();
        for sentinel in [&config.header, &config.footer] {
            if !sentinel.is_empty() {
                text = text.replace(sentinel.as_str(), "");
            }
        }

        let mut buffer = String::with_capacity(text.len());
        for line in text.split(config.sync_char).filter(|l| !l.is_empty()) {
            if line.starts_with(config.page_marker_prefix.as_str()) {
                report.markers_skipped += 1;
                continue;
            }

            let cleaned = sanitize(line, false);
            report.chars_sanitized += line.chars().count() - cleaned.len();

            if cleaned.len() < QUANTUM {
                report.lines_discarded += 1;
                report.chars_trimmed += cleaned.len();
                continue;
            }

            // Unalignable characters are dropped from the front of the line
            let offset = cleaned.len() % QUANTUM;
            report.chars_trimmed += offset;
            buffer.push_str(&cleaned[offset..]);
            report.lines_kept += 1;
        }

        if config.trim_safe_padding {
            strip_safe_padding(&mut buffer, config.safe_pad_symbol);
        }

        let fill = padding(buffer.len(), QUANTUM);
        buffer.extend(std::iter::repeat(PAD_SYMBOL).take(fill));

        let data = SYNC_ENGINE.decode(buffer.as_bytes())?;

        log::debug!(
            "Decoded {} bytes: {} lines kept, {} markers skipped, {} lines discarded, \
             {} chars sanitized, {} chars trimmed",
            data.len(),
            report.lines_kept,
            report.markers_skipped,
            report.lines_discarded,
            report.chars_sanitized,
            report.chars_trimmed
        );

        Ok((data, report))
    }

    /// Decode an artifact file into a binary file, replacing any existing one.
    ///
    /// Input bytes that are not valid UTF-8 are treated like any other foreign
    /// characters.
    pub fn decode_file(&self, input: &Path, output: &Path) -> Result<DecodeReport> {
        let raw = std::fs::read(input)
            .with_context(|| format!("Failed to read: {}", input.display()))?;
        let text = String::from_utf8_lossy(&raw);

        let (data, report) = self
            .decode_with_report(&text)
            .with_context(|| format!("Failed to decode: {}", input.display()))?;

        if !report.is_clean() {
            log::warn!(
                "{}: {} lines discarded, {} characters dropped",
                input.display(),
                report.lines_discarded,
                report.chars_sanitized + report.chars_trimmed
            );
        }

        remove_existing(output)?;
        std::fs::write(output, &data)
            .with_context(|| format!("Failed to write: {}", output.display()))?;

        Ok(report)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Undo the encoder's safe padding on the reassembled stream.
///
/// The trailing run of the safe-pad symbol is removed. Canonical base64 never
/// ends in a lone symbol or in a partial group with trailing bits set, so in
/// those cases the stripped run must have held real data and symbols are put
/// back up to the next whole group.
fn strip_safe_padding(buffer: &mut String, safe_pad: char) {
    let original_len = buffer.len();
    let stripped_len = buffer.trim_end_matches(safe_pad).len();
    if stripped_len == original_len {
        return;
    }
    buffer.truncate(stripped_len);

    let partial = stripped_len % QUANTUM;
    if partial == 0 {
        return;
    }

    let canonical = partial > 1
        && buffer
            .chars()
            .last()
            .and_then(symbol_value)
            .map(|value| value & trailing_bits_mask(partial) == 0)
            .unwrap_or(false);
    if !canonical {
        let restore = padding(stripped_len, QUANTUM).min(original_len - stripped_len);
        buffer.extend(std::iter::repeat(safe_pad).take(restore));
    }
}

/// Bits of the last symbol that carry no data in a partial group
fn trailing_bits_mask(partial: usize) -> u8 {
    match partial {
        2 => 0x0F,
        3 => 0x03,
        _ => 0x3F,
    }
}

/// Remove `path` if present, clearing a read-only flag first
#[allow(clippy::permissions_set_readonly_false)]
fn remove_existing(path: &Path) -> Result<()> {
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            std::fs::set_permissions(path, permissions)?;
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to replace: {}", path.display()))?;
    }
    Ok(())
}
