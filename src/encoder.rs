//! RARBase64 encoder

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;

use crate::alphabet::padding;
use crate::config::{SyncConfig, PAD_SYMBOL};
use crate::error::CodecError;

/// Encodes binary payloads into sync-framed base64 text
pub struct Encoder {
    config: SyncConfig,
}

impl Encoder {
    /// Create an encoder producing standard RARBase64 artifacts
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Create an encoder with custom framing
    pub fn with_config(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Framing used by this encoder
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Encode a payload into a complete artifact, header to footer.
    ///
    /// Fails with [`CodecError::Conflict`] when the plain base64 text already
    /// contains one of the reserved sentinels; nothing is produced in that case.
    pub fn encode(&self, payload: &[u8]) -> Result<String, CodecError> {
        let config = &self.config;
        config.validate()?;

        let raw = base64::engine::general_purpose::STANDARD.encode(payload);
        self.check_conflicts(&raw)?;

        // Free the pad symbol, then complete the last sync block
        let mut safe: String = raw
            .chars()
            .map(|c| if c == PAD_SYMBOL { config.safe_pad_symbol } else { c })
            .collect();
        let fill = padding(safe.len(), config.block_size);
        safe.extend(std::iter::repeat(config.safe_pad_symbol).take(fill));

        let rows = safe.len() / config.block_size;
        let markers = rows / config.rows_per_page;
        let framing = config.header.len() + config.footer.len();
        let mut output =
            String::with_capacity(framing + (rows + markers + 1) * (config.block_size + 1));

        output.push_str(&config.header);
        output.push(config.sync_char);

        let mut rows_to_marker = config.rows_per_page;
        let mut page = 1;
        let mut recorded = 0;
        while recorded + config.block_size <= safe.len() {
            output.push_str(&safe[recorded..recorded + config.block_size]);
            output.push(config.sync_char);
            recorded += config.block_size;

            rows_to_marker -= 1;
            if rows_to_marker == 0 {
                rows_to_marker = config.rows_per_page;
                output.push_str(&format_page_marker(config, page));
                output.push(config.sync_char);
                page += 1;
            }
        }

        let remainder = &safe[recorded..];
        if !remainder.is_empty() {
            log::warn!("Emitting short trailing block of {} characters", remainder.len());
            output.push_str(remainder);
            output.push(config.sync_char);
        }

        output.push_str(&config.footer);

        log::debug!(
            "Encoded {} bytes into {} sync blocks and {} page markers",
            payload.len(),
            rows,
            page - 1
        );

        Ok(output)
    }

    /// Reject base64 text that already contains a reserved marker
    fn check_conflicts(&self, raw: &str) -> Result<(), CodecError> {
        let config = &self.config;
        for marker in [&config.header, &config.footer, &config.page_marker_prefix] {
            if !marker.is_empty() && raw.contains(marker.as_str()) {
                return Err(CodecError::Conflict { marker: marker.clone() });
            }
        }
        Ok(())
    }

    /// Encode a payload directly to a writer
    pub fn encode_to_writer<W: Write>(&self, payload: &[u8], mut writer: W) -> Result<()> {
        let encoded = self.encode(payload)?;
        writer.write_all(encoded.as_bytes())?;
        Ok(())
    }

    /// Encode a file into an artifact file.
    ///
    /// The artifact is written to a temporary file beside `output` and renamed
    /// into place, so a failed encode never leaves a partial artifact.
    pub fn encode_file(&self, input: &Path, output: &Path) -> Result<()> {
        let payload = std::fs::read(input)
            .with_context(|| format!("Failed to read: {}", input.display()))?;
        let encoded = self
            .encode(&payload)
            .with_context(|| format!("Failed to encode: {}", input.display()))?;

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to stage output in: {}", dir.display()))?;
        staged.write_all(encoded.as_bytes())?;
        staged.flush()?;
        staged
            .persist(output)
            .with_context(|| format!("Failed to write: {}", output.display()))?;

        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the page marker line for `page`.
///
/// The page number is repeated, `/`-separated, while the line plus the dot
/// padding still fits the block width; `:` filler completes the line. The
/// decoder only looks at the prefix, so the body is purely visual.
pub fn format_page_marker(config: &SyncConfig, page: usize) -> String {
    let number = page.to_string();
    let mut marker = config.page_marker_prefix.clone();

    let mut repeats = 0;
    while marker.chars().count() + number.len() + config.page_number_padding < config.block_size {
        if repeats > 0 {
            marker.push('/');
        }
        marker.push_str(&number);
        repeats += 1;
    }
    while marker.chars().count() < config.block_size {
        marker.push(config.page_marker_filler);
    }

    marker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FOOTER, HEADER, PAGE_MARKER_PREFIX};

    fn content_lines(artifact: &str) -> Vec<&str> {
        artifact
            .lines()
            .filter(|l| *l != HEADER && *l != FOOTER && !l.starts_with(PAGE_MARKER_PREFIX))
            .collect()
    }

    #[test]
    fn test_encode_man() {
        let encoder = Encoder::new();
        let result = encoder.encode(&[0x4D, 0x61, 0x6E]).unwrap();

        let expected = format!("{}\nTWFu{}\n{}", HEADER, "+".repeat(60), FOOTER);
        assert_eq!(result, expected);
        assert!(!result.ends_with('\n'));
    }

    #[test]
    fn test_encode_replaces_pad_symbol() {
        let encoder = Encoder::new();
        let result = encoder.encode(b"Ma").unwrap();

        assert!(result.contains(&format!("TWE+{}", "+".repeat(60))));
        assert!(!content_lines(&result).iter().any(|l| l.contains('=')));
    }

    #[test]
    fn test_encode_empty() {
        let encoder = Encoder::new();
        let result = encoder.encode(&[]).unwrap();
        assert_eq!(result, format!("{}\n{}", HEADER, FOOTER));
    }

    #[test]
    fn test_every_content_line_is_full_width() {
        let encoder = Encoder::new();
        for len in [1usize, 2, 3, 47, 48, 49, 100, 1535, 1536, 1537, 5000] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            let result = encoder.encode(&payload).unwrap();
            for line in content_lines(&result) {
                assert_eq!(line.len(), 64, "payload length {}", len);
            }
        }
    }

    #[test]
    fn test_page_marker_cadence() {
        let encoder = Encoder::new();
        // 48 bytes per block, 32 blocks per page: three full pages plus a bit
        let payload = vec![0x5Au8; 48 * 32 * 3 + 10];
        let result = encoder.encode(&payload).unwrap();

        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(*lines.last().unwrap(), FOOTER);

        let body = &lines[1..lines.len() - 1];
        let mut rows = 0;
        let mut page = 1;
        for line in body {
            if line.starts_with(PAGE_MARKER_PREFIX) {
                assert_eq!(rows, 32, "marker must follow exactly 32 rows");
                assert_eq!(*line, format_page_marker(encoder.config(), page));
                rows = 0;
                page += 1;
            } else {
                rows += 1;
            }
        }
        assert_eq!(page, 4);
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_no_marker_without_full_page() {
        let encoder = Encoder::new();
        let result = encoder.encode(&vec![1u8; 48 * 31]).unwrap();
        assert!(!result.contains(PAGE_MARKER_PREFIX));
    }

    #[test]
    fn test_marker_after_exact_page() {
        let encoder = Encoder::new();
        let result = encoder.encode(&vec![1u8; 48 * 32]).unwrap();
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 1 + 32 + 1 + 1);
        assert!(lines[33].starts_with(PAGE_MARKER_PREFIX));
    }

    #[test]
    fn test_format_page_marker_first_page() {
        let marker = format_page_marker(&SyncConfig::default(), 1);
        let expected = format!("{}{}::::", PAGE_MARKER_PREFIX, vec!["1"; 15].join("/"));
        assert_eq!(marker, expected);
        assert_eq!(marker.len(), 64);
    }

    #[test]
    fn test_format_page_marker_two_digits() {
        let marker = format_page_marker(&SyncConfig::default(), 10);
        let expected = format!("{}{}::::", PAGE_MARKER_PREFIX, vec!["10"; 10].join("/"));
        assert_eq!(marker, expected);
        assert_eq!(marker.len(), 64);
    }

    #[test]
    fn test_format_page_marker_always_block_width() {
        let config = SyncConfig::default();
        for page in [1, 9, 99, 100, 12345, usize::MAX] {
            assert_eq!(format_page_marker(&config, page).len(), 64, "page {}", page);
        }
    }

    #[test]
    fn test_conflict_is_reported() {
        // "AAA" encodes to "QUFB"
        let config = SyncConfig { page_marker_prefix: "QUFB".to_string(), ..SyncConfig::default() };
        let encoder = Encoder::with_config(config);
        let err = encoder.encode(b"AAA").unwrap_err();
        assert_eq!(err, CodecError::Conflict { marker: "QUFB".to_string() });
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let config = SyncConfig { block_size: 10, ..SyncConfig::default() };
        let encoder = Encoder::with_config(config);
        assert!(matches!(encoder.encode(b"x"), Err(CodecError::InvalidConfig { .. })));
    }

    #[test]
    fn test_encode_to_writer() {
        let encoder = Encoder::new();
        let mut buffer = Vec::new();
        encoder.encode_to_writer(b"Man", &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), encoder.encode(b"Man").unwrap());
    }

    #[test]
    fn test_encode_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("payload.bin");
        let output = dir.path().join("payload.bin.RARBase64");
        std::fs::write(&input, [0x4D, 0x61, 0x6E]).unwrap();

        let encoder = Encoder::new();
        encoder.encode_file(&input, &output).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, encoder.encode(&[0x4D, 0x61, 0x6E]).unwrap());
    }
}
