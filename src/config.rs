//! Framing configuration

use crate::alphabet::is_alphabet_char;
use crate::error::CodecError;

// RARBase64 framing constants
pub const QUANTUM: usize = 4;
pub const SYNC_BLOCK_SIZE: usize = QUANTUM * 16;
pub const SYNC_CHAR: char = '\n';
pub const PAD_SYMBOL: char = '=';
pub const SAFE_PAD_SYMBOL: char = '+';
pub const HEADER: &str = "------------------- BEGIN RARBase64 MESSAGE --------------------";
pub const FOOTER: &str = "-------------------- END RARBase64 MESSAGE ---------------------";
pub const PAGE_MARKER_PREFIX: &str = ":::::RARBase64 PAGE MARKER:::::";
pub const PAGE_MARKER_FILLER: char = ':';
pub const ROWS_PER_PAGE: usize = 32;
pub const PAGE_NUMBER_DOT_PADDING: usize = 4;

/// Framing parameters shared by [`Encoder`](crate::Encoder) and [`Decoder`](crate::Decoder).
///
/// The default value produces bit-exact RARBase64 artifacts. Alternate values are
/// mostly useful for tests that need short pages or narrow blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Width of a sync block (and of every page marker line)
    pub block_size: usize,
    /// Character terminating every emitted line
    pub sync_char: char,
    /// Filler replacing pad symbols and completing the last block
    pub safe_pad_symbol: char,
    /// Sentinel opening the artifact
    pub header: String,
    /// Sentinel closing the artifact
    pub footer: String,
    /// Prefix identifying page marker lines
    pub page_marker_prefix: String,
    /// Filler completing a page marker line
    pub page_marker_filler: char,
    /// Number of sync blocks between page markers
    pub rows_per_page: usize,
    /// Slack kept free when repeating the page number
    pub page_number_padding: usize,
    /// Strip the safe padding again on decode so the payload round-trips exactly
    pub trim_safe_padding: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            block_size: SYNC_BLOCK_SIZE,
            sync_char: SYNC_CHAR,
            safe_pad_symbol: SAFE_PAD_SYMBOL,
            header: HEADER.to_string(),
            footer: FOOTER.to_string(),
            page_marker_prefix: PAGE_MARKER_PREFIX.to_string(),
            page_marker_filler: PAGE_MARKER_FILLER,
            rows_per_page: ROWS_PER_PAGE,
            page_number_padding: PAGE_NUMBER_DOT_PADDING,
            trim_safe_padding: true,
        }
    }
}

impl SyncConfig {
    /// Check that the parameters describe a usable framing
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.block_size == 0 || self.block_size % QUANTUM != 0 {
            return Err(CodecError::InvalidConfig {
                reason: format!(
                    "block size {} is not a positive multiple of {}",
                    self.block_size, QUANTUM
                ),
            });
        }
        if !is_alphabet_char(self.safe_pad_symbol, false) {
            return Err(CodecError::InvalidConfig {
                reason: format!(
                    "safe pad symbol {:?} is not a base64 symbol",
                    self.safe_pad_symbol
                ),
            });
        }
        if self.rows_per_page == 0 {
            return Err(CodecError::InvalidConfig {
                reason: "page marker cadence must be at least one row".to_string(),
            });
        }
        if self.page_marker_prefix.is_empty()
            || self.page_marker_prefix.chars().count() >= self.block_size
        {
            return Err(CodecError::InvalidConfig {
                reason: format!(
                    "page marker prefix must be non-empty and shorter than {} characters",
                    self.block_size
                ),
            });
        }
        if self.header.contains(self.sync_char) || self.footer.contains(self.sync_char) {
            return Err(CodecError::InvalidConfig {
                reason: "sentinels must not contain the sync character".to_string(),
            });
        }
        Ok(())
    }
}
