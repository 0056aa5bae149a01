//! # rarbase64
//!
//! Resynchronizable base64 framing for moving binary archives through
//! line-oriented, lossy text channels (copy-paste, chat windows, retyping).
//!
//! ## Artifact Format
//!
//! ```text
//! ------------------- BEGIN RARBase64 MESSAGE --------------------
//! UmFyIRoHAQAzkrXlCgEFBgAFAQGAgAC0r6PsJgIDC5kABJkAIOqHjJqAAAAIdGVz
//! ... 31 more 64-character sync blocks ...
//! :::::RARBase64 PAGE MARKER:::::1/1/1/1/1/1/1/1/1/1/1/1/1/1/1::::
//! ...
//! Gx0AAAAAAAAA++++++++++++++++++++++++++++++++++++++++++++++++++++
//! -------------------- END RARBase64 MESSAGE ---------------------
//! ```
//!
//! - The standard base64 text has every `=` rewritten to `+` and is padded
//!   with `+` to a whole number of 64-character sync blocks.
//! - Every block ends with a line feed, the sync character.
//! - A page marker line follows every 32 blocks. Markers are for humans; the
//!   decoder drops any line starting with the marker prefix.
//!
//! ## Damage Tolerance
//!
//! Each line is decoded on its own terms: foreign characters are stripped,
//! then characters are dropped from the *front* of the line until it holds
//! whole base64 groups. A dropped, truncated or polluted line loses at most
//! its own bytes; the rest of the payload still decodes. Repairing the loss
//! is left to the archive's recovery record (see [`archiver`]).
//!
//! ## Trailing Padding
//!
//! The `+` filler is indistinguishable from a data symbol, so the decoder
//! strips the trailing run and puts back only what canonical base64 proves
//! was data. A payload whose own base64 ends in `+` may lose its last bytes;
//! archives tolerate this. Set [`SyncConfig::trim_safe_padding`] to `false`
//! to keep the filler as trailing bytes instead.

pub mod alphabet;
pub mod archiver;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod pipeline;

pub use alphabet::{alphabet, sanitize};
pub use archiver::{Archiver, ArchiverStatus, RarArchiver};
pub use config::SyncConfig;
pub use decoder::{DecodeReport, Decoder};
pub use encoder::{format_page_marker, Encoder};
pub use error::CodecError;
pub use pipeline::{decoded_path, encoded_path, is_encoded_path, Pipeline};
