//! Base64 alphabet and sanitization helpers

use std::collections::HashSet;

use crate::config::PAD_SYMBOL;

/// The 64 symbols of the standard base64 alphabet, in index order
pub const BASE64_SYMBOLS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Return the base64 symbol set, including the pad symbol when `extended` is set
pub fn alphabet(extended: bool) -> HashSet<char> {
    let mut set: HashSet<char> = BASE64_SYMBOLS.chars().collect();
    if extended {
        set.insert(PAD_SYMBOL);
    }
    set
}

/// Whether `c` belongs to the (optionally extended) base64 alphabet
pub fn is_alphabet_char(c: char, extended: bool) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || (extended && c == PAD_SYMBOL)
}

/// Six-bit value of a base64 symbol
pub fn symbol_value(c: char) -> Option<u8> {
    match c {
        'A'..='Z' => Some(c as u8 - b'A'),
        'a'..='z' => Some(c as u8 - b'a' + 26),
        '0'..='9' => Some(c as u8 - b'0' + 52),
        '+' => Some(62),
        '/' => Some(63),
        _ => None,
    }
}

/// Keep only alphabet characters of `text`, in their original order.
///
/// Characters are judged one at a time by their Unicode value; nothing outside
/// ASCII ever survives.
pub fn sanitize(text: &str, extended: bool) -> String {
    text.chars().filter(|&c| is_alphabet_char(c, extended)).collect()
}

/// Number of filler units needed to bring `len` up to a multiple of `block`
pub fn padding(len: usize, block: usize) -> usize {
    (block - len % block) % block
}
