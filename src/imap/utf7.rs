// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Modified UTF-7 codec for IMAP mailbox names (RFC 3501 section 5.1.3).
//!
//! Printable ASCII other than `&` passes through unchanged, `&` becomes `&-`,
//! and every other run of characters is written as `&` + base64 of its
//! UTF-16BE form (`,` instead of `/`, no padding) + `-`.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use thiserror::Error;

const MUTF7: GeneralPurpose = GeneralPurpose::new(
    &alphabet::IMAP_MUTF7,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid modified base64 in mailbox name: {0}")]
    InvalidBase64(String),

    #[error("Escaped sequence is not valid UTF-16: {0}")]
    InvalidUtf16(String),

    #[error("Non-ASCII byte 0x{0:02x} outside an escape sequence")]
    NonAsciiByte(u8),
}

fn is_direct(c: char) -> bool {
    (' '..='~').contains(&c) && c != '&'
}

fn flush_shifted(out: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|unit| unit.to_be_bytes()).collect();
    out.push('&');
    out.push_str(&MUTF7.encode(bytes));
    out.push('-');
    pending.clear();
}

/// Encodes a Unicode mailbox name into its modified UTF-7 wire form.
///
/// The result only ever contains printable ASCII.
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending: Vec<u16> = Vec::new();

    for c in text.chars() {
        if is_direct(c) {
            flush_shifted(&mut out, &mut pending);
            out.push(c);
        } else if c == '&' {
            flush_shifted(&mut out, &mut pending);
            out.push_str("&-");
        } else {
            let mut units = [0u16; 2];
            pending.extend_from_slice(c.encode_utf16(&mut units));
        }
    }
    flush_shifted(&mut out, &mut pending);
    out
}

fn decode_shifted(encoded: &[u8]) -> Result<String, CodecError> {
    let lossy = || String::from_utf8_lossy(encoded).into_owned();
    let bytes = MUTF7
        .decode(encoded)
        .map_err(|_| CodecError::InvalidBase64(lossy()))?;
    if bytes.len() % 2 != 0 {
        return Err(CodecError::InvalidUtf16(lossy()));
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|_| CodecError::InvalidUtf16(lossy()))
}

/// Decodes a modified UTF-7 mailbox name.
///
/// An escape left open at the end of the input is decoded from whatever
/// was collected so far instead of being dropped.
pub fn decode(input: impl AsRef<[u8]>) -> Result<String, CodecError> {
    let input = input.as_ref();
    let mut out = String::with_capacity(input.len());
    // `Some` while inside an `&...-` escape
    let mut shifted: Option<Vec<u8>> = None;

    for &byte in input {
        if let Some(collected) = shifted.as_mut() {
            if byte != b'-' {
                collected.push(byte);
                continue;
            }
            if collected.is_empty() {
                out.push('&');
            } else {
                out.push_str(&decode_shifted(collected)?);
            }
            shifted = None;
        } else if byte == b'&' {
            shifted = Some(Vec::new());
        } else if byte.is_ascii() {
            out.push(byte as char);
        } else {
            return Err(CodecError::NonAsciiByte(byte));
        }
    }

    if let Some(collected) = shifted {
        if !collected.is_empty() {
            out.push_str(&decode_shifted(&collected)?);
        }
    }
    Ok(out)
}
