// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RFC 1924 base85, byte-compatible with Python's `base64.b85encode`.
// Chosen over base64 for symbol payloads: 4:5 expansion instead of 3:4
// while staying inside the ASCII range the symbol encoder accepts.

use ipops_core::error::{IpopsError, Result};

const ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

/// Encode bytes as RFC 1924 base85 text.
///
/// Each 4-byte group becomes 5 characters, most significant digit first;
/// a final group of n bytes becomes n + 1 characters.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(4) * 5);
    for group in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..group.len()].copy_from_slice(group);
        let mut acc = u32::from_be_bytes(word);

        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (acc % 85) as u8;
            acc /= 85;
        }
        for &digit in &digits[..group.len() + 1] {
            out.push(ALPHABET[digit as usize] as char);
        }
    }
    out
}

/// Decode RFC 1924 base85 text back to bytes.
///
/// A final group of n + 1 characters yields n bytes; short groups are
/// completed with the highest digit before decoding, matching the CPython
/// reference. Fails on characters outside the alphabet, on a trailing
/// group of a single character, and on groups overflowing 32 bits.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() / 5 * 4 + 4);

    for group in text.as_bytes().chunks(5) {
        if group.len() == 1 {
            return Err(IpopsError::Decode(
                "base85: trailing single character".into(),
            ));
        }

        let mut acc: u64 = 0;
        for position in 0..5 {
            let digit = match group.get(position) {
                Some(&c) => match DECODE_TABLE[c as usize] {
                    0xff => {
                        return Err(IpopsError::Decode(format!(
                            "base85: invalid character {:?}",
                            c as char
                        )));
                    }
                    digit => digit,
                },
                None => 84,
            };
            acc = acc * 85 + u64::from(digit);
        }
        if acc > u64::from(u32::MAX) {
            return Err(IpopsError::Decode("base85: group overflows 32 bits".into()));
        }

        let word = (acc as u32).to_be_bytes();
        out.extend_from_slice(&word[..group.len() - 1]);
    }
    Ok(out)
}

const DECODE_TABLE: [u8; 256] = build_decode_table();

const fn build_decode_table() -> [u8; 256] {
    let mut table = [0xffu8; 256];
    let mut index = 0;
    while index < ALPHABET.len() {
        table[ALPHABET[index] as usize] = index as u8;
        index += 1;
    }
    table
}
