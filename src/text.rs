//! On-disc text decoding.
//!
//! TOC text is stored in one of six character sets selected by a 3-bit
//! code carried next to the language code of each text channel. Strings
//! are NUL-terminated in their source encoding: a single `0x00` for the
//! single-byte sets, a `0x00 0x00` pair for the double-byte sets.

use encoding_rs::{BIG5, EUC_KR, GBK, SHIFT_JIS};

/// Character set of a text channel
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Charset {
    /// ISO 646 (US-ASCII), codes 0 and 1
    Ascii,
    /// ISO 8859-1, codes 2 and 7
    Latin1,
    /// Shift-JIS (JIS X 0201 + JIS X 0208), code 3
    ShiftJis,
    /// KSC 5601 (decoded as EUC-KR), code 4
    Ksc5601,
    /// GB 2312 (decoded as GBK), code 5
    Gb2312,
    /// Big5, code 6
    Big5,
}

impl Charset {
    /// Decode the 3-bit on-disc character set code. Only the low three
    /// bits of `code` are considered.
    pub fn from_code(code: u8) -> Charset {
        match code & 7 {
            0 | 1 => Charset::Ascii,
            2 | 7 => Charset::Latin1,
            3 => Charset::ShiftJis,
            4 => Charset::Ksc5601,
            5 => Charset::Gb2312,
            6 => Charset::Big5,
            _ => unreachable!(),
        }
    }

    /// Returns true for the double-byte character sets
    pub fn is_double_byte(self) -> bool {
        matches!(
            self,
            Charset::ShiftJis | Charset::Ksc5601 | Charset::Gb2312 | Charset::Big5
        )
    }

    /// Return the byte length of the string starting at `raw`, up to but
    /// excluding the terminator. If no terminator is found the whole
    /// slice is the string.
    pub fn source_len(self, raw: &[u8]) -> usize {
        if self.is_double_byte() {
            // Double-byte sets terminate on the first NUL pair
            let mut i = 0;

            while i + 1 < raw.len() {
                if raw[i] == 0 && raw[i + 1] == 0 {
                    return i;
                }

                i += 1;
            }

            // A lone trailing NUL still ends the string
            if !raw.is_empty() && raw[raw.len() - 1] == 0 {
                raw.len() - 1
            } else {
                raw.len()
            }
        } else {
            raw.iter().position(|&b| b == 0).unwrap_or(raw.len())
        }
    }

    /// Convert the NUL-terminated string starting at `raw` to an owned
    /// UTF-8 string. Malformed sequences decode to the replacement
    /// character, never an error.
    pub fn decode(self, raw: &[u8]) -> String {
        let raw = &raw[..self.source_len(raw)];

        match self {
            // Treat both single-byte sets as a plain byte-to-code-point
            // copy. This is exact for ISO 8859-1 and covers out-of-range
            // ASCII bytes without failing.
            Charset::Ascii | Charset::Latin1 => raw.iter().map(|&b| b as char).collect(),
            Charset::ShiftJis => SHIFT_JIS.decode(raw).0.into_owned(),
            Charset::Ksc5601 => EUC_KR.decode(raw).0.into_owned(),
            Charset::Gb2312 => GBK.decode(raw).0.into_owned(),
            Charset::Big5 => BIG5.decode(raw).0.into_owned(),
        }
    }
}
