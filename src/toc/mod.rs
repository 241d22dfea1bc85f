//! On-disc table-of-contents parsing.
//!
//! A disc carries one Master TOC (three redundant copies at fixed
//! sector numbers) describing the album and pointing at up to two Area
//! TOCs, one per audio area. All multi-byte integers on disc are
//! big-endian.

use crate::text::Charset;
use crate::{SacdError, SacdResult};

pub mod area;
pub mod master;

pub use self::area::{AccessList, AreaToc, TrackInfo};
pub use self::master::MasterToc;

/// Which genre table an entry indexes into
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum GenreTable {
    /// Entry unused
    Unused,
    /// General genre table
    General,
    /// Japanese genre table
    Japanese,
}

/// One disc, album or track genre entry
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Genre {
    /// Which table `index` points into
    pub table: GenreTable,
    /// Index within the table
    pub index: u16,
}

impl Genre {
    /// Decode a 4-byte on-disc genre entry. Unknown table codes decode
    /// as unused.
    pub(crate) fn parse(raw: &[u8; 4]) -> Genre {
        let table = match raw[0] {
            1 => GenreTable::General,
            2 => GenreTable::Japanese,
            _ => GenreTable::Unused,
        };

        Genre {
            table,
            index: u16::from_be_bytes([raw[2], raw[3]]),
        }
    }

    /// Returns true if the entry indexes a real table
    pub fn is_used(&self) -> bool {
        self.table != GenreTable::Unused
    }
}

/// Language and character set of one text channel
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Locale {
    /// ISO 639 two-letter language code
    pub language: [u8; 2],
    /// On-disc character set code
    pub charset_code: u8,
}

impl Locale {
    pub(crate) fn parse(raw: &[u8; 4]) -> Locale {
        Locale {
            language: [raw[0], raw[1]],
            charset_code: raw[2],
        }
    }

    /// A channel is used when both the language and the character set
    /// are set
    pub fn is_used(&self) -> bool {
        self.language != [0, 0] && self.charset_code != 0
    }

    /// Character set of this channel
    pub fn charset(&self) -> Charset {
        Charset::from_code(self.charset_code)
    }
}

/// Check an 8-byte ASCII signature at the start of `buf`
pub(crate) fn check_signature(buf: &[u8], expected: &[u8; 8]) -> SacdResult<()> {
    if array_ref![buf, 0, 8] == expected {
        Ok(())
    } else {
        debug!(
            "signature mismatch: expected {:?}",
            std::str::from_utf8(expected).unwrap_or("?")
        );

        Err(SacdError::InvalidSignature)
    }
}

/// Read a big-endian u16 at `off`
pub(crate) fn be_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_be_bytes(*array_ref![buf, off, 2])
}

/// Read a big-endian u32 at `off`
pub(crate) fn be_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_be_bytes(*array_ref![buf, off, 4])
}

/// Decode a NUL-padded ASCII field into an owned trimmed string
pub(crate) fn padded_ascii(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());

    String::from_utf8_lossy(&raw[..end]).trim_end().to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn genre_parsing() {
        let g = Genre::parse(&[1, 0, 0, 12]);
        assert_eq!(g.table, GenreTable::General);
        assert_eq!(g.index, 12);
        assert!(g.is_used());

        let g = Genre::parse(&[0, 0, 0, 0]);
        assert!(!g.is_used());

        // Unknown table codes decode as unused
        let g = Genre::parse(&[9, 0, 0, 3]);
        assert!(!g.is_used());
    }

    #[test]
    fn locale_usage() {
        let l = Locale::parse(&[b'e', b'n', 1, 0]);
        assert!(l.is_used());

        let l = Locale::parse(&[0, 0, 1, 0]);
        assert!(!l.is_used());

        let l = Locale::parse(&[b'j', b'a', 0, 0]);
        assert!(!l.is_used());
    }

    #[test]
    fn ascii_fields() {
        assert_eq!(padded_ascii(b"ABC-123\0\0\0"), "ABC-123");
        assert_eq!(padded_ascii(b"trailing  \0"), "trailing");
        assert_eq!(padded_ascii(b""), "");
    }
}
