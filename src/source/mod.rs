//! Polymorphic sector-source layer.
//!
//! A [`SectorSource`] exposes a disc as a run of contiguous raw sectors
//! plus the physical sector geometry. Three backends exist: a plain
//! image file ([`FileSource`]), a network server streaming sectors over
//! TCP ([`NetSource`]) and an authenticated optical drive
//! ([`DriveSource`]).

use crate::{SacdError, SacdResult, SACD_LSN_SIZE};

pub mod drive;
pub mod file;
pub mod net;

pub use self::drive::{DriveAccess, DriveSource};
pub use self::file::FileSource;
pub use self::net::NetSource;

/// The three physical sector encodings found in image files
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SectorFormat {
    /// Bare 2048-byte payload
    Plain2048,
    /// 6-byte header followed by the payload
    Headered2054,
    /// 12-byte header, payload, 4-byte trailer
    Full2064,
}

impl SectorFormat {
    /// Return the geometry for this sector format
    pub fn geometry(self) -> SectorGeometry {
        match self {
            SectorFormat::Plain2048 => SectorGeometry {
                format: self,
                sector_size: 2048,
                header_size: 0,
                trailer_size: 0,
            },
            SectorFormat::Headered2054 => SectorGeometry {
                format: self,
                sector_size: 2054,
                header_size: 6,
                trailer_size: 0,
            },
            SectorFormat::Full2064 => SectorGeometry {
                format: self,
                sector_size: 2064,
                header_size: 12,
                trailer_size: 4,
            },
        }
    }
}

/// Raw sector layout of a source
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct SectorGeometry {
    /// Which of the three physical encodings this is
    pub format: SectorFormat,
    /// Total raw sector size in bytes
    pub sector_size: usize,
    /// Bytes preceding the 2048-byte payload in each raw sector
    pub header_size: usize,
    /// Bytes following the payload in each raw sector
    pub trailer_size: usize,
}

/// Abstract read-only interface to a sector-addressable SACD source
pub trait SectorSource {
    /// Read `count` contiguous raw sectors starting at `lsn` into
    /// `buf`, which must be at least `count * sector_size` bytes.
    /// Returns the number of sectors actually read; partial reads are
    /// only allowed at end-of-source. Reading entirely past the end
    /// fails with `NoData`.
    fn read_sectors(&mut self, lsn: u32, count: u32, buf: &mut [u8]) -> SacdResult<u32>;

    /// Total number of sectors in the source
    fn total_sectors(&self) -> u32;

    /// Raw sector layout of this source
    fn geometry(&self) -> SectorGeometry;

    /// Release all resources. Idempotent; any further read fails.
    fn close(&mut self) -> SacdResult<()>;

    /// Authenticate against the source. Sources without an
    /// authentication step report `NotSupported`, which callers treat
    /// as success.
    fn authenticate(&mut self) -> SacdResult<()> {
        Err(SacdError::NotSupported)
    }

    /// Decrypt `count` sectors in place. Only available on sources
    /// that report `can_decrypt`, and only after a successful
    /// `authenticate`.
    fn decrypt(&mut self, _buf: &mut [u8], _count: u32) -> SacdResult<()> {
        Err(SacdError::NotSupported)
    }

    /// Returns true if this source currently provides sector
    /// decryption
    fn can_decrypt(&self) -> bool {
        false
    }
}

/// Read `count` sectors starting at `lsn` and strip the physical
/// header/trailer, returning `count * 2048` payload bytes. Fails with
/// `NoData` on a short read.
pub(crate) fn read_payload(
    source: &mut dyn SectorSource,
    lsn: u32,
    count: u32,
) -> SacdResult<Vec<u8>> {
    let geom = source.geometry();

    let mut raw = vec![0u8; count as usize * geom.sector_size];

    let read = source.read_sectors(lsn, count, &mut raw)?;
    if read < count {
        return Err(SacdError::NoData);
    }

    if geom.header_size == 0 && geom.trailer_size == 0 {
        return Ok(raw);
    }

    let mut payload = Vec::with_capacity(count as usize * SACD_LSN_SIZE);

    for s in 0..count as usize {
        let start = s * geom.sector_size + geom.header_size;

        payload.extend_from_slice(&raw[start..start + SACD_LSN_SIZE]);
    }

    Ok(payload)
}
