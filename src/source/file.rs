//! Image-file sector source.
//!
//! Image files come in three flavours depending on how they were
//! extracted: bare 2048-byte payloads, or raw dumps carrying a 6-byte
//! header or a 12-byte header plus 4-byte trailer around each payload.
//! The flavour is auto-detected by probing the Master TOC signature.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::{SectorFormat, SectorGeometry, SectorSource};
use crate::{SacdError, SacdResult, MASTER_TOC_LSN};

/// Master TOC signature used by the geometry probe
const MASTER_TOC_SIGNATURE: &[u8; 8] = b"SACDMTOC";

/// Sector source backed by a disc image file
pub struct FileSource {
    /// Backing file, `None` once closed
    file: Option<File>,
    geometry: SectorGeometry,
    total_sectors: u32,
}

impl FileSource {
    /// Open `path` and probe its sector geometry
    pub fn open<P: AsRef<Path>>(path: P) -> SacdResult<FileSource> {
        let mut file = File::open(path.as_ref())?;

        let len = file.metadata()?.len();

        let geometry = probe_geometry(&mut file, len)?;

        // A partial trailing sector doesn't count
        let total_sectors = (len / geometry.sector_size as u64) as u32;

        debug!(
            "opened image, {:?}, {} sectors",
            geometry.format, total_sectors
        );

        Ok(FileSource {
            file: Some(file),
            geometry,
            total_sectors,
        })
    }
}

impl SectorSource for FileSource {
    fn read_sectors(&mut self, lsn: u32, count: u32, buf: &mut [u8]) -> SacdResult<u32> {
        let file = match self.file.as_mut() {
            Some(f) => f,
            None => return Err(SacdError::Uninitialised),
        };

        let sector_size = self.geometry.sector_size;

        if buf.len() < count as usize * sector_size {
            return Err(SacdError::InvalidArgument);
        }

        if lsn >= self.total_sectors {
            return Err(SacdError::NoData);
        }

        // Clamp to the end of the image, partial reads are allowed there
        let count = count.min(self.total_sectors - lsn);

        file.seek(SeekFrom::Start(u64::from(lsn) * sector_size as u64))?;
        file.read_exact(&mut buf[..count as usize * sector_size])?;

        Ok(count)
    }

    fn total_sectors(&self) -> u32 {
        self.total_sectors
    }

    fn geometry(&self) -> SectorGeometry {
        self.geometry
    }

    fn close(&mut self) -> SacdResult<()> {
        self.file = None;

        Ok(())
    }
}

/// Look for the Master TOC signature in sector 510 at each candidate
/// geometry, widest first. If nothing matches, fall back to the bare
/// layout and let the TOC parser reject the image.
fn probe_geometry(file: &mut File, len: u64) -> SacdResult<SectorGeometry> {
    let candidates = [
        SectorFormat::Full2064,
        SectorFormat::Headered2054,
        SectorFormat::Plain2048,
    ];

    for format in candidates {
        let geom = format.geometry();

        let offset =
            u64::from(MASTER_TOC_LSN[0]) * geom.sector_size as u64 + geom.header_size as u64;

        if offset + 8 > len {
            continue;
        }

        let mut signature = [0u8; 8];

        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut signature)?;

        if &signature == MASTER_TOC_SIGNATURE {
            return Ok(geom);
        }
    }

    debug!("no Master TOC signature found, assuming bare 2048-byte sectors");

    Ok(SectorFormat::Plain2048.geometry())
}
