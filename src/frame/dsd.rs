//! Fixed-layout DSD frame readers.
//!
//! Plain DSD areas store three 9408-byte frames per block of 14 or 16
//! sectors. A frame's location is fully determined by its number: the
//! layout tables below give, for each of the three positions within a
//! block, the first sector, the sector count and the byte slice to take
//! out of each sector. Offsets are relative to the 2048-byte sector
//! payload; the physical header is skipped on top of them.

use super::{DataType, FrameReader};
use crate::source::{SectorGeometry, SectorSource};
use crate::{SacdError, SacdResult, SACD_FRAME_SIZE};

/// Byte slice taken from one sector: (payload offset, length)
type Slice = (usize, usize);

/// Location of one of the three frames within a block
struct Position {
    /// Sector offset of the frame's first sector within the block
    sector_offset: u32,
    /// Per-sector slices, one per spanned sector
    slices: &'static [Slice],
}

struct Layout {
    sectors_per_block: u32,
    positions: [Position; 3],
}

static LAYOUT_3_IN_14: Layout = Layout {
    sectors_per_block: 14,
    positions: [
        Position {
            sector_offset: 0,
            slices: &[(32, 2016), (32, 2016), (32, 2016), (32, 2016), (32, 1344)],
        },
        Position {
            sector_offset: 4,
            slices: &[
                (1376, 672),
                (32, 2016),
                (32, 2016),
                (32, 2016),
                (32, 2016),
                (32, 672),
            ],
        },
        Position {
            sector_offset: 9,
            slices: &[(704, 1344), (32, 2016), (32, 2016), (32, 2016), (32, 2016)],
        },
    ],
};

static LAYOUT_3_IN_16: Layout = Layout {
    sectors_per_block: 16,
    positions: [
        Position {
            sector_offset: 0,
            slices: &[
                (284, 1764),
                (284, 1764),
                (284, 1764),
                (284, 1764),
                (284, 1764),
                (284, 588),
            ],
        },
        Position {
            sector_offset: 5,
            slices: &[
                (872, 1176),
                (284, 1764),
                (284, 1764),
                (284, 1764),
                (284, 1764),
                (284, 1176),
            ],
        },
        Position {
            sector_offset: 10,
            slices: &[
                (1460, 588),
                (284, 1764),
                (284, 1764),
                (284, 1764),
                (284, 1764),
                (284, 1764),
            ],
        },
    ],
};

/// Frame reader for the two fixed DSD layouts
pub struct DsdFrameReader {
    layout: &'static Layout,
    track_area_start: u32,
    track_area_end: u32,
    geometry: SectorGeometry,
}

impl DsdFrameReader {
    /// Reader for the three-frames-per-14-sectors layout
    pub fn new_3_in_14(
        track_area_start: u32,
        track_area_end: u32,
        geometry: SectorGeometry,
    ) -> DsdFrameReader {
        DsdFrameReader {
            layout: &LAYOUT_3_IN_14,
            track_area_start,
            track_area_end,
            geometry,
        }
    }

    /// Reader for the three-frames-per-16-sectors layout
    pub fn new_3_in_16(
        track_area_start: u32,
        track_area_end: u32,
        geometry: SectorGeometry,
    ) -> DsdFrameReader {
        DsdFrameReader {
            layout: &LAYOUT_3_IN_16,
            track_area_start,
            track_area_end,
            geometry,
        }
    }

    /// Compute the sector run holding `frame_num`
    fn locate(&self, frame_num: u32) -> SacdResult<(u32, &'static Position)> {
        let block = frame_num / 3;
        let position = &self.layout.positions[(frame_num % 3) as usize];

        let start = self.track_area_start
            + block * self.layout.sectors_per_block
            + position.sector_offset;

        let count = position.slices.len() as u32;

        if start + count - 1 > self.track_area_end {
            return Err(SacdError::InvalidArgument);
        }

        Ok((start, position))
    }
}

impl FrameReader for DsdFrameReader {
    fn read_frame(
        &mut self,
        source: &mut dyn SectorSource,
        frame_num: u32,
        _data_type: DataType,
        buf: &mut [u8],
    ) -> SacdResult<usize> {
        // Fixed DSD sectors have no packet structure, every frame is
        // exactly one frame worth of audio
        if buf.len() < SACD_FRAME_SIZE {
            return Err(SacdError::InvalidArgument);
        }

        let (start, position) = self.locate(frame_num)?;

        let count = position.slices.len() as u32;
        let sector_size = self.geometry.sector_size;

        let mut raw = vec![0u8; count as usize * sector_size];

        let read = source.read_sectors(start, count, &mut raw)?;
        if read < count {
            return Err(SacdError::NoData);
        }

        let mut written = 0;

        for (s, &(offset, length)) in position.slices.iter().enumerate() {
            let from = s * sector_size + self.geometry.header_size + offset;

            buf[written..written + length].copy_from_slice(&raw[from..from + length]);
            written += length;
        }

        Ok(written)
    }

    fn sector_range(
        &mut self,
        _source: &mut dyn SectorSource,
        frame_num: u32,
    ) -> SacdResult<(u32, u32)> {
        let (start, position) = self.locate(frame_num)?;

        Ok((start, position.slices.len() as u32))
    }
}
