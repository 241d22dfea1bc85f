//! Audio frame extraction.
//!
//! A [`FrameReader`] pulls one multiplexed frame at a time out of an
//! area's track sectors. Plain DSD areas use fixed sector-block
//! arithmetic ([`dsd::DsdFrameReader`]); DST-compressed areas carry a
//! packet structure inside each sector and need a searchable index
//! ([`dst::DstFrameReader`]).

use crate::source::SectorSource;
use crate::SacdResult;

pub mod dsd;
pub mod dst;

pub use self::dsd::DsdFrameReader;
pub use self::dst::DstFrameReader;

/// Payload type of a packet within a multiplexed frame
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum DataType {
    /// Audio payload
    Audio,
    /// Supplementary data
    Supplementary,
    /// Padding
    Padding,
}

impl DataType {
    /// The on-disc 3-bit data type code
    pub fn code(self) -> u8 {
        match self {
            DataType::Audio => 2,
            DataType::Supplementary => 3,
            DataType::Padding => 7,
        }
    }
}

/// Abstract frame extraction over a sector source. The source is
/// passed at call time and never owned by the reader.
pub trait FrameReader {
    /// Read frame `frame_num`, appending every packet whose type
    /// matches `data_type` to `buf`. Returns the number of bytes
    /// written.
    fn read_frame(
        &mut self,
        source: &mut dyn SectorSource,
        frame_num: u32,
        data_type: DataType,
        buf: &mut [u8],
    ) -> SacdResult<usize>;

    /// Locate frame `frame_num`, returning its first sector and the
    /// number of sectors it spans
    fn sector_range(&mut self, source: &mut dyn SectorSource, frame_num: u32)
        -> SacdResult<(u32, u32)>;
}
