//! Generic interface to read Super Audio CD (SACD) disc images.
//!
//! The entry point is [`reader::SacdReader`] which ties together a
//! [`source::SectorSource`] (plain image file, network server or
//! authenticated optical drive), the disc-level Master TOC and the
//! per-area TOCs, and routes audio-frame reads to the frame reader
//! matching the area's encoding (plain DSD or DST-compressed).

#![warn(missing_docs)]

#[macro_use]
extern crate arrayref;
extern crate encoding_rs;
#[macro_use]
extern crate log;
#[cfg(feature = "serde")]
extern crate serde;
extern crate thiserror;

pub mod frame;
pub mod frame_time;
pub mod reader;
pub mod source;
pub mod text;
pub mod toc;

#[cfg(test)]
pub(crate) mod testutil;

pub use frame::DataType;
pub use frame_time::FrameTime;
pub use reader::SacdReader;
pub use source::{SectorFormat, SectorGeometry, SectorSource};
pub use toc::area::AreaToc;
pub use toc::master::MasterToc;

use std::io;
use thiserror::Error;

/// Payload size of a logical sector in bytes. Physical sector encodings
/// add a header and/or trailer on top of this (see
/// [`source::SectorFormat`]).
pub const SACD_LSN_SIZE: usize = 2048;

/// DSD sampling frequency in Hz
pub const SACD_SAMPLING_FREQUENCY: u32 = 2_822_400;

/// Number of audio frames per second
pub const SACD_FRAME_RATE: u32 = 75;

/// Size in bytes of one frame of DSD audio payload
pub const SACD_FRAME_SIZE: usize = 9408;

/// Logical sector numbers of the three redundant Master TOC copies
pub const MASTER_TOC_LSN: [u32; 3] = [510, 520, 530];

/// Length of a Master TOC copy in sectors
pub const MASTER_TOC_LEN: u32 = 10;

/// Maximum number of text channels a disc can carry
pub const MAX_TEXT_CHANNELS: usize = 8;

/// Maximum number of index points per track, including the pre-gap and
/// track-start entries
pub const MAX_INDEX_COUNT: usize = 255;

/// Maximum number of sectors a single DST frame can span
pub const MAX_DST_SECTORS: u32 = 16;

/// Maximum number of disc or album genre entries
pub const MAX_GENRE_COUNT: usize = 4;

/// The two kinds of audio area a disc can carry
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum ChannelType {
    /// Two-channel stereo area
    Stereo,
    /// Multi-channel (5 or 6 channel) area
    Multichannel,
}

/// Encoding of the audio frames within an area
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum FrameFormat {
    /// DST-compressed frames of variable length
    Dst,
    /// Plain DSD, three frames per 14-sector block
    Dsd3In14,
    /// Plain DSD, three frames per 16-sector block
    Dsd3In16,
}

impl FrameFormat {
    /// Decode the on-disc frame format code
    pub fn from_code(code: u8) -> Option<FrameFormat> {
        let f = match code {
            0 => FrameFormat::Dst,
            2 => FrameFormat::Dsd3In14,
            3 => FrameFormat::Dsd3In16,
            _ => return None,
        };

        Some(f)
    }

    /// Returns true if frames are DST-compressed
    pub fn is_dst(self) -> bool {
        self == FrameFormat::Dst
    }
}

/// Error type for SACD operations.
#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum SacdError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid or out-of-range argument")]
    InvalidArgument,
    #[error("The reader has not been initialised")]
    Uninitialised,
    #[error("Allocation failed while parsing a table of contents")]
    Memory,
    #[error("The source is shorter than the requested sector range")]
    NoData,
    #[error("A mandatory SACD signature check failed")]
    InvalidSignature,
    #[error("Area channel count is inconsistent with the area kind")]
    ChannelCount,
    #[error("Unknown audio frame format code")]
    FrameFormat,
    #[error("The requested area, channel or text item is absent")]
    NotAvailable,
    #[error("Playback position wrapped past the end of the area")]
    EndOfAudio,
    #[error("Access list entry overshot the requested frame")]
    AccessListInvalid,
    #[error("Frame not found in the searched sector range")]
    FrameNotFound,
    #[error("Drive authentication failed")]
    AuthFailed,
    #[error("Sector decryption failed")]
    DecryptFailed,
    #[error("Operation not supported by this sector source")]
    NotSupported,
}

/// Convenience type alias for a `Result<R, SacdError>`
pub type SacdResult<R> = std::result::Result<R, SacdError>;

#[test]
fn sacderror_display() {
    // Make sure that SacdError implements Display. This should be true if
    // we set an `#[error("...")]` for every variant
    println!("{}", SacdError::InvalidSignature);
}
