//! Reader facade.
//!
//! [`SacdReader`] owns the sector source, the Master TOC and up to two
//! area TOCs, keeps the current area selection and playback cursors,
//! and routes disc-level and area-level queries to the right TOC.

use crate::frame::{DataType, FrameReader};
use crate::source::{FileSource, NetSource, SectorSource};
use crate::toc::area::AreaToc;
use crate::toc::master::MasterToc;
use crate::{ChannelType, SacdError, SacdResult};

/// Frame capacity per channel for audio reads: one frame of DSD per
/// channel plus one spare byte
const AUDIO_FRAME_CAPACITY_PER_CHANNEL: usize = 4704 + 1;

/// Frame capacity for supplementary reads
const SUPPLEMENTARY_FRAME_CAPACITY: usize = 4704 * 8;

/// Frame position argument of the audio read calls
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum FramePosition {
    /// Continue from the reader's current frame cursor
    Current,
    /// Absolute frame number within the selected area
    At(u32),
}

/// Result of a multi-frame read: how many frames were produced and the
/// byte length of each
#[derive(Clone, Debug, Default)]
pub struct FrameBatch {
    /// Number of frames written to the caller's buffer
    pub frames_read: u32,
    /// Byte length of each frame, in order
    pub sizes: Vec<usize>,
}

/// One loaded area: its TOC plus the frame reader matching its format
struct Area {
    toc: AreaToc,
    reader: Box<dyn FrameReader>,
}

#[derive(Clone, Copy, Default)]
struct Cursor {
    frame: u32,
    track: u8,
    index: u8,
}

/// SACD reader facade
#[derive(Default)]
pub struct SacdReader {
    source: Option<Box<dyn SectorSource>>,
    master: Option<MasterToc>,
    stereo: Option<Area>,
    multichannel: Option<Area>,
    current: Option<ChannelType>,
    cursor: Cursor,
}

impl SacdReader {
    /// Create a reader in the pre-init state
    pub fn new() -> SacdReader {
        SacdReader::default()
    }

    /// Open `target` and load all TOCs. The target is classified as a
    /// network address (`host:port` with a numeric port), a device path
    /// (`/dev/...`, `\\.\X:`, `X:`) or an image file path. Device
    /// targets need a drive collaborator and must go through
    /// [`SacdReader::init_with_source`] wrapping a
    /// [`crate::source::DriveSource`].
    pub fn init(&mut self, target: &str, master_toc_copy: u8, area_toc_copy: u8) -> SacdResult<()> {
        let source: Box<dyn SectorSource> = if is_device_path(target) {
            return Err(SacdError::NotSupported);
        } else if let Some(addr) = as_net_address(target) {
            Box::new(NetSource::connect(addr)?)
        } else {
            Box::new(FileSource::open(target)?)
        };

        self.init_with_source(source, master_toc_copy, area_toc_copy)
    }

    /// Load all TOCs from an already-constructed source. On failure the
    /// reader is left in the pre-init state.
    pub fn init_with_source(
        &mut self,
        mut source: Box<dyn SectorSource>,
        master_toc_copy: u8,
        area_toc_copy: u8,
    ) -> SacdResult<()> {
        if area_toc_copy != 1 && area_toc_copy != 2 {
            return Err(SacdError::InvalidArgument);
        }

        // Wipe any previous state first so that a failed init can't
        // leave a half-open reader behind
        self.close()?;

        match self.load(&mut source, master_toc_copy, area_toc_copy) {
            Ok(()) => {
                self.source = Some(source);
                Ok(())
            }
            Err(e) => {
                let _ = source.close();

                self.master = None;
                self.stereo = None;
                self.multichannel = None;
                self.current = None;

                Err(e)
            }
        }
    }

    fn load(
        &mut self,
        source: &mut Box<dyn SectorSource>,
        master_toc_copy: u8,
        area_toc_copy: u8,
    ) -> SacdResult<()> {
        // Drives authenticate here; file and network sources don't
        // support the operation, which counts as success
        match source.authenticate() {
            Ok(()) | Err(SacdError::NotSupported) => (),
            Err(e) => return Err(e),
        }

        let geometry = source.geometry();

        let master = MasterToc::read(source.as_mut(), master_toc_copy)?;

        for kind in [ChannelType::Multichannel, ChannelType::Stereo] {
            if let Some(pointers) = master.area(kind) {
                let toc = AreaToc::read(source.as_mut(), kind, pointers, area_toc_copy)?;
                let reader = toc.make_frame_reader(geometry);

                let area = Some(Area { toc, reader });

                match kind {
                    ChannelType::Stereo => self.stereo = area,
                    ChannelType::Multichannel => self.multichannel = area,
                }

                if self.current.is_none() {
                    self.current = Some(kind);
                }
            }
        }

        self.master = Some(master);
        self.cursor = Cursor::default();

        Ok(())
    }

    /// Release the source and all parsed state. Idempotent and safe in
    /// any state.
    pub fn close(&mut self) -> SacdResult<()> {
        if let Some(mut source) = self.source.take() {
            source.close()?;
        }

        self.master = None;
        self.stereo = None;
        self.multichannel = None;
        self.current = None;
        self.cursor = Cursor::default();

        Ok(())
    }

    /// Returns true between a successful `init` and `close`
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// The channel types present on the disc, multi-channel first
    pub fn available_channel_types(&self) -> Vec<ChannelType> {
        let mut kinds = Vec::new();

        if self.multichannel.is_some() {
            kinds.push(ChannelType::Multichannel);
        }

        if self.stereo.is_some() {
            kinds.push(ChannelType::Stereo);
        }

        kinds
    }

    /// Route subsequent area queries and reads to `kind`
    pub fn select_channel_type(&mut self, kind: ChannelType) -> SacdResult<()> {
        let present = match kind {
            ChannelType::Stereo => self.stereo.is_some(),
            ChannelType::Multichannel => self.multichannel.is_some(),
        };

        if !present {
            return Err(SacdError::NotAvailable);
        }

        self.current = Some(kind);
        self.cursor = Cursor::default();

        Ok(())
    }

    /// The currently selected channel type
    pub fn current_channel_type(&self) -> SacdResult<ChannelType> {
        self.current.ok_or(SacdError::NotAvailable)
    }

    /// Disc-level metadata
    pub fn master_toc(&self) -> SacdResult<&MasterToc> {
        self.master.as_ref().ok_or(SacdError::Uninitialised)
    }

    /// TOC of the currently selected area
    pub fn area_toc(&self) -> SacdResult<&AreaToc> {
        if self.master.is_none() {
            return Err(SacdError::Uninitialised);
        }

        let kind = self.current.ok_or(SacdError::NotAvailable)?;

        self.area_toc_for(kind)
    }

    /// TOC of a specific area
    pub fn area_toc_for(&self, kind: ChannelType) -> SacdResult<&AreaToc> {
        let area = match kind {
            ChannelType::Stereo => self.stereo.as_ref(),
            ChannelType::Multichannel => self.multichannel.as_ref(),
        };

        match area {
            Some(a) => Ok(&a.toc),
            None => Err(SacdError::NotAvailable),
        }
    }

    /// Required per-frame buffer capacity for `read_sound_data`
    pub fn sound_frame_capacity(&self) -> SacdResult<usize> {
        let channels = self.area_toc()?.channel_count() as usize;

        Ok(AUDIO_FRAME_CAPACITY_PER_CHANNEL * channels)
    }

    /// Required per-frame buffer capacity for `read_supplementary_data`
    pub fn supplementary_frame_capacity(&self) -> usize {
        SUPPLEMENTARY_FRAME_CAPACITY
    }

    /// Current playback position as (frame, track, index)
    pub fn position(&self) -> (u32, u8, u8) {
        (self.cursor.frame, self.cursor.track, self.cursor.index)
    }

    /// Move the frame cursor to the start of track `n` (1-based)
    pub fn select_track(&mut self, n: u8) -> SacdResult<()> {
        let start = {
            let track = self.area_toc()?.track(n)?;

            // Element 1 of the index starts is the on-disc track start
            track.index_starts[1]
        };

        self.cursor = Cursor {
            frame: start,
            track: n,
            index: 1,
        };

        Ok(())
    }

    /// Read up to `count` audio frames starting at `start`. The buffer
    /// must hold `count` times the audio frame capacity; each frame is
    /// written at a frame-capacity stride. Stops early with a partial
    /// batch on the first failure after the first frame, or when the
    /// cursor wraps past the end of the area.
    pub fn read_sound_data(
        &mut self,
        start: FramePosition,
        count: u32,
        buf: &mut [u8],
    ) -> SacdResult<FrameBatch> {
        let capacity = self.sound_frame_capacity()?;

        self.read_frames(start, count, buf, capacity, DataType::Audio)
    }

    /// Read up to `count` frames of supplementary data; same shape as
    /// `read_sound_data`
    pub fn read_supplementary_data(
        &mut self,
        start: FramePosition,
        count: u32,
        buf: &mut [u8],
    ) -> SacdResult<FrameBatch> {
        self.read_frames(
            start,
            count,
            buf,
            SUPPLEMENTARY_FRAME_CAPACITY,
            DataType::Supplementary,
        )
    }

    fn read_frames(
        &mut self,
        start: FramePosition,
        count: u32,
        buf: &mut [u8],
        capacity: usize,
        data_type: DataType,
    ) -> SacdResult<FrameBatch> {
        let source = match self.source.as_mut() {
            Some(s) => s,
            None => return Err(SacdError::Uninitialised),
        };

        let kind = self.current.ok_or(SacdError::NotAvailable)?;

        let area = match kind {
            ChannelType::Stereo => self.stereo.as_mut(),
            ChannelType::Multichannel => self.multichannel.as_mut(),
        };

        let area = match area {
            Some(a) => a,
            None => return Err(SacdError::NotAvailable),
        };

        if buf.len() < count as usize * capacity {
            return Err(SacdError::InvalidArgument);
        }

        let total = area.toc.total_play_time();

        let mut frame = match start {
            FramePosition::At(f) => {
                if f >= total {
                    return Err(SacdError::InvalidArgument);
                }

                f
            }
            FramePosition::Current => self.cursor.frame,
        };

        let mut sizes = Vec::new();

        for i in 0..count as usize {
            if frame >= total {
                // Informational: the cursor wraps around and the
                // caller gets what was read so far
                self.cursor.frame = 0;

                if sizes.is_empty() {
                    return Err(SacdError::EndOfAudio);
                }

                break;
            }

            let chunk = &mut buf[i * capacity..(i + 1) * capacity];

            match area
                .reader
                .read_frame(source.as_mut(), frame, data_type, chunk)
            {
                Ok(n) => {
                    sizes.push(n);

                    frame += 1;
                    self.cursor.frame = frame;
                }
                Err(e) => {
                    if sizes.is_empty() {
                        return Err(e);
                    }

                    break;
                }
            }
        }

        Ok(FrameBatch {
            frames_read: sizes.len() as u32,
            sizes,
        })
    }

    /// Read raw sectors straight from the source. When the source
    /// provides decryption, the part of the range that falls inside a
    /// DST-coded area's track range is decrypted in place.
    pub fn read_raw_sectors(&mut self, lsn: u32, count: u32, buf: &mut [u8]) -> SacdResult<u32> {
        let source = match self.source.as_mut() {
            Some(s) => s,
            None => return Err(SacdError::Uninitialised),
        };

        let read = source.read_sectors(lsn, count, buf)?;

        if read > 0 && source.can_decrypt() {
            let sector_size = source.geometry().sector_size;
            let last = lsn + read - 1;

            for area in [self.stereo.as_ref(), self.multichannel.as_ref()]
                .into_iter()
                .flatten()
            {
                if !area.toc.frame_format().is_dst() {
                    continue;
                }

                let (start, end) = area.toc.track_area();

                let lo = start.max(lsn);
                let hi = end.min(last);

                if lo > hi {
                    continue;
                }

                let offset = (lo - lsn) as usize * sector_size;
                let sectors = hi - lo + 1;

                source.decrypt(
                    &mut buf[offset..offset + sectors as usize * sector_size],
                    sectors,
                )?;
            }
        }

        Ok(read)
    }
}

fn is_device_path(target: &str) -> bool {
    if target.starts_with("/dev/") || target.starts_with("\\\\.\\") {
        return true;
    }

    // Bare Windows drive letter, "D:"
    let bytes = target.as_bytes();

    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn as_net_address(target: &str) -> Option<&str> {
    let (host, port) = target.rsplit_once(':')?;

    if host.is_empty() || port.parse::<u16>().is_err() {
        return None;
    }

    Some(target)
}
