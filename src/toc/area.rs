//! Per-area TOC.
//!
//! Each audio area (stereo or multi-channel) carries its own TOC of
//! `toc_size` contiguous sectors, stored twice. Sector 0 is the area
//! header, sector 1 the track location list, sector 2 the track time
//! list and sectors 3 to 4 the ISRC/genre list. The header declares
//! sector offsets for three optional regions: the access list, the
//! track text and the index list.

use super::master::AreaPointers;
use super::{be_u16, be_u32, check_signature, Genre, Locale};
use crate::frame::dsd::DsdFrameReader;
use crate::frame::dst::DstFrameReader;
use crate::frame::FrameReader;
use crate::frame_time::FrameTime;
use crate::source::{read_payload, SectorGeometry, SectorSource};
use crate::{
    ChannelType, FrameFormat, SacdError, SacdResult, MAX_INDEX_COUNT, MAX_TEXT_CHANNELS,
    SACD_LSN_SIZE, SACD_SAMPLING_FREQUENCY,
};

const STEREO_SIGNATURE: &[u8; 8] = b"TWOCHTOC";
const MULTICHANNEL_SIGNATURE: &[u8; 8] = b"MULCHTOC";
const TRACK_LIST_1_SIGNATURE: &[u8; 8] = b"SACDTRL1";
const TRACK_LIST_2_SIGNATURE: &[u8; 8] = b"SACDTRL2";
const ISRC_GENRE_SIGNATURE: &[u8; 8] = b"SACD_IGL";
const ACCESS_LIST_SIGNATURE: &[u8; 8] = b"SACD_ACC";
const TRACK_TEXT_SIGNATURE: &[u8; 8] = b"SACDTTxt";
const INDEX_LIST_SIGNATURE: &[u8; 8] = b"SACD_Ind";

// Byte offsets within the area header sector
const VERSION: usize = 8;
const TOC_SIZE: usize = 10;
const MAX_BYTE_RATE: usize = 16;
const SAMPLE_FREQUENCY: usize = 20;
const FRAME_FORMAT: usize = 21;
const CHANNEL_COUNT: usize = 32;
const LOUDSPEAKER_CONFIG: usize = 33;
const TOTAL_PLAY_TIME: usize = 40;
const TRACK_OFFSET: usize = 44;
const TRACK_COUNT: usize = 45;
const TRACK_AREA_START: usize = 48;
const TRACK_AREA_END: usize = 52;
const TEXT_CHANNEL_COUNT: usize = 56;
const LOCALES: usize = 60;
const TRACK_TEXT_OFFSET: usize = 92;
const INDEX_LIST_OFFSET: usize = 94;
const ACCESS_LIST_OFFSET: usize = 96;
const AREA_TEXT: usize = 100;

/// Maximum number of tracks an area list can hold
const MAX_TRACK_COUNT: usize = 255;

/// Text item type carrying the track title
pub const TRACK_TEXT_TITLE: u8 = 1;
/// Text item type carrying the track performer
pub const TRACK_TEXT_PERFORMER: u8 = 2;

/// Sparse index from frame numbers (at a fixed frame step) to the
/// sector where that frame starts, used to bound DST seeks
#[derive(Clone, Debug)]
pub struct AccessList {
    /// Frame distance between consecutive entries
    pub step_size: u16,
    /// One entry per `step_size` frames of the area
    pub entries: Vec<AccessEntry>,
}

/// One access list entry
#[derive(Clone, Copy, Debug)]
pub struct AccessEntry {
    /// Sector in which the entry's frame starts
    pub frame_start_lsn: u32,
    /// How many sectors before the interpolated estimate a seek must
    /// start to be safe
    pub margin_sectors: u16,
}

/// The four per-track mute/interpolation flag bits
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct TrackFlags {
    /// Bit 0 of the on-disc flags byte
    pub mute_full: bool,
    /// Bit 1
    pub mute_interval: bool,
    /// Bit 2
    pub ilp_start: bool,
    /// Bit 3
    pub ilp_end: bool,
}

impl TrackFlags {
    fn parse(raw: u8) -> TrackFlags {
        TrackFlags {
            mute_full: raw & 0x01 != 0,
            mute_interval: raw & 0x02 != 0,
            ilp_start: raw & 0x04 != 0,
            ilp_end: raw & 0x08 != 0,
        }
    }
}

/// One decoded track text item
#[derive(Clone, Debug)]
pub struct TrackTextItem {
    /// On-disc item type (see `TRACK_TEXT_TITLE` and friends)
    pub text_type: u8,
    /// Decoded text
    pub text: String,
}

/// Everything the area TOC knows about one track
#[derive(Clone, Debug)]
pub struct TrackInfo {
    /// ISRC of the track, `None` when the on-disc field is nulled
    pub isrc: Option<String>,
    /// Mute/ILP flag bits
    pub flags: TrackFlags,
    /// Raw track mode byte, kept verbatim
    pub track_mode: u8,
    /// Track genre
    pub genre: Genre,
    /// First sector of the track
    pub start_lsn: u32,
    /// Number of sectors covered by the track. Derived from the next
    /// track's start so that the stored tracks tile the track area
    /// without gaps.
    pub sector_length: u32,
    /// Track length in frames, pre-gap included
    pub length_frames: u32,
    /// Index start frames: element 0 is the pre-gap start, element 1
    /// the track start time code, further elements come from the
    /// optional index list
    pub index_starts: Vec<u32>,
    /// Text items, one vector per text channel
    pub text: Vec<Vec<TrackTextItem>>,
}

impl TrackInfo {
    /// Title of this track on text channel `channel` (0-based), if any
    pub fn title(&self, channel: usize) -> Option<&str> {
        self.text_item(channel, TRACK_TEXT_TITLE)
    }

    /// Performer of this track on text channel `channel` (0-based)
    pub fn performer(&self, channel: usize) -> Option<&str> {
        self.text_item(channel, TRACK_TEXT_PERFORMER)
    }

    fn text_item(&self, channel: usize, text_type: u8) -> Option<&str> {
        self.text
            .get(channel)?
            .iter()
            .find(|i| i.text_type == text_type)
            .map(|i| i.text.as_str())
    }
}

/// Decoded area-level text of one text channel
#[derive(Clone, Debug, Default)]
#[allow(missing_docs)]
pub struct AreaText {
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub description_phonetic: Option<String>,
    pub copyright_phonetic: Option<String>,
}

/// Parsed per-area TOC
pub struct AreaToc {
    kind: ChannelType,
    version: (u8, u8),
    size_sectors: u16,
    max_byte_rate: u32,
    sample_frequency_code: u8,
    frame_format: FrameFormat,
    channel_count: u8,
    loudspeaker_config: u8,
    total_play_time: u32,
    track_offset: u8,
    track_area_start: u32,
    track_area_end: u32,
    text_channel_count: u8,
    locales: [Locale; MAX_TEXT_CHANNELS],
    tracks: Vec<TrackInfo>,
    access_list: Option<AccessList>,
    area_text: Vec<AreaText>,
}

impl AreaToc {
    /// Read and parse the TOC of `kind` from `source` using copy 1 or 2
    /// of the pair declared in the Master TOC
    pub fn read(
        source: &mut dyn SectorSource,
        kind: ChannelType,
        pointers: &AreaPointers,
        copy: u8,
    ) -> SacdResult<AreaToc> {
        let lsn = match copy {
            1 => pointers.toc_1_lsn,
            2 => pointers.toc_2_lsn,
            _ => return Err(SacdError::InvalidArgument),
        };

        let data = read_payload(source, lsn, u32::from(pointers.toc_size))?;

        AreaToc::parse(&data, kind)
    }

    /// Parse `toc_size` sectors worth of area TOC payload
    pub(crate) fn parse(data: &[u8], kind: ChannelType) -> SacdResult<AreaToc> {
        // Header, two track lists and the two ISRC/genre sectors are
        // mandatory
        if data.len() < 5 * SACD_LSN_SIZE {
            return Err(SacdError::NoData);
        }

        let header = &data[..SACD_LSN_SIZE];

        let signature = match kind {
            ChannelType::Stereo => STEREO_SIGNATURE,
            ChannelType::Multichannel => MULTICHANNEL_SIGNATURE,
        };

        check_signature(header, signature)?;

        let frame_format = match FrameFormat::from_code(header[FRAME_FORMAT]) {
            Some(f) => f,
            None => return Err(SacdError::FrameFormat),
        };

        let channel_count = header[CHANNEL_COUNT];

        let channels_ok = match kind {
            ChannelType::Stereo => channel_count == 2,
            ChannelType::Multichannel => channel_count == 5 || channel_count == 6,
        };

        if !channels_ok {
            return Err(SacdError::ChannelCount);
        }

        let total_play_time = match FrameTime::new(
            header[TOTAL_PLAY_TIME],
            header[TOTAL_PLAY_TIME + 1],
            header[TOTAL_PLAY_TIME + 2],
        ) {
            Some(t) => t.frame_number(),
            None => return Err(SacdError::InvalidSignature),
        };

        let track_count = header[TRACK_COUNT] as usize;
        if track_count > MAX_TRACK_COUNT {
            return Err(SacdError::InvalidSignature);
        }

        let track_area_start = be_u32(header, TRACK_AREA_START);
        let track_area_end = be_u32(header, TRACK_AREA_END);

        let mut locales = [Locale {
            language: [0; 2],
            charset_code: 0,
        }; MAX_TEXT_CHANNELS];

        for (i, locale) in locales.iter_mut().enumerate() {
            *locale = Locale::parse(array_ref![header, LOCALES + i * 4, 4]);
        }

        let text_channel_count = (header[TEXT_CHANNEL_COUNT] as usize).min(MAX_TEXT_CHANNELS) as u8;

        // Mandatory lists
        let track_list_1 = &data[SACD_LSN_SIZE..2 * SACD_LSN_SIZE];
        let track_list_2 = &data[2 * SACD_LSN_SIZE..3 * SACD_LSN_SIZE];
        let isrc_genre = &data[3 * SACD_LSN_SIZE..5 * SACD_LSN_SIZE];

        check_signature(track_list_1, TRACK_LIST_1_SIGNATURE)?;
        check_signature(track_list_2, TRACK_LIST_2_SIGNATURE)?;
        check_signature(isrc_genre, ISRC_GENRE_SIGNATURE)?;

        // Optional regions, each a sector offset within the TOC
        let track_text = optional_region(data, header, TRACK_TEXT_OFFSET, TRACK_TEXT_SIGNATURE)?;
        let index_list = optional_region(data, header, INDEX_LIST_OFFSET, INDEX_LIST_SIGNATURE)?;
        let access_region =
            optional_region(data, header, ACCESS_LIST_OFFSET, ACCESS_LIST_SIGNATURE)?;

        let access_list =
            access_region.and_then(|region| parse_access_list(region, total_play_time));

        let tracks = build_tracks(
            track_count,
            track_list_1,
            track_list_2,
            isrc_genre,
            index_list,
            track_text,
            &locales,
            track_area_end,
        )?;

        let area_text = decode_area_text(header, &locales);

        debug!(
            "area TOC: {:?}, {:?}, {} tracks, {} frames",
            kind, frame_format, track_count, total_play_time
        );

        Ok(AreaToc {
            kind,
            version: (header[VERSION], header[VERSION + 1]),
            size_sectors: be_u16(header, TOC_SIZE),
            max_byte_rate: be_u32(header, MAX_BYTE_RATE),
            sample_frequency_code: header[SAMPLE_FREQUENCY],
            frame_format,
            channel_count,
            loudspeaker_config: header[LOUDSPEAKER_CONFIG],
            total_play_time,
            track_offset: header[TRACK_OFFSET],
            track_area_start,
            track_area_end,
            text_channel_count,
            locales,
            tracks,
            access_list,
            area_text,
        })
    }

    /// Kind of this area
    pub fn kind(&self) -> ChannelType {
        self.kind
    }

    /// Specification version as (major, minor)
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Size of this TOC in sectors
    pub fn size_sectors(&self) -> u16 {
        self.size_sectors
    }

    /// Maximum byte rate of the area
    pub fn max_byte_rate(&self) -> u32 {
        self.max_byte_rate
    }

    /// Encoding of the audio frames
    pub fn frame_format(&self) -> FrameFormat {
        self.frame_format
    }

    /// Number of audio channels
    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    /// Loudspeaker configuration byte
    pub fn loudspeaker_config(&self) -> u8 {
        self.loudspeaker_config
    }

    /// Raw on-disc sampling frequency code
    pub fn sample_frequency_code(&self) -> u8 {
        self.sample_frequency_code
    }

    /// Sampling frequency in Hz, `None` for unknown codes
    pub fn sample_frequency(&self) -> Option<u32> {
        match self.sample_frequency_code {
            4 => Some(SACD_SAMPLING_FREQUENCY),
            _ => None,
        }
    }

    /// Total play time of the area in frames
    pub fn total_play_time(&self) -> u32 {
        self.total_play_time
    }

    /// Number of the first track, as declared on disc
    pub fn track_offset(&self) -> u8 {
        self.track_offset
    }

    /// Number of tracks in the area
    pub fn track_count(&self) -> u8 {
        self.tracks.len() as u8
    }

    /// Track number `n` (1-based)
    pub fn track(&self, n: u8) -> SacdResult<&TrackInfo> {
        if n == 0 {
            return Err(SacdError::InvalidArgument);
        }

        match self.tracks.get(n as usize - 1) {
            Some(t) => Ok(t),
            None => Err(SacdError::InvalidArgument),
        }
    }

    /// All tracks in order
    pub fn tracks(&self) -> &[TrackInfo] {
        &self.tracks
    }

    /// First and last sector of the track area, inclusive
    pub fn track_area(&self) -> (u32, u32) {
        (self.track_area_start, self.track_area_end)
    }

    /// Number of used text channels
    pub fn text_channel_count(&self) -> u8 {
        self.text_channel_count
    }

    /// Locale of text channel `channel` (1-based)
    pub fn locale(&self, channel: u8) -> SacdResult<&Locale> {
        if channel == 0 || channel > self.text_channel_count {
            return Err(SacdError::InvalidArgument);
        }

        Ok(&self.locales[channel as usize - 1])
    }

    /// Area-level text of channel `channel` (1-based)
    pub fn area_text(&self, channel: u8) -> SacdResult<&AreaText> {
        if channel == 0 || channel as usize > self.area_text.len() {
            return Err(SacdError::InvalidArgument);
        }

        Ok(&self.area_text[channel as usize - 1])
    }

    /// The access list, when the disc carries one
    pub fn access_list(&self) -> Option<&AccessList> {
        self.access_list.as_ref()
    }

    /// Sector range `[from, to]` to scan for the start of `frame`,
    /// interpolated from the access list. Without an access list the
    /// whole track area is returned.
    pub fn search_range(&self, frame: u32) -> (u32, u32) {
        search_range(
            self.access_list.as_ref(),
            frame,
            self.total_play_time,
            self.track_area_start,
            self.track_area_end,
        )
    }

    /// Instantiate the frame reader matching this area's frame format
    pub fn make_frame_reader(&self, geometry: SectorGeometry) -> Box<dyn FrameReader> {
        match self.frame_format {
            FrameFormat::Dsd3In14 => Box::new(DsdFrameReader::new_3_in_14(
                self.track_area_start,
                self.track_area_end,
                geometry,
            )),
            FrameFormat::Dsd3In16 => Box::new(DsdFrameReader::new_3_in_16(
                self.track_area_start,
                self.track_area_end,
                geometry,
            )),
            FrameFormat::Dst => Box::new(DstFrameReader::new(
                self.track_area_start,
                self.track_area_end,
                geometry,
                self.total_play_time,
                self.access_list.clone(),
            )),
        }
    }
}

/// Slice an optional region out of the TOC buffer and check its
/// signature. A zero offset means the region is absent; an offset
/// outside the TOC is a hard error.
fn optional_region<'a>(
    data: &'a [u8],
    header: &[u8],
    offset_field: usize,
    signature: &[u8; 8],
) -> SacdResult<Option<&'a [u8]>> {
    let offset = be_u16(header, offset_field) as usize;

    if offset == 0 {
        return Ok(None);
    }

    if offset * SACD_LSN_SIZE >= data.len() {
        return Err(SacdError::InvalidSignature);
    }

    let region = &data[offset * SACD_LSN_SIZE..];

    check_signature(region, signature)?;

    Ok(Some(region))
}

/// Decode the access list region. Malformed lists (bad step size or an
/// entry count inconsistent with the area play time) are dropped rather
/// than failing the whole parse; seeks then fall back to full scans.
fn parse_access_list(region: &[u8], total_play_time: u32) -> Option<AccessList> {
    let step_size = be_u16(region, 8);
    let num_entries = be_u16(region, 10) as usize;

    if step_size == 0 || step_size > 180 || step_size % 10 != 0 {
        warn!("dropping access list with step size {}", step_size);
        return None;
    }

    let expected = if total_play_time == 0 {
        0
    } else {
        (total_play_time - 1) / u32::from(step_size) + 1
    };

    if num_entries as u32 != expected {
        warn!(
            "dropping access list: {} entries, expected {}",
            num_entries, expected
        );
        return None;
    }

    if 12 + num_entries * 5 > region.len() {
        warn!("dropping truncated access list");
        return None;
    }

    let mut entries = Vec::with_capacity(num_entries);

    for i in 0..num_entries {
        let raw = &region[12 + i * 5..];

        let frame_start_lsn =
            (u32::from(raw[0]) << 16) | (u32::from(raw[1]) << 8) | u32::from(raw[2]);

        // Bit 15 of the flags word is a detail-table indicator that we
        // don't use; the low 15 bits are the seek margin
        let margin_sectors = be_u16(raw, 3) & 0x7fff;

        entries.push(AccessEntry {
            frame_start_lsn,
            margin_sectors,
        });
    }

    Some(AccessList { step_size, entries })
}

pub(crate) fn search_range(
    access_list: Option<&AccessList>,
    frame: u32,
    total_play_time: u32,
    area_start: u32,
    area_end: u32,
) -> (u32, u32) {
    let list = match access_list {
        Some(l) if !l.entries.is_empty() => l,
        _ => return (area_start, area_end),
    };

    let step = u32::from(list.step_size);
    let count = list.entries.len() as u32;

    let entry_index = (frame / step).min(count - 1);
    let entry = &list.entries[entry_index as usize];

    let entry_lsn = entry.frame_start_lsn;
    let margin = u32::from(entry.margin_sectors);
    let frame_offset = frame % step;

    let (from, to) = if entry_index + 1 < count {
        let next_lsn = list.entries[entry_index as usize + 1].frame_start_lsn;
        let interval = next_lsn.saturating_sub(entry_lsn);

        let estimated = entry_lsn + frame_offset * interval / step;

        (estimated.saturating_sub(margin).max(entry_lsn), next_lsn)
    } else {
        let remaining_frames = total_play_time.saturating_sub(entry_index * step);

        let from = if remaining_frames > 0 {
            let span = area_end.saturating_sub(entry_lsn);
            let estimated = entry_lsn + frame_offset * span / step;

            estimated.saturating_sub(margin).max(entry_lsn)
        } else {
            entry_lsn
        };

        (from, area_end)
    };

    let to = to.min(area_end);

    (from.max(area_start).min(to), to)
}

/// Build the per-track info vector with contiguous sector coverage
#[allow(clippy::too_many_arguments)]
fn build_tracks(
    track_count: usize,
    track_list_1: &[u8],
    track_list_2: &[u8],
    isrc_genre: &[u8],
    index_list: Option<&[u8]>,
    track_text: Option<&[u8]>,
    locales: &[Locale; MAX_TEXT_CHANNELS],
    track_area_end: u32,
) -> SacdResult<Vec<TrackInfo>> {
    let mut tracks = Vec::with_capacity(track_count);

    let mut running_frame = 0u32;

    for t in 0..track_count {
        let start_lsn = be_u32(track_list_1, 8 + t * 4);

        // The next track's start (or the area end for the last track)
        // bounds this track so that coverage is contiguous even when
        // the on-disc length field understates the range
        let bound = if t + 1 < track_count {
            be_u32(track_list_1, 8 + (t + 1) * 4)
        } else {
            track_area_end
        };

        if bound < start_lsn {
            return Err(SacdError::InvalidSignature);
        }

        let sector_length = bound - start_lsn + 1;

        let time_raw = array_ref![track_list_2, 8 + t * 4, 4];
        let duration_raw = array_ref![track_list_2, 1028 + t * 4, 4];

        let start_time = match FrameTime::new(time_raw[0], time_raw[1], time_raw[2]) {
            Some(t) => t,
            None => return Err(SacdError::InvalidSignature),
        };

        let duration = match FrameTime::new(duration_raw[0], duration_raw[1], duration_raw[2]) {
            Some(t) => t,
            None => return Err(SacdError::InvalidSignature),
        };

        let mut index_starts = Vec::with_capacity(2);

        index_starts.push(running_frame);
        index_starts.push(start_time.frame_number());

        if let Some(region) = index_list {
            append_sub_indices(region, t, &mut index_starts);
        }

        let isrc_raw = &isrc_genre[8 + t * 12..8 + t * 12 + 12];

        let isrc = if isrc_raw.iter().all(|&b| b == 0) {
            None
        } else {
            Some(String::from_utf8_lossy(isrc_raw).into_owned())
        };

        let genre = Genre::parse(array_ref![isrc_genre, 3068 + t * 4, 4]);

        let text = match track_text {
            Some(region) => decode_track_text(region, t, locales),
            None => Vec::new(),
        };

        let length_frames = duration.frame_number();
        running_frame += length_frames;

        tracks.push(TrackInfo {
            isrc,
            flags: TrackFlags::parse(time_raw[3]),
            track_mode: duration_raw[3],
            genre,
            start_lsn,
            sector_length,
            length_frames,
            index_starts,
            text,
        });
    }

    Ok(tracks)
}

/// Append the sub-index start frames of track `t` from the index list
/// region
fn append_sub_indices(region: &[u8], t: usize, index_starts: &mut Vec<u32>) {
    let offset = be_u16(region, 8 + t * 2) as usize;

    if offset == 0 || offset + 2 > region.len() {
        return;
    }

    let count = (region[offset] as usize).min(MAX_INDEX_COUNT - 1);

    for i in 0..count {
        let entry = offset + 2 + i * 4;

        if entry + 4 > region.len() {
            break;
        }

        let time = match FrameTime::new(region[entry], region[entry + 1], region[entry + 2]) {
            Some(t) => t,
            None => break,
        };

        index_starts.push(time.frame_number());
    }
}

/// Decode the text items of track `t` on every used text channel
fn decode_track_text(
    region: &[u8],
    t: usize,
    locales: &[Locale; MAX_TEXT_CHANNELS],
) -> Vec<Vec<TrackTextItem>> {
    let mut channels = Vec::with_capacity(MAX_TEXT_CHANNELS);

    for (c, locale) in locales.iter().enumerate() {
        let mut items = Vec::new();

        if locale.is_used() {
            let table_entry = 8 + (c * MAX_TRACK_COUNT + t) * 2;

            if table_entry + 2 <= region.len() {
                let offset = be_u16(region, table_entry) as usize;

                if offset != 0 && offset + 2 <= region.len() {
                    decode_text_items(region, offset, locale, &mut items);
                }
            }
        }

        channels.push(items);
    }

    channels
}

/// Walk the item list at `offset`: each item is a type byte, a padding
/// byte and a NUL-terminated string, the next item starting at the
/// following 4-byte boundary
fn decode_text_items(region: &[u8], offset: usize, locale: &Locale, items: &mut Vec<TrackTextItem>) {
    let charset = locale.charset();

    let num_items = region[offset] as usize;
    let mut cursor = offset + 2;

    for _ in 0..num_items {
        if cursor + 2 > region.len() {
            break;
        }

        let text_type = region[cursor];
        cursor += 2;

        if cursor >= region.len() {
            break;
        }

        let len = charset.source_len(&region[cursor..]);

        items.push(TrackTextItem {
            text_type,
            text: charset.decode(&region[cursor..]),
        });

        cursor += len + 1;
        cursor = (cursor + 3) & !3;
    }
}

/// Decode the area-level text declared in the header sector
fn decode_area_text(header: &[u8], locales: &[Locale; MAX_TEXT_CHANNELS]) -> Vec<AreaText> {
    let mut texts = Vec::with_capacity(MAX_TEXT_CHANNELS);

    for (c, locale) in locales.iter().enumerate() {
        let mut text = AreaText::default();

        if locale.is_used() {
            let charset = locale.charset();

            let fields: [&mut Option<String>; 4] = [
                &mut text.description,
                &mut text.copyright,
                &mut text.description_phonetic,
                &mut text.copyright_phonetic,
            ];

            for (i, field) in fields.into_iter().enumerate() {
                let off = be_u16(header, AREA_TEXT + c * 8 + i * 2) as usize;

                if off != 0 && off < SACD_LSN_SIZE {
                    *field = Some(charset.decode(&header[off..]));
                }
            }
        }

        texts.push(text);
    }

    texts
}
