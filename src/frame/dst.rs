//! DST frame reader.
//!
//! DST-compressed frames are variable length, span 1 to 16 sectors and
//! do not align with sector boundaries. Every track sector starts with
//! a one-byte header declaring how many packets it carries and how many
//! frames start inside it, followed by the packet descriptors, the
//! frame info records and the packet payloads in declared order.
//!
//! Locating a frame means scanning a sector range for an audio packet
//! whose frame-start time code matches the target. The range comes from
//! the area's access list when one is present; an access list that
//! points too far forward triggers one fallback scan over the whole
//! track area.

use super::{DataType, FrameReader};
use crate::frame_time::FrameTime;
use crate::source::{SectorGeometry, SectorSource};
use crate::toc::area::{search_range, AccessList};
use crate::{SacdError, SacdResult, MAX_DST_SECTORS, SACD_LSN_SIZE};

/// One packet descriptor from a sector header
struct PacketInfo {
    frame_start: bool,
    data_type: u8,
    length: u16,
}

/// One frame info record from a sector header
struct FrameInfo {
    time: FrameTime,
    sector_count: u8,
}

/// Decoded header area of one track sector
struct SectorInfo {
    packets: Vec<PacketInfo>,
    frames: Vec<FrameInfo>,
    /// Offset of the first packet payload within the sector payload
    payload_offset: usize,
}

/// Decode the header byte, packet descriptors and frame info records
/// at the start of a 2048-byte sector payload. Returns `None` for
/// sectors that don't carry a well-formed header (padding at the end
/// of an area, for instance).
fn parse_sector(payload: &[u8]) -> Option<SectorInfo> {
    let header = *payload.first()?;

    // packet_count[7:5], frame_start_count[4:2], reserved[1],
    // dst_coded[0]
    let packet_count = (header >> 5) & 0x07;
    let frame_start_count = (header >> 2) & 0x07;
    let dst_coded = header & 0x01 != 0;

    if packet_count == 0 {
        return None;
    }

    let mut offset = 1;

    let mut packets = Vec::with_capacity(packet_count as usize);

    for _ in 0..packet_count {
        if offset + 2 > payload.len() {
            return None;
        }

        // frame_start[15], reserved[14], data_type[13:11],
        // packet_length[10:0]
        let word = u16::from_be_bytes([payload[offset], payload[offset + 1]]);
        offset += 2;

        packets.push(PacketInfo {
            frame_start: word & 0x8000 != 0,
            data_type: ((word >> 11) & 0x07) as u8,
            length: word & 0x07ff,
        });
    }

    let mut frames = Vec::with_capacity(frame_start_count as usize);

    for _ in 0..frame_start_count {
        let record_len = if dst_coded { 4 } else { 3 };

        if offset + record_len > payload.len() {
            return None;
        }

        let time = FrameTime::new(payload[offset], payload[offset + 1], payload[offset + 2])?;

        // Uncompressed frame info records carry no sector count, such
        // frames always fit in one sector
        let sector_count = if dst_coded {
            (payload[offset + 3] >> 2) & 0x1f
        } else {
            1
        };

        offset += record_len;

        frames.push(FrameInfo { time, sector_count });
    }

    Some(SectorInfo {
        packets,
        frames,
        payload_offset: offset,
    })
}

/// Position remembered after a successful read, allowing the next
/// sequential read to skip the access-list seek
struct SeqCache {
    /// Frame number of the last read
    frame: u32,
    /// Sector in which that frame started
    found_lsn: u32,
    /// Sector in which the following frame starts, when known
    next_lsn: Option<u32>,
}

/// Frame reader for DST-compressed areas
pub struct DstFrameReader {
    track_area_start: u32,
    track_area_end: u32,
    geometry: SectorGeometry,
    total_play_time: u32,
    access_list: Option<AccessList>,
    cache: Option<SeqCache>,
}

impl DstFrameReader {
    /// Create a reader over `[track_area_start, track_area_end]`
    pub fn new(
        track_area_start: u32,
        track_area_end: u32,
        geometry: SectorGeometry,
        total_play_time: u32,
        access_list: Option<AccessList>,
    ) -> DstFrameReader {
        DstFrameReader {
            track_area_start,
            track_area_end,
            geometry,
            total_play_time,
            access_list,
            cache: None,
        }
    }

    /// Read one raw sector and return its payload, decrypted when the
    /// source provides decryption and the sector belongs to the track
    /// area
    fn read_one(&self, source: &mut dyn SectorSource, lsn: u32) -> SacdResult<Vec<u8>> {
        let sector_size = self.geometry.sector_size;

        let mut raw = vec![0u8; sector_size];

        let read = source.read_sectors(lsn, 1, &mut raw)?;
        if read < 1 {
            return Err(SacdError::NoData);
        }

        if source.can_decrypt() && lsn >= self.track_area_start && lsn <= self.track_area_end {
            source.decrypt(&mut raw, 1)?;
        }

        raw.drain(..self.geometry.header_size);
        raw.truncate(SACD_LSN_SIZE);

        Ok(raw)
    }

    /// Scan `[from, to]` for the sector in which `frame_num` starts.
    /// Returns the sector and the frame's sector count, or
    /// `AccessListInvalid` when a frame past the target shows up first.
    fn scan(
        &self,
        source: &mut dyn SectorSource,
        frame_num: u32,
        from: u32,
        to: u32,
    ) -> SacdResult<(u32, u32)> {
        for lsn in from..=to {
            let payload = self.read_one(source, lsn)?;

            let info = match parse_sector(&payload) {
                Some(i) => i,
                None => continue,
            };

            let mut frame_index = 0;

            for packet in &info.packets {
                if !packet.frame_start {
                    continue;
                }

                let frame_info = match info.frames.get(frame_index) {
                    Some(f) => f,
                    None => break,
                };
                frame_index += 1;

                if packet.data_type != DataType::Audio.code() {
                    continue;
                }

                let found = frame_info.time.frame_number();

                if found == frame_num {
                    return Ok((lsn, u32::from(frame_info.sector_count)));
                }

                if found > frame_num {
                    // The search range started past the target
                    return Err(SacdError::AccessListInvalid);
                }
            }
        }

        Err(SacdError::FrameNotFound)
    }

    /// Locate `frame_num` via the access list, falling back to one scan
    /// over the whole track area when the narrowed range misses
    fn locate(&self, source: &mut dyn SectorSource, frame_num: u32) -> SacdResult<(u32, u32)> {
        let (from, to) = search_range(
            self.access_list.as_ref(),
            frame_num,
            self.total_play_time,
            self.track_area_start,
            self.track_area_end,
        );

        match self.scan(source, frame_num, from, to) {
            Err(SacdError::AccessListInvalid) | Err(SacdError::FrameNotFound)
                if (from, to) != (self.track_area_start, self.track_area_end) =>
            {
                warn!(
                    "frame {} not in [{}, {}], rescanning the whole track area",
                    frame_num, from, to
                );

                self.scan(source, frame_num, self.track_area_start, self.track_area_end)
            }
            other => other,
        }
    }

    /// Extract the target frame starting its scan at `found_lsn`
    fn read_located(
        &mut self,
        source: &mut dyn SectorSource,
        frame_num: u32,
        found_lsn: u32,
        data_type: DataType,
        buf: &mut [u8],
    ) -> SacdResult<usize> {
        if found_lsn > self.track_area_end {
            return Err(SacdError::FrameNotFound);
        }

        let count = MAX_DST_SECTORS.min(self.track_area_end - found_lsn + 1);

        let mut written = 0;
        let mut in_frame = false;
        let mut start_sector = 0u32;
        let mut frame_sectors = 0u32;
        let mut next_lsn = None;

        'sectors: for s in 0..count {
            let payload = self.read_one(source, found_lsn + s)?;

            let info = match parse_sector(&payload) {
                Some(i) => i,
                None => break,
            };

            let mut frame_index = 0;
            let mut payload_offset = info.payload_offset;

            for packet in &info.packets {
                if packet.frame_start {
                    let frame_info = match info.frames.get(frame_index) {
                        Some(f) => f,
                        None => break 'sectors,
                    };
                    frame_index += 1;

                    if packet.data_type == DataType::Audio.code() {
                        let found = frame_info.time.frame_number();

                        if in_frame {
                            // The next frame begins here, so the target
                            // is complete and starts no later than this
                            // sector
                            next_lsn = Some(found_lsn + s);
                            break 'sectors;
                        }

                        if found == frame_num {
                            in_frame = true;
                            start_sector = s;
                            frame_sectors = u32::from(frame_info.sector_count);
                        } else if found > frame_num {
                            return Err(SacdError::FrameNotFound);
                        }
                    }
                }

                let length = usize::from(packet.length);

                if in_frame && packet.data_type == data_type.code() {
                    if payload_offset + length > payload.len() {
                        break 'sectors;
                    }

                    // Truncate at the end of the caller's buffer but
                    // keep walking to find the frame boundary
                    let take = length.min(buf.len() - written);

                    buf[written..written + take]
                        .copy_from_slice(&payload[payload_offset..payload_offset + take]);
                    written += take;
                }

                payload_offset += length;
            }

            if in_frame && frame_sectors != 0 && s + 1 - start_sector == frame_sectors {
                // All of the frame's sectors are consumed, the next
                // frame starts right after them
                next_lsn = Some(found_lsn + start_sector + frame_sectors);
                break;
            }
        }

        if !in_frame {
            return Err(SacdError::FrameNotFound);
        }

        self.cache = Some(SeqCache {
            frame: frame_num,
            found_lsn: found_lsn + start_sector,
            next_lsn,
        });

        Ok(written)
    }
}

impl FrameReader for DstFrameReader {
    fn read_frame(
        &mut self,
        source: &mut dyn SectorSource,
        frame_num: u32,
        data_type: DataType,
        buf: &mut [u8],
    ) -> SacdResult<usize> {
        if frame_num >= self.total_play_time {
            return Err(SacdError::InvalidArgument);
        }

        // A monotone read can reuse the last read's position as long
        // as the next frame starts in a strictly later sector
        let cached_lsn = match &self.cache {
            Some(c) if frame_num == c.frame + 1 => match c.next_lsn {
                Some(next) if next > c.found_lsn => Some(next),
                _ => None,
            },
            _ => None,
        };

        let found_lsn = match cached_lsn {
            Some(lsn) => lsn,
            None => self.locate(source, frame_num)?.0,
        };

        self.cache = None;

        self.read_located(source, frame_num, found_lsn, data_type, buf)
    }

    fn sector_range(
        &mut self,
        source: &mut dyn SectorSource,
        frame_num: u32,
    ) -> SacdResult<(u32, u32)> {
        if frame_num >= self.total_play_time {
            return Err(SacdError::InvalidArgument);
        }

        self.locate(source, frame_num)
    }
}
