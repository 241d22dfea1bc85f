//! Test fixtures: an in-memory sector source and builders producing
//! synthetic disc images, so that the parsers and readers can be
//! exercised hermetically.

use std::io;
use std::net::TcpListener;
use std::thread;

use crate::source::{SectorFormat, SectorGeometry, SectorSource};
use crate::{ChannelType, FrameFormat, FrameTime, SacdError, SacdResult, SACD_LSN_SIZE};

/// In-memory sector source with optional XOR "encryption" standing in
/// for a drive, plus a read log for asserting access patterns
pub struct MemSource {
    data: Vec<u8>,
    geometry: SectorGeometry,
    closed: bool,
    key: Option<u8>,
    authenticated: bool,
    decrypt_calls: u32,
    poison_below: u32,
    reads: Vec<(u32, u32)>,
}

impl MemSource {
    pub fn new(data: Vec<u8>, format: SectorFormat) -> MemSource {
        MemSource {
            data,
            geometry: format.geometry(),
            closed: false,
            key: None,
            authenticated: false,
            decrypt_calls: 0,
            poison_below: 0,
            reads: Vec::new(),
        }
    }

    /// Source whose sectors from `from_lsn` onwards are XOR-scrambled
    /// with `key` in storage; `decrypt` undoes the scrambling after
    /// `authenticate` has been called
    pub fn encrypted(mut data: Vec<u8>, format: SectorFormat, key: u8, from_lsn: u32) -> MemSource {
        let sector_size = format.geometry().sector_size;

        for b in data[from_lsn as usize * sector_size..].iter_mut() {
            *b ^= key;
        }

        let mut source = MemSource::new(data, format);
        source.key = Some(key);

        source
    }

    /// Make any read touching a sector below `lsn` fail, to prove a
    /// code path doesn't read there
    pub fn poison_below(&mut self, lsn: u32) {
        self.poison_below = lsn;
    }

    pub fn decrypt_calls(&self) -> u32 {
        self.decrypt_calls
    }

    /// All (lsn, count) pairs read so far
    pub fn read_log(&self) -> &[(u32, u32)] {
        &self.reads
    }
}

impl SectorSource for MemSource {
    fn read_sectors(&mut self, lsn: u32, count: u32, buf: &mut [u8]) -> SacdResult<u32> {
        if self.closed {
            return Err(SacdError::Uninitialised);
        }

        let sector_size = self.geometry.sector_size;

        if buf.len() < count as usize * sector_size {
            return Err(SacdError::InvalidArgument);
        }

        let total = self.total_sectors();

        if lsn >= total {
            return Err(SacdError::NoData);
        }

        if lsn < self.poison_below {
            return Err(SacdError::Io(io::Error::new(
                io::ErrorKind::Other,
                "poisoned sector range",
            )));
        }

        let count = count.min(total - lsn);

        let from = lsn as usize * sector_size;
        let len = count as usize * sector_size;

        buf[..len].copy_from_slice(&self.data[from..from + len]);

        self.reads.push((lsn, count));

        Ok(count)
    }

    fn total_sectors(&self) -> u32 {
        (self.data.len() / self.geometry.sector_size) as u32
    }

    fn geometry(&self) -> SectorGeometry {
        self.geometry
    }

    fn close(&mut self) -> SacdResult<()> {
        self.closed = true;

        Ok(())
    }

    fn authenticate(&mut self) -> SacdResult<()> {
        match self.key {
            Some(_) => {
                self.authenticated = true;
                Ok(())
            }
            None => Err(SacdError::NotSupported),
        }
    }

    fn decrypt(&mut self, buf: &mut [u8], _count: u32) -> SacdResult<()> {
        if !self.authenticated {
            return Err(SacdError::DecryptFailed);
        }

        let key = self.key.unwrap();

        for b in buf.iter_mut() {
            *b ^= key;
        }

        self.decrypt_calls += 1;

        Ok(())
    }

    fn can_decrypt(&self) -> bool {
        self.authenticated
    }
}

fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_be_bytes());
}

fn put_time(buf: &mut [u8], off: usize, frames: u32) {
    let t = FrameTime::from_frame_number(frames).unwrap();

    buf[off] = t.minutes();
    buf[off + 1] = t.seconds();
    buf[off + 2] = t.frames();
}

/// Builder for the ten Master TOC sectors
pub struct MasterTocBuilder {
    album_set_size: u16,
    album_sequence_number: u16,
    date: (u16, u8, u8),
    album_title: Option<String>,
    album_artist: Option<String>,
    stereo: Option<(u32, u32, u16)>,
    multichannel: Option<(u32, u32, u16)>,
    broken_stereo: bool,
}

impl MasterTocBuilder {
    pub fn new() -> MasterTocBuilder {
        MasterTocBuilder {
            album_set_size: 1,
            album_sequence_number: 1,
            date: (0, 0, 0),
            album_title: None,
            album_artist: None,
            stereo: Some((544, 600, 10)),
            multichannel: Some((700, 760, 10)),
            broken_stereo: false,
        }
    }

    pub fn album(mut self, set_size: u16, sequence: u16) -> Self {
        self.album_set_size = set_size;
        self.album_sequence_number = sequence;
        self
    }

    pub fn date(mut self, year: u16, month: u8, day: u8) -> Self {
        self.date = (year, month, day);
        self
    }

    pub fn album_text(mut self, title: &str, artist: &str) -> Self {
        self.album_title = Some(title.to_string());
        self.album_artist = Some(artist.to_string());
        self
    }

    pub fn stereo_area(mut self, toc_1: u32, toc_2: u32, size: u16) -> Self {
        self.stereo = Some((toc_1, toc_2, size));
        self
    }

    pub fn multichannel_area(mut self, toc_1: u32, toc_2: u32, size: u16) -> Self {
        self.multichannel = Some((toc_1, toc_2, size));
        self
    }

    pub fn no_multichannel(mut self) -> Self {
        self.multichannel = None;
        self
    }

    pub fn broken_stereo_pointers(mut self) -> Self {
        self.broken_stereo = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = vec![0u8; 10 * SACD_LSN_SIZE];

        {
            let disc = &mut data[..SACD_LSN_SIZE];

            disc[..8].copy_from_slice(b"SACDMTOC");
            disc[8] = 2; // version 2.0
            put_u16(disc, 16, self.album_set_size);
            put_u16(disc, 18, self.album_sequence_number);
            disc[24..31].copy_from_slice(b"CAT-001");

            if let Some((a, b, size)) = self.stereo {
                put_u32(disc, 64, a);
                put_u32(disc, 68, if self.broken_stereo { 0 } else { b });
                put_u16(disc, 72, size);
            }

            if let Some((a, b, size)) = self.multichannel {
                put_u32(disc, 76, a);
                put_u32(disc, 80, b);
                put_u16(disc, 84, size);
            }

            put_u16(disc, 88, self.date.0);
            disc[90] = self.date.1;
            disc[91] = self.date.2;

            // One English ASCII text channel
            put_u16(disc, 112, 1);
            disc[116] = b'e';
            disc[117] = b'n';
            disc[118] = 1;
        }

        {
            let bank = &mut data[SACD_LSN_SIZE..2 * SACD_LSN_SIZE];

            bank[..8].copy_from_slice(b"SACDText");

            let mut cursor = 256;

            for (field, text) in [(0, &self.album_title), (1, &self.album_artist)] {
                if let Some(text) = text {
                    put_u16(bank, 16 + field * 2, cursor as u16);

                    bank[cursor..cursor + text.len()].copy_from_slice(text.as_bytes());
                    cursor += text.len() + 1;
                }
            }
        }

        data[9 * SACD_LSN_SIZE..9 * SACD_LSN_SIZE + 8].copy_from_slice(b"SACD_Man");

        data
    }
}

/// Builder for one area TOC
pub struct AreaTocBuilder {
    kind: ChannelType,
    channel_count: u8,
    format: FrameFormat,
    play_time: u32,
    track_area: (u32, u32),
    /// (start_lsn, length_frames) per track
    tracks: Vec<(u32, u32)>,
    titles: Vec<(usize, String)>,
    isrcs: Vec<(usize, String)>,
    indices: Vec<(usize, Vec<u32>)>,
    access: Option<(u16, Vec<(u32, u16)>)>,
}

impl AreaTocBuilder {
    pub fn new(kind: ChannelType) -> AreaTocBuilder {
        AreaTocBuilder {
            kind,
            channel_count: match kind {
                ChannelType::Stereo => 2,
                ChannelType::Multichannel => 5,
            },
            format: FrameFormat::Dsd3In14,
            play_time: 0,
            track_area: (0, 0),
            tracks: Vec::new(),
            titles: Vec::new(),
            isrcs: Vec::new(),
            indices: Vec::new(),
            access: None,
        }
    }

    pub fn format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }

    pub fn play_time(mut self, frames: u32) -> Self {
        self.play_time = frames;
        self
    }

    pub fn track_area(mut self, start: u32, end: u32) -> Self {
        self.track_area = (start, end);
        self
    }

    pub fn tracks(mut self, tracks: &[(u32, u32)]) -> Self {
        self.tracks = tracks.to_vec();
        self
    }

    pub fn track_title(mut self, track: usize, title: &str) -> Self {
        self.titles.push((track, title.to_string()));
        self
    }

    pub fn track_isrc(mut self, track: usize, isrc: &str) -> Self {
        self.isrcs.push((track, isrc.to_string()));
        self
    }

    pub fn track_indices(mut self, track: usize, frames: &[u32]) -> Self {
        self.indices.push((track, frames.to_vec()));
        self
    }

    pub fn access_list(mut self, step_size: u16, entries: &[(u32, u16)]) -> Self {
        self.access = Some((step_size, entries.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        // Mandatory sectors, then the optional regions in a fixed
        // order: access list, track text, index list
        let access_sectors = match &self.access {
            Some((_, entries)) => sectors_for(12 + entries.len() * 5),
            None => 0,
        };

        let text_sectors = if self.titles.is_empty() {
            0
        } else {
            let items: usize = self.titles.iter().map(|(_, t)| 8 + t.len()).sum();

            sectors_for(8 + 8 * 255 * 2 + items)
        };

        let index_sectors = if self.indices.is_empty() {
            0
        } else {
            let entries: usize = self.indices.iter().map(|(_, f)| 4 + f.len() * 4).sum();

            sectors_for(8 + 255 * 2 + entries)
        };

        let access_offset = if access_sectors > 0 { 5 } else { 0 };
        let text_offset = if text_sectors > 0 {
            5 + access_sectors
        } else {
            0
        };
        let index_offset = if index_sectors > 0 {
            5 + access_sectors + text_sectors
        } else {
            0
        };

        let total = 5 + access_sectors + text_sectors + index_sectors;

        let mut data = vec![0u8; total * SACD_LSN_SIZE];

        {
            let header = &mut data[..SACD_LSN_SIZE];

            let signature: &[u8; 8] = match self.kind {
                ChannelType::Stereo => b"TWOCHTOC",
                ChannelType::Multichannel => b"MULCHTOC",
            };

            header[..8].copy_from_slice(signature);
            header[8] = 2;
            put_u16(header, 10, total as u16);
            header[20] = 4; // 2.8224 MHz
            header[21] = match self.format {
                FrameFormat::Dst => 0,
                FrameFormat::Dsd3In14 => 2,
                FrameFormat::Dsd3In16 => 3,
            };
            header[32] = self.channel_count;
            put_time(header, 40, self.play_time);
            header[44] = 1;
            header[45] = self.tracks.len() as u8;
            put_u32(header, 48, self.track_area.0);
            put_u32(header, 52, self.track_area.1);
            header[56] = 1;
            // Same single English ASCII channel as the master TOC
            header[60] = b'e';
            header[61] = b'n';
            header[62] = 1;

            put_u16(header, 92, text_offset as u16);
            put_u16(header, 94, index_offset as u16);
            put_u16(header, 96, access_offset as u16);
        }

        {
            let list = &mut data[SACD_LSN_SIZE..2 * SACD_LSN_SIZE];

            list[..8].copy_from_slice(b"SACDTRL1");

            for (t, &(start_lsn, _)) in self.tracks.iter().enumerate() {
                put_u32(list, 8 + t * 4, start_lsn);
            }
        }

        {
            let list = &mut data[2 * SACD_LSN_SIZE..3 * SACD_LSN_SIZE];

            list[..8].copy_from_slice(b"SACDTRL2");

            let mut cumulative = 0u32;

            for (t, &(_, length)) in self.tracks.iter().enumerate() {
                put_time(list, 8 + t * 4, cumulative);
                put_time(list, 1028 + t * 4, length);

                cumulative += length;
            }
        }

        {
            let list = &mut data[3 * SACD_LSN_SIZE..5 * SACD_LSN_SIZE];

            list[..8].copy_from_slice(b"SACD_IGL");

            for (t, isrc) in &self.isrcs {
                list[8 + t * 12..8 + t * 12 + isrc.len()].copy_from_slice(isrc.as_bytes());
            }
        }

        if let Some((step_size, entries)) = &self.access {
            let region = &mut data[access_offset * SACD_LSN_SIZE..];

            region[..8].copy_from_slice(b"SACD_ACC");
            put_u16(region, 8, *step_size);
            put_u16(region, 10, entries.len() as u16);

            for (i, &(lsn, margin)) in entries.iter().enumerate() {
                let off = 12 + i * 5;

                region[off] = (lsn >> 16) as u8;
                region[off + 1] = (lsn >> 8) as u8;
                region[off + 2] = lsn as u8;
                put_u16(region, off + 3, margin & 0x7fff);
            }
        }

        if !self.titles.is_empty() {
            let region = &mut data[text_offset * SACD_LSN_SIZE..];

            region[..8].copy_from_slice(b"SACDTTxt");

            // Channel 0's pointer table, items after the full table
            let mut cursor = 8 + 8 * 255 * 2;

            for (t, title) in &self.titles {
                put_u16(region, 8 + t * 2, cursor as u16);

                region[cursor] = 1; // one item
                region[cursor + 2] = 1; // title type
                region[cursor + 4..cursor + 4 + title.len()].copy_from_slice(title.as_bytes());

                cursor = (cursor + 4 + title.len() + 1 + 3) & !3;
            }
        }

        if !self.indices.is_empty() {
            let region = &mut data[index_offset * SACD_LSN_SIZE..];

            region[..8].copy_from_slice(b"SACD_Ind");

            let mut cursor = 520;

            for (t, frames) in &self.indices {
                put_u16(region, 8 + t * 2, cursor as u16);

                region[cursor] = frames.len() as u8;

                for (i, &frame) in frames.iter().enumerate() {
                    put_time(region, cursor + 2 + i * 4, frame);
                }

                cursor += 2 + frames.len() * 4;
            }
        }

        data
    }
}

fn sectors_for(bytes: usize) -> usize {
    (bytes + SACD_LSN_SIZE - 1) / SACD_LSN_SIZE
}

/// Builds the track-area sectors of a DST-coded area. Every frame
/// starts its own sector and spans as many sectors as its payload
/// needs; an optional padding packet follows the first audio packet of
/// each frame.
pub struct DstAreaBuilder {
    start_lsn: u32,
    frame_lsns: Vec<u32>,
    sectors: Vec<Vec<u8>>,
}

impl DstAreaBuilder {
    pub fn new(start_lsn: u32, frames: &[Vec<u8>]) -> DstAreaBuilder {
        DstAreaBuilder::build(start_lsn, frames, 0)
    }

    pub fn with_padding(start_lsn: u32, frames: &[Vec<u8>], padding: usize) -> DstAreaBuilder {
        DstAreaBuilder::build(start_lsn, frames, padding)
    }

    fn build(start_lsn: u32, frames: &[Vec<u8>], padding: usize) -> DstAreaBuilder {
        let mut builder = DstAreaBuilder {
            start_lsn,
            frame_lsns: Vec::new(),
            sectors: Vec::new(),
        };

        for (f, payload) in frames.iter().enumerate() {
            builder.frame_lsns.push(start_lsn + builder.sectors.len() as u32);

            // Header byte + packet infos + frame info, plus the
            // padding packet in the first sector
            let first_packets = if padding > 0 { 2 } else { 1 };
            let first_capacity = SACD_LSN_SIZE - 1 - 2 * first_packets - 4 - padding;
            let cont_capacity = SACD_LSN_SIZE - 1 - 2;

            let first_len = payload.len().min(first_capacity);
            let rest = &payload[first_len..];

            let sector_count = 1 + (rest.len() + cont_capacity - 1) / cont_capacity.max(1);
            let sector_count = if rest.is_empty() { 1 } else { sector_count };

            // First sector: frame-start audio packet, optional padding
            let mut sector = vec![0u8; SACD_LSN_SIZE];

            sector[0] = ((first_packets as u8) << 5) | (1 << 2) | 1;

            let mut off = 1;

            put_u16(
                &mut sector,
                off,
                0x8000 | (2 << 11) | first_len as u16,
            );
            off += 2;

            if padding > 0 {
                put_u16(&mut sector, off, (7 << 11) | padding as u16);
                off += 2;
            }

            put_time(&mut sector, off, f as u32);
            sector[off + 3] = (sector_count as u8) << 2;
            off += 4;

            sector[off..off + first_len].copy_from_slice(&payload[..first_len]);
            off += first_len;

            sector[off..off + padding].fill(0xee);

            builder.sectors.push(sector);

            // Continuation sectors: one non-starting audio packet each
            for chunk in rest.chunks(cont_capacity) {
                let mut sector = vec![0u8; SACD_LSN_SIZE];

                sector[0] = (1 << 5) | 1;
                put_u16(&mut sector, 1, (2 << 11) | chunk.len() as u16);
                sector[3..3 + chunk.len()].copy_from_slice(chunk);

                builder.sectors.push(sector);
            }
        }

        builder
    }

    /// Full image: zero sectors up to the track area, then the track
    /// sectors
    pub fn image(&self) -> Vec<u8> {
        let mut data = vec![0u8; self.start_lsn as usize * SACD_LSN_SIZE];

        for sector in &self.sectors {
            data.extend_from_slice(sector);
        }

        data
    }

    /// The track-area sectors alone
    pub fn sectors(&self) -> &[Vec<u8>] {
        &self.sectors
    }

    /// First sector of frame `f`
    pub fn frame_lsn(&self, f: usize) -> u32 {
        self.frame_lsns[f]
    }

    /// Last sector of the track area
    pub fn end_lsn(&self) -> u32 {
        self.start_lsn + self.sectors.len() as u32 - 1
    }
}

/// Assembles a whole disc image out of payload sectors placed at
/// arbitrary sector numbers
pub struct DiscBuilder {
    sectors: Vec<Vec<u8>>,
}

impl DiscBuilder {
    pub fn new() -> DiscBuilder {
        DiscBuilder {
            sectors: Vec::new(),
        }
    }

    /// Copy `payload` (a multiple of 2048 bytes) into consecutive
    /// sectors starting at `lsn`
    pub fn place(&mut self, lsn: u32, payload: &[u8]) -> &mut Self {
        assert_eq!(payload.len() % SACD_LSN_SIZE, 0);

        let count = payload.len() / SACD_LSN_SIZE;

        let needed = lsn as usize + count;
        while self.sectors.len() < needed {
            self.sectors.push(vec![0u8; SACD_LSN_SIZE]);
        }

        for s in 0..count {
            self.sectors[lsn as usize + s]
                .copy_from_slice(&payload[s * SACD_LSN_SIZE..(s + 1) * SACD_LSN_SIZE]);
        }

        self
    }

    /// Pad the image out to `sectors` total sectors
    pub fn pad_to(&mut self, sectors: u32) -> &mut Self {
        while self.sectors.len() < sectors as usize {
            self.sectors.push(vec![0u8; SACD_LSN_SIZE]);
        }

        self
    }

    /// Serialize with the given physical sector encoding, headers and
    /// trailers zero-filled
    pub fn build(&self, format: SectorFormat) -> Vec<u8> {
        let geom = format.geometry();

        let mut data = Vec::with_capacity(self.sectors.len() * geom.sector_size);

        for sector in &self.sectors {
            data.extend_from_slice(&vec![0u8; geom.header_size]);
            data.extend_from_slice(sector);
            data.extend_from_slice(&vec![0u8; geom.trailer_size]);
        }

        data
    }
}

/// Spawn an in-process sector server speaking the network source
/// protocol, serving 2048-byte sectors out of `data`. Returns the
/// address to connect to.
pub fn spawn_sector_server(data: Vec<u8>) -> String {
    use std::io::{Read, Write};

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        let total = (data.len() / SACD_LSN_SIZE) as u32;

        loop {
            let mut head = [0u8; 5];
            if stream.read_exact(&mut head).is_err() {
                return;
            }

            let len = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as usize;
            let opcode = head[4];

            // Body plus the terminating zero byte
            let mut body = vec![0u8; len + 1];
            if stream.read_exact(&mut body).is_err() {
                return;
            }

            let (response, payload): (u8, Vec<u8>) = match opcode {
                1 => (2, Vec::new()),
                3 => (4, total.to_be_bytes().to_vec()),
                5 => {
                    let lsn = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
                    let count = u32::from_be_bytes([body[4], body[5], body[6], body[7]]);

                    let from = lsn as usize * SACD_LSN_SIZE;
                    let to = (from + count as usize * SACD_LSN_SIZE).min(data.len());

                    (6, data[from..to].to_vec())
                }
                7 => {
                    let mut msg = Vec::new();
                    msg.extend_from_slice(&0u32.to_be_bytes());
                    msg.push(8);
                    msg.push(0);
                    let _ = stream.write_all(&msg);
                    return;
                }
                _ => (255, Vec::new()),
            };

            let mut msg = Vec::new();
            msg.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            msg.push(response);
            msg.extend_from_slice(&payload);
            msg.push(0);

            if stream.write_all(&msg).is_err() {
                return;
            }
        }
    });

    addr
}
