//! Disc-level Master TOC.
//!
//! Ten contiguous sectors, stored three times at fixed sector numbers.
//! Sector 0 is the disc-info block, sectors 1 to 8 carry one text bank
//! per declared text channel and sector 9 is the manufacturer block.

use super::{be_u16, be_u32, check_signature, padded_ascii, Genre, Locale};
use crate::source::{read_payload, SectorSource};
use crate::{
    ChannelType, SacdError, SacdResult, MASTER_TOC_LEN, MASTER_TOC_LSN, MAX_GENRE_COUNT,
    MAX_TEXT_CHANNELS, SACD_LSN_SIZE,
};

const MASTER_TOC_SIGNATURE: &[u8; 8] = b"SACDMTOC";
const MASTER_TEXT_SIGNATURE: &[u8; 8] = b"SACDText";
const MANUFACTURER_SIGNATURE: &[u8; 8] = b"SACD_Man";

// Byte offsets within the disc-info sector
const VERSION: usize = 8;
const ALBUM_SET_SIZE: usize = 16;
const ALBUM_SEQUENCE_NUMBER: usize = 18;
const ALBUM_CATALOG_NUMBER: usize = 24;
const ALBUM_GENRES: usize = 40;
const STEREO_AREA: usize = 64;
const HYBRID_FLAG: usize = 74;
const MULTICHANNEL_AREA: usize = 76;
const DISC_DATE: usize = 88;
const DISC_GENRES: usize = 96;
const TEXT_CHANNEL_COUNT: usize = 112;
const LOCALES: usize = 116;
const DISC_CATALOG_NUMBER: usize = 148;
const DISC_WEB_LINK: usize = 168;

/// Offset of the 16 text pointers within a text bank sector
const TEXT_BANK_POINTERS: usize = 16;

/// Location of one Area TOC: two redundant copies plus a length
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct AreaPointers {
    /// Sector number of the first TOC copy
    pub toc_1_lsn: u32,
    /// Sector number of the second TOC copy
    pub toc_2_lsn: u32,
    /// Length of each copy in sectors
    pub toc_size: u16,
}

/// Decoded text of one Master TOC text channel
#[derive(Clone, Debug, Default)]
#[allow(missing_docs)]
pub struct MasterText {
    pub album_title: Option<String>,
    pub album_artist: Option<String>,
    pub album_publisher: Option<String>,
    pub album_copyright: Option<String>,
    pub album_title_phonetic: Option<String>,
    pub album_artist_phonetic: Option<String>,
    pub album_publisher_phonetic: Option<String>,
    pub album_copyright_phonetic: Option<String>,
    pub disc_title: Option<String>,
    pub disc_artist: Option<String>,
    pub disc_publisher: Option<String>,
    pub disc_copyright: Option<String>,
    pub disc_title_phonetic: Option<String>,
    pub disc_artist_phonetic: Option<String>,
    pub disc_publisher_phonetic: Option<String>,
    pub disc_copyright_phonetic: Option<String>,
}

/// Components used to derive an album directory name
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum DirNameFormat {
    /// `"YYYY - Artist - Title"`
    YearArtistTitle,
    /// `"Artist - Title"`
    ArtistTitle,
    /// `"Title"`
    Title,
}

/// Parsed disc-level TOC
pub struct MasterToc {
    version: (u8, u8),
    album_set_size: u16,
    album_sequence_number: u16,
    album_catalog_number: String,
    album_genres: [Genre; MAX_GENRE_COUNT],
    disc_genres: [Genre; MAX_GENRE_COUNT],
    hybrid: bool,
    date: (u16, u8, u8),
    stereo_area: Option<AreaPointers>,
    multichannel_area: Option<AreaPointers>,
    disc_catalog_number: String,
    disc_web_link: String,
    text_channel_count: u8,
    locales: [Locale; MAX_TEXT_CHANNELS],
    text: Vec<MasterText>,
    manufacturer: Vec<u8>,
}

impl MasterToc {
    /// Read and parse Master TOC copy `copy` (1 to 3) from `source`
    pub fn read(source: &mut dyn SectorSource, copy: u8) -> SacdResult<MasterToc> {
        if copy == 0 || copy as usize > MASTER_TOC_LSN.len() {
            return Err(SacdError::InvalidArgument);
        }

        let lsn = MASTER_TOC_LSN[copy as usize - 1];

        let data = read_payload(source, lsn, MASTER_TOC_LEN)?;

        MasterToc::parse(&data)
    }

    /// Parse ten sectors worth of Master TOC payload
    pub(crate) fn parse(data: &[u8]) -> SacdResult<MasterToc> {
        if data.len() < MASTER_TOC_LEN as usize * SACD_LSN_SIZE {
            return Err(SacdError::NoData);
        }

        let disc = &data[..SACD_LSN_SIZE];

        check_signature(disc, MASTER_TOC_SIGNATURE)?;
        check_signature(&data[9 * SACD_LSN_SIZE..], MANUFACTURER_SIGNATURE)?;

        let text_channel_count = be_u16(disc, TEXT_CHANNEL_COUNT);
        if text_channel_count as usize > MAX_TEXT_CHANNELS {
            return Err(SacdError::InvalidSignature);
        }
        let text_channel_count = text_channel_count as u8;

        for channel in 0..text_channel_count as usize {
            let bank = &data[(1 + channel) * SACD_LSN_SIZE..];

            check_signature(bank, MASTER_TEXT_SIGNATURE)?;
        }

        let stereo_area = area_pointers(disc, STEREO_AREA)?;
        let multichannel_area = area_pointers(disc, MULTICHANNEL_AREA)?;

        let mut locales = [Locale {
            language: [0; 2],
            charset_code: 0,
        }; MAX_TEXT_CHANNELS];

        for (i, locale) in locales.iter_mut().enumerate() {
            *locale = Locale::parse(array_ref![disc, LOCALES + i * 4, 4]);
        }

        let mut album_genres = [Genre::parse(&[0; 4]); MAX_GENRE_COUNT];
        let mut disc_genres = album_genres;

        for i in 0..MAX_GENRE_COUNT {
            album_genres[i] = Genre::parse(array_ref![disc, ALBUM_GENRES + i * 4, 4]);
            disc_genres[i] = Genre::parse(array_ref![disc, DISC_GENRES + i * 4, 4]);
        }

        let mut text = Vec::with_capacity(text_channel_count as usize);

        for channel in 0..text_channel_count as usize {
            let bank = &data[(1 + channel) * SACD_LSN_SIZE..(2 + channel) * SACD_LSN_SIZE];

            text.push(decode_text_bank(bank, &locales[channel]));
        }

        debug!(
            "master TOC: album {}/{}, {} text channels",
            be_u16(disc, ALBUM_SEQUENCE_NUMBER),
            be_u16(disc, ALBUM_SET_SIZE),
            text_channel_count
        );

        Ok(MasterToc {
            version: (disc[VERSION], disc[VERSION + 1]),
            album_set_size: be_u16(disc, ALBUM_SET_SIZE),
            album_sequence_number: be_u16(disc, ALBUM_SEQUENCE_NUMBER),
            album_catalog_number: padded_ascii(&disc[ALBUM_CATALOG_NUMBER..][..16]),
            album_genres,
            disc_genres,
            hybrid: disc[HYBRID_FLAG] & 1 != 0,
            date: (be_u16(disc, DISC_DATE), disc[DISC_DATE + 2], disc[DISC_DATE + 3]),
            stereo_area,
            multichannel_area,
            disc_catalog_number: padded_ascii(&disc[DISC_CATALOG_NUMBER..][..16]),
            disc_web_link: padded_ascii(&disc[DISC_WEB_LINK..][..128]),
            text_channel_count,
            locales,
            text,
            manufacturer: data[9 * SACD_LSN_SIZE + 8..10 * SACD_LSN_SIZE].to_vec(),
        })
    }

    /// Specification version as (major, minor)
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Number of discs in the album set
    pub fn album_set_size(&self) -> u16 {
        self.album_set_size
    }

    /// Position of this disc within the album set, 1-based
    pub fn album_sequence_number(&self) -> u16 {
        self.album_sequence_number
    }

    /// Album catalog number
    pub fn album_catalog_number(&self) -> &str {
        &self.album_catalog_number
    }

    /// Disc catalog number
    pub fn disc_catalog_number(&self) -> &str {
        &self.disc_catalog_number
    }

    /// Disc weblink
    pub fn disc_web_link(&self) -> &str {
        &self.disc_web_link
    }

    /// True for hybrid (SACD + CD layer) discs
    pub fn is_hybrid(&self) -> bool {
        self.hybrid
    }

    /// Disc creation date as (year, month, day)
    pub fn date(&self) -> (u16, u8, u8) {
        self.date
    }

    /// Location of the TOC for `area`, or `None` if the disc doesn't
    /// carry that area
    pub fn area(&self, area: ChannelType) -> Option<&AreaPointers> {
        match area {
            ChannelType::Stereo => self.stereo_area.as_ref(),
            ChannelType::Multichannel => self.multichannel_area.as_ref(),
        }
    }

    /// Number of used text channels
    pub fn text_channel_count(&self) -> u8 {
        self.text_channel_count
    }

    /// Locale of text channel `channel` (1-based)
    pub fn locale(&self, channel: u8) -> SacdResult<&Locale> {
        let i = self.channel_index(channel)?;

        Ok(&self.locales[i])
    }

    /// Decoded text of channel `channel` (1-based)
    pub fn text_channel(&self, channel: u8) -> SacdResult<&MasterText> {
        let i = self.channel_index(channel)?;

        Ok(&self.text[i])
    }

    /// Album genre number `n` (1-based)
    pub fn album_genre(&self, n: u8) -> SacdResult<&Genre> {
        Ok(&self.album_genres[genre_index(n)?])
    }

    /// Disc genre number `n` (1-based)
    pub fn disc_genre(&self, n: u8) -> SacdResult<&Genre> {
        Ok(&self.disc_genres[genre_index(n)?])
    }

    /// Opaque manufacturer blob
    pub fn manufacturer(&self) -> &[u8] {
        &self.manufacturer
    }

    /// Derive a filesystem-safe directory name for the album from the
    /// first text channel, with a `" (Disc N of M)"` suffix for
    /// multi-disc sets
    pub fn album_dir(&self, format: DirNameFormat) -> String {
        let text = self.text.first();

        let title = text.and_then(|t| t.album_title.as_deref()).unwrap_or("");
        let artist = text.and_then(|t| t.album_artist.as_deref()).unwrap_or("");

        let mut parts: Vec<String> = Vec::new();

        if format == DirNameFormat::YearArtistTitle && self.date.0 != 0 {
            parts.push(self.date.0.to_string());
        }

        if format != DirNameFormat::Title && !artist.is_empty() {
            parts.push(sanitize(artist));
        }

        if !title.is_empty() {
            parts.push(sanitize(title));
        }

        if parts.is_empty() {
            parts.push("unknown".to_string());
        }

        let mut dir = parts.join(" - ");

        if self.album_set_size > 1 {
            dir.push_str(&format!(
                " (Disc {} of {})",
                self.album_sequence_number, self.album_set_size
            ));
        }

        dir
    }

    fn channel_index(&self, channel: u8) -> SacdResult<usize> {
        if channel == 0 || channel > self.text_channel_count {
            return Err(SacdError::InvalidArgument);
        }

        Ok(channel as usize - 1)
    }
}

fn genre_index(n: u8) -> SacdResult<usize> {
    if n == 0 || n as usize > MAX_GENRE_COUNT {
        return Err(SacdError::InvalidArgument);
    }

    Ok(n as usize - 1)
}

/// Read one pair of Area TOC pointers, validating that both copies are
/// either present or absent
fn area_pointers(disc: &[u8], off: usize) -> SacdResult<Option<AreaPointers>> {
    let toc_1_lsn = be_u32(disc, off);
    let toc_2_lsn = be_u32(disc, off + 4);
    let toc_size = be_u16(disc, off + 8);

    match (toc_1_lsn, toc_2_lsn) {
        (0, 0) => Ok(None),
        (a, b) if a != 0 && b != 0 => Ok(Some(AreaPointers {
            toc_1_lsn,
            toc_2_lsn,
            toc_size,
        })),
        _ => Err(SacdError::InvalidSignature),
    }
}

/// Decode the 16 text pointers of one text bank sector. Offsets of zero
/// or pointing outside the sector are skipped.
fn decode_text_bank(bank: &[u8], locale: &Locale) -> MasterText {
    let mut text = MasterText::default();

    if !locale.is_used() {
        return text;
    }

    let charset = locale.charset();

    let fields: [&mut Option<String>; 16] = [
        &mut text.album_title,
        &mut text.album_artist,
        &mut text.album_publisher,
        &mut text.album_copyright,
        &mut text.album_title_phonetic,
        &mut text.album_artist_phonetic,
        &mut text.album_publisher_phonetic,
        &mut text.album_copyright_phonetic,
        &mut text.disc_title,
        &mut text.disc_artist,
        &mut text.disc_publisher,
        &mut text.disc_copyright,
        &mut text.disc_title_phonetic,
        &mut text.disc_artist_phonetic,
        &mut text.disc_publisher_phonetic,
        &mut text.disc_copyright_phonetic,
    ];

    for (i, field) in fields.into_iter().enumerate() {
        let off = be_u16(bank, TEXT_BANK_POINTERS + i * 2) as usize;

        if off != 0 && off < SACD_LSN_SIZE {
            *field = Some(charset.decode(&bank[off..]));
        }
    }

    text
}

/// Replace filesystem-hostile characters and trim the result
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    cleaned.trim().to_string()
}
