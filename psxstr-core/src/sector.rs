//! CD sector buffers and the read-only view the classifier works on.
//!
//! A [`Sector`] owns the bytes of one sector as they were read from a disc
//! image (either 2048 bytes of ISO user data or a full 2352-byte raw sector).
//! [`Sector::view`] borrows it as a [`SectorView`]: the user-data area plus
//! the CD-XA sub-header when the sector carries one.

use std::fmt;

use crate::edc;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// CD sync pattern at the start of every raw (2352-byte) data sector.
pub const CD_SYNC_PATTERN: [u8; 12] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

/// Raw CD sector size (sync + header + subheader + data + EDC + ECC).
pub const RAW_SECTOR_SIZE: usize = 2352;

/// User data size of a Mode 1 or Mode 2 Form 1 sector (and of an ISO sector).
pub const USER_DATA_SIZE: usize = 2048;

/// User data size of a Mode 2 Form 2 sector.
pub const FORM2_USER_DATA_SIZE: usize = 2324;

/// Offset of the mode byte in a raw sector header.
const MODE_OFFSET: usize = 15;

/// Offset of the CD-XA sub-header in a raw Mode 2 sector.
const SUBHEADER_OFFSET: usize = 16;

/// Offset to user data within a Mode 1 raw sector (12 sync + 4 header).
const MODE1_DATA_OFFSET: usize = 16;

/// Offset to user data within a Mode 2 raw sector.
/// 12 (sync) + 4 (header) + 8 (subheader) = 24.
const MODE2_DATA_OFFSET: usize = 24;

// ---------------------------------------------------------------------------
// Sub-header
// ---------------------------------------------------------------------------

/// CD-XA sub-mode bit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubMode(u8);

impl SubMode {
    pub const END_OF_RECORD: u8 = 0x01;
    pub const VIDEO: u8 = 0x02;
    pub const AUDIO: u8 = 0x04;
    pub const DATA: u8 = 0x08;
    pub const TRIGGER: u8 = 0x10;
    /// Set for Form 2 sectors.
    pub const FORM: u8 = 0x20;
    pub const REALTIME: u8 = 0x40;
    pub const END_OF_FILE: u8 = 0x80;

    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Bits of `self` that are also set in `mask`.
    pub const fn mask(self, mask: u8) -> u8 {
        self.0 & mask
    }

    pub const fn is_form2(self) -> bool {
        self.mask(Self::FORM) != 0
    }

    pub const fn is_audio(self) -> bool {
        self.mask(Self::AUDIO) != 0
    }
}

impl fmt::Display for SubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, &str); 8] = [
            (SubMode::END_OF_FILE, "EOF"),
            (SubMode::REALTIME, "RT"),
            (SubMode::FORM, "FORM2"),
            (SubMode::TRIGGER, "TRIG"),
            (SubMode::DATA, "DATA"),
            (SubMode::AUDIO, "AUDIO"),
            (SubMode::VIDEO, "VIDEO"),
            (SubMode::END_OF_RECORD, "EOR"),
        ];
        let mut first = true;
        for (bit, name) in NAMES {
            if self.0 & bit != 0 {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("-")?;
        }
        Ok(())
    }
}

/// The 4-byte CD-XA sub-header found in raw Mode 2 sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubHeader {
    pub file_number: u8,
    pub channel: u8,
    pub submode: SubMode,
    pub coding_info: u8,
}

impl SubHeader {
    /// Parse from the first 4 bytes of `bytes`.
    ///
    /// The sub-header is stored twice; only the first copy is used.
    pub fn parse(bytes: &[u8; 4]) -> Self {
        Self {
            file_number: bytes[0],
            channel: bytes[1],
            submode: SubMode::new(bytes[2]),
            coding_info: bytes[3],
        }
    }
}

// ---------------------------------------------------------------------------
// SectorView
// ---------------------------------------------------------------------------

/// Read-only view over one sector's user data.
///
/// Offsets passed to the accessors are relative to the start of user data.
/// The accessors panic if the read would run past the end of the slice;
/// callers check [`len`](Self::len) first.
#[derive(Debug, Clone, Copy)]
pub struct SectorView<'a> {
    index: u32,
    data: &'a [u8],
    sub_header: Option<SubHeader>,
}

impl<'a> SectorView<'a> {
    pub fn new(index: u32, data: &'a [u8], sub_header: Option<SubHeader>) -> Self {
        Self {
            index,
            data,
            sub_header,
        }
    }

    /// Sector number on the disc.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sub_header(&self) -> Option<SubHeader> {
        self.sub_header
    }

    pub fn read_u8(&self, offset: usize) -> u8 {
        self.data[offset]
    }

    pub fn read_u16_le(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }

    pub fn read_i16_le(&self, offset: usize) -> i16 {
        self.read_u16_le(offset) as i16
    }

    pub fn read_u32_le(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    pub fn read_i32_le(&self, offset: usize) -> i32 {
        self.read_u32_le(offset) as i32
    }
}

// ---------------------------------------------------------------------------
// Owned sectors
// ---------------------------------------------------------------------------

/// How the bytes of a [`Sector`] are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorLayout {
    /// 2048 bytes of user data, no header (ISO images).
    Iso,
    /// Raw Mode 1 data sector.
    RawMode1,
    /// Raw Mode 2 Form 1 sector (2048 bytes of user data).
    RawMode2Form1,
    /// Raw Mode 2 Form 2 sector (2324 bytes of user data).
    RawMode2Form2,
    /// Raw sector without a sync pattern, usually CD-DA audio.
    RawNoSync,
}

impl SectorLayout {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iso => "ISO",
            Self::RawMode1 => "Mode 1",
            Self::RawMode2Form1 => "Mode 2 Form 1",
            Self::RawMode2Form2 => "Mode 2 Form 2",
            Self::RawNoSync => "No sync",
        }
    }
}

/// One sector as read from a disc image.
#[derive(Clone)]
pub struct Sector {
    index: u32,
    layout: SectorLayout,
    bytes: Vec<u8>,
}

impl fmt::Debug for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sector")
            .field("index", &self.index)
            .field("layout", &self.layout)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Sector {
    /// Wrap 2048 bytes of ISO user data.
    pub fn from_iso(index: u32, bytes: Vec<u8>) -> Self {
        Self {
            index,
            layout: SectorLayout::Iso,
            bytes,
        }
    }

    /// Wrap a full 2352-byte raw sector, detecting its layout from the sync
    /// pattern, mode byte and sub-header.
    pub fn from_raw(index: u32, bytes: Vec<u8>) -> Self {
        let layout = detect_raw_layout(&bytes);
        Self {
            index,
            layout,
            bytes,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn layout(&self) -> SectorLayout {
        self.layout
    }

    /// All bytes of the sector as stored in the image.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sub_header(&self) -> Option<SubHeader> {
        match self.layout {
            SectorLayout::RawMode2Form1 | SectorLayout::RawMode2Form2 => {
                let mut sh = [0u8; 4];
                sh.copy_from_slice(&self.bytes[SUBHEADER_OFFSET..SUBHEADER_OFFSET + 4]);
                Some(SubHeader::parse(&sh))
            }
            _ => None,
        }
    }

    fn user_data_range(&self) -> std::ops::Range<usize> {
        match self.layout {
            SectorLayout::Iso => 0..self.bytes.len().min(USER_DATA_SIZE),
            SectorLayout::RawMode1 => MODE1_DATA_OFFSET..MODE1_DATA_OFFSET + USER_DATA_SIZE,
            SectorLayout::RawMode2Form1 => MODE2_DATA_OFFSET..MODE2_DATA_OFFSET + USER_DATA_SIZE,
            SectorLayout::RawMode2Form2 => {
                MODE2_DATA_OFFSET..MODE2_DATA_OFFSET + FORM2_USER_DATA_SIZE
            }
            SectorLayout::RawNoSync => 0..self.bytes.len(),
        }
    }

    pub fn user_data(&self) -> &[u8] {
        &self.bytes[self.user_data_range()]
    }

    pub fn user_data_mut(&mut self) -> &mut [u8] {
        let range = self.user_data_range();
        &mut self.bytes[range]
    }

    pub fn view(&self) -> SectorView<'_> {
        SectorView::new(self.index, self.user_data(), self.sub_header())
    }

    /// Recompute EDC/ECC after the user data was modified.
    ///
    /// Raw Mode 1 and Mode 2 Form 1 sectors carry error codes over their user
    /// data. Every other layout is left untouched.
    pub fn refresh_error_codes(&mut self) {
        match self.layout {
            SectorLayout::RawMode1 => edc::regenerate_mode1(&mut self.bytes),
            SectorLayout::RawMode2Form1 => edc::regenerate_mode2_form1(&mut self.bytes),
            SectorLayout::Iso | SectorLayout::RawMode2Form2 | SectorLayout::RawNoSync => {}
        }
    }
}

fn detect_raw_layout(bytes: &[u8]) -> SectorLayout {
    if bytes.len() < RAW_SECTOR_SIZE || bytes[..12] != CD_SYNC_PATTERN {
        return SectorLayout::RawNoSync;
    }
    match bytes[MODE_OFFSET] {
        1 => SectorLayout::RawMode1,
        2 => {
            if SubMode::new(bytes[SUBHEADER_OFFSET + 2]).is_form2() {
                SectorLayout::RawMode2Form2
            } else {
                SectorLayout::RawMode2Form1
            }
        }
        _ => SectorLayout::RawNoSync,
    }
}

#[cfg(test)]
#[path = "tests/sector_tests.rs"]
mod tests;
