//! Builders for synthetic STR sectors shared by the unit tests.

use crate::edc;
use crate::header::{STR_HEADER_MARKER, VIDEO_SECTOR_MAGIC};
use crate::sector::{CD_SYNC_PATTERN, RAW_SECTOR_SIZE, Sector, SubMode, USER_DATA_SIZE};

/// Field values for a synthetic STR sector header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TestHeader {
    pub magic: u32,
    pub frame: i32,
    pub chunk: u16,
    pub chunks: u16,
    pub used_size: u32,
    pub width: i16,
    pub height: i16,
    pub rlc: u16,
    pub marker: u16,
    pub qscale: i16,
    pub version: u16,
    pub reserved: u32,
}

impl Default for TestHeader {
    fn default() -> Self {
        Self {
            magic: VIDEO_SECTOR_MAGIC,
            frame: 100,
            chunk: 0,
            chunks: 5,
            used_size: 9000,
            width: 320,
            height: 240,
            rlc: 1500,
            marker: STR_HEADER_MARKER,
            qscale: 4,
            version: 2,
            reserved: 0,
        }
    }
}

impl TestHeader {
    pub fn chunk(mut self, chunk: u16) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn bytes(&self) -> [u8; 32] {
        let mut h = [0u8; 32];
        h[0..4].copy_from_slice(&self.magic.to_le_bytes());
        h[4..8].copy_from_slice(&self.frame.to_le_bytes());
        h[8..10].copy_from_slice(&self.chunk.to_le_bytes());
        h[10..12].copy_from_slice(&self.chunks.to_le_bytes());
        h[12..16].copy_from_slice(&self.used_size.to_le_bytes());
        h[16..18].copy_from_slice(&self.width.to_le_bytes());
        h[18..20].copy_from_slice(&self.height.to_le_bytes());
        h[20..22].copy_from_slice(&self.rlc.to_le_bytes());
        h[22..24].copy_from_slice(&self.marker.to_le_bytes());
        h[24..26].copy_from_slice(&self.qscale.to_le_bytes());
        h[26..28].copy_from_slice(&self.version.to_le_bytes());
        h[28..32].copy_from_slice(&self.reserved.to_le_bytes());
        h
    }

    /// 2048 bytes of user data: the header followed by `fill` bytes.
    pub fn user_data(&self, fill: u8) -> Vec<u8> {
        let mut data = vec![fill; USER_DATA_SIZE];
        data[..32].copy_from_slice(&self.bytes());
        data
    }

    pub fn iso_sector(&self, index: u32) -> Sector {
        Sector::from_iso(index, self.user_data(0))
    }
}

/// A raw Mode 2 Form 1 sector around `user_data`, with valid EDC/ECC.
pub(crate) fn raw_form1(user_data: &[u8], submode: u8) -> Vec<u8> {
    let mut raw = vec![0u8; RAW_SECTOR_SIZE];
    raw[..12].copy_from_slice(&CD_SYNC_PATTERN);
    raw[12..15].copy_from_slice(&[0x00, 0x02, 0x16]);
    raw[15] = 0x02;
    let sub_header = [0x01, 0x00, submode, 0x00];
    raw[16..20].copy_from_slice(&sub_header);
    raw[20..24].copy_from_slice(&sub_header);
    raw[24..24 + USER_DATA_SIZE].copy_from_slice(&user_data[..USER_DATA_SIZE]);
    edc::regenerate_mode2_form1(&mut raw);
    raw
}

/// A raw Mode 1 sector around `user_data`, with valid EDC/ECC.
pub(crate) fn raw_mode1(user_data: &[u8]) -> Vec<u8> {
    let mut raw = vec![0u8; RAW_SECTOR_SIZE];
    raw[..12].copy_from_slice(&CD_SYNC_PATTERN);
    raw[12..16].copy_from_slice(&[0x00, 0x02, 0x16, 0x01]);
    raw[16..16 + USER_DATA_SIZE].copy_from_slice(&user_data[..USER_DATA_SIZE]);
    edc::regenerate_mode1(&mut raw);
    raw
}

/// A raw Mode 2 Form 2 XA audio sector.
pub(crate) fn raw_xa_audio() -> Vec<u8> {
    let mut raw = vec![0u8; RAW_SECTOR_SIZE];
    raw[..12].copy_from_slice(&CD_SYNC_PATTERN);
    raw[15] = 0x02;
    let submode = SubMode::AUDIO | SubMode::FORM | SubMode::REALTIME;
    let sub_header = [0x01, 0x01, submode, 0x04];
    raw[16..20].copy_from_slice(&sub_header);
    raw[20..24].copy_from_slice(&sub_header);
    raw
}

/// An 8-byte compressed bitstream header followed by `body_len` bytes.
pub(crate) fn bitstream(version: i16, qscale: i16, half_codes: i16, body_len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + body_len);
    data.extend_from_slice(&half_codes.to_le_bytes());
    data.extend_from_slice(&0x3800u16.to_le_bytes());
    data.extend_from_slice(&qscale.to_le_bytes());
    data.extend_from_slice(&version.to_le_bytes());
    data.extend((0..body_len).map(|i| (i % 251) as u8));
    data
}

/// `chunks` ISO sectors forming one frame, numbered from `first_index`.
pub(crate) fn frame_sectors(fields: TestHeader, first_index: u32) -> Vec<Sector> {
    (0..fields.chunks)
        .map(|chunk| fields.chunk(chunk).iso_sector(first_index + chunk as u32))
        .collect()
}
