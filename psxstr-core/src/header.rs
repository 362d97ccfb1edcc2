//! Video sector headers.
//!
//! Every video chunk sector starts with a 16-byte header shared by all
//! variants ([`CommonVideoHeader`]). STR sectors extend it to 32 bytes
//! ([`StrFrameHeader`]). All fields are little-endian.
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | magic (0x80010160) |
//! | 4 | 4 | frame number (signed) |
//! | 8 | 2 | chunk number |
//! | 10 | 2 | chunks in frame |
//! | 12 | 4 | used demux size |
//! | 16 | 2 | width |
//! | 18 | 2 | height |
//! | 20 | 2 | run-length code count / 2, rounded up |
//! | 22 | 2 | 0x3800 |
//! | 24 | 2 | quantization scale (signed) |
//! | 26 | 2 | version |
//! | 28 | 4 | unknown |

use serde::Serialize;

use crate::sector::{SectorView, USER_DATA_SIZE};

/// Magic number at the start of every STR video sector.
pub const VIDEO_SECTOR_MAGIC: u32 = 0x8001_0160;

/// Constant found at offset 22 of every STR sector header.
pub const STR_HEADER_MARKER: u16 = 0x3800;

pub const COMMON_HEADER_SIZE: usize = 16;
pub const STR_HEADER_SIZE: usize = 32;

/// Bytes of frame data carried by one STR chunk sector.
pub const STR_CHUNK_PAYLOAD_SIZE: usize = USER_DATA_SIZE - STR_HEADER_SIZE;

pub(crate) const MAGIC_OFFSET: usize = 0;
pub(crate) const FRAME_NUMBER_OFFSET: usize = 4;
pub(crate) const CHUNK_NUMBER_OFFSET: usize = 8;
pub(crate) const CHUNKS_IN_FRAME_OFFSET: usize = 10;
pub(crate) const USED_DEMUX_SIZE_OFFSET: usize = 12;
pub(crate) const WIDTH_OFFSET: usize = 16;
pub(crate) const HEIGHT_OFFSET: usize = 18;
pub(crate) const RUN_LENGTH_CODE_COUNT_OFFSET: usize = 20;
pub(crate) const MARKER_OFFSET: usize = 22;
pub(crate) const QUANTIZATION_SCALE_OFFSET: usize = 24;
pub(crate) const VERSION_OFFSET: usize = 26;
pub(crate) const RESERVED_OFFSET: usize = 28;

/// Lowest frame number a stream is allowed to start at.
///
/// Standard STR streams number frames from 1, but some titles write a
/// frame 0 into otherwise ordinary STR sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameNumberRule {
    /// Frame numbers start at 1.
    Strict,
    /// Frame 0 is tolerated.
    #[default]
    Relaxed,
}

impl FrameNumberRule {
    pub fn minimum(self) -> i32 {
        match self {
            Self::Strict => 1,
            Self::Relaxed => 0,
        }
    }
}

/// The 16-byte header shared by every video chunk sector variant.
///
/// Parsing never fails; whether the values make sense is answered by the
/// `has_standard_*` predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommonVideoHeader {
    pub magic: u32,
    pub frame_number: i32,
    pub chunk_number: u16,
    pub chunks_in_frame: u16,
    pub used_demux_size: u32,
}

impl CommonVideoHeader {
    /// Read the header fields from the start of a sector.
    ///
    /// # Panics
    ///
    /// Panics if the sector holds fewer than 16 bytes.
    pub fn read(sector: &SectorView<'_>) -> Self {
        Self {
            magic: sector.read_u32_le(MAGIC_OFFSET),
            frame_number: sector.read_i32_le(FRAME_NUMBER_OFFSET),
            chunk_number: sector.read_u16_le(CHUNK_NUMBER_OFFSET),
            chunks_in_frame: sector.read_u16_le(CHUNKS_IN_FRAME_OFFSET),
            used_demux_size: sector.read_u32_le(USED_DEMUX_SIZE_OFFSET),
        }
    }

    pub fn has_video_magic(&self) -> bool {
        self.magic == VIDEO_SECTOR_MAGIC
    }

    pub fn has_standard_chunk_number(&self) -> bool {
        self.chunk_number < self.chunks_in_frame
    }

    pub fn has_standard_chunks_in_frame(&self) -> bool {
        self.chunks_in_frame > 0
    }

    pub fn has_standard_frame_number(&self, rule: FrameNumberRule) -> bool {
        self.frame_number >= rule.minimum()
    }

    /// The demux size must be non-zero and fit in the payload area of all
    /// of the frame's chunk sectors.
    pub fn has_standard_used_demux_size(&self) -> bool {
        let capacity = self.chunks_in_frame as u64 * STR_CHUNK_PAYLOAD_SIZE as u64;
        self.used_demux_size >= 1 && self.used_demux_size as u64 <= capacity
    }
}

/// The 32-byte STR v1/v2/v3 sector header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrFrameHeader {
    #[serde(flatten)]
    pub common: CommonVideoHeader,
    pub width: i16,
    pub height: i16,
    /// Stored as the number of 16-bit units holding two codes each.
    pub run_length_code_count: u16,
    pub quantization_scale: i16,
    pub version: u16,
    /// Usually 0. Non-zero values show up with non-reference encoders.
    pub reserved: u32,
}

impl StrFrameHeader {
    /// Read every field without validating any of them.
    ///
    /// # Panics
    ///
    /// Panics if the sector holds fewer than 32 bytes.
    pub fn read(sector: &SectorView<'_>) -> Self {
        Self {
            common: CommonVideoHeader::read(sector),
            width: sector.read_i16_le(WIDTH_OFFSET),
            height: sector.read_i16_le(HEIGHT_OFFSET),
            run_length_code_count: sector.read_u16_le(RUN_LENGTH_CODE_COUNT_OFFSET),
            quantization_scale: sector.read_i16_le(QUANTIZATION_SCALE_OFFSET),
            version: sector.read_u16_le(VERSION_OFFSET),
            reserved: sector.read_u32_le(RESERVED_OFFSET),
        }
    }

    /// The value at the constant-marker offset.
    pub fn read_marker(sector: &SectorView<'_>) -> u16 {
        sector.read_u16_le(MARKER_OFFSET)
    }

    pub fn frame_number(&self) -> i32 {
        self.common.frame_number
    }

    pub fn chunk_number(&self) -> u16 {
        self.common.chunk_number
    }

    pub fn chunks_in_frame(&self) -> u16 {
        self.common.chunks_in_frame
    }

    pub fn used_demux_size(&self) -> u32 {
        self.common.used_demux_size
    }
}

#[cfg(test)]
#[path = "tests/header_tests.rs"]
mod tests;
