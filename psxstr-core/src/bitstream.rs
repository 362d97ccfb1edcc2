//! Headers of the compressed frame bitstream.
//!
//! Once a frame's chunks are demuxed, the resulting bitstream begins with an
//! 8-byte header of four little-endian 16-bit words:
//!
//! | Offset | Field |
//! |---|---|
//! | 0 | run-length code count / 2, rounded up |
//! | 2 | 0x3800 |
//! | 4 | quantization scale (signed) |
//! | 6 | version |
//!
//! The two known dialects, STR v2 and STR v3, share this layout and differ in
//! the version word (and in how the body is coded, which is not looked at
//! here). Parsing only checks the header; it never decodes the body.

use std::fmt;

use serde::Serialize;

const MARKER: u16 = 0x3800;

/// Size of the bitstream header.
pub const BITSTREAM_HEADER_SIZE: usize = 8;

/// A known compressed bitstream dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    StrV2,
    StrV3,
}

impl Dialect {
    /// Dialects in the order they are tried by [`FrameHeaderVariant::detect`].
    pub const ALL: [Dialect; 2] = [Dialect::StrV2, Dialect::StrV3];

    pub fn version(self) -> i16 {
        match self {
            Self::StrV2 => 2,
            Self::StrV3 => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StrV2 => "STRv2",
            Self::StrV3 => "STRv3",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields of a bitstream header, read without validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BitstreamHeader {
    pub half_code_count: i16,
    pub marker: u16,
    pub quantization_scale: i16,
    pub version: i16,
}

impl BitstreamHeader {
    fn read(buffer: &[u8]) -> Self {
        let word = |offset: usize| u16::from_le_bytes([buffer[offset], buffer[offset + 1]]);
        Self {
            half_code_count: word(0) as i16,
            marker: word(2),
            quantization_scale: word(4) as i16,
            version: word(6) as i16,
        }
    }

    fn is_valid_for(&self, dialect: Dialect) -> bool {
        self.marker == MARKER
            && self.quantization_scale >= 1
            && self.version == dialect.version()
            && self.half_code_count >= 0
    }
}

/// A bitstream header parsed as one particular dialect.
///
/// A variant is produced for any input; [`is_valid`](Self::is_valid) says
/// whether the bytes actually belong to that dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameHeaderVariant {
    V2(Option<BitstreamHeader>),
    V3(Option<BitstreamHeader>),
}

impl FrameHeaderVariant {
    /// Parse the first `used_size` bytes of `buffer` as `dialect`.
    ///
    /// `used_size` is clamped to the buffer length. Fewer than 8 bytes give
    /// an invalid variant.
    pub fn parse(dialect: Dialect, buffer: &[u8], used_size: usize) -> Self {
        let used = &buffer[..used_size.min(buffer.len())];
        let header = (used.len() >= BITSTREAM_HEADER_SIZE).then(|| BitstreamHeader::read(used));
        match dialect {
            Dialect::StrV2 => Self::V2(header),
            Dialect::StrV3 => Self::V3(header),
        }
    }

    /// The first dialect whose header validates, in [`Dialect::ALL`] order.
    pub fn detect(buffer: &[u8], used_size: usize) -> Option<Self> {
        Dialect::ALL
            .into_iter()
            .map(|dialect| Self::parse(dialect, buffer, used_size))
            .find(Self::is_valid)
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Self::V2(_) => Dialect::StrV2,
            Self::V3(_) => Dialect::StrV3,
        }
    }

    pub fn header(&self) -> Option<&BitstreamHeader> {
        match self {
            Self::V2(header) | Self::V3(header) => header.as_ref(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.header()
            .is_some_and(|header| header.is_valid_for(self.dialect()))
    }

    /// Quantization scale from the header, or -1 when the buffer was too
    /// short to hold one.
    pub fn quantization_scale(&self) -> i16 {
        self.header().map_or(-1, |h| h.quantization_scale)
    }

    /// Run-length code count / 2 from the header, or -1 when too short.
    pub fn half_code_count(&self) -> i16 {
        self.header().map_or(-1, |h| h.half_code_count)
    }
}

#[cfg(test)]
#[path = "tests/bitstream_tests.rs"]
mod tests;
