use thiserror::Error;

use crate::bitstream::Dialect;

/// Errors from opening, reading or writing a disc image.
#[derive(Debug, Error)]
pub enum DiscError {
    /// I/O error while reading or writing the image
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not recognized or is invalid
    #[error("Invalid disc image: {0}")]
    InvalidFormat(String),

    /// The image is too small to contain a single sector
    #[error("Image too small: expected at least {expected} bytes, got {actual}")]
    TooSmall { expected: u64, actual: u64 },

    /// Sector index past the end of the image
    #[error("Sector {sector} is beyond end of image ({count} sectors)")]
    SectorOutOfRange { sector: u32, count: u32 },

    /// Operation not supported for this image format
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// CHD container error
    #[error("CHD error: {0}")]
    Chd(String),
}

impl DiscError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn chd(msg: impl Into<String>) -> Self {
        Self::Chd(msg.into())
    }
}

/// Errors from rewriting a video sector header for a replacement frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemuxError {
    /// The replacement bitstream matches none of the known dialects
    #[error("Replacement frame is not a recognized format (tried {})", dialect_list(.tried))]
    IncompatibleFormat { tried: Vec<Dialect> },

    /// The run-length code count does not fit the 16-bit header field
    #[error("Run-length code count {count} does not fit in the sector header")]
    CodeCountOverflow { count: u32 },

    /// The used size cannot be rounded up to a 4-byte boundary in 32 bits
    #[error("Used demux size {size} is too large")]
    DemuxSizeOverflow { size: u32 },

    /// The replacement does not fit in the frame's existing sectors
    #[error("Replacement frame is {size} bytes but the frame's sectors hold only {capacity}")]
    PayloadTooLarge { size: usize, capacity: usize },

    /// A chunk buffer is too small to hold a header and payload
    #[error("Chunk buffer {chunk} is {len} bytes, expected {expected}")]
    ChunkBufferSize {
        chunk: usize,
        len: usize,
        expected: usize,
    },
}

/// Errors from replacing a frame inside an image.
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error(transparent)]
    Disc(#[from] DiscError),

    #[error(transparent)]
    Remux(#[from] RemuxError),
}

fn dialect_list(tried: &[Dialect]) -> String {
    tried
        .iter()
        .map(|d| d.name())
        .collect::<Vec<_>>()
        .join(", ")
}
