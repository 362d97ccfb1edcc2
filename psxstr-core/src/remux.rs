//! Rewriting STR sector headers for a replacement frame.
//!
//! Replacing a frame keeps the disc's sector layout intact: the new
//! bitstream is written over the payload area of the frame's existing chunk
//! sectors and only three header fields change (used demux size, run-length
//! code count and quantization scale). Every other header byte is left as
//! it was, since other tools reading the image rely on them.

use crate::bitstream::{Dialect, FrameHeaderVariant};
use crate::error::RemuxError;
use crate::header::{
    QUANTIZATION_SCALE_OFFSET, RUN_LENGTH_CODE_COUNT_OFFSET, STR_CHUNK_PAYLOAD_SIZE,
    STR_HEADER_SIZE, USED_DEMUX_SIZE_OFFSET,
};
use crate::sector::USER_DATA_SIZE;

/// The three header values written for a replacement frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderPatch {
    pub used_demux_size: u32,
    pub half_code_count: u16,
    pub quantization_scale: i16,
}

impl HeaderPatch {
    /// Work out the header values for `new_payload`.
    ///
    /// Fails without side effects if the payload is in neither known dialect
    /// or a value does not fit its header field.
    ///
    /// The sector header stores the half code count unsigned, so counts up to
    /// 0xFFFF are accepted here. A bitstream's own header holds the same count
    /// as a signed value and is only recognized up to 0x7FFF, so a count
    /// above that can be written to the sector header but never read back
    /// from a bitstream.
    pub fn new(
        new_payload: &[u8],
        new_used_size: u32,
        new_code_count: u32,
    ) -> Result<Self, RemuxError> {
        let quantization_scale = select_quantization_scale(new_payload, new_used_size)?;

        let used_demux_size = new_used_size
            .checked_add(3)
            .map(|size| size & !3)
            .ok_or(RemuxError::DemuxSizeOverflow {
                size: new_used_size,
            })?;

        // Two run-length codes are packed per 16-bit unit
        let half_code_count = u16::try_from(new_code_count.div_ceil(2)).map_err(|_| {
            RemuxError::CodeCountOverflow {
                count: new_code_count,
            }
        })?;

        Ok(Self {
            used_demux_size,
            half_code_count,
            quantization_scale,
        })
    }

    /// Write the values into a sector header.
    ///
    /// # Panics
    ///
    /// Panics if `header` is shorter than 32 bytes.
    pub fn apply(&self, header: &mut [u8]) {
        header[USED_DEMUX_SIZE_OFFSET..USED_DEMUX_SIZE_OFFSET + 4]
            .copy_from_slice(&self.used_demux_size.to_le_bytes());
        header[RUN_LENGTH_CODE_COUNT_OFFSET..RUN_LENGTH_CODE_COUNT_OFFSET + 2]
            .copy_from_slice(&self.half_code_count.to_le_bytes());
        header[QUANTIZATION_SCALE_OFFSET..QUANTIZATION_SCALE_OFFSET + 2]
            .copy_from_slice(&self.quantization_scale.to_le_bytes());
    }
}

/// Quantization scale of the first dialect that recognizes the payload.
pub fn select_quantization_scale(
    new_payload: &[u8],
    new_used_size: u32,
) -> Result<i16, RemuxError> {
    FrameHeaderVariant::detect(new_payload, new_used_size as usize)
        .map(|variant| variant.quantization_scale())
        .ok_or_else(|| RemuxError::IncompatibleFormat {
            tried: Dialect::ALL.to_vec(),
        })
}

/// Patch the used demux size, run-length code count and quantization scale
/// of an STR sector header to describe `new_payload`.
///
/// On error the header is left unmodified.
pub fn rewrite_header(
    new_payload: &[u8],
    new_used_size: u32,
    new_code_count: u32,
    header: &mut [u8; STR_HEADER_SIZE],
) -> Result<(), RemuxError> {
    let patch = HeaderPatch::new(new_payload, new_used_size, new_code_count)?;
    patch.apply(header);
    Ok(())
}

/// Write a replacement bitstream over the chunk sectors of one frame.
///
/// `chunks[i]` is the 2048-byte user data of chunk `i`. Each chunk receives
/// the next 2016 bytes of the payload after its 32-byte header, the unused
/// tail is zeroed and every header is patched with the same values. Nothing
/// is written if any check fails.
pub fn replace_frame_payload(
    new_payload: &[u8],
    new_code_count: u32,
    chunks: &mut [&mut [u8]],
) -> Result<HeaderPatch, RemuxError> {
    for (chunk, data) in chunks.iter().enumerate() {
        if data.len() < USER_DATA_SIZE {
            return Err(RemuxError::ChunkBufferSize {
                chunk,
                len: data.len(),
                expected: USER_DATA_SIZE,
            });
        }
    }

    let capacity = chunks.len() * STR_CHUNK_PAYLOAD_SIZE;
    if new_payload.len() > capacity {
        return Err(RemuxError::PayloadTooLarge {
            size: new_payload.len(),
            capacity,
        });
    }
    let used_size = u32::try_from(new_payload.len()).map_err(|_| RemuxError::DemuxSizeOverflow {
        size: u32::MAX,
    })?;

    let patch = HeaderPatch::new(new_payload, used_size, new_code_count)?;

    let mut pieces = new_payload.chunks(STR_CHUNK_PAYLOAD_SIZE);
    for data in chunks.iter_mut() {
        let (header, body) = data[..USER_DATA_SIZE].split_at_mut(STR_HEADER_SIZE);
        patch.apply(header);

        let piece = pieces.next().unwrap_or(&[]);
        body[..piece.len()].copy_from_slice(piece);
        body[piece.len()..].fill(0);
    }

    log::debug!(
        "replaced frame payload: {} bytes over {} chunks (qscale {})",
        new_payload.len(),
        chunks.len(),
        patch.quantization_scale
    );

    Ok(patch)
}

#[cfg(test)]
#[path = "tests/remux_tests.rs"]
mod tests;
