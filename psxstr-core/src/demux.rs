//! Moving frame bitstreams in and out of chunk sectors.

use serde::Serialize;

use crate::assemble::Frame;
use crate::bitstream::{Dialect, FrameHeaderVariant};
use crate::disc::{SectorSink, SectorSource};
use crate::error::{DiscError, ReplaceError};
use crate::header::{STR_CHUNK_PAYLOAD_SIZE, STR_HEADER_SIZE, StrFrameHeader};
use crate::remux::{self, HeaderPatch};
use crate::sector::{Sector, USER_DATA_SIZE};

/// A frame's compressed bitstream, reassembled from its chunks.
#[derive(Debug, Clone, Serialize)]
pub struct DemuxedFrame {
    pub frame_number: i32,
    #[serde(skip)]
    pub bitstream: Vec<u8>,
    /// Dialect of the bitstream header, if it is a known one.
    pub dialect: Option<Dialect>,
}

/// Read a frame's chunk sectors and concatenate their payloads.
///
/// The result is cut to the used demux size stored in chunk 0 as it is on
/// disc now, so a `Frame` scanned before a replacement still demuxes the new
/// bitstream.
pub fn demux_frame<S: SectorSource + ?Sized>(
    source: &mut S,
    frame: &Frame,
) -> Result<DemuxedFrame, DiscError> {
    let mut bitstream = Vec::with_capacity(frame.sectors.len() * STR_CHUNK_PAYLOAD_SIZE);
    let mut used_demux_size = frame.used_demux_size;
    for (chunk, &index) in frame.sectors.iter().enumerate() {
        let sector = source.read_sector(index)?;
        let data = sector.user_data();
        if data.len() < USER_DATA_SIZE {
            return Err(DiscError::invalid_format(format!(
                "sector {} holds {} bytes of user data",
                index,
                data.len()
            )));
        }
        if chunk == 0 {
            used_demux_size = StrFrameHeader::read(&sector.view()).used_demux_size();
            if used_demux_size != frame.used_demux_size {
                log::debug!(
                    "frame {} demux size changed on disc: {} -> {}",
                    frame.frame_number,
                    frame.used_demux_size,
                    used_demux_size
                );
            }
        }
        bitstream.extend_from_slice(&data[STR_HEADER_SIZE..USER_DATA_SIZE]);
    }
    bitstream.truncate(used_demux_size as usize);

    let dialect = FrameHeaderVariant::detect(&bitstream, bitstream.len()).map(|v| v.dialect());
    if dialect.is_none() {
        log::warn!(
            "frame {} at sector {} has an unrecognized bitstream header",
            frame.frame_number,
            frame.first_sector()
        );
    }

    Ok(DemuxedFrame {
        frame_number: frame.frame_number,
        bitstream,
        dialect,
    })
}

/// Replace a frame's bitstream in place.
///
/// Reads the frame's chunk sectors, writes the new payload over them with
/// patched headers, regenerates sector error codes and writes them back.
/// Nothing is written if the payload is rejected.
pub fn replace_frame<D: SectorSource + SectorSink + ?Sized>(
    disc: &mut D,
    frame: &Frame,
    new_bitstream: &[u8],
    new_code_count: u32,
) -> Result<HeaderPatch, ReplaceError> {
    let mut sectors = frame
        .sectors
        .iter()
        .map(|&index| disc.read_sector(index))
        .collect::<Result<Vec<Sector>, _>>()?;

    let patch = {
        let mut chunks: Vec<&mut [u8]> = sectors.iter_mut().map(Sector::user_data_mut).collect();
        remux::replace_frame_payload(new_bitstream, new_code_count, &mut chunks)?
    };

    for sector in &mut sectors {
        sector.refresh_error_codes();
        disc.write_sector(sector)?;
    }

    log::debug!(
        "replaced frame {} ({} sectors starting at {})",
        frame.frame_number,
        sectors.len(),
        frame.first_sector()
    );
    Ok(patch)
}

#[cfg(test)]
#[path = "tests/demux_tests.rs"]
mod tests;
