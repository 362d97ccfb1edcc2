//! STR video sector classification.
//!
//! Most sectors on a disc are not video. A rejection is an ordinary outcome,
//! reported as [`Classification::Rejected`] with the first check that failed.
//! Accepted sectors carry a confidence score: the same bytes can pass the
//! structural checks by coincidence, and a disc-wide scanner uses the score
//! to prefer one interpretation over another.

use std::fmt;

use serde::Serialize;

use crate::header::{
    CommonVideoHeader, FrameNumberRule, STR_HEADER_MARKER, STR_HEADER_SIZE, StrFrameHeader,
};
use crate::sector::{SectorView, SubMode};

/// Score of a sector that passed every check with nothing unusual about it.
pub const MAX_PROBABILITY: u8 = 100;

/// Penalty when the trailing unknown field is non-zero.
const RESERVED_PENALTY: u8 = 10;

/// Penalty for sectors labelled version 1.
const VERSION1_PENALTY: u8 = 5;

/// The check that rejected a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rejection {
    TooSmall { len: usize },
    NotDataOrVideo { submode: u8 },
    Form2 { submode: u8 },
    Magic { found: u32 },
    ChunkNumber { chunk: u16, chunks: u16 },
    ChunksInFrame { chunks: u16 },
    FrameNumber { frame: i32 },
    UsedDemuxSize { size: u32 },
    Width { width: i16 },
    Height { height: i16 },
    RunLengthCodeCount { count: u16 },
    Marker { found: u16 },
    QuantizationScale { scale: i16 },
    Version { version: u16 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TooSmall { len } => write!(f, "sector holds only {len} bytes"),
            Self::NotDataOrVideo { submode } => {
                write!(f, "sub-mode {} is neither DATA nor VIDEO", SubMode::new(submode))
            }
            Self::Form2 { submode } => write!(f, "sub-mode {} is Form 2", SubMode::new(submode)),
            Self::Magic { found } => write!(f, "magic {found:08x} is not a video sector"),
            Self::ChunkNumber { chunk, chunks } => {
                write!(f, "chunk {chunk} out of range for {chunks} chunks")
            }
            Self::ChunksInFrame { chunks } => write!(f, "{chunks} chunks in frame"),
            Self::FrameNumber { frame } => write!(f, "frame number {frame} below minimum"),
            Self::UsedDemuxSize { size } => write!(f, "used demux size {size} out of range"),
            Self::Width { width } => write!(f, "width {width}"),
            Self::Height { height } => write!(f, "height {height}"),
            Self::RunLengthCodeCount { count } => write!(f, "run-length code count {count}"),
            Self::Marker { found } => write!(f, "marker {found:04x} is not 3800"),
            Self::QuantizationScale { scale } => write!(f, "quantization scale {scale}"),
            Self::Version { version } => write!(f, "version {version}"),
        }
    }
}

/// A sector identified as an STR video chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassifiedSector {
    pub sector_index: u32,
    pub header: StrFrameHeader,
    /// Confidence in the range 0–100.
    pub probability: u8,
}

impl ClassifiedSector {
    pub fn type_name(&self) -> &'static str {
        "STR"
    }
}

impl fmt::Display for ClassifiedSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        write!(
            f,
            "{} [Sector:{}] frame:{} chunk:{}/{} {}x{} ver:{} \
             {{demux frame size={} rlc={} qscale={} ??={:08x}}}",
            self.type_name(),
            self.sector_index,
            h.frame_number(),
            h.chunk_number(),
            h.chunks_in_frame(),
            h.width,
            h.height,
            h.version,
            h.used_demux_size(),
            h.run_length_code_count,
            h.quantization_scale,
            h.reserved,
        )
    }
}

/// Outcome of running a sector through the validation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    Accepted(ClassifiedSector),
    Rejected(Rejection),
}

impl Classification {
    pub fn accepted(self) -> Option<ClassifiedSector> {
        match self {
            Self::Accepted(sector) => Some(sector),
            Self::Rejected(_) => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Classifies sectors as STR video chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectorClassifier {
    frame_number_rule: FrameNumberRule,
}

impl SectorClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_number_rule(mut self, rule: FrameNumberRule) -> Self {
        self.frame_number_rule = rule;
        self
    }

    pub fn rule(&self) -> FrameNumberRule {
        self.frame_number_rule
    }

    pub fn classify(&self, sector: &SectorView<'_>) -> Option<ClassifiedSector> {
        self.evaluate(sector).accepted()
    }

    /// Run the full validation chain, stopping at the first failed check.
    pub fn evaluate(&self, sector: &SectorView<'_>) -> Classification {
        match self.validate(sector) {
            Ok(header) => Classification::Accepted(ClassifiedSector {
                sector_index: sector.index(),
                probability: score(&header),
                header,
            }),
            Err(rejection) => {
                log::trace!("sector {} rejected: {}", sector.index(), rejection);
                Classification::Rejected(rejection)
            }
        }
    }

    fn validate(&self, sector: &SectorView<'_>) -> Result<StrFrameHeader, Rejection> {
        if sector.len() < STR_HEADER_SIZE {
            return Err(Rejection::TooSmall { len: sector.len() });
        }

        // Only sectors with a sub-header get their mode checked
        if let Some(sh) = sector.sub_header() {
            let submode = sh.submode;
            if submode.mask(SubMode::DATA | SubMode::VIDEO) == 0 {
                return Err(Rejection::NotDataOrVideo {
                    submode: submode.bits(),
                });
            }
            if submode.is_form2() {
                return Err(Rejection::Form2 {
                    submode: submode.bits(),
                });
            }
        }

        let common = CommonVideoHeader::read(sector);
        check_common(&common, self.frame_number_rule)?;

        let header = StrFrameHeader::read(sector);
        if header.width < 1 {
            return Err(Rejection::Width {
                width: header.width,
            });
        }
        if header.height < 1 {
            return Err(Rejection::Height {
                height: header.height,
            });
        }
        if header.run_length_code_count < 1 {
            return Err(Rejection::RunLengthCodeCount {
                count: header.run_length_code_count,
            });
        }
        let marker = StrFrameHeader::read_marker(sector);
        if marker != STR_HEADER_MARKER {
            return Err(Rejection::Marker { found: marker });
        }
        if header.quantization_scale < 1 {
            return Err(Rejection::QuantizationScale {
                scale: header.quantization_scale,
            });
        }
        // Some titles label ordinary v2 frames as v1
        if !(1..=3).contains(&header.version) {
            return Err(Rejection::Version {
                version: header.version,
            });
        }

        Ok(header)
    }
}

fn check_common(common: &CommonVideoHeader, rule: FrameNumberRule) -> Result<(), Rejection> {
    if !common.has_video_magic() {
        return Err(Rejection::Magic {
            found: common.magic,
        });
    }
    if !common.has_standard_chunk_number() {
        return Err(Rejection::ChunkNumber {
            chunk: common.chunk_number,
            chunks: common.chunks_in_frame,
        });
    }
    if !common.has_standard_chunks_in_frame() {
        return Err(Rejection::ChunksInFrame {
            chunks: common.chunks_in_frame,
        });
    }
    if !common.has_standard_frame_number(rule) {
        return Err(Rejection::FrameNumber {
            frame: common.frame_number,
        });
    }
    if !common.has_standard_used_demux_size() {
        return Err(Rejection::UsedDemuxSize {
            size: common.used_demux_size,
        });
    }
    Ok(())
}

/// Confidence score for a header that passed validation.
fn score(header: &StrFrameHeader) -> u8 {
    let mut probability = MAX_PROBABILITY;
    if header.reserved != 0 {
        probability = probability.saturating_sub(RESERVED_PENALTY);
    }
    if header.version == 1 {
        probability = probability.saturating_sub(VERSION1_PENALTY);
    }
    probability.min(MAX_PROBABILITY)
}

#[cfg(test)]
#[path = "tests/classify_tests.rs"]
mod tests;
