//! PlayStation STR video stream demuxing and remuxing.
//!
//! Classifies disc sectors as STR video chunks, assembles complete frames
//! from them, and writes replacement frame bitstreams back into the original
//! sector layout.

use std::io::{Read, Seek};

pub mod assemble;
pub mod bitstream;
pub mod classify;
pub mod demux;
pub mod disc;
pub mod edc;
pub mod error;
pub mod header;
pub mod remux;
pub mod scan;
pub mod sector;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use assemble::{AssemblerState, Frame, FrameAssembler};
pub use bitstream::{Dialect, FrameHeaderVariant};
pub use classify::{Classification, ClassifiedSector, Rejection, SectorClassifier};
pub use demux::{DemuxedFrame, demux_frame, replace_frame};
pub use disc::{DiscFormat, DiscImage, SectorSink, SectorSource};
pub use error::{DiscError, RemuxError, ReplaceError};
pub use header::{CommonVideoHeader, FrameNumberRule, StrFrameHeader};
pub use remux::{HeaderPatch, replace_frame_payload, rewrite_header};
pub use scan::{ScanOptions, ScanProgress, ScanReport, scan, scan_with_progress};
pub use sector::{Sector, SectorLayout, SectorView, SubHeader, SubMode};

/// A readable and seekable byte source.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}
