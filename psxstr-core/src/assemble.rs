//! Grouping classified chunk sectors into complete frames.
//!
//! Sectors must be pushed in disc order. A frame is emitted only when every
//! chunk `0..chunks_in_frame` arrived in sequence; any break in the sequence
//! throws the partial frame away, since the decoder cannot work with a
//! frame that is missing a chunk.

use serde::Serialize;

use crate::classify::ClassifiedSector;

/// A complete frame: one sector index per chunk, in chunk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub frame_number: i32,
    pub chunks_in_frame: u16,
    /// `sectors[i]` holds chunk `i`.
    pub sectors: Vec<u32>,
    pub width: i16,
    pub height: i16,
    pub version: u16,
    pub used_demux_size: u32,
    pub run_length_code_count: u16,
    pub quantization_scale: i16,
    /// Lowest probability among the frame's chunks.
    pub probability: u8,
}

impl Frame {
    fn start(chunk: &ClassifiedSector) -> Self {
        let h = &chunk.header;
        Self {
            frame_number: h.frame_number(),
            chunks_in_frame: h.chunks_in_frame(),
            sectors: vec![chunk.sector_index],
            width: h.width,
            height: h.height,
            version: h.version,
            used_demux_size: h.used_demux_size(),
            run_length_code_count: h.run_length_code_count,
            quantization_scale: h.quantization_scale,
            probability: chunk.probability,
        }
    }

    pub fn first_sector(&self) -> u32 {
        self.sectors[0]
    }

    pub fn last_sector(&self) -> u32 {
        self.sectors[self.sectors.len() - 1]
    }
}

/// Where the assembler stands between two pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Idle,
    InFrame {
        frame_number: i32,
        next_chunk: u16,
        chunks_in_frame: u16,
    },
    /// A frame was just emitted.
    Complete,
    /// A partial frame was just discarded.
    Abandoned,
}

/// Frame assembly state machine.
#[derive(Debug)]
pub struct FrameAssembler {
    state: AssemblerState,
    current: Option<Frame>,
    abandoned_runs: usize,
    frames_emitted: usize,
    passed_over: usize,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            state: AssemblerState::Idle,
            current: None,
            abandoned_runs: 0,
            frames_emitted: 0,
            passed_over: 0,
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Number of partial frames discarded so far.
    pub fn abandoned_runs(&self) -> usize {
        self.abandoned_runs
    }

    pub fn frames_emitted(&self) -> usize {
        self.frames_emitted
    }

    /// Number of interleaved sectors skipped with [`pass_over`](Self::pass_over).
    pub fn passed_over(&self) -> usize {
        self.passed_over
    }

    /// Feed the next sector in disc order.
    ///
    /// `None` stands for a sector that is not an STR video chunk. Returns the
    /// frame completed by this sector, if any.
    pub fn push(&mut self, sector: Option<&ClassifiedSector>) -> Option<Frame> {
        if let AssemblerState::InFrame {
            frame_number,
            next_chunk,
            chunks_in_frame,
        } = self.state
        {
            match sector {
                Some(chunk)
                    if chunk.header.frame_number() == frame_number
                        && chunk.header.chunks_in_frame() == chunks_in_frame
                        && chunk.header.chunk_number() == next_chunk =>
                {
                    return self.append(chunk);
                }
                _ => self.abandon(),
            }
        }

        // Idle, Complete and Abandoned all re-evaluate the sector as a
        // possible start of a frame. Abandoned persists until a frame starts.
        match sector {
            Some(chunk) if chunk.header.chunk_number() == 0 => self.begin(chunk),
            _ => {
                if self.state == AssemblerState::Complete {
                    self.state = AssemblerState::Idle;
                }
                None
            }
        }
    }

    /// Skip a sector that belongs to another stream interleaved with the
    /// video (e.g. XA audio) without breaking the frame in progress.
    pub fn pass_over(&mut self) {
        self.passed_over += 1;
    }

    /// Signal the end of input. A frame still in progress is discarded.
    pub fn finish(&mut self) {
        if matches!(self.state, AssemblerState::InFrame { .. }) {
            self.abandon();
        }
    }

    fn begin(&mut self, chunk: &ClassifiedSector) -> Option<Frame> {
        let frame = Frame::start(chunk);
        let chunks_in_frame = frame.chunks_in_frame;
        self.state = AssemblerState::InFrame {
            frame_number: frame.frame_number,
            next_chunk: 1,
            chunks_in_frame,
        };
        self.current = Some(frame);
        if chunks_in_frame == 1 {
            return self.complete();
        }
        None
    }

    fn append(&mut self, chunk: &ClassifiedSector) -> Option<Frame> {
        let frame = self.current.as_mut()?;
        frame.sectors.push(chunk.sector_index);
        frame.probability = frame.probability.min(chunk.probability);

        let next_chunk = chunk.header.chunk_number() + 1;
        if next_chunk == frame.chunks_in_frame {
            return self.complete();
        }
        self.state = AssemblerState::InFrame {
            frame_number: frame.frame_number,
            next_chunk,
            chunks_in_frame: frame.chunks_in_frame,
        };
        None
    }

    fn complete(&mut self) -> Option<Frame> {
        let frame = self.current.take()?;
        log::debug!(
            "frame {} complete: sectors {}-{}",
            frame.frame_number,
            frame.first_sector(),
            frame.last_sector()
        );
        self.state = AssemblerState::Complete;
        self.frames_emitted += 1;
        Some(frame)
    }

    fn abandon(&mut self) {
        if let Some(frame) = self.current.take() {
            log::debug!(
                "frame {} abandoned after {}/{} chunks at sector {}",
                frame.frame_number,
                frame.sectors.len(),
                frame.chunks_in_frame,
                frame.last_sector()
            );
        }
        self.state = AssemblerState::Abandoned;
        self.abandoned_runs += 1;
    }
}

#[cfg(test)]
#[path = "tests/assemble_tests.rs"]
mod tests;
