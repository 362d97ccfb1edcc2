//! Whole-image scanning for STR video frames.
//!
//! Sectors are read in batches. Each batch is classified in parallel; the
//! results are then fed to a single [`FrameAssembler`] in sector order.
//! Progress is reported between batches.

use std::sync::mpsc::Sender;

use rayon::prelude::*;
use serde::Serialize;

use crate::assemble::{Frame, FrameAssembler};
use crate::classify::{ClassifiedSector, SectorClassifier};
use crate::disc::SectorSource;
use crate::error::DiscError;
use crate::header::FrameNumberRule;
use crate::sector::Sector;

const DEFAULT_BATCH_SIZE: usize = 256;

/// Options that control how an image is scanned.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Minimum frame number accepted by the classifier.
    pub frame_number_rule: FrameNumberRule,

    /// First sector to scan (inclusive).
    pub start_sector: Option<u32>,

    /// Last sector to scan (inclusive).
    pub end_sector: Option<u32>,

    /// Sectors read and classified per batch.
    pub batch_size: usize,

    /// Keep every classified sector in the report, not just the frames.
    pub collect_sectors: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            frame_number_rule: FrameNumberRule::default(),
            start_sector: None,
            end_sector: None,
            batch_size: DEFAULT_BATCH_SIZE,
            collect_sectors: false,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_number_rule(mut self, rule: FrameNumberRule) -> Self {
        self.frame_number_rule = rule;
        self
    }

    pub fn start_sector(mut self, sector: u32) -> Self {
        self.start_sector = Some(sector);
        self
    }

    pub fn end_sector(mut self, sector: u32) -> Self {
        self.end_sector = Some(sector);
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn collect_sectors(mut self, collect: bool) -> Self {
        self.collect_sectors = collect;
        self
    }

    /// Sector range to scan, clamped to the image.
    fn range(&self, sector_count: u32) -> std::ops::Range<u32> {
        let start = self.start_sector.unwrap_or(0).min(sector_count);
        let end = self
            .end_sector
            .map_or(sector_count, |e| e.saturating_add(1))
            .min(sector_count);
        start..end.max(start)
    }
}

/// Progress update sent while scanning.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    Started { total_sectors: u32 },
    Reading { sectors_done: u32, total_sectors: u32 },
    FrameFound { frame_number: i32, first_sector: u32 },
    Completed,
}

/// Everything a scan found.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub frames: Vec<Frame>,
    /// Only filled when [`ScanOptions::collect_sectors`] is set.
    pub sectors: Vec<ClassifiedSector>,
    pub sectors_scanned: u32,
    pub video_sectors: u32,
    pub interleaved_sectors: usize,
    pub abandoned_runs: usize,
}

/// Scan an image for complete STR frames.
pub fn scan<S: SectorSource + ?Sized>(
    source: &mut S,
    options: &ScanOptions,
) -> Result<ScanReport, DiscError> {
    run(source, options, None)
}

/// Like [`scan`], sending [`ScanProgress`] updates between batches.
pub fn scan_with_progress<S: SectorSource + ?Sized>(
    source: &mut S,
    options: &ScanOptions,
    progress_tx: &Sender<ScanProgress>,
) -> Result<ScanReport, DiscError> {
    run(source, options, Some(progress_tx))
}

fn run<S: SectorSource + ?Sized>(
    source: &mut S,
    options: &ScanOptions,
    progress_tx: Option<&Sender<ScanProgress>>,
) -> Result<ScanReport, DiscError> {
    // A closed channel only means nobody is watching
    let send = |update: ScanProgress| {
        if let Some(tx) = progress_tx {
            let _ = tx.send(update);
        }
    };

    let classifier = SectorClassifier::new().frame_number_rule(options.frame_number_rule);
    let mut assembler = FrameAssembler::new();
    let mut report = ScanReport::default();

    let range = options.range(source.sector_count());
    let total_sectors = range.end - range.start;
    let batch_size = options.batch_size.max(1) as u32;
    log::debug!(
        "scanning sectors {}..{} in batches of {}",
        range.start,
        range.end,
        batch_size
    );
    send(ScanProgress::Started { total_sectors });

    let mut next = range.start;
    while next < range.end {
        let batch_end = next.saturating_add(batch_size).min(range.end);
        let batch = (next..batch_end)
            .map(|index| source.read_sector(index))
            .collect::<Result<Vec<Sector>, _>>()?;

        let results: Vec<(Option<ClassifiedSector>, bool)> = batch
            .par_iter()
            .map(|sector| (classifier.classify(&sector.view()), is_interleaved(sector)))
            .collect();

        for (classified, interleaved) in results {
            report.sectors_scanned += 1;
            match classified {
                Some(chunk) => {
                    report.video_sectors += 1;
                    if let Some(frame) = assembler.push(Some(&chunk)) {
                        send(ScanProgress::FrameFound {
                            frame_number: frame.frame_number,
                            first_sector: frame.first_sector(),
                        });
                        report.frames.push(frame);
                    }
                    if options.collect_sectors {
                        report.sectors.push(chunk);
                    }
                }
                None if interleaved => assembler.pass_over(),
                None => {
                    assembler.push(None);
                }
            }
        }

        next = batch_end;
        send(ScanProgress::Reading {
            sectors_done: next - range.start,
            total_sectors,
        });
    }

    assembler.finish();
    report.abandoned_runs = assembler.abandoned_runs();
    report.interleaved_sectors = assembler.passed_over();
    log::debug!(
        "scan complete: {} frames, {} video sectors, {} abandoned runs",
        report.frames.len(),
        report.video_sectors,
        report.abandoned_runs
    );
    send(ScanProgress::Completed);
    Ok(report)
}

/// XA audio sectors are interleaved with video and don't break a frame.
fn is_interleaved(sector: &Sector) -> bool {
    sector.sub_header().is_some_and(|sh| sh.submode.is_audio())
}

#[cfg(test)]
#[path = "tests/scan_tests.rs"]
mod tests;
