use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use psxstr_core::{DiscImage, SectorSource};

use crate::CliError;
use crate::cli_types::ScanArgs;

/// Run the scan command.
pub(crate) fn run_scan(
    image: &Path,
    args: &ScanArgs,
    sectors: bool,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let mut disc = DiscImage::open(image)?;
    let options = crate::scan_options(args).collect_sectors(sectors);

    if !json {
        log::info!(
            "Scanning {} ({}, {} sectors)",
            image.display().if_supports_color(Stdout, |t| t.cyan()),
            disc.format().name(),
            disc.sector_count(),
        );
        crate::log_blank();
    }

    // JSON bypasses the logger and the progress bar
    let report = crate::scan_image(&mut disc, &options, quiet || json)?;

    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::json(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    if sectors {
        for sector in &report.sectors {
            log::info!("  {}", sector);
        }
        crate::log_blank();
    }

    for frame in &report.frames {
        log::info!("  {}", crate::format_frame(frame));
    }
    if !report.frames.is_empty() {
        crate::log_blank();
    }

    log::info!(
        "{} {} frames, {} video sectors in {} scanned",
        "Found".if_supports_color(Stdout, |t| t.bold()),
        report.frames.len().if_supports_color(Stdout, |t| t.green()),
        report.video_sectors,
        report.sectors_scanned,
    );
    if report.interleaved_sectors > 0 {
        log::info!(
            "{}",
            format!("{} interleaved audio sectors skipped", report.interleaved_sectors)
                .if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    if report.abandoned_runs > 0 {
        log::warn!(
            "{} incomplete frames discarded",
            report.abandoned_runs.if_supports_color(Stdout, |t| t.yellow()),
        );
    }

    Ok(())
}
