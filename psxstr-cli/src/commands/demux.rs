use std::fs;
use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use psxstr_core::{DiscImage, demux_frame};

use crate::CliError;
use crate::cli_types::ScanArgs;

/// Run the demux command.
pub(crate) fn run_demux(
    image: &Path,
    out_dir: &Path,
    frame_number: Option<i32>,
    min_probability: u8,
    args: &ScanArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let mut disc = DiscImage::open(image)?;
    log::info!(
        "Extracting frames from {}",
        image.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    if min_probability > 0 {
        log::info!(
            "{}",
            format!("Minimum probability: {}%", min_probability)
                .if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let report = crate::scan_image(&mut disc, &crate::scan_options(args), quiet)?;
    let frames: Vec<_> = report
        .frames
        .iter()
        .filter(|f| frame_number.is_none_or(|n| f.frame_number == n))
        .filter(|f| f.probability >= min_probability)
        .collect();

    if frames.is_empty() {
        return match frame_number {
            Some(n) => Err(CliError::frame_not_found(format!("no frame {n} in image"))),
            None => {
                log::info!("No frames found");
                Ok(())
            }
        };
    }

    fs::create_dir_all(out_dir)?;
    let mut unknown = 0usize;
    for frame in &frames {
        let demuxed = demux_frame(&mut disc, frame)?;
        if demuxed.dialect.is_none() {
            unknown += 1;
        }
        // Frame numbers repeat across movies on one disc
        let path = out_dir.join(format!(
            "frame_{:05}_{:06}.bs",
            frame.frame_number,
            frame.first_sector()
        ));
        fs::write(&path, &demuxed.bitstream)?;
        log::debug!("wrote {} ({} bytes)", path.display(), demuxed.bitstream.len());
    }

    crate::log_blank();
    log::info!(
        "{} {} frames to {}",
        "Wrote".if_supports_color(Stdout, |t| t.bold()),
        frames.len().if_supports_color(Stdout, |t| t.green()),
        out_dir.display(),
    );
    if unknown > 0 {
        log::warn!(
            "{} frames have an unrecognized bitstream header",
            unknown.if_supports_color(Stdout, |t| t.yellow()),
        );
    }

    Ok(())
}
