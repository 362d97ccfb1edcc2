use std::fs;
use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use psxstr_core::bitstream::{Dialect, FrameHeaderVariant};
use psxstr_core::{
    DiscImage, Frame, HeaderPatch, RemuxError, Sector, SectorSource, replace_frame,
    replace_frame_payload,
};

use crate::CliError;
use crate::cli_types::ScanArgs;

/// Run the replace command.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_replace(
    image: &Path,
    frame_number: i32,
    first_sector: Option<u32>,
    bitstream_path: &Path,
    codes: Option<u32>,
    dry_run: bool,
    args: &ScanArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let bitstream = fs::read(bitstream_path)?;
    let codes = match codes {
        Some(codes) => codes,
        None => code_count_from_header(&bitstream)?,
    };

    let mut disc = if dry_run {
        DiscImage::open(image)?
    } else {
        DiscImage::open_writable(image)?
    };

    log::info!(
        "Replacing frame {} in {} with {} ({} bytes, {} codes)",
        frame_number.if_supports_color(Stdout, |t| t.bold()),
        image.display().if_supports_color(Stdout, |t| t.cyan()),
        bitstream_path.display(),
        bitstream.len(),
        codes,
    );
    if dry_run {
        log::info!(
            "{}",
            "Dry run: the image will not be modified".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    crate::log_blank();

    let report = crate::scan_image(&mut disc, &crate::scan_options(args), quiet)?;
    let frame = find_frame(&report.frames, frame_number, first_sector)?;
    log::info!("  Old: {}", crate::format_frame(frame));

    let patch = if dry_run {
        let mut sectors = frame
            .sectors
            .iter()
            .map(|&index| disc.read_sector(index))
            .collect::<Result<Vec<Sector>, _>>()?;
        let mut chunks: Vec<&mut [u8]> = sectors.iter_mut().map(Sector::user_data_mut).collect();
        replace_frame_payload(&bitstream, codes, &mut chunks)?
    } else {
        let patch = replace_frame(&mut disc, frame, &bitstream, codes)?;
        disc.flush()?;
        patch
    };

    log_patch(frame, &patch);
    crate::log_blank();
    if dry_run {
        log::info!("Frame {} can be replaced", frame_number);
    } else {
        log::info!(
            "{} frame {} ({} sectors)",
            "Replaced".if_supports_color(Stdout, |t| t.green()),
            frame_number,
            frame.sectors.len(),
        );
    }

    Ok(())
}

/// Run-length code count stored in the replacement's own bitstream header.
fn code_count_from_header(bitstream: &[u8]) -> Result<u32, CliError> {
    let variant = FrameHeaderVariant::detect(bitstream, bitstream.len()).ok_or_else(|| {
        RemuxError::IncompatibleFormat {
            tried: Dialect::ALL.to_vec(),
        }
    })?;
    log::debug!("replacement bitstream is {}", variant.dialect());
    Ok(variant.half_code_count().max(0) as u32 * 2)
}

fn find_frame(
    frames: &[Frame],
    frame_number: i32,
    first_sector: Option<u32>,
) -> Result<&Frame, CliError> {
    let candidates: Vec<&Frame> = frames
        .iter()
        .filter(|f| f.frame_number == frame_number)
        .filter(|f| first_sector.is_none_or(|s| f.first_sector() == s))
        .collect();

    match candidates.as_slice() {
        [] => Err(CliError::frame_not_found(match first_sector {
            Some(s) => format!("no frame {frame_number} starting at sector {s}"),
            None => format!("no frame {frame_number} in image"),
        })),
        [frame] => Ok(*frame),
        many => {
            let starts: Vec<String> = many.iter().map(|f| f.first_sector().to_string()).collect();
            Err(CliError::other(format!(
                "frame {} occurs {} times (first sectors {}); choose one with --first-sector",
                frame_number,
                many.len(),
                starts.join(", ")
            )))
        }
    }
}

fn log_patch(frame: &Frame, patch: &HeaderPatch) {
    log::info!(
        "  Used demux size: {} -> {}",
        frame.used_demux_size,
        patch.used_demux_size.if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "  Run-length codes: {} -> {}",
        frame.run_length_code_count,
        patch.half_code_count.if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "  Quantization scale: {} -> {}",
        frame.quantization_scale,
        patch.quantization_scale.if_supports_color(Stdout, |t| t.bold()),
    );
}

#[cfg(test)]
#[path = "../tests/replace_tests.rs"]
mod tests;
