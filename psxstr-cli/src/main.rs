//! psxstr CLI
//!
//! Command-line interface for finding, extracting and replacing STR video
//! frames in PlayStation disc images.

use std::io::Write;
use std::sync::mpsc;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use psxstr_core::{
    Frame, FrameNumberRule, ScanOptions, ScanProgress, ScanReport, SectorSource,
    scan_with_progress,
};

mod cli_types;
mod commands;
mod error;

use cli_types::{Cli, Commands, ScanArgs};
pub(crate) use error::CliError;

fn main() {
    let cli = Cli::parse();
    init_logger(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Scan {
            image,
            scan,
            sectors,
            json,
        } => commands::scan::run_scan(&image, &scan, sectors, json, cli.quiet),
        Commands::Inspect { image, sector } => commands::inspect::run_inspect(&image, sector),
        Commands::Demux {
            image,
            out_dir,
            frame,
            min_probability,
            scan,
        } => commands::demux::run_demux(
            &image,
            &out_dir,
            frame,
            min_probability,
            &scan,
            cli.quiet,
        ),
        Commands::Replace {
            image,
            frame,
            first_sector,
            bitstream,
            codes,
            dry_run,
            scan,
        } => commands::replace::run_replace(
            &image,
            frame,
            first_sector,
            &bitstream,
            codes,
            dry_run,
            &scan,
            cli.quiet,
        ),
    };

    if let Err(e) = result {
        log::error!("{} {}", "Error:".if_supports_color(Stdout, |t| t.red()), e);
        std::process::exit(1);
    }
}

/// Install a logger that prints bare messages at the level picked by
/// `--quiet` / `--verbose`. `RUST_LOG` still overrides it.
fn init_logger(quiet: bool, verbose: bool) {
    let level = if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(move |buf, record| {
            if verbose {
                writeln!(
                    buf,
                    "[{:<5} {}] {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            } else {
                writeln!(buf, "{}", record.args())
            }
        })
        .init();
}

/// Print an empty line through the logger.
pub(crate) fn log_blank() {
    log::info!("");
}

pub(crate) fn scan_options(args: &ScanArgs) -> ScanOptions {
    let rule = if args.strict_frame_numbers {
        FrameNumberRule::Strict
    } else {
        FrameNumberRule::Relaxed
    };
    let mut options = ScanOptions::new()
        .frame_number_rule(rule)
        .batch_size(args.batch_size);
    if let Some(start) = args.start {
        options = options.start_sector(start);
    }
    if let Some(end) = args.end {
        options = options.end_sector(end);
    }
    options
}

/// Scan an image, showing a progress bar unless `quiet` is set.
pub(crate) fn scan_image<S: SectorSource + ?Sized>(
    disc: &mut S,
    options: &ScanOptions,
    quiet: bool,
) -> Result<ScanReport, CliError> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} sectors {msg}")
                .expect("static pattern")
                .progress_chars("=> "),
        );
        pb
    };

    let (tx, rx) = mpsc::channel();
    let display_pb = pb.clone();
    let result = std::thread::scope(|s| {
        let display = s.spawn(move || {
            let mut frames = 0usize;
            for update in rx {
                match update {
                    ScanProgress::Started { total_sectors } => {
                        display_pb.set_length(total_sectors as u64);
                    }
                    ScanProgress::Reading { sectors_done, .. } => {
                        display_pb.set_position(sectors_done as u64);
                    }
                    ScanProgress::FrameFound { .. } => {
                        frames += 1;
                        display_pb.set_message(format!("({frames} frames)"));
                    }
                    ScanProgress::Completed => display_pb.finish_and_clear(),
                }
            }
        });

        let result = scan_with_progress(disc, options, &tx);
        drop(tx);
        if display.join().is_err() {
            log::warn!("Progress display stopped unexpectedly");
        }
        result
    });
    pb.finish_and_clear();

    Ok(result?)
}

/// One-line summary of a frame, as printed by `scan`.
pub(crate) fn format_frame(frame: &Frame) -> String {
    format!(
        "Frame {}  sectors {}-{}  {}x{}  v{}  {} bytes  qscale {}  {}%",
        format!("{:>5}", frame.frame_number).if_supports_color(Stdout, |t| t.bold()),
        frame.first_sector(),
        frame.last_sector(),
        frame.width,
        frame.height,
        frame.version,
        frame.used_demux_size,
        frame.quantization_scale,
        frame.probability,
    )
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
