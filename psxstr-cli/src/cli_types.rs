//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "psxstr")]
#[command(about = "Find, extract and replace PlayStation STR video frames in disc images", long_about = None)]
pub(crate) struct Cli {
    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by commands that scan an image for frames.
#[derive(Args, Clone)]
pub(crate) struct ScanArgs {
    /// Reject frame number 0 (some titles start counting at 1)
    #[arg(long)]
    pub strict_frame_numbers: bool,

    /// First sector to scan
    #[arg(long)]
    pub start: Option<u32>,

    /// Last sector to scan (inclusive)
    #[arg(long)]
    pub end: Option<u32>,

    /// Sectors read and classified per batch
    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List the STR frames found in a disc image
    Scan {
        /// Disc image (.iso, .bin, .cue or .chd)
        image: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Also list every sector classified as a video chunk
        #[arg(long)]
        sectors: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a single sector is classified
    Inspect {
        /// Disc image (.iso, .bin, .cue or .chd)
        image: PathBuf,

        /// Sector index
        sector: u32,
    },

    /// Extract frame bitstreams to files
    Demux {
        /// Disc image (.iso, .bin, .cue or .chd)
        image: PathBuf,

        /// Directory for the extracted frames
        out_dir: PathBuf,

        /// Only extract this frame number
        #[arg(long)]
        frame: Option<i32>,

        /// Skip frames scoring below this probability (0-100)
        #[arg(long, default_value_t = 0)]
        min_probability: u8,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Replace a frame's bitstream in place
    Replace {
        /// Disc image (.iso, .bin or .cue); CHD images are read-only
        image: PathBuf,

        /// Frame number to replace
        #[arg(long)]
        frame: i32,

        /// First sector of the frame, when the frame number occurs more than once
        #[arg(long)]
        first_sector: Option<u32>,

        /// Replacement bitstream file
        #[arg(long)]
        bitstream: PathBuf,

        /// Run-length code count of the replacement (default: read from its header)
        #[arg(long)]
        codes: Option<u32>,

        /// Show the new header values without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        #[command(flatten)]
        scan: ScanArgs,
    },
}
