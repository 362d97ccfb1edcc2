use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use psxstr_core::bitstream::FrameHeaderVariant;
use psxstr_core::header::{STR_CHUNK_PAYLOAD_SIZE, STR_HEADER_SIZE};
use psxstr_core::{Classification, DiscImage, SectorClassifier, SectorSource};

use crate::CliError;

/// Run the inspect command.
pub(crate) fn run_inspect(image: &Path, index: u32) -> Result<(), CliError> {
    let mut disc = DiscImage::open(image)?;
    let sector = disc.read_sector(index)?;

    log::info!(
        "Sector {} of {} ({})",
        index.if_supports_color(Stdout, |t| t.bold()),
        image.display().if_supports_color(Stdout, |t| t.cyan()),
        sector.layout().name(),
    );
    if let Some(sh) = sector.sub_header() {
        log::info!(
            "  Sub-header: file {} channel {} mode {} coding {:02x}",
            sh.file_number,
            sh.channel,
            sh.submode,
            sh.coding_info,
        );
    }

    match SectorClassifier::new().evaluate(&sector.view()) {
        Classification::Accepted(chunk) => {
            log::info!(
                "  {} {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                chunk,
            );
            log::info!("  Probability: {}%", chunk.probability);

            // Chunk 0 starts with the bitstream header
            if chunk.header.chunk_number() == 0 {
                let data = sector.user_data();
                let end = (STR_HEADER_SIZE + STR_CHUNK_PAYLOAD_SIZE).min(data.len());
                let payload = &data[STR_HEADER_SIZE..end];
                match FrameHeaderVariant::detect(payload, chunk.header.used_demux_size() as usize) {
                    Some(variant) => log::info!(
                        "  Bitstream: {} (qscale {}, {} half codes)",
                        variant.dialect(),
                        variant.quantization_scale(),
                        variant.half_code_count(),
                    ),
                    None => log::info!(
                        "  Bitstream: {}",
                        "unrecognized header".if_supports_color(Stdout, |t| t.yellow()),
                    ),
                }
            }
        }
        Classification::Rejected(reason) => {
            log::info!(
                "  {} Not an STR video sector: {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                reason,
            );
        }
    }

    Ok(())
}
