use std::io::Cursor;

use psxstr_core::edc::regenerate_mode2_form1;
use psxstr_core::header::{STR_HEADER_MARKER, VIDEO_SECTOR_MAGIC};
use psxstr_core::sector::{CD_SYNC_PATTERN, RAW_SECTOR_SIZE};
use psxstr_core::*;

fn video_sector(frame: i32, chunk: u16, chunks: u16, payload: &[u8], qscale: i16) -> Vec<u8> {
    let mut raw = vec![0u8; RAW_SECTOR_SIZE];
    raw[..12].copy_from_slice(&CD_SYNC_PATTERN);
    raw[15] = 0x02;
    let sub_header = [0x01, 0x00, SubMode::DATA | SubMode::REALTIME, 0x00];
    raw[16..20].copy_from_slice(&sub_header);
    raw[20..24].copy_from_slice(&sub_header);

    let h = &mut raw[24..56];
    h[0..4].copy_from_slice(&VIDEO_SECTOR_MAGIC.to_le_bytes());
    h[4..8].copy_from_slice(&frame.to_le_bytes());
    h[8..10].copy_from_slice(&chunk.to_le_bytes());
    h[10..12].copy_from_slice(&chunks.to_le_bytes());
    h[12..16].copy_from_slice(&(payload.len() as u32).to_le_bytes());
    h[16..18].copy_from_slice(&320i16.to_le_bytes());
    h[18..20].copy_from_slice(&224i16.to_le_bytes());
    h[20..22].copy_from_slice(&900u16.to_le_bytes());
    h[22..24].copy_from_slice(&STR_HEADER_MARKER.to_le_bytes());
    h[24..26].copy_from_slice(&qscale.to_le_bytes());
    h[26..28].copy_from_slice(&2u16.to_le_bytes());

    let start = chunk as usize * 2016;
    let piece = &payload[start.min(payload.len())..(start + 2016).min(payload.len())];
    raw[56..56 + piece.len()].copy_from_slice(piece);
    regenerate_mode2_form1(&mut raw);
    raw
}

fn audio_sector() -> Vec<u8> {
    let mut raw = vec![0u8; RAW_SECTOR_SIZE];
    raw[..12].copy_from_slice(&CD_SYNC_PATTERN);
    raw[15] = 0x02;
    let sub_header = [0x01, 0x01, SubMode::AUDIO | SubMode::FORM | SubMode::REALTIME, 0x04];
    raw[16..20].copy_from_slice(&sub_header);
    raw[20..24].copy_from_slice(&sub_header);
    raw
}

fn bitstream(version: i16, qscale: i16, len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    data[0..2].copy_from_slice(&450i16.to_le_bytes());
    data[2..4].copy_from_slice(&0x3800u16.to_le_bytes());
    data[4..6].copy_from_slice(&qscale.to_le_bytes());
    data[6..8].copy_from_slice(&version.to_le_bytes());
    for (i, b) in data[8..].iter_mut().enumerate() {
        *b = (i % 13) as u8;
    }
    data
}

/// Two 3-chunk frames with XA audio interleaved every third sector.
fn movie_image() -> (Vec<u8>, Vec<Vec<u8>>) {
    let payloads = vec![bitstream(2, 5, 5000), bitstream(2, 6, 4800)];
    let mut image = Vec::new();
    for (i, payload) in payloads.iter().enumerate() {
        let frame = i as i32 + 1;
        for chunk in 0..3 {
            image.extend(video_sector(frame, chunk, 3, payload, 5 + i as i16));
            if chunk == 1 {
                image.extend(audio_sector());
            }
        }
    }
    (image, payloads)
}

#[test]
fn scan_demux_replace_raw_image() {
    let (image, payloads) = movie_image();
    let mut disc = DiscImage::from_reader(Cursor::new(image)).unwrap();
    assert_eq!(disc.format(), DiscFormat::RawSector2352);
    assert_eq!(disc.sector_count(), 8);

    let report = scan(&mut disc, &ScanOptions::new().batch_size(3)).unwrap();
    assert_eq!(report.frames.len(), 2);
    assert_eq!(report.interleaved_sectors, 2);
    assert_eq!(report.frames[0].sectors, vec![0, 1, 3]);
    assert_eq!(report.frames[1].sectors, vec![4, 5, 7]);

    for (frame, payload) in report.frames.iter().zip(&payloads) {
        let demuxed = demux_frame(&mut disc, frame).unwrap();
        assert_eq!(&demuxed.bitstream, payload);
        assert_eq!(demuxed.dialect, Some(Dialect::StrV2));
    }

    let replacement = bitstream(3, 14, 3001);
    let patch = replace_frame(&mut disc, &report.frames[1], &replacement, 901).unwrap();
    assert_eq!(patch.used_demux_size, 3004);
    assert_eq!(patch.half_code_count, 451);
    assert_eq!(patch.quantization_scale, 14);

    let rescan = scan(&mut disc, &ScanOptions::new()).unwrap();
    assert_eq!(rescan.frames.len(), 2);
    assert_eq!(rescan.frames[0], report.frames[0]);
    let replaced = &rescan.frames[1];
    assert_eq!(replaced.used_demux_size, 3004);
    assert_eq!(replaced.quantization_scale, 14);

    let demuxed = demux_frame(&mut disc, replaced).unwrap();
    assert_eq!(&demuxed.bitstream[..3001], &replacement[..]);
    assert_eq!(&demuxed.bitstream[3001..], &[0u8; 3]);
    assert_eq!(demuxed.dialect, Some(Dialect::StrV3));

    for &index in &replaced.sectors {
        let sector = disc.read_sector(index).unwrap();
        assert!(edc::edc_matches_mode2_form1(sector.bytes()));
    }
}

#[test]
fn classifier_and_assembler_driven_by_hand() {
    let (image, _) = movie_image();
    let sectors: Vec<Sector> = image
        .chunks(RAW_SECTOR_SIZE)
        .enumerate()
        .map(|(i, raw)| Sector::from_raw(i as u32, raw.to_vec()))
        .collect();

    let classifier = SectorClassifier::new();
    let mut assembler = FrameAssembler::new();
    let mut frames = Vec::new();
    for sector in &sectors {
        match classifier.evaluate(&sector.view()) {
            Classification::Accepted(chunk) => frames.extend(assembler.push(Some(&chunk))),
            Classification::Rejected(Rejection::NotDataOrVideo { .. }) => assembler.pass_over(),
            Classification::Rejected(_) => {
                assembler.push(None);
            }
        }
    }
    assembler.finish();

    assert_eq!(frames.len(), 2);
    assert_eq!(assembler.passed_over(), 2);
    assert_eq!(assembler.abandoned_runs(), 0);
}

#[test]
fn oversized_replacement_is_refused() {
    let (image, _) = movie_image();
    let mut disc = DiscImage::from_reader(Cursor::new(image)).unwrap();
    let report = scan(&mut disc, &ScanOptions::new()).unwrap();

    let too_big = bitstream(2, 1, 3 * 2016 + 4);
    let err = replace_frame(&mut disc, &report.frames[0], &too_big, 10).unwrap_err();
    assert!(matches!(
        err,
        ReplaceError::Remux(RemuxError::PayloadTooLarge { .. })
    ));
    assert_eq!(scan(&mut disc, &ScanOptions::new()).unwrap().frames, report.frames);
}
