use super::*;

fn frame(frame_number: i32, first: u32) -> Frame {
    Frame {
        frame_number,
        chunks_in_frame: 2,
        sectors: vec![first, first + 1],
        width: 320,
        height: 240,
        version: 2,
        used_demux_size: 3000,
        run_length_code_count: 700,
        quantization_scale: 3,
        probability: 100,
    }
}

#[test]
fn finds_unique_frame() {
    let frames = vec![frame(1, 0), frame(2, 10)];
    assert_eq!(find_frame(&frames, 2, None).unwrap().first_sector(), 10);
}

#[test]
fn missing_frame_is_an_error() {
    let frames = vec![frame(1, 0)];
    assert!(matches!(
        find_frame(&frames, 7, None),
        Err(CliError::FrameNotFound(_))
    ));
}

#[test]
fn repeated_frame_needs_first_sector() {
    let frames = vec![frame(1, 0), frame(1, 500)];
    assert!(matches!(
        find_frame(&frames, 1, None),
        Err(CliError::Other(_))
    ));
    assert_eq!(find_frame(&frames, 1, Some(500)).unwrap().sectors, vec![500, 501]);
}

#[test]
fn code_count_read_from_bitstream_header() {
    let mut bitstream = vec![0u8; 16];
    bitstream[0..2].copy_from_slice(&321i16.to_le_bytes());
    bitstream[2..4].copy_from_slice(&0x3800u16.to_le_bytes());
    bitstream[4..6].copy_from_slice(&2i16.to_le_bytes());
    bitstream[6..8].copy_from_slice(&3i16.to_le_bytes());
    assert_eq!(code_count_from_header(&bitstream).unwrap(), 642);
}

#[test]
fn unrecognized_bitstream_has_no_code_count() {
    assert!(matches!(
        code_count_from_header(&[0u8; 16]),
        Err(CliError::Remux(RemuxError::IncompatibleFormat { .. }))
    ));
}
