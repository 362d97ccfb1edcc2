use super::*;
use crate::sector::{Sector, SubHeader};
use crate::test_support::{TestHeader, raw_form1};

fn evaluate(fields: TestHeader) -> Classification {
    let sector = fields.iso_sector(0);
    SectorClassifier::new().evaluate(&sector.view())
}

fn rejection(fields: TestHeader) -> Rejection {
    match evaluate(fields) {
        Classification::Rejected(r) => r,
        Classification::Accepted(s) => panic!("accepted: {s}"),
    }
}

#[test]
fn accepts_standard_sector() {
    let sector = TestHeader::default().chunk(2).iso_sector(17);
    let classified = SectorClassifier::new().classify(&sector.view()).unwrap();
    assert_eq!(classified.sector_index, 17);
    assert_eq!(classified.probability, MAX_PROBABILITY);
    assert_eq!(classified.header.frame_number(), 100);
    assert_eq!(classified.header.chunk_number(), 2);
    assert_eq!(classified.header.width, 320);
}

#[test]
fn missing_magic_is_rejected() {
    let fields = TestHeader {
        magic: 0x0000_0160,
        ..TestHeader::default()
    };
    assert_eq!(rejection(fields), Rejection::Magic { found: 0x0000_0160 });
}

#[test]
fn all_zero_sector_is_rejected() {
    let sector = Sector::from_iso(0, vec![0; 2048]);
    assert!(SectorClassifier::new().classify(&sector.view()).is_none());
}

#[test]
fn short_sector_is_rejected() {
    let data = TestHeader::default().bytes();
    let view = SectorView::new(0, &data[..31], None);
    assert_eq!(
        SectorClassifier::new().evaluate(&view),
        Classification::Rejected(Rejection::TooSmall { len: 31 })
    );
}

#[test]
fn wrong_marker_is_rejected() {
    let fields = TestHeader {
        marker: 0x3801,
        ..TestHeader::default()
    };
    assert_eq!(rejection(fields), Rejection::Marker { found: 0x3801 });
}

#[test]
fn chunk_number_at_count_is_rejected() {
    let fields = TestHeader::default().chunk(5);
    assert_eq!(
        rejection(fields),
        Rejection::ChunkNumber {
            chunk: 5,
            chunks: 5
        }
    );
}

#[test]
fn zero_chunks_rejected_by_chunk_number_first() {
    // chunk 0 of 0 already fails "chunk < chunks"
    let fields = TestHeader {
        chunks: 0,
        ..TestHeader::default()
    };
    assert!(matches!(rejection(fields), Rejection::ChunkNumber { .. }));
}

#[test]
fn oversized_demux_size_is_rejected() {
    let fields = TestHeader {
        chunks: 1,
        used_size: 2017,
        ..TestHeader::default()
    };
    assert_eq!(rejection(fields), Rejection::UsedDemuxSize { size: 2017 });
}

#[test]
fn non_positive_dimensions_are_rejected() {
    let fields = TestHeader {
        width: 0,
        ..TestHeader::default()
    };
    assert_eq!(rejection(fields), Rejection::Width { width: 0 });

    let fields = TestHeader {
        height: -16,
        ..TestHeader::default()
    };
    assert_eq!(rejection(fields), Rejection::Height { height: -16 });
}

#[test]
fn zero_run_length_code_count_is_rejected() {
    let fields = TestHeader {
        rlc: 0,
        ..TestHeader::default()
    };
    assert_eq!(rejection(fields), Rejection::RunLengthCodeCount { count: 0 });
}

#[test]
fn zero_quantization_scale_is_rejected() {
    let fields = TestHeader {
        qscale: 0,
        ..TestHeader::default()
    };
    assert_eq!(rejection(fields), Rejection::QuantizationScale { scale: 0 });
}

#[test]
fn versions_outside_one_to_three_are_rejected() {
    for version in [0u16, 4, 0xFFFF] {
        let fields = TestHeader {
            version,
            ..TestHeader::default()
        };
        assert_eq!(rejection(fields), Rejection::Version { version });
    }
}

#[test]
fn frame_number_zero_depends_on_rule() {
    let sector = TestHeader {
        frame: 0,
        ..TestHeader::default()
    }
    .iso_sector(0);
    let view = sector.view();

    assert!(SectorClassifier::new().classify(&view).is_some());
    let strict = SectorClassifier::new().frame_number_rule(FrameNumberRule::Strict);
    assert_eq!(strict.rule(), FrameNumberRule::Strict);
    assert_eq!(
        strict.evaluate(&view),
        Classification::Rejected(Rejection::FrameNumber { frame: 0 })
    );
}

#[test]
fn reserved_field_lowers_score() {
    let fields = TestHeader {
        reserved: 1,
        ..TestHeader::default()
    };
    assert_eq!(evaluate(fields).accepted().unwrap().probability, 90);
}

#[test]
fn version_one_lowers_score_further() {
    let v1 = TestHeader {
        version: 1,
        ..TestHeader::default()
    };
    assert_eq!(evaluate(v1).accepted().unwrap().probability, 95);

    let both = TestHeader {
        version: 1,
        reserved: 0xFFFF_FFFF,
        ..TestHeader::default()
    };
    assert_eq!(evaluate(both).accepted().unwrap().probability, 85);
}

#[test]
fn score_is_deterministic_and_bounded() {
    for version in 1..=3u16 {
        for reserved in [0u32, 7] {
            let fields = TestHeader {
                version,
                reserved,
                ..TestHeader::default()
            };
            let first = evaluate(fields).accepted().unwrap().probability;
            let second = evaluate(fields).accepted().unwrap().probability;
            assert_eq!(first, second);
            assert!(first <= MAX_PROBABILITY);
        }
    }
}

#[test]
fn raw_data_sector_is_accepted() {
    let user = TestHeader::default().user_data(0);
    let sector = Sector::from_raw(4, raw_form1(&user, SubMode::DATA));
    assert!(SectorClassifier::new().evaluate(&sector.view()).is_accepted());

    let sector = Sector::from_raw(4, raw_form1(&user, SubMode::VIDEO | SubMode::REALTIME));
    assert!(SectorClassifier::new().evaluate(&sector.view()).is_accepted());
}

#[test]
fn raw_sector_without_data_or_video_flag_is_rejected() {
    let user = TestHeader::default().user_data(0);
    let sector = Sector::from_raw(0, raw_form1(&user, SubMode::AUDIO));
    assert_eq!(
        SectorClassifier::new().evaluate(&sector.view()),
        Classification::Rejected(Rejection::NotDataOrVideo {
            submode: SubMode::AUDIO
        })
    );
}

#[test]
fn form2_sub_header_is_rejected() {
    let data = TestHeader::default().user_data(0);
    let sub_header = SubHeader::parse(&[1, 0, SubMode::DATA | SubMode::FORM, 0]);
    let view = SectorView::new(0, &data, Some(sub_header));
    assert_eq!(
        SectorClassifier::new().evaluate(&view),
        Classification::Rejected(Rejection::Form2 {
            submode: SubMode::DATA | SubMode::FORM
        })
    );
}

#[test]
fn display_matches_listing_format() {
    let fields = TestHeader {
        reserved: 0xAB,
        ..TestHeader::default()
    };
    let classified = evaluate(fields.chunk(1)).accepted().unwrap();
    assert_eq!(
        classified.to_string(),
        "STR [Sector:0] frame:100 chunk:1/5 320x240 ver:2 \
         {demux frame size=9000 rlc=1500 qscale=4 ??=000000ab}"
    );
}

#[test]
fn rejection_messages() {
    assert_eq!(
        Rejection::Marker { found: 0x3801 }.to_string(),
        "marker 3801 is not 3800"
    );
    assert_eq!(
        Rejection::NotDataOrVideo { submode: 0x04 }.to_string(),
        "sub-mode AUDIO is neither DATA nor VIDEO"
    );
}
