use super::*;
use crate::sector::{CD_SYNC_PATTERN, RAW_SECTOR_SIZE};

fn blank_form1() -> Vec<u8> {
    let mut raw = vec![0u8; RAW_SECTOR_SIZE];
    raw[..12].copy_from_slice(&CD_SYNC_PATTERN);
    raw[12..16].copy_from_slice(&[0x00, 0x02, 0x00, 0x02]);
    raw[18] = 0x08;
    raw[22] = 0x08;
    raw
}

#[test]
fn lookup_tables_are_inverse() {
    // ECC_B_LUT undoes "x ^ f(x)"
    for i in 0..256usize {
        let f = ECC_F_LUT[i] as usize;
        assert_eq!(ECC_B_LUT[i ^ f] as usize, i);
    }
    assert_eq!(ECC_F_LUT[0x80], 0x1D);
    assert_eq!(ECC_F_LUT[0x01], 0x02);
}

#[test]
fn regenerate_writes_matching_edc() {
    let mut raw = blank_form1();
    for (i, b) in raw[24..2072].iter_mut().enumerate() {
        *b = (i * 7) as u8;
    }
    regenerate_mode2_form1(&mut raw);

    assert!(edc_matches_mode2_form1(&raw));
    let stored = u32::from_le_bytes(raw[2072..2076].try_into().unwrap());
    assert_eq!(stored, CD_ROM_CRC.checksum(&raw[16..2072]));
}

#[test]
fn regenerate_preserves_address_bytes() {
    let mut raw = blank_form1();
    regenerate_mode2_form1(&mut raw);
    assert_eq!(&raw[12..16], &[0x00, 0x02, 0x00, 0x02]);
}

#[test]
fn ecc_ignores_address_bytes() {
    let mut a = blank_form1();
    let mut b = blank_form1();
    b[12..15].copy_from_slice(&[0x01, 0x23, 0x45]);
    regenerate_mode2_form1(&mut a);
    regenerate_mode2_form1(&mut b);
    assert_eq!(&a[2076..], &b[2076..]);
}

#[test]
fn ecc_changes_with_user_data() {
    let mut a = blank_form1();
    let mut b = blank_form1();
    b[500] = 0x5A;
    regenerate_mode2_form1(&mut a);
    regenerate_mode2_form1(&mut b);
    assert_ne!(&a[2076..2248], &b[2076..2248]);
    assert_ne!(&a[2248..], &b[2248..]);
}

#[test]
fn all_zero_payload_has_zero_parity() {
    // Reed-Solomon parity of an all-zero input is all zero
    let mut raw = vec![0u8; RAW_SECTOR_SIZE];
    regenerate_mode2_form1(&mut raw);
    assert!(raw[2076..].iter().all(|&b| b == 0));
}

#[test]
fn edc_mismatch_detected() {
    let mut raw = blank_form1();
    regenerate_mode2_form1(&mut raw);
    raw[30] ^= 1;
    assert!(!edc_matches_mode2_form1(&raw));
}

fn blank_mode1() -> Vec<u8> {
    let mut raw = vec![0u8; RAW_SECTOR_SIZE];
    raw[..12].copy_from_slice(&CD_SYNC_PATTERN);
    raw[12..16].copy_from_slice(&[0x00, 0x02, 0x00, 0x01]);
    raw
}

#[test]
fn mode1_edc_covers_sync_header_and_data() {
    let mut raw = blank_mode1();
    for (i, b) in raw[16..2064].iter_mut().enumerate() {
        *b = (i * 13) as u8;
    }
    raw[2068..2076].fill(0xFF);
    regenerate_mode1(&mut raw);

    assert!(edc_matches_mode1(&raw));
    let stored = u32::from_le_bytes(raw[2064..2068].try_into().unwrap());
    assert_eq!(stored, CD_ROM_CRC.checksum(&raw[..2064]));
    assert!(raw[2068..2076].iter().all(|&b| b == 0));

    raw[1000] ^= 0x40;
    assert!(!edc_matches_mode1(&raw));
}

#[test]
fn mode1_parity_covers_address_bytes() {
    let mut a = blank_mode1();
    let mut b = blank_mode1();
    b[12..15].copy_from_slice(&[0x01, 0x23, 0x45]);
    regenerate_mode1(&mut a);
    regenerate_mode1(&mut b);
    assert_ne!(&a[2076..], &b[2076..]);
    assert_eq!(&b[12..16], &[0x01, 0x23, 0x45, 0x01]);
}
