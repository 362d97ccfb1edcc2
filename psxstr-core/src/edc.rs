//! Error detection (EDC) and correction (ECC) codes for raw data sectors.
//!
//! Rewriting a frame's payload changes the user data of every chunk sector,
//! so the trailing EDC and the P/Q parity must be regenerated before the
//! sector goes back into a raw image. Mode 1 and Mode 2 Form 1 use the same
//! codes over different spans.

use std::ops::Range;

use crc::Crc;

const CD_ROM_CRC: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_CD_ROM_EDC);

/// Sub-header + user data, covered by the EDC in Form 1.
const MODE2_EDC_RANGE: Range<usize> = 16..2072;
const MODE2_EDC_LOCATION: Range<usize> = 2072..2076;

/// Sync, header and user data, covered by the EDC in Mode 1.
const MODE1_EDC_RANGE: Range<usize> = 0..2064;
const MODE1_EDC_LOCATION: Range<usize> = 2064..2068;
/// Reserved bytes between the Mode 1 EDC and the P parity, always zero.
const MODE1_RESERVED: Range<usize> = 2068..2076;

/// Sector header address bytes, treated as zero when computing Mode 2 ECC.
const ADDRESS_RANGE: Range<usize> = 12..16;

/// ECC input starts at the sector header.
const ECC_SOURCE_OFFSET: usize = 12;
const ECC_P_OFFSET: usize = 2076;
const ECC_Q_OFFSET: usize = 2248;

const ECC_F_LUT: [u8; 256] = build_f_lut();
const ECC_B_LUT: [u8; 256] = build_b_lut();

const fn build_f_lut() -> [u8; 256] {
    let mut lut = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let j = (i << 1) ^ if i & 0x80 != 0 { 0x11D } else { 0 };
        lut[i] = j as u8;
        i += 1;
    }
    lut
}

const fn build_b_lut() -> [u8; 256] {
    let f = build_f_lut();
    let mut lut = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        lut[i ^ f[i] as usize] = i as u8;
        i += 1;
    }
    lut
}

fn stored_edc(sector: &[u8], location: Range<usize>) -> u32 {
    let mut stored = [0u8; 4];
    stored.copy_from_slice(&sector[location]);
    u32::from_le_bytes(stored)
}

/// Compute the EDC of a raw Mode 2 Form 1 sector.
pub fn compute_edc_mode2_form1(sector: &[u8]) -> u32 {
    CD_ROM_CRC.checksum(&sector[MODE2_EDC_RANGE])
}

/// Whether the stored EDC of a raw Mode 2 Form 1 sector matches its contents.
pub fn edc_matches_mode2_form1(sector: &[u8]) -> bool {
    compute_edc_mode2_form1(sector) == stored_edc(sector, MODE2_EDC_LOCATION)
}

/// Compute the EDC of a raw Mode 1 sector.
pub fn compute_edc_mode1(sector: &[u8]) -> u32 {
    CD_ROM_CRC.checksum(&sector[MODE1_EDC_RANGE])
}

/// Whether the stored EDC of a raw Mode 1 sector matches its contents.
pub fn edc_matches_mode1(sector: &[u8]) -> bool {
    compute_edc_mode1(sector) == stored_edc(sector, MODE1_EDC_LOCATION)
}

/// Rewrite EDC, P parity and Q parity of a 2352-byte Mode 2 Form 1 sector.
///
/// # Panics
///
/// Panics if `sector` is shorter than 2352 bytes.
pub fn regenerate_mode2_form1(sector: &mut [u8]) {
    let edc = compute_edc_mode2_form1(sector);
    sector[MODE2_EDC_LOCATION].copy_from_slice(&edc.to_le_bytes());

    let mut address = [0u8; 4];
    address.copy_from_slice(&sector[ADDRESS_RANGE]);
    sector[ADDRESS_RANGE].fill(0);
    write_parity(sector);
    sector[ADDRESS_RANGE].copy_from_slice(&address);
}

/// Rewrite EDC, P parity and Q parity of a 2352-byte Mode 1 sector.
///
/// Mode 1 parity covers the address bytes as stored.
///
/// # Panics
///
/// Panics if `sector` is shorter than 2352 bytes.
pub fn regenerate_mode1(sector: &mut [u8]) {
    let edc = compute_edc_mode1(sector);
    sector[MODE1_EDC_LOCATION].copy_from_slice(&edc.to_le_bytes());
    sector[MODE1_RESERVED].fill(0);
    write_parity(sector);
}

fn write_parity(sector: &mut [u8]) {
    {
        let (src, dest) = sector.split_at_mut(ECC_P_OFFSET);
        compute_block(&src[ECC_SOURCE_OFFSET..], 86, 24, 2, 86, &mut dest[..172]);
    }
    let (src, dest) = sector.split_at_mut(ECC_Q_OFFSET);
    compute_block(&src[ECC_SOURCE_OFFSET..], 52, 43, 86, 88, &mut dest[..104]);
}

/// Reed-Solomon product code over one parity axis.
fn compute_block(
    src: &[u8],
    major_count: usize,
    minor_count: usize,
    major_mult: usize,
    minor_inc: usize,
    dest: &mut [u8],
) {
    let size = major_count * minor_count;
    for major in 0..major_count {
        let mut index = (major >> 1) * major_mult + (major & 1);
        let mut ecc_a = 0u8;
        let mut ecc_b = 0u8;
        for _ in 0..minor_count {
            let temp = src[index];
            index += minor_inc;
            if index >= size {
                index -= size;
            }
            ecc_a ^= temp;
            ecc_b ^= temp;
            ecc_a = ECC_F_LUT[ecc_a as usize];
        }
        ecc_a = ECC_B_LUT[(ECC_F_LUT[ecc_a as usize] ^ ecc_b) as usize];
        dest[major] = ecc_a;
        dest[major + major_count] = ecc_a ^ ecc_b;
    }
}

#[cfg(test)]
#[path = "tests/edc_tests.rs"]
mod tests;
