//! CRC32 helpers for DMG checksum maintenance.
//!
//! UDIF images carry IEEE CRC32 checksums (reflected polynomial
//! 0xedb88320) over regions we only partially rewrite. `crc32_combine`
//! implements zlib's GF(2) matrix method so the checksum of
//! `concat(A, B)` can be derived from `crc(A)`, `crc(B)` and `len(B)`
//! without re-reading A.

/// Reflected IEEE polynomial, as used by zlib and UDIF.
pub const CRC32_POLYNOMIAL: u32 = 0xedb8_8320;

/// CRC32 (IEEE) of a byte slice.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn gf2_matrix_times(mat: &[u32; 32], mut vec: u32) -> u32 {
    let mut sum = 0;
    let mut i = 0;
    while vec != 0 {
        if vec & 1 != 0 {
            sum ^= mat[i];
        }
        vec >>= 1;
        i += 1;
    }
    sum
}

fn gf2_matrix_square(square: &mut [u32; 32], mat: &[u32; 32]) {
    for n in 0..32 {
        square[n] = gf2_matrix_times(mat, mat[n]);
    }
}

/// Combine `crc1 = crc(A)` and `crc2 = crc(B)` into `crc(A ++ B)`, where
/// `len2` is the length of B in bytes.
#[must_use]
pub fn crc32_combine(mut crc1: u32, crc2: u32, mut len2: u64) -> u32 {
    if len2 == 0 {
        return crc1;
    }

    let mut even = [0u32; 32]; // even-power-of-two zero operators
    let mut odd = [0u32; 32]; // odd-power-of-two zero operators

    // operator for one zero bit
    odd[0] = CRC32_POLYNOMIAL;
    let mut row: u32 = 1;
    for cell in odd.iter_mut().skip(1) {
        *cell = row;
        row <<= 1;
    }

    // operator for two zero bits, then four
    gf2_matrix_square(&mut even, &odd);
    gf2_matrix_square(&mut odd, &even);

    // apply len2 zeros to crc1, squaring the operator each pass
    loop {
        gf2_matrix_square(&mut even, &odd);
        if len2 & 1 != 0 {
            crc1 = gf2_matrix_times(&even, crc1);
        }
        len2 >>= 1;
        if len2 == 0 {
            break;
        }

        gf2_matrix_square(&mut odd, &even);
        if len2 & 1 != 0 {
            crc1 = gf2_matrix_times(&odd, crc1);
        }
        len2 >>= 1;
        if len2 == 0 {
            break;
        }
    }

    crc1 ^ crc2
}
