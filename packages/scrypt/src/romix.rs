//! scrypt ROMix over caller-owned buffers
//!
//! Blocks are handled as little-endian `u32` words: a 64-byte Salsa20 block
//! is 16 words and a `128 * r` byte scrypt block is `32 * r` words. Nothing in
//! this module allocates; all memory comes from the caller.

/// Words in one Salsa20 block
pub(crate) const SALSA_WORDS: usize = 16;

#[inline(always)]
fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[b] ^= x[a].wrapping_add(x[d]).rotate_left(7);
    x[c] ^= x[b].wrapping_add(x[a]).rotate_left(9);
    x[d] ^= x[c].wrapping_add(x[b]).rotate_left(13);
    x[a] ^= x[d].wrapping_add(x[c]).rotate_left(18);
}

/// Salsa20/8 core applied in place
pub(crate) fn salsa20_8(block: &mut [u32; 16]) {
    let mut x = *block;
    for _ in 0..4 {
        // columns
        quarter_round(&mut x, 0, 4, 8, 12);
        quarter_round(&mut x, 5, 9, 13, 1);
        quarter_round(&mut x, 10, 14, 2, 6);
        quarter_round(&mut x, 15, 3, 7, 11);
        // rows
        quarter_round(&mut x, 0, 1, 2, 3);
        quarter_round(&mut x, 5, 6, 7, 4);
        quarter_round(&mut x, 10, 11, 8, 9);
        quarter_round(&mut x, 15, 12, 13, 14);
    }
    for (word, mixed) in block.iter_mut().zip(x) {
        *word = word.wrapping_add(mixed);
    }
}

/// scryptBlockMix: `output = BlockMix(input)`, both `32 * r` words
///
/// Even-indexed Salsa outputs go to the first half of `output`, odd-indexed
/// ones to the second half.
pub(crate) fn block_mix(input: &[u32], output: &mut [u32]) {
    debug_assert_eq!(input.len(), output.len());
    let blocks = input.len() / SALSA_WORDS;
    let half = blocks / 2;

    let mut x = [0u32; SALSA_WORDS];
    x.copy_from_slice(&input[(blocks - 1) * SALSA_WORDS..]);

    for (i, chunk) in input.chunks_exact(SALSA_WORDS).enumerate() {
        for (xw, bw) in x.iter_mut().zip(chunk) {
            *xw ^= *bw;
        }
        salsa20_8(&mut x);

        let dest = if i % 2 == 0 { i / 2 } else { half + i / 2 };
        output[dest * SALSA_WORDS..(dest + 1) * SALSA_WORDS].copy_from_slice(&x);
    }
}

/// Last Salsa block's first 64 bits, reduced modulo `n` (a power of two)
fn integerify(x: &[u32], n: u64) -> usize {
    let tail = x.len() - SALSA_WORDS;
    let value = u64::from(x[tail]) | (u64::from(x[tail + 1]) << 32);
    // Fits: the result is below n, and the table of n blocks was addressable
    (value & (n - 1)) as usize
}

fn xor_into(dst: &mut [u32], src: &[u32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

fn load_le(bytes: &[u8], words: &mut [u32]) {
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

fn store_le(words: &[u32], bytes: &mut [u8]) {
    for (word, chunk) in words.iter().zip(bytes.chunks_exact_mut(4)) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

/// scryptROMix on one `128 * r` byte block, in place
///
/// - `table` holds `n * 32 * r` words (the `V` array)
/// - `scratch` holds `64 * r` words (`X` and `Y`)
///
/// `n` is a power of two greater than 1, so the two loops can alternate
/// between `X` and `Y` without copying.
pub(crate) fn ro_mix(block: &mut [u8], table: &mut [u32], scratch: &mut [u32], n: u64) {
    let words = block.len() / 4;
    debug_assert_eq!(scratch.len(), 2 * words);
    debug_assert_eq!(table.len() as u64, n * words as u64);

    let (x, y) = scratch.split_at_mut(words);
    load_le(block, x);

    for pair in table.chunks_exact_mut(2 * words) {
        let (v0, v1) = pair.split_at_mut(words);
        v0.copy_from_slice(x);
        block_mix(x, y);
        v1.copy_from_slice(y);
        block_mix(y, x);
    }

    for _ in 0..n / 2 {
        let j = integerify(x, n);
        xor_into(x, &table[j * words..(j + 1) * words]);
        block_mix(x, y);

        let j = integerify(y, n);
        xor_into(y, &table[j * words..(j + 1) * words]);
        block_mix(y, x);
    }

    store_le(x, block);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salsa20_8_of_zero_block_is_zero() {
        let mut block = [0u32; 16];
        salsa20_8(&mut block);
        assert_eq!(block, [0u32; 16]);
    }

    #[test]
    fn salsa20_8_mixes_every_word() {
        let mut block = [0u32; 16];
        block[0] = 1;
        salsa20_8(&mut block);
        assert!(block.iter().filter(|w| **w != 0).count() > 8);
    }

    #[test]
    fn block_mix_interleaves_halves() {
        // r = 2: four Salsa blocks
        let input: Vec<u32> = (0..64).collect();
        let mut output = vec![0u32; 64];
        block_mix(&input, &mut output);

        let mut x = [0u32; 16];
        x.copy_from_slice(&input[48..]);
        let mut expected = Vec::new();
        for chunk in input.chunks_exact(16) {
            for (xw, bw) in x.iter_mut().zip(chunk) {
                *xw ^= *bw;
            }
            salsa20_8(&mut x);
            expected.push(x);
        }
        assert_eq!(&output[0..16], &expected[0]);
        assert_eq!(&output[16..32], &expected[2]);
        assert_eq!(&output[32..48], &expected[1]);
        assert_eq!(&output[48..64], &expected[3]);
    }

    #[test]
    fn ro_mix_is_deterministic_and_changes_the_block() {
        let r = 1;
        let n = 16u64;
        let original: Vec<u8> = (0..128 * r).map(|i| i as u8).collect();

        let run = || {
            let mut block = original.clone();
            let mut table = vec![0u32; n as usize * 32 * r];
            let mut scratch = vec![0u32; 64 * r];
            ro_mix(&mut block, &mut table, &mut scratch, n);
            block
        };

        let first = run();
        assert_eq!(first, run());
        assert_ne!(first, original);
    }

    #[test]
    fn le_round_trip() {
        let bytes: Vec<u8> = (0..16).collect();
        let mut words = [0u32; 4];
        load_le(&bytes, &mut words);
        assert_eq!(words[0], 0x0302_0100);
        let mut back = [0u8; 16];
        store_le(&words, &mut back);
        assert_eq!(back.to_vec(), bytes);
    }
}
