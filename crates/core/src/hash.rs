//! Mixing hash used by generated key hashers.
//!
//! The accumulator follows the murmur3 32-bit block/finalize structure. Values
//! never leave the process, so only determinism within a run matters.

/// Initial accumulator value.
pub const SEED: u32 = 0xcafe_babe;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// Mixes one 32-bit block into the running accumulator.
#[inline]
pub fn mix(acc: u32, block: u32) -> u32 {
    let k = block.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
    (acc ^ k)
        .rotate_left(13)
        .wrapping_mul(5)
        .wrapping_add(0xe654_6b64)
}

/// Final avalanche over the number of mixed blocks.
#[inline]
pub fn finish(acc: u32, count: u32) -> u32 {
    let mut h = acc ^ count;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}

/// Hashes a byte string with the same block structure.
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut acc = SEED;
    let mut chunks = bytes.chunks_exact(4);
    for chunk in &mut chunks {
        acc = mix(acc, u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut buf = [0u8; 4];
        buf[..tail.len()].copy_from_slice(tail);
        acc = mix(acc, u32::from_le_bytes(buf));
    }
    finish(acc, bytes.len() as u32)
}

/// Folds a 64-bit value into 32 bits.
#[inline]
pub fn fold64(v: u64) -> u32 {
    (v ^ (v >> 32)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(hash_bytes(b"warehouse"), hash_bytes(b"warehouse"));
        assert_eq!(finish(mix(SEED, 7), 1), finish(mix(SEED, 7), 1));
    }

    #[test]
    fn test_order_sensitive() {
        let ab = finish(mix(mix(SEED, 1), 2), 2);
        let ba = finish(mix(mix(SEED, 2), 1), 2);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_tail_bytes_matter() {
        assert_ne!(hash_bytes(b"abcd"), hash_bytes(b"abcde"));
        assert_ne!(hash_bytes(b"abcde"), hash_bytes(b"abcdf"));
        assert_ne!(hash_bytes(b""), hash_bytes(b"\0"));
    }

    #[test]
    fn test_fold64() {
        assert_eq!(fold64(0), 0);
        assert_eq!(fold64(1 << 32), 1);
        assert_eq!(fold64(5), 5);
    }
}
