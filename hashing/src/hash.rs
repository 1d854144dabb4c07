use crate::{HashError, Int128};

/// Bytes consumed per block.
pub const BLOCK_SIZE: usize = 128;

/// Bytes consumed per lane; a block holds eight lanes.
pub const LANE_SIZE: usize = 16;

const MAGIC_TABLE: [u64; 16] = [
    0x95c0_5f4d_1512_959e,
    0xe4f3_c46e_ef0d_cf07,
    0x6238_dc22_8f98_0ad2,
    0x53f3_e3bc_4960_7092,
    0x4e7b_e706_9078_d625,
    0x1016_d709_d1ad_25fc,
    0x044e_89b8_ac76_e045,
    0xe0b6_84dd_a364_bfa1,
    0x90c5_33b8_35e8_9e5f,
    0x3daf_462a_74fa_874f,
    0xfea5_4965_dd3e_f5a0,
    0x287a_5d7c_cb31_b970,
    0xae68_1046_8007_52f8,
    0x121c_2d6e_af66_ec6e,
    0xee8f_8ca7_e090_fb20,
    0xce1a_e25f_48fe_0a52,
];

const ROUND_MAGIC: Int128 = Int128::new(0x14c9_8366_0183_c0ae, 0x78f3_2468_cd48_d6de);
const FINAL_MAGIC: Int128 = Int128::new(0x5b7e_9e82_8a9b_8abd, 0xbdb3_1b10_864f_3f87);

const MASK_126: Int128 = Int128::new(u64::MAX, 0x3fff_ffff_ffff_ffff);
const MASK_127: Int128 = Int128::new(u64::MAX, 0x7fff_ffff_ffff_ffff);

const FOLD: u64 = 0x101;
const FINAL_LIMIT: u64 = 0xffff_ffff_ffff_fefe;
const LOW_32: u64 = 0xffff_ffff;

/// Hash a single block (or zero-padded tail) into the 126-bit lane sum.
pub fn hash_block(block: &[u8]) -> Result<Int128, HashError> {
    if block.len() > BLOCK_SIZE || block.len() % LANE_SIZE != 0 {
        return Err(HashError::UnalignedBlock { len: block.len() });
    }
    Ok(lane_sum(block))
}

fn read_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0, |word, byte| (word << 8) | u64::from(*byte))
}

fn lane_sum(block: &[u8]) -> Int128 {
    let mut sum = Int128::ZERO;
    for (lane, chunk) in block.chunks_exact(LANE_SIZE).enumerate() {
        let (a, b) = chunk.split_at(8);
        let (a, b) = (read_le(a), read_le(b));
        sum = sum
            + Int128::mul64(
                a.wrapping_add(MAGIC_TABLE[lane * 2]),
                b.wrapping_add(MAGIC_TABLE[lane * 2 + 1]),
            );
    }
    sum & MASK_126
}

/// `hash * mul + add` reduced modulo 2^127 - 1 (the high product terms are
/// doubled because 2^128 == 2 in that field).
fn mul_add(hash: Int128, mul: Int128, add: Int128) -> Int128 {
    let m0 = mul.lo & LOW_32;
    let m1 = mul.lo >> 32;
    let m2 = mul.hi & LOW_32;
    let m3 = mul.hi >> 32;

    let h0 = hash.lo & LOW_32;
    let h1 = hash.lo >> 32;
    let h2 = hash.hi & LOW_32;
    let h3 = hash.hi >> 32;

    let c0 = h0 * m0;
    let c1 = (h0 * m1).wrapping_add(h1 * m0);
    let c2 = (h0 * m2).wrapping_add(h1 * m1).wrapping_add(h2 * m0);
    let c3 = (h0 * m3)
        .wrapping_add(h1 * m2)
        .wrapping_add(h2 * m1)
        .wrapping_add(h3 * m0);
    let c4 = (h1 * m3).wrapping_add(h2 * m2).wrapping_add(h3 * m1);
    let c5 = (h2 * m3).wrapping_add(h3 * m2);
    let c6 = h3 * m3;

    let r2 = c2.wrapping_add(c6 << 1).wrapping_add(add.hi);
    let r3 = c3.wrapping_add(r2 >> 32);
    let r0 = c0
        .wrapping_add(c4 << 1)
        .wrapping_add(add.lo & LOW_32)
        .wrapping_add(r3 >> 31);
    let r1 = c1
        .wrapping_add(c5 << 1)
        .wrapping_add(add.lo >> 32)
        .wrapping_add(r0 >> 32);

    Int128::new(
        (r1 << 32) | (r0 & LOW_32),
        (((r3 & 0x7fff_ffff) << 32) | (r2 & LOW_32)).wrapping_add(r1 >> 32),
    )
}

/// `value + magic`, adding 0x101 back when the sum wraps.
fn add_folded(value: u64, magic: u64) -> u64 {
    let sum = value.wrapping_add(magic);
    if sum < value {
        sum.wrapping_add(FOLD)
    } else {
        sum
    }
}

fn finalize(hash: Int128, tail_len: usize) -> u64 {
    let mut hash = hash + Int128::new(0, tail_len as u64 * 8);
    if hash >= MASK_127 {
        hash = hash + Int128::from_u64(1);
    }
    let hash = hash & MASK_127;

    let x = hash.hi.wrapping_add(hash.lo >> 32);
    let x = hash
        .hi
        .wrapping_add(x.wrapping_add(x >> 32).wrapping_add(1) >> 32);
    let y = (x << 32).wrapping_add(hash.lo);

    let a = add_folded(x, FINAL_MAGIC.hi);
    let b = add_folded(y, FINAL_MAGIC.lo);

    let mut product = Int128::mul64(a, b);
    for _ in 0..2 {
        product = Int128::mul64(product.hi, FOLD) + Int128::from_u64(product.lo);
    }

    let mut result = product.lo;
    if product.hi != 0 {
        result = result.wrapping_add(FOLD);
    }
    if result > FINAL_LIMIT {
        result = result.wrapping_add(FOLD);
    }
    result
}

/// Hash an arbitrary-length buffer to 64 bits.
pub fn hash64(input: &[u8]) -> u64 {
    let full_blocks = input.len() / BLOCK_SIZE;
    let tail_len = input.len() % BLOCK_SIZE;

    // Tail is zero padded to a whole number of lanes.
    let mut padded = [0u8; BLOCK_SIZE];
    padded[..tail_len].copy_from_slice(&input[input.len() - tail_len..]);
    let tail = &padded[..tail_len.div_ceil(LANE_SIZE) * LANE_SIZE];

    let mut blocks = input[..full_blocks * BLOCK_SIZE].chunks_exact(BLOCK_SIZE);
    let mut hash = match blocks.next() {
        Some(first) => lane_sum(first),
        None => lane_sum(tail),
    } + ROUND_MAGIC;

    if full_blocks > 0 {
        for block in blocks {
            hash = mul_add(hash, ROUND_MAGIC, lane_sum(block));
        }
        if tail_len > 0 {
            hash = mul_add(hash, ROUND_MAGIC, lane_sum(tail));
        }
    }

    finalize(hash, tail_len)
}

/// Fold a 64-bit hash to 32 bits by XOR-ing its halves.
pub fn fold32(hash: u64) -> u32 {
    (hash as u32) ^ ((hash >> 32) as u32)
}

/// Hash an arbitrary-length buffer to 32 bits.
pub fn hash32(input: &[u8]) -> u32 {
    fold32(hash64(input))
}

fn salted(seed: &[u8], input: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(seed.len() + input.len());
    buffer.extend_from_slice(seed);
    buffer.extend_from_slice(input);
    buffer
}

/// [hash64] of `seed (4 bytes, big-endian) || input`.
pub fn hash64_salt32(input: &[u8], seed: u32) -> u64 {
    hash64(&salted(&seed.to_be_bytes(), input))
}

/// [hash64] of `seed (8 bytes, big-endian) || input`.
pub fn hash64_salt64(input: &[u8], seed: u64) -> u64 {
    hash64(&salted(&seed.to_be_bytes(), input))
}

/// [hash32] of `seed (4 bytes, big-endian) || input`.
pub fn hash32_salt32(input: &[u8], seed: u32) -> u32 {
    fold32(hash64_salt32(input, seed))
}
