//! 32-bit FNV-1a, used to derive object ids from object names.

const OFFSET_BASIS: u32 = 2_166_136_261;
const PRIME: u32 = 16_777_619;

/// Hash `name` with FNV-1a. Usable in const context.
pub const fn fnv1a_32(name: &str) -> u32 {
    let bytes = name.as_bytes();
    let mut hash = OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }
    hash
}
