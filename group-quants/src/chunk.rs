use crate::QuantParams;
use half::f16;
use std::iter::zip;

/// Bytes of input one packing call covers.
pub const GRANULARITY: usize = 16;
/// Half-precision elements per chunk.
pub const H_PER_CHUNK: usize = GRANULARITY / size_of::<f16>();

/// Output bytes one packed chunk occupies.
#[inline]
pub const fn bytes_per_chunk(bits: u32) -> usize {
    H_PER_CHUNK * bits as usize / 8
}

/// Packs one chunk. 8-bit: one code per byte. 4-bit: two codes per byte,
/// the second element of each pair in the high nibble.
pub(crate) fn pack_chunk<P: QuantParams>(out: &mut [u8], data: &[f16], params: &P) {
    const { assert!(P::BITS == 4 || P::BITS == 8) }
    debug_assert_eq!(data.len(), H_PER_CHUNK);
    debug_assert_eq!(out.len(), bytes_per_chunk(P::BITS));

    match P::BITS {
        8 => {
            for (y, &x) in zip(out, data) {
                *y = params.quantize(x) as u8;
            }
        }
        4 => {
            for (y, x) in zip(out, data.chunks_exact(2)) {
                let lo = params.quantize(x[0]) as u8 & 0xf;
                let hi = params.quantize(x[1]) as u8 & 0xf;
                *y = hi << 4 | lo;
            }
        }
        _ => unreachable!(),
    }
}

/// Expands one packed chunk back through a stored group record. Nibbles
/// are sign-extended.
pub(crate) fn unpack_chunk<P: QuantParams>(out: &mut [f16], data: &[u8], record: &[f32]) {
    const { assert!(P::BITS == 4 || P::BITS == 8) }
    debug_assert_eq!(out.len(), H_PER_CHUNK);
    debug_assert_eq!(data.len(), bytes_per_chunk(P::BITS));

    match P::BITS {
        8 => {
            for (y, &x) in zip(out, data) {
                *y = f16::from_f32(P::dequantize(record, x as i8));
            }
        }
        4 => {
            for (y, &x) in zip(out.chunks_exact_mut(2), data) {
                y[0] = f16::from_f32(P::dequantize(record, (x << 4) as i8 >> 4));
                y[1] = f16::from_f32(P::dequantize(record, (x as i8) >> 4));
            }
        }
        _ => unreachable!(),
    }
}
