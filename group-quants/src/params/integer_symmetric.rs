use crate::{AbsMax, QuantParams};
use half::f16;

/// Symmetric map whose scale is itself an integer, for value domains
/// that are already integral.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntegerSymmetric<const BITS: u32> {
    scale: i32,
}

impl<const BITS: u32> QuantParams for IntegerSymmetric<BITS> {
    type Stats = AbsMax;

    const BITS: u32 = BITS;
    const RECORD_STRIDE: usize = 1;

    fn from_stats(max: f32) -> Self {
        const { assert!(BITS == 4 || BITS == 8) }

        Self {
            scale: (max + 0.5).round() as i32,
        }
    }

    /// Multiplies by `Q_MAX`, divides by the integer scale, truncates.
    /// No clamp: inputs must stay within the range the integer scale
    /// bounds, or the code wraps.
    #[inline]
    fn quantize(&self, val: f16) -> i8 {
        let val = val.to_f32() * Self::Q_MAX as f32;
        (val / self.scale as f32) as i32 as i8
    }

    /// The record slot carries the integer's bit pattern, not a float
    /// cast.
    #[inline]
    fn store(&self, record: &mut [f32]) {
        record[0] = f32::from_bits(self.scale as u32);
    }

    #[inline]
    fn dequantize(record: &[f32], code: i8) -> f32 {
        let scale = record[0].to_bits() as i32;
        code as f32 * scale as f32 / Self::Q_MAX as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q8() {
        let params = IntegerSymmetric::<8>::from_stats(3.2);
        assert_eq!(params, IntegerSymmetric { scale: 4 });

        // 3.0 * 127 / 4 = 95.25, truncated
        assert_eq!(params.quantize(f16::from_f32(3.0)), 95);
        assert_eq!(params.quantize(f16::from_f32(-3.0)), -95);
        assert_eq!(params.quantize(f16::ZERO), 0);
    }

    #[test]
    fn test_record_bit_pattern() {
        let params = IntegerSymmetric::<8>::from_stats(6.7);
        let mut record = [0.];
        params.store(&mut record);
        assert_eq!(record[0].to_bits(), 7);
        assert_eq!(
            IntegerSymmetric::<8>::dequantize(&record, 127),
            7.0 * 127.0 / 127.0
        );
    }

    #[test]
    fn test_zero_group() {
        let params = IntegerSymmetric::<8>::from_stats(0.0);
        assert_eq!(params, IntegerSymmetric { scale: 1 });
        assert_eq!(params.quantize(f16::ZERO), 0);
    }

    #[test]
    fn test_unclamped_overflow_wraps() {
        // An input beyond the integer scale's range is not clamped:
        // 5.0 * 127 / 4 = 158.75 truncates to 158, which wraps to -98
        // as an i8. Pinned down here rather than silently "fixed".
        let params = IntegerSymmetric::<8>::from_stats(3.5);
        assert_eq!(params.quantize(f16::from_f32(5.0)), -98);
    }

    #[test]
    fn test_roundtrip_integral() {
        let params = IntegerSymmetric::<8>::from_stats(4.0);
        let mut record = [0.];
        params.store(&mut record);

        // truncation costs up to one full step
        let step = 5.0 / 127.0;
        for i in -5..=5 {
            let x = f16::from_f32(i as f32);
            let deq = IntegerSymmetric::<8>::dequantize(&record, params.quantize(x));
            assert!(
                (deq - i as f32).abs() <= step + 1e-6,
                "{i} vs {deq}"
            );
        }
    }
}
