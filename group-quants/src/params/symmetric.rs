use crate::{AbsMax, QuantParams};
use half::f16;

/// Centered affine map over `[-max_abs, max_abs]`; the zero point is
/// implicit.
#[derive(Clone, Copy, Debug)]
pub struct Symmetric<const BITS: u32> {
    scale: f32,
}

impl<const BITS: u32> QuantParams for Symmetric<BITS> {
    type Stats = AbsMax;

    const BITS: u32 = BITS;
    const RECORD_STRIDE: usize = 1;

    fn from_stats(max: f32) -> Self {
        const { assert!(BITS == 4 || BITS == 8) }

        let scale = if max == 0. {
            // all-zero group: every value quantizes to 0
            1.
        } else {
            (1 << BITS) as f32 / (2. * max)
        };
        Self { scale }
    }

    #[inline]
    fn quantize(&self, val: f16) -> i8 {
        let q = (val.to_f32() * self.scale).round() as i32;
        q.clamp(Self::Q_MIN, Self::Q_MAX) as i8
    }

    #[inline]
    fn store(&self, record: &mut [f32]) {
        record[0] = self.scale.recip();
    }

    #[inline]
    fn dequantize(record: &[f32], code: i8) -> f32 {
        code as f32 * record[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GroupStats;

    fn stats_of(data: &[f32]) -> f32 {
        let mut stats = AbsMax::default();
        for pair in data.chunks_exact(2) {
            stats.update([f16::from_f32(pair[0]), f16::from_f32(pair[1])]);
        }
        stats.finalize()
    }

    #[test]
    fn test_q8() {
        let params = Symmetric::<8>::from_stats(stats_of(&[1.0, -2.0, 0.5, -0.25]));

        let codes: Vec<i8> = [1.0f32, -2.0, 0.5, -0.25]
            .map(f16::from_f32)
            .iter()
            .map(|&x| params.quantize(x))
            .collect();
        assert_eq!(codes, [64, -128, 32, -16]);

        let mut record = [0.];
        params.store(&mut record);
        assert_eq!(record, [0.015625]);
    }

    #[test]
    fn test_clamp() {
        // scale derived from 2.0, then a value outside the observed range
        let params = Symmetric::<8>::from_stats(2.0);
        assert_eq!(params.quantize(f16::from_f32(3.0)), 127);
        assert_eq!(params.quantize(f16::from_f32(-3.0)), -128);
    }

    #[test]
    fn test_zero_group() {
        let params = Symmetric::<8>::from_stats(0.0);
        let mut record = [f32::NAN];
        params.store(&mut record);
        assert_eq!(record, [1.0]);
        assert_eq!(params.quantize(f16::ZERO), 0);
    }

    #[test]
    fn test_q4_range() {
        let params = Symmetric::<4>::from_stats(2.0);
        assert_eq!(params.quantize(f16::from_f32(2.0)), 7);
        assert_eq!(params.quantize(f16::from_f32(-2.0)), -8);
        assert_eq!(params.quantize(f16::from_f32(0.5)), 2);
    }

    #[test]
    fn test_roundtrip() {
        use crate::test_utils::{Diff, ErrorCollector};
        use rand::Rng;

        let mut data = [0.0f32; 64];
        rand::thread_rng().fill(&mut data[..]);

        let params = Symmetric::<8>::from_stats(stats_of(&data));
        let mut record = [0.];
        params.store(&mut record);

        // half a step of rounding; a full step at the clamped positive
        // extreme, since the integer domain tops out one code short
        let step = record[0];
        let mut ec = ErrorCollector::new(step + 1e-3, 0.);
        for &x in &data {
            let x = f16::from_f32(x);
            let deq = Symmetric::<8>::dequantize(&record, params.quantize(x));
            ec.push(Diff::new(x.to_f32(), deq));
        }
        println!("{ec}");

        for &i in ec.outliers() {
            let x = f16::from_f32(data[i]);
            println!(
                "{} vs {}",
                data[i],
                Symmetric::<8>::dequantize(&record, params.quantize(x))
            );
        }
        assert!(ec.outliers().is_empty());
    }
}
