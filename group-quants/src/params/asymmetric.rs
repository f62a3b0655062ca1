use crate::{MinMax, QuantParams};
use half::f16;

/// True affine range map over `[min, max]`; an explicit offset recenters
/// the integer domain.
#[derive(Clone, Copy, Debug)]
pub struct Asymmetric<const BITS: u32> {
    scale: f32,
    offset: f32,
}

impl<const BITS: u32> QuantParams for Asymmetric<BITS> {
    type Stats = MinMax;

    const BITS: u32 = BITS;
    const RECORD_STRIDE: usize = 2;

    fn from_stats((min, max): (f32, f32)) -> Self {
        const { assert!(BITS == 4 || BITS == 8) }

        let scale = if max == min {
            // constant group: every value lands on the recentered min
            1.
        } else {
            (1 << BITS) as f32 / (max - min)
        };
        Self {
            scale,
            offset: -((1 << (BITS - 1)) as f32) - min * scale,
        }
    }

    #[inline]
    fn quantize(&self, val: f16) -> i8 {
        let q = (val.to_f32() * self.scale + self.offset).round() as i32;
        q.clamp(Self::Q_MIN, Self::Q_MAX) as i8
    }

    #[inline]
    fn store(&self, record: &mut [f32]) {
        record[0] = self.scale.recip();
        record[1] = self.offset;
    }

    #[inline]
    fn dequantize(record: &[f32], code: i8) -> f32 {
        (code as f32 - record[1]) * record[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q8() {
        let params = Asymmetric::<8>::from_stats((0.0, 4.0));

        assert_eq!(params.quantize(f16::ZERO), -128);
        // 4.0 * 64 - 128 = 128, clamped into the domain
        assert_eq!(params.quantize(f16::from_f32(4.0)), 127);
        assert_eq!(params.quantize(f16::from_f32(2.0)), 0);

        let mut record = [0.; 2];
        params.store(&mut record);
        assert_eq!(record, [0.015625, -128.0]);
    }

    #[test]
    fn test_constant_group() {
        let params = Asymmetric::<8>::from_stats((1.5, 1.5));
        let mut record = [0.; 2];
        params.store(&mut record);
        assert_eq!(record[0], 1.0);
        assert_eq!(params.quantize(f16::from_f32(1.5)), -128);
    }

    #[test]
    fn test_q4() {
        let params = Asymmetric::<4>::from_stats((-1.0, 1.0));
        assert_eq!(params.quantize(f16::from_f32(-1.0)), -8);
        assert_eq!(params.quantize(f16::from_f32(1.0)), 7);
    }

    #[test]
    fn test_roundtrip() {
        use crate::test_utils::{Diff, ErrorCollector};
        use rand::Rng;

        let mut data = [0.0f32; 64];
        rand::thread_rng().fill(&mut data[..]);
        for x in &mut data {
            *x = *x * 3.0 + 1.0;
        }

        let (min, max) = data
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), &x| {
                (min.min(x), max.max(x))
            });
        let params = Asymmetric::<8>::from_stats((min, max));
        let mut record = [0.; 2];
        params.store(&mut record);

        let step = record[0];
        let mut ec = ErrorCollector::new(step / 2. + 1e-2, 0.);
        for &x in &data {
            let x = f16::from_f32(x);
            let deq = Asymmetric::<8>::dequantize(&record, params.quantize(x));
            ec.push(Diff::new(x.to_f32(), deq));
        }
        println!("{ec}");
        assert!(ec.outliers().is_empty());
    }
}
