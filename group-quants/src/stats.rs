use crate::GroupStats;
use half::f16;

/// Folds per-lane partial accumulators in lane order, then converges the
/// lane pair. One call per group; every lane's contribution must be in
/// `parts`. The fold order is fixed and max/min combine exactly, so
/// repeated runs produce identical statistics.
pub fn reduce<S: GroupStats>(parts: impl IntoIterator<Item = S>) -> S::Final {
    parts.into_iter().fold(S::default(), S::merge).finalize()
}

/// `f16` abs is a sign-bit clear.
#[inline]
fn habs(x: f16) -> f16 {
    f16::from_bits(x.to_bits() & 0x7fff)
}

#[inline]
fn hmax(a: f16, b: f16) -> f16 {
    if b > a {
        b
    } else {
        a
    }
}

#[inline]
fn hmin(a: f16, b: f16) -> f16 {
    if b < a {
        b
    } else {
        a
    }
}

/// Running maximum of absolute values, kept in paired half-precision
/// lanes until finalization.
///
/// An accumulator that never sees an element finalizes to `-inf`; groups
/// with no elements are not a supported input.
#[derive(Clone, Copy, Debug)]
pub struct AbsMax {
    cur_max: [f16; 2],
}

impl Default for AbsMax {
    #[inline]
    fn default() -> Self {
        Self {
            cur_max: [f16::NEG_INFINITY; 2],
        }
    }
}

impl GroupStats for AbsMax {
    type Final = f32;

    #[inline]
    fn update(&mut self, [a, b]: [f16; 2]) {
        let [x, y] = self.cur_max;
        self.cur_max = [hmax(x, habs(a)), hmax(y, habs(b))];
    }

    #[inline]
    fn merge(self, other: Self) -> Self {
        let [a, b] = self.cur_max;
        let [x, y] = other.cur_max;
        Self {
            cur_max: [hmax(a, x), hmax(b, y)],
        }
    }

    #[inline]
    fn finalize(self) -> f32 {
        let [a, b] = self.cur_max;
        a.to_f32().max(b.to_f32())
    }
}

/// Running minimum and maximum, for true range analysis.
#[derive(Clone, Copy, Debug)]
pub struct MinMax {
    cur_max: [f16; 2],
    cur_min: [f16; 2],
}

impl Default for MinMax {
    #[inline]
    fn default() -> Self {
        Self {
            cur_max: [f16::NEG_INFINITY; 2],
            cur_min: [f16::INFINITY; 2],
        }
    }
}

impl GroupStats for MinMax {
    /// `(min, max)` across the whole group.
    type Final = (f32, f32);

    #[inline]
    fn update(&mut self, [a, b]: [f16; 2]) {
        let [x, y] = self.cur_max;
        self.cur_max = [hmax(x, a), hmax(y, b)];
        let [x, y] = self.cur_min;
        self.cur_min = [hmin(x, a), hmin(y, b)];
    }

    #[inline]
    fn merge(self, other: Self) -> Self {
        let [a, b] = self.cur_max;
        let [x, y] = other.cur_max;
        let cur_max = [hmax(a, x), hmax(b, y)];
        let [a, b] = self.cur_min;
        let [x, y] = other.cur_min;
        let cur_min = [hmin(a, x), hmin(b, y)];
        Self { cur_max, cur_min }
    }

    #[inline]
    fn finalize(self) -> (f32, f32) {
        let [a, b] = self.cur_min;
        let [x, y] = self.cur_max;
        (a.to_f32().min(b.to_f32()), x.to_f32().max(y.to_f32()))
    }
}

#[test]
fn test_absmax() {
    let mut stats = AbsMax::default();
    for pair in [[1.0f32, -2.0], [0.5, -0.25]] {
        stats.update(pair.map(f16::from_f32));
    }
    assert_eq!(stats.finalize(), 2.0);
}

#[test]
fn test_minmax() {
    let mut stats = MinMax::default();
    for pair in [[0.0f32, 4.0], [-1.5, 2.0]] {
        stats.update(pair.map(f16::from_f32));
    }
    assert_eq!(stats.finalize(), (-1.5, 4.0));
}

#[test]
fn test_reduce_matches_serial() {
    let data: Vec<f16> = (0..64)
        .map(|i| f16::from_f32((i as f32 - 31.5) * 0.1))
        .collect();

    let mut serial = MinMax::default();
    for pair in data.chunks_exact(2) {
        serial.update([pair[0], pair[1]]);
    }

    let lanes = data.chunks_exact(16).map(|span| {
        let mut acc = MinMax::default();
        for pair in span.chunks_exact(2) {
            acc.update([pair[0], pair[1]]);
        }
        acc
    });

    assert_eq!(reduce(lanes), serial.finalize());
}
