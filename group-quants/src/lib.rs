//! Per-group quantization of half-precision values into packed 4- or
//! 8-bit signed codes, with one parameter record per group.

mod chunk;
mod params;
mod stats;
mod tile;

pub use chunk::{bytes_per_chunk, GRANULARITY, H_PER_CHUNK};
pub use params::{Asymmetric, IntegerSymmetric, Symmetric};
pub use stats::{reduce, AbsMax, MinMax};
pub use tile::TileQuantizer;

pub use ::half::f16;

/// Running statistics over one quantization group.
///
/// Values are folded in as adjacent pairs, one pair per [`update`] call;
/// the accumulator keeps the two lanes separate until [`finalize`]. Both
/// `update` and [`merge`] are commutative and associative, so any
/// partition of a group across accumulators converges to the same
/// statistics.
///
/// The lifecycle has exactly two phases: accumulating (this type) and
/// finalized ([`Final`]). `finalize` consumes the accumulator, so partial
/// state cannot be observed after the reduction and the reduction cannot
/// run twice.
///
/// [`update`]: GroupStats::update
/// [`merge`]: GroupStats::merge
/// [`finalize`]: GroupStats::finalize
/// [`Final`]: GroupStats::Final
pub trait GroupStats: Copy + Default + Send {
    /// Scalar statistics with the accumulator lanes converged.
    type Final: Copy;

    /// Folds a pair of adjacent values into the running accumulator.
    fn update(&mut self, pair: [f16; 2]);

    /// Combines two partial accumulators.
    fn merge(self, other: Self) -> Self;

    /// Converges the paired lanes into scalar statistics, consuming the
    /// accumulator.
    fn finalize(self) -> Self::Final;
}

/// Per-group quantization parameters: the affine map from the float
/// domain into the `BITS`-wide signed integer domain.
///
/// Derived exactly once per group from finalized statistics; immutable
/// afterwards.
pub trait QuantParams: Copy + Send + Sync {
    /// Statistics this mode derives its parameters from.
    type Stats: GroupStats;

    /// Quantized width. 4 or 8.
    const BITS: u32;
    /// f32 slots one group record occupies in the parameter buffer.
    const RECORD_STRIDE: usize;

    const Q_MIN: i32 = -(1 << (Self::BITS - 1));
    const Q_MAX: i32 = (1 << (Self::BITS - 1)) - 1;

    /// Derives the affine map from finalized group statistics.
    fn from_stats(stats: <Self::Stats as GroupStats>::Final) -> Self;

    /// Maps one value into the integer domain.
    fn quantize(&self, val: f16) -> i8;

    /// Serializes this group's record into its `RECORD_STRIDE`-wide slot
    /// of the parameter buffer. Must execute exactly once per group.
    fn store(&self, record: &mut [f32]);

    /// Recovers an approximate value from a stored record and one code.
    /// Scales are stored inverted, so recovery multiplies.
    fn dequantize(record: &[f32], code: i8) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantizeError {
    Indivisible,
    LengthMismatch,
}

#[cfg(test)]
mod test_utils;
