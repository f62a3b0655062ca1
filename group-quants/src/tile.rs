use crate::{
    chunk::{bytes_per_chunk, pack_chunk, unpack_chunk, H_PER_CHUNK},
    reduce, GroupStats, QuantParams, QuantizeError,
};
use half::f16;
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};
use std::iter::zip;

/// Widest lane partition a tile is split into.
const MAX_LANES: usize = 32;

/// Per-group orchestration: lane-partitioned statistics, parameter
/// derivation and chunked packing over a padded tile.
///
/// A tile is `lanes * chunks_per_lane` chunks of [`H_PER_CHUNK`]
/// elements. The shape is fixed at construction and shared by every
/// group of an invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileQuantizer {
    lanes: usize,
    chunks_per_lane: usize,
}

impl TileQuantizer {
    pub const fn new(lanes: usize, chunks_per_lane: usize) -> Self {
        assert!(lanes > 0 && chunks_per_lane > 0);
        Self {
            lanes,
            chunks_per_lane,
        }
    }

    /// Smallest shape whose tile covers `count` elements.
    pub const fn covering(count: usize) -> Self {
        let chunks = count.div_ceil(H_PER_CHUNK);
        let chunks = if chunks == 0 { 1 } else { chunks };
        let lanes = if chunks < MAX_LANES { chunks } else { MAX_LANES };
        Self::new(lanes, chunks.div_ceil(lanes))
    }

    /// Elements one padded tile holds.
    #[inline]
    pub const fn tile_len(&self) -> usize {
        self.lanes * self.chunks_per_lane * H_PER_CHUNK
    }

    /// Bytes one tile's packed output occupies at the given width.
    #[inline]
    pub const fn tile_bytes(&self, bits: u32) -> usize {
        self.lanes * self.chunks_per_lane * bytes_per_chunk(bits)
    }

    /// Packing pass over one group, parameters already derived.
    ///
    /// `tile` must be `tile_len()` long and zero-filled beyond `count`;
    /// `codes` spans the padded tile, `record` is this group's slot.
    /// Writes the record once, then packs every chunk whose start offset
    /// lies below `count`, full-width. Chunks starting at or beyond
    /// `count` leave their output bytes untouched.
    pub fn quantize_with_params<P: QuantParams>(
        &self,
        tile: &[f16],
        count: usize,
        params: P,
        codes: &mut [u8],
        record: &mut [f32],
    ) {
        debug_assert_eq!(tile.len(), self.tile_len());
        debug_assert_eq!(codes.len(), self.tile_bytes(P::BITS));
        debug_assert_eq!(record.len(), P::RECORD_STRIDE);

        params.store(record);

        let chunks = zip(
            tile.chunks_exact(H_PER_CHUNK),
            codes.chunks_exact_mut(bytes_per_chunk(P::BITS)),
        );
        for (i, (data, out)) in chunks.enumerate() {
            if i * H_PER_CHUNK >= count {
                break;
            }
            pack_chunk(out, data, &params);
        }
    }

    /// Two-pass path over one group: builds statistics, derives
    /// parameters, then packs.
    ///
    /// One serial scan per lane over its contiguous span (chunks in
    /// index order), one merge-reduction across lanes, then the packing
    /// pass. The whole padded tile participates in the scan, so the
    /// padding must be zero-filled. Parameters may depend on any element
    /// of the group; the passes are never fused.
    pub fn quantize<P: QuantParams>(
        &self,
        tile: &[f16],
        count: usize,
        codes: &mut [u8],
        record: &mut [f32],
    ) {
        debug_assert_eq!(tile.len(), self.tile_len());

        let span = self.chunks_per_lane * H_PER_CHUNK;
        let stats = reduce(tile.chunks_exact(span).map(lane_scan::<P::Stats>));
        self.quantize_with_params(tile, count, P::from_stats(stats), codes, record);
    }

    /// Quantizes `src`, laid out as consecutive groups of `count`
    /// elements, into packed `codes` and per-group `records`.
    ///
    /// `codes` holds `tile_bytes` per group (padded to the chunk
    /// boundary); `records` holds `RECORD_STRIDE` floats per group.
    /// Groups are independent partitions and run in parallel; their
    /// output ranges never overlap.
    pub fn quantize_slice<P: QuantParams>(
        &self,
        src: &[f16],
        count: usize,
        codes: &mut [u8],
        records: &mut [f32],
    ) -> Result<(), QuantizeError> {
        if count == 0 || src.len() % count != 0 {
            return Err(QuantizeError::Indivisible);
        }
        let groups = src.len() / count;
        if count > self.tile_len()
            || codes.len() != groups * self.tile_bytes(P::BITS)
            || records.len() != groups * P::RECORD_STRIDE
        {
            return Err(QuantizeError::LengthMismatch);
        }

        src.par_chunks(count)
            .zip(codes.par_chunks_mut(self.tile_bytes(P::BITS)))
            .zip(records.par_chunks_mut(P::RECORD_STRIDE))
            .for_each(|((group, codes), record)| {
                if count == self.tile_len() {
                    self.quantize::<P>(group, count, codes, record);
                } else {
                    // stage short groups into a zero-filled padded tile
                    let mut tile = vec![f16::ZERO; self.tile_len()];
                    tile[..count].copy_from_slice(group);
                    self.quantize::<P>(&tile, count, codes, record);
                }
            });
        Ok(())
    }

    /// Inverse of [`quantize_slice`]: expands packed codes back to half
    /// precision through the stored records.
    ///
    /// [`quantize_slice`]: TileQuantizer::quantize_slice
    pub fn dequantize_slice<P: QuantParams>(
        &self,
        codes: &[u8],
        records: &[f32],
        count: usize,
        dst: &mut [f16],
    ) -> Result<(), QuantizeError> {
        if count == 0 || dst.len() % count != 0 {
            return Err(QuantizeError::Indivisible);
        }
        let groups = dst.len() / count;
        if count > self.tile_len()
            || codes.len() != groups * self.tile_bytes(P::BITS)
            || records.len() != groups * P::RECORD_STRIDE
        {
            return Err(QuantizeError::LengthMismatch);
        }

        dst.par_chunks_mut(count)
            .zip(codes.par_chunks(self.tile_bytes(P::BITS)))
            .zip(records.par_chunks(P::RECORD_STRIDE))
            .for_each(|((dst, codes), record)| {
                let mut buf = [f16::ZERO; H_PER_CHUNK];
                let chunks = zip(
                    dst.chunks_mut(H_PER_CHUNK),
                    codes.chunks(bytes_per_chunk(P::BITS)),
                );
                for (dst, data) in chunks {
                    unpack_chunk::<P>(&mut buf, data, record);
                    dst.copy_from_slice(&buf[..dst.len()]);
                }
            });
        Ok(())
    }
}

/// One lane's private accumulation over its contiguous span.
fn lane_scan<S: GroupStats>(span: &[f16]) -> S {
    let mut stats = S::default();
    for pair in span.chunks_exact(2) {
        stats.update([pair[0], pair[1]]);
    }
    stats
}
