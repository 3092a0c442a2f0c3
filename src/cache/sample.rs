//! Seeded row sampling straight from a source file.

use std::path::Path;

use polars::prelude::DataFrame;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::source::{rows_to_frame, ChunkReader, Rows};
use super::{CacheError, CacheResult};

/// Parameters for one sample draw.
#[derive(Debug, Clone, Copy)]
pub struct SamplePlan {
    pub size: usize,
    pub seed: u64,
    /// Small samples read `size * oversample` rows before drawing.
    pub oversample: usize,
    /// Samples larger than this are drawn chunk by chunk.
    pub large_threshold: usize,
    pub chunk_size: usize,
}

/// Draw a uniform sample of `plan.size` rows.
///
/// The same plan over the same file always returns the same rows, in
/// source order.
pub fn draw_sample(path: &Path, plan: &SamplePlan) -> CacheResult<DataFrame> {
    let failed = |e: &dyn std::fmt::Display| CacheError::conversion(path, e);

    let mut reader = ChunkReader::open(path).map_err(|e| failed(&e))?;
    let columns = reader.columns().to_vec();
    let mut rng = StdRng::seed_from_u64(plan.seed);

    let rows = if plan.size > plan.large_threshold {
        draw_chunked(&mut reader, plan, &mut rng).map_err(|e| failed(&e))?
    } else {
        let window = plan.size.saturating_mul(plan.oversample.max(1));
        let rows = reader
            .next_chunk(window)
            .map_err(|e| failed(&e))?
            .unwrap_or_default();
        pick(rows, plan.size, &mut rng)
    };

    rows_to_frame(&columns, &rows).map_err(|e| failed(&e))
}

/// Draw `size / 10` rows from each chunk until `size` rows are collected.
fn draw_chunked(
    reader: &mut ChunkReader,
    plan: &SamplePlan,
    rng: &mut StdRng,
) -> crate::scan::ScanResult<Rows> {
    let per_chunk = (plan.size / 10).max(1);
    let mut collected: Rows = Vec::with_capacity(plan.size);

    while let Some(chunk) = reader.next_chunk(plan.chunk_size.max(1))? {
        let take = per_chunk.min(chunk.len());
        collected.extend(pick(chunk, take, rng));
        if collected.len() >= plan.size {
            break;
        }
    }

    collected.truncate(plan.size);
    Ok(collected)
}

/// Uniformly pick `amount` rows, keeping their relative order.
fn pick(rows: Rows, amount: usize, rng: &mut StdRng) -> Rows {
    if amount >= rows.len() {
        return rows;
    }
    let mut indices = rand::seq::index::sample(rng, rows.len(), amount).into_vec();
    indices.sort_unstable();

    let mut keep = indices.into_iter().peekable();
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| {
            if keep.peek() == Some(&i) {
                keep.next();
                Some(row)
            } else {
                None
            }
        })
        .collect()
}
