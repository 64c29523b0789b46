//! Merging partial fan collections into one global store.

use rayon::prelude::*;
use tracing::info;

use crate::error::{FanError, FanResult};
use crate::fans::{FanStore, PartialFans};
use crate::progress::{report, ProgressCallback, ProgressCounter};

/// Merges partial fan collections into one global [`FanStore`].
///
/// The store is sized to the largest center vertex id seen across all
/// collections; vertices without a fan anywhere get an empty neighbor
/// list. The relative neighbor order of every fan is preserved verbatim.
///
/// Each vertex must appear in at most one collection; duplicates are a
/// programming error upstream (chunks are expected to be disjoint) and
/// are only checked in debug builds.
///
/// # Errors
///
/// [`FanError::EmptyInput`] if `parts` is empty or contains no fans at
/// all; [`FanError::Cancelled`] if the progress callback asked to stop.
///
/// # Example
///
/// ```
/// use mesh_fans::{merge_fans, PartialFans};
///
/// let mut chunk_a = PartialFans::new();
/// chunk_a.push_fan(0, Some(2), &[1, 2]);
/// let mut chunk_b = PartialFans::new();
/// chunk_b.push_fan(2, None, &[0, 1, 3]);
///
/// let store = merge_fans(&[chunk_a, chunk_b], None).unwrap();
/// assert_eq!(store.vertex_count(), 3);
/// assert_eq!(store.neighbors_of(0), &[1, 2]);
/// assert_eq!(store.neighbors_of(1), &[] as &[u32]);
/// assert_eq!(store.neighbors_of(2), &[0, 1, 3]);
/// ```
pub fn merge_fans(
    parts: &[PartialFans],
    progress: Option<&ProgressCallback>,
) -> FanResult<FanStore> {
    let Some(max_center) = parts.iter().filter_map(PartialFans::max_center).max() else {
        return Err(FanError::EmptyInput);
    };
    let vertex_count = max_center as usize + 1;

    if !report(progress, 0.0) {
        return Err(FanError::Cancelled);
    }

    // First pass: per-vertex neighbor counts, borders, and source slices.
    let mut counts = vec![0u32; vertex_count];
    let mut borders = vec![None; vertex_count];
    let mut sources: Vec<&[u32]> = vec![&[]; vertex_count];
    for part in parts {
        debug_assert!(part.offsets.windows(2).all(|w| w[0] <= w[1]));
        for (i, &center) in part.centers.iter().enumerate() {
            let beg = part.offsets[i] as usize;
            let end = part.offsets[i + 1] as usize;
            let c = center as usize;
            debug_assert!(sources[c].is_empty() && counts[c] == 0);
            counts[c] = (end - beg) as u32;
            borders[c] = part.borders[i];
            sources[c] = &part.neighbors[beg..end];
        }
    }
    if !report(progress, 0.25) {
        return Err(FanError::Cancelled);
    }

    // Prefix sum over the counts gives the global offsets.
    let mut offsets = Vec::with_capacity(vertex_count + 1);
    let mut total = 0u32;
    offsets.push(0);
    for &count in &counts {
        total += count;
        offsets.push(total);
    }
    if !report(progress, 0.5) {
        return Err(FanError::Cancelled);
    }

    // Copy every fan into its slot of the global neighbor array. Slots
    // are disjoint, so the copies run in parallel.
    let mut neighbors = vec![0u32; total as usize];
    let mut slots = Vec::with_capacity(vertex_count);
    let mut rest = neighbors.as_mut_slice();
    for &count in &counts {
        let (slot, tail) = rest.split_at_mut(count as usize);
        slots.push(slot);
        rest = tail;
    }
    let counter = ProgressCounter::new(progress, vertex_count, 0.5, 1.0);
    slots
        .into_par_iter()
        .zip(sources.par_iter())
        .with_min_len(ProgressCounter::CHECK_EVERY)
        .for_each(|(slot, source)| {
            if counter.add(1) {
                slot.copy_from_slice(source);
            }
        });
    if counter.is_cancelled() {
        return Err(FanError::Cancelled);
    }

    info!(
        parts = parts.len(),
        vertices = vertex_count,
        neighbors = neighbors.len(),
        "merged local triangulations"
    );
    Ok(FanStore {
        offsets,
        borders,
        neighbors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_part() -> PartialFans {
        let mut part = PartialFans::new();
        part.push_fan(0, Some(1), &[3, 4, 1]);
        part.push_fan(4, None, &[7, 8, 5, 1, 0, 3]);
        part.push_fan(2, Some(5), &[1, 5]);
        part
    }

    #[test]
    fn test_merge_empty_slice_is_empty_input() {
        assert_eq!(merge_fans(&[], None), Err(FanError::EmptyInput));
    }

    #[test]
    fn test_merge_parts_without_fans_is_empty_input() {
        let parts = vec![PartialFans::new(), PartialFans::new()];
        assert_eq!(merge_fans(&parts, None), Err(FanError::EmptyInput));
    }

    #[test]
    fn test_merge_single_part_round_trip() {
        let part = sample_part();
        let store = merge_fans(std::slice::from_ref(&part), None).unwrap();

        assert_eq!(store.vertex_count(), 5);
        assert_eq!(store.offsets.len(), 6);
        assert_eq!(store.neighbors_of(0), &[3, 4, 1]);
        assert_eq!(store.border(0), Some(1));
        assert_eq!(store.neighbors_of(4), &[7, 8, 5, 1, 0, 3]);
        assert_eq!(store.border(4), None);
        assert_eq!(store.neighbors_of(2), &[1, 5]);
        assert_eq!(store.border(2), Some(5));
        // Vertices without fans are present with empty lists.
        assert_eq!(store.neighbors_of(1), &[] as &[u32]);
        assert_eq!(store.neighbors_of(3), &[] as &[u32]);
        assert_eq!(*store.offsets.last().unwrap() as usize, store.neighbors.len());
    }

    #[test]
    fn test_merge_two_shards_matches_single_part() {
        let whole = sample_part();
        let expected = merge_fans(std::slice::from_ref(&whole), None).unwrap();

        let mut shard_low = PartialFans::new();
        shard_low.push_fan(0, Some(1), &[3, 4, 1]);
        shard_low.push_fan(2, Some(5), &[1, 5]);
        let mut shard_high = PartialFans::new();
        shard_high.push_fan(4, None, &[7, 8, 5, 1, 0, 3]);

        let merged = merge_fans(&[shard_low, shard_high], None).unwrap();
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_merge_cancellation_before_work() {
        let cancel: ProgressCallback = Box::new(|_| false);
        let part = sample_part();
        assert_eq!(
            merge_fans(std::slice::from_ref(&part), Some(&cancel)),
            Err(FanError::Cancelled)
        );
    }

    #[test]
    fn test_merge_reports_monotone_progress() {
        use std::sync::{Arc, Mutex};
        let fractions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fractions);
        let callback: ProgressCallback = Box::new(move |f| {
            sink.lock().unwrap().push(f);
            true
        });
        let part = sample_part();
        merge_fans(std::slice::from_ref(&part), Some(&callback)).unwrap();
        let fractions = fractions.lock().unwrap();
        assert!(fractions.len() >= 3);
        for pair in fractions.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!(fractions.iter().all(|&f| (0.0..=1.0).contains(&f)));
    }
}
