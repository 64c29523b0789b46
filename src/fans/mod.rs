//! Per-vertex neighbor fans in compressed (CSR) storage.
//!
//! A *fan* is the cyclically ordered list of neighbor vertex ids around a
//! point, listed in clockwise order as seen from outside the surface.
//! Every consecutive cyclic pair `(curr, next)` of an unbordered fan forms
//! a candidate triangle `(v, next, curr)` with the fan's center. An *open*
//! fan (center near a cloud edge) has one missing angular sector: its
//! `border` names the neighbor whose pair with the following neighbor is
//! not a triangle.
//!
//! Fans for the whole cloud live in one [`FanStore`] with a single flat
//! neighbor array addressed by a prefix-sum offset table. Partial
//! collections produced per chunk by an external local triangulation
//! builder are [`PartialFans`] and are combined by [`merge_fans`].
//!
//! [`merge_fans`]: crate::merge_fans

pub mod merge;
pub mod normals;

use rayon::prelude::*;

/// All per-vertex fans of a cloud, in CSR layout.
///
/// The neighbor list of vertex `v` is
/// `neighbors[offsets[v] as usize..offsets[v + 1] as usize]`, so `offsets`
/// holds one entry more than there are vertices and its last entry equals
/// `neighbors.len()`. `borders[v]` is `Some(n)` for an open fan, where `n`
/// starts the missing angular gap, and `None` for a closed (full disk)
/// fan.
///
/// The store is built once by [`merge_fans`] and then only mutated in
/// place by winding flips; it is never resized.
///
/// # Example
///
/// ```
/// use mesh_fans::FanStore;
///
/// // One closed fan: vertex 0 surrounded by 1, 2, 3 (clockwise).
/// let store = FanStore {
///     offsets: vec![0, 3, 3, 3, 3],
///     borders: vec![None; 4],
///     neighbors: vec![1, 2, 3],
/// };
/// let triangles: Vec<_> = store.fan_triangles(0).collect();
/// assert_eq!(triangles, vec![[0, 2, 1], [0, 3, 2], [0, 1, 3]]);
/// ```
///
/// [`merge_fans`]: crate::merge_fans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanStore {
    /// Prefix-sum neighbor offsets, `vertex_count() + 1` entries.
    pub offsets: Vec<u32>,

    /// Border marker per vertex; `None` means a closed fan.
    pub borders: Vec<Option<u32>>,

    /// Flat neighbor array addressed through `offsets`.
    pub neighbors: Vec<u32>,
}

impl Default for FanStore {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            borders: Vec::new(),
            neighbors: Vec::new(),
        }
    }
}

impl FanStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertex id slots covered by the store.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.borders.len()
    }

    /// Returns true if the store covers no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.borders.is_empty()
    }

    /// The neighbor fan of vertex `v`, in stored cyclic order.
    ///
    /// Empty for vertices past the covered range or without a fan.
    #[must_use]
    pub fn neighbors_of(&self, v: u32) -> &[u32] {
        let v = v as usize;
        if v >= self.vertex_count() {
            return &[];
        }
        &self.neighbors[self.offsets[v] as usize..self.offsets[v + 1] as usize]
    }

    /// Border marker of vertex `v`, `None` for closed fans and for
    /// vertices outside the covered range.
    #[must_use]
    pub fn border(&self, v: u32) -> Option<u32> {
        self.borders.get(v as usize).copied().flatten()
    }

    /// Iterates the valid triangles `[v, next, curr]` of the fan of `v`.
    ///
    /// Triples follow the stored clockwise neighbor order; for an open
    /// fan the pair starting at the border neighbor is skipped.
    pub fn fan_triangles(&self, v: u32) -> impl Iterator<Item = [u32; 3]> + '_ {
        let fan = self.neighbors_of(v);
        let border = self.border(v);
        (0..fan.len()).filter_map(move |i| {
            let curr = fan[i];
            if Some(curr) == border {
                return None;
            }
            let next = fan[if i + 1 < fan.len() { i + 1 } else { 0 }];
            Some([v, next, curr])
        })
    }

    /// Reverses the winding of the fan of `v` in place.
    ///
    /// The neighbor slice is reversed and the border moves to the
    /// neighbor that cyclically followed the old border, so an open fan's
    /// gap stays between the same pair of neighbors.
    pub fn reverse_fan(&mut self, v: u32) {
        let idx = v as usize;
        if idx >= self.vertex_count() {
            return;
        }
        let beg = self.offsets[idx] as usize;
        let end = self.offsets[idx + 1] as usize;
        reverse_fan_slice(&mut self.neighbors[beg..end], &mut self.borders[idx]);
    }

    /// Hands out one disjoint mutable view per vertex for data-parallel
    /// passes: `(vertex id, border, neighbor slice)`.
    pub(crate) fn par_fans_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = (u32, &mut Option<u32>, &mut [u32])> + '_ {
        let mut slices = Vec::with_capacity(self.borders.len());
        let mut rest = self.neighbors.as_mut_slice();
        for v in 0..self.borders.len() {
            let len = (self.offsets[v + 1] - self.offsets[v]) as usize;
            let (fan, tail) = rest.split_at_mut(len);
            slices.push(fan);
            rest = tail;
        }
        self.borders
            .par_iter_mut()
            .zip(slices.into_par_iter())
            .enumerate()
            .map(|(v, (border, fan))| (v as u32, border, fan))
    }
}

/// Reverses one fan's neighbor slice and updates its border marker.
///
/// Shared by the sequential [`FanStore::reverse_fan`] and the
/// data-parallel orientation pass that owns per-vertex slices directly.
pub(crate) fn reverse_fan_slice(fan: &mut [u32], border: &mut Option<u32>) {
    let next_after_border = border.and_then(|b| {
        let i = fan.iter().position(|&n| n == b)?;
        Some(fan[if i + 1 < fan.len() { i + 1 } else { 0 }])
    });
    fan.reverse();
    *border = next_after_border;
}

/// Fans for a subset of vertex ids, as produced by an external local
/// triangulation builder over one chunk of the cloud.
///
/// Same CSR idea as [`FanStore`], but fans are addressed by position and
/// carry their center vertex id explicitly, so a partial collection can
/// cover any sparse subset of ids. No vertex may appear in two partial
/// collections handed to the merger.
///
/// # Example
///
/// ```
/// use mesh_fans::PartialFans;
///
/// let mut part = PartialFans::new();
/// part.push_fan(5, None, &[1, 2, 3]);
/// part.push_fan(1, Some(2), &[5, 2]);
/// assert_eq!(part.fan_count(), 2);
/// assert_eq!(part.max_center(), Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartialFans {
    /// Center vertex id per fan.
    pub centers: Vec<u32>,

    /// Border marker per fan, parallel to `centers`.
    pub borders: Vec<Option<u32>>,

    /// Prefix-sum neighbor offsets, `centers.len() + 1` entries.
    pub offsets: Vec<u32>,

    /// Flat neighbor array addressed through `offsets`.
    pub neighbors: Vec<u32>,
}

impl PartialFans {
    /// Creates an empty partial collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            centers: Vec::new(),
            borders: Vec::new(),
            offsets: vec![0],
            neighbors: Vec::new(),
        }
    }

    /// Appends the fan of `center` with the given cyclic neighbor list.
    pub fn push_fan(&mut self, center: u32, border: Option<u32>, fan: &[u32]) {
        self.centers.push(center);
        self.borders.push(border);
        self.neighbors.extend_from_slice(fan);
        self.offsets.push(self.neighbors.len() as u32);
    }

    /// Number of fans in this collection.
    #[must_use]
    pub fn fan_count(&self) -> usize {
        self.centers.len()
    }

    /// Largest center vertex id, `None` if the collection has no fans.
    #[must_use]
    pub fn max_center(&self) -> Option<u32> {
        self.centers.iter().copied().max()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn closed_fan_store() -> FanStore {
        // Vertex 0 with clockwise neighbors 1, 2, 3, 4.
        FanStore {
            offsets: vec![0, 4, 4, 4, 4, 4],
            borders: vec![None; 5],
            neighbors: vec![1, 2, 3, 4],
        }
    }

    #[test]
    fn test_closed_fan_triangles_wrap_around() {
        let store = closed_fan_store();
        let triangles: Vec<_> = store.fan_triangles(0).collect();
        assert_eq!(triangles, vec![[0, 2, 1], [0, 3, 2], [0, 4, 3], [0, 1, 4]]);
    }

    #[test]
    fn test_open_fan_skips_gap() {
        let mut store = closed_fan_store();
        store.borders[0] = Some(4);
        let triangles: Vec<_> = store.fan_triangles(0).collect();
        // The pair starting at the border neighbor (4 -> 1) is the gap.
        assert_eq!(triangles, vec![[0, 2, 1], [0, 3, 2], [0, 4, 3]]);
    }

    #[test]
    fn test_out_of_range_vertex_has_empty_fan() {
        let store = closed_fan_store();
        assert!(store.neighbors_of(99).is_empty());
        assert_eq!(store.border(99), None);
        assert_eq!(store.fan_triangles(99).count(), 0);
    }

    #[test]
    fn test_reverse_closed_fan() {
        let mut store = closed_fan_store();
        store.reverse_fan(0);
        assert_eq!(store.neighbors_of(0), &[4, 3, 2, 1]);
        assert_eq!(store.border(0), None);
        // Reversing twice restores the original order.
        store.reverse_fan(0);
        assert_eq!(store.neighbors_of(0), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_reverse_open_fan_keeps_gap_between_same_pair() {
        let mut store = closed_fan_store();
        store.borders[0] = Some(4);
        // Gap lies between 4 and 1.
        store.reverse_fan(0);
        assert_eq!(store.neighbors_of(0), &[4, 3, 2, 1]);
        // After reversal the gap still lies between 1 and 4, now starting
        // at 1 in the new cyclic order.
        assert_eq!(store.border(0), Some(1));
        let triangles: Vec<_> = store.fan_triangles(0).collect();
        assert_eq!(triangles, vec![[0, 3, 4], [0, 2, 3], [0, 1, 2]]);
    }

    #[test]
    fn test_par_fans_mut_views_are_disjoint_and_complete() {
        let mut store = FanStore {
            offsets: vec![0, 2, 2, 5],
            borders: vec![Some(1), None, None],
            neighbors: vec![1, 2, 0, 1, 4],
        };
        let seen: Vec<(u32, usize)> = store
            .par_fans_mut()
            .map(|(v, _, fan)| (v, fan.len()))
            .collect();
        assert_eq!(seen, vec![(0, 2), (1, 0), (2, 3)]);
    }

    #[test]
    fn test_partial_fans_push_fan_builds_csr() {
        let mut part = PartialFans::new();
        part.push_fan(3, None, &[0, 1, 2]);
        part.push_fan(0, Some(3), &[3, 1]);
        assert_eq!(part.offsets, vec![0, 3, 5]);
        assert_eq!(part.neighbors, vec![0, 1, 2, 3, 1]);
        assert_eq!(part.max_center(), Some(3));
        assert_eq!(PartialFans::new().max_center(), None);
    }
}
