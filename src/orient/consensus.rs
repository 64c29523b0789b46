//! Triangle identity and winding-vote consensus.
//!
//! A triangle appears in up to three fans (one per vertex), and each fan
//! lists it with its own winding. Tallying, per *unoriented* triangle,
//! how many referencing fans agree or disagree with a canonical winding
//! gives a consensus signal: a unanimous tally means the fans are
//! mutually consistent around that triangle, a mixed tally is a direct
//! conflict, and a total other than three flags boundary or
//! manifold-violating geometry.
//!
//! The batch builders here serve diagnostics; the orientation propagator
//! maintains its own incremental tally with the same key and counter
//! types.

use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{FanError, FanResult};
use crate::fans::FanStore;
use crate::progress::{ProgressCallback, ProgressCounter};

/// Canonical identity of a triangle, independent of winding.
///
/// Vertex ids are stored in ascending order. [`canonical`] reports
/// whether an ordered triple was an odd permutation of that canonical
/// order, which is what relates two fans' windings of the same triangle:
/// equal flags mean equal winding.
///
/// # Example
///
/// ```
/// use mesh_fans::UnorientedTriangle;
///
/// let (tri, flipped) = UnorientedTriangle::canonical([2, 3, 1]);
/// assert_eq!(tri.vertices(), [1, 2, 3]);
/// assert!(!flipped); // cyclic rotation, even permutation
///
/// let (same_tri, flipped) = UnorientedTriangle::canonical([3, 2, 1]);
/// assert_eq!(same_tri, tri);
/// assert!(flipped); // swapped pair, odd permutation
/// ```
///
/// [`canonical`]: UnorientedTriangle::canonical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnorientedTriangle([u32; 3]);

impl UnorientedTriangle {
    /// Canonicalizes an ordered vertex triple.
    ///
    /// Returns the identity and whether the input ordering was an odd
    /// permutation of it ("flipped").
    #[must_use]
    pub fn canonical(mut tri: [u32; 3]) -> (Self, bool) {
        let mut flipped = false;
        if tri[0] > tri[1] {
            tri.swap(0, 1);
            flipped = !flipped;
        }
        if tri[1] > tri[2] {
            tri.swap(1, 2);
            flipped = !flipped;
        }
        if tri[0] > tri[1] {
            tri.swap(0, 1);
            flipped = !flipped;
        }
        (Self(tri), flipped)
    }

    /// The three vertex ids, ascending.
    #[must_use]
    pub fn vertices(&self) -> [u32; 3] {
        self.0
    }

    /// Returns true if `v` is one of the triangle's vertices.
    #[must_use]
    pub fn contains(&self, v: u32) -> bool {
        self.0.contains(&v)
    }
}

/// Winding vote counters for one unoriented triangle.
///
/// Each fan referencing the triangle votes once: `same` if it lists the
/// triangle in canonical winding, `opposite` if reversed. Counters
/// saturate instead of wrapping; for any map built over a fan store the
/// total is between 1 and 3 (three vertices, at most one vote each).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindingVotes {
    /// Fans listing the triangle in canonical winding.
    pub same: u8,
    /// Fans listing the triangle in reversed winding.
    pub opposite: u8,
}

impl WindingVotes {
    /// Registers one fan's vote.
    pub fn add(&mut self, flipped: bool) {
        if flipped {
            self.opposite = self.opposite.saturating_add(1);
        } else {
            self.same = self.same.saturating_add(1);
        }
    }

    /// Total number of votes received.
    #[must_use]
    pub fn total(&self) -> u8 {
        self.same.saturating_add(self.opposite)
    }

    /// True if the referencing fans disagree on winding.
    #[must_use]
    pub fn is_conflicted(&self) -> bool {
        self.same >= 1 && self.opposite >= 1
    }
}

/// Vote tallies keyed by canonical triangle identity.
pub(crate) type VoteMap = HashMap<UnorientedTriangle, WindingVotes>;

/// Stable partition function assigning each triangle to one map shard.
///
/// Independent of any hash map's per-instance seed, so every worker
/// computes the same shard for the same triangle.
fn shard_of(tri: UnorientedTriangle, shard_count: usize) -> usize {
    let [a, b, c] = tri.vertices();
    let mut h = (u64::from(a) << 42) ^ (u64::from(b) << 21) ^ u64::from(c);
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^= h >> 31;
    (h % shard_count as u64) as usize
}

/// Builds the full vote tally over the store as disjoint shards.
///
/// Each rayon worker scans the entire store but only inserts triangles
/// whose partition falls in its own shard, so no entry is ever written
/// by two workers and no locking is needed. The shards are disjoint by
/// construction; queries simply visit all of them.
pub(crate) fn build_vote_shards(
    store: &FanStore,
    shard_count: usize,
    progress: Option<&ProgressCallback>,
) -> FanResult<Vec<VoteMap>> {
    let shard_count = shard_count.max(1);
    let counter = ProgressCounter::new(progress, shard_count * store.vertex_count(), 0.0, 1.0);
    let shards: Vec<VoteMap> = (0..shard_count)
        .into_par_iter()
        .map(|shard| {
            let mut map = VoteMap::new();
            for v in 0..store.vertex_count() as u32 {
                if !counter.add(1) {
                    return map;
                }
                for triple in store.fan_triangles(v) {
                    let (tri, flipped) = UnorientedTriangle::canonical(triple);
                    if shard_of(tri, shard_count) != shard {
                        continue;
                    }
                    map.entry(tri).or_default().add(flipped);
                }
            }
            map
        })
        .collect();
    if counter.is_cancelled() {
        return Err(FanError::Cancelled);
    }
    Ok(shards)
}

/// How often each unoriented triangle is referenced across all fans.
///
/// `conflicts` is an additional signal counted on top of the repetition
/// buckets: triangles that received both same- and opposite-winding
/// votes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangleRepetitions {
    /// Triangles with disagreeing winding votes.
    pub conflicts: usize,
    /// Triangles referenced by exactly one fan (boundary).
    pub once: usize,
    /// Triangles referenced by exactly two fans (non-manifold signal).
    pub twice: usize,
    /// Triangles referenced by all three of their fans.
    pub thrice: usize,
}

/// Counts triangle repetitions and winding conflicts over the store.
///
/// Pure with respect to the store.
///
/// # Errors
///
/// [`FanError::Cancelled`] if the progress callback asked to stop.
pub fn compute_triangle_repetitions(
    store: &FanStore,
    progress: Option<&ProgressCallback>,
) -> FanResult<TriangleRepetitions> {
    let shards = build_vote_shards(store, rayon::current_num_threads(), progress)?;
    let mut res = TriangleRepetitions::default();
    for votes in shards.iter().flat_map(HashMap::values) {
        debug_assert!((1..=3).contains(&votes.total()));
        match votes.total() {
            1 => res.once += 1,
            2 => res.twice += 1,
            _ => res.thrice += 1,
        }
        if votes.is_conflicted() {
            res.conflicts += 1;
        }
    }
    debug!(?res, "computed triangle repetitions");
    Ok(res)
}

/// Returns all triangles referenced by exactly `repetitions` fans,
/// sorted by vertex ids.
///
/// `repetitions` must be between 1 and 3: a repetition count of 1 marks
/// boundary triangles, 2 marks non-manifold candidates, and 3 is the
/// interior norm (more than 3 is impossible — a triangle only has three
/// vertices).
///
/// # Errors
///
/// [`FanError::Cancelled`] if the progress callback asked to stop.
pub fn find_repeated_triangles(
    store: &FanStore,
    repetitions: u8,
    progress: Option<&ProgressCallback>,
) -> FanResult<Vec<UnorientedTriangle>> {
    debug_assert!((1..=3).contains(&repetitions));
    let shards = build_vote_shards(store, rayon::current_num_threads(), progress)?;
    let mut res: Vec<UnorientedTriangle> = shards
        .iter()
        .flat_map(HashMap::iter)
        .filter(|(_, votes)| votes.total() == repetitions)
        .map(|(&tri, _)| tri)
        .collect();
    res.sort_unstable();
    Ok(res)
}
