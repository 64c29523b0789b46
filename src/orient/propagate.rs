//! Globally consistent winding via consensus-driven region growing.

use tracing::{debug, info, warn};

use crate::cloud::PointCloud;
use crate::error::{FanError, FanResult};
use crate::fans::FanStore;
use crate::orient::consensus::{UnorientedTriangle, VoteMap};
use crate::orient::heap::PriorityHeap;
use crate::orient::orient_fans_by_direction;
use crate::progress::{report, ProgressCallback, ProgressCounter};

/// Heap priority of vertices that were already visited (or were never
/// eligible). The expansion loop stops when this reaches the top.
const FINALIZED: f64 = f64::NEG_INFINITY;

/// Outcome of [`auto_orient_fans`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrientStats {
    /// Valid vertices processed by the expansion loop.
    pub visited: usize,

    /// Fan reversals applied during propagation (a vertex may be
    /// reversed more than once while the consensus around it shifts).
    pub flipped: usize,

    /// Vertices visited without a single accumulated winding vote,
    /// beyond the one seed every propagation starts from. Non-zero
    /// means the cloud has surface pieces sharing no triangles with the
    /// rest; those pieces keep their coarse seed-pass orientation and
    /// may disagree with it globally.
    pub unreached: usize,
}

/// Derives one mutually consistent winding for all fans, without any
/// externally supplied direction field.
///
/// The pass first applies the local corrector with the crude direction
/// `p[v] - boundingBoxCenter`, then region-grows: vertices are visited
/// greedily by confidence, each visit casts the vertex's winding votes
/// on its triangles, and every unvisited neighbor is re-scored from the
/// votes accumulated so far — reversing its fan first whenever opposite
/// votes dominate. Vertices far from the box center are visited first
/// (they are most likely locally planar and unambiguous), so confidence
/// propagates inward. Vote entries are pruned as soon as all three
/// vertices of a triangle have been visited.
///
/// Inherently sequential: each step's scores depend on the votes of the
/// previous one. Deterministic for identical inputs. The cloud must
/// cover every vertex id the store references.
///
/// # Errors
///
/// [`FanError::Cancelled`] if the progress callback asked to stop. The
/// callback is consulted before the seed pass, so an immediate cancel
/// leaves the store untouched; a later cancel leaves the fans already
/// processed at their (individually valid) orientations.
///
/// # Example
///
/// ```
/// use mesh_fans::{auto_orient_fans, merge_fans, PartialFans, PointCloud};
/// use nalgebra::Point3;
///
/// // Two triangles sharing the edge (0, 1); vertex 2's fan winds
/// // against the other three.
/// let mut part = PartialFans::new();
/// part.push_fan(0, Some(3), &[2, 1, 3]);
/// part.push_fan(1, Some(2), &[3, 0, 2]);
/// part.push_fan(2, Some(1), &[0, 1]);
/// part.push_fan(3, Some(1), &[0, 1]);
/// let mut store = merge_fans(&[part], None).unwrap();
///
/// let cloud = PointCloud::from_positions(vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
///     Point3::new(0.5, -1.0, 0.0),
/// ]);
/// let stats = auto_orient_fans(&cloud, &mut store, None).unwrap();
/// assert_eq!(stats.visited, 4);
/// // The odd fan out was reversed to match the consensus.
/// assert_eq!(store.neighbors_of(2), &[1, 0]);
/// ```
pub fn auto_orient_fans(
    cloud: &PointCloud,
    store: &mut FanStore,
    progress: Option<&ProgressCallback>,
) -> FanResult<OrientStats> {
    let bbox = cloud.bounding_box();
    if !report(progress, 0.025) {
        return Err(FanError::Cancelled);
    }
    if bbox.is_empty() {
        debug!("no valid vertices, nothing to orient");
        return Ok(OrientStats::default());
    }
    let center = bbox.center();
    let max_dist_sq = bbox.size().norm_squared() / 4.0;

    // Seed pass: noisy but non-random starting winding for every fan.
    let seeded = orient_fans_by_direction(
        store,
        &cloud.points,
        |v| cloud.points[v as usize] - center,
        None,
    )?;
    debug!(flipped = seeded, "seeded fan orientation away from box center");
    if !report(progress, 0.05) {
        return Err(FanError::Cancelled);
    }

    // Priorities are negative distances-from-extremes: vertices near the
    // surface extremes score closest to zero and are visited first.
    let mut weights = vec![FINALIZED; cloud.len()];
    for (v, weight) in weights.iter_mut().enumerate() {
        if cloud.valid[v] {
            *weight = ((cloud.points[v] - center).norm_squared() - max_dist_sq).min(0.0);
        }
    }
    let mut heap = PriorityHeap::new(weights);
    if !report(progress, 0.1) {
        return Err(FanError::Cancelled);
    }

    // A plain map, deliberately not the sharded diagnostic layout: this
    // phase is single-threaded and one map is faster here.
    let mut map = VoteMap::new();

    let total = cloud.valid_count();
    let slots = cloud.len().max(store.vertex_count());
    let mut visited: Vec<bool> = (0..slots as u32).map(|v| !cloud.is_valid(v)).collect();
    // Whether re-scoring a vertex ever found votes for it; pops of
    // unscored vertices start a new expansion front.
    let mut scored = vec![false; slots];
    let mut stats = OrientStats::default();
    let mut fronts = 0usize;

    while let Some((v, weight)) = heap.top() {
        if weight == FINALIZED {
            break; // every eligible vertex has been finalized
        }
        heap.set_value(v, FINALIZED);
        visited[v as usize] = true;
        stats.visited += 1;
        if !scored[v as usize] {
            fronts += 1;
        }

        // Cast this fan's votes; drop entries of triangles whose three
        // vertices have all been visited, they can never be scored again.
        for triple in store.fan_triangles(v) {
            let [_, next, curr] = triple;
            let (tri, flipped) = UnorientedTriangle::canonical(triple);
            if visited[curr as usize] && visited[next as usize] {
                map.remove(&tri);
                continue;
            }
            map.entry(tri).or_default().add(flipped);
        }

        // Re-score every unvisited neighbor against the updated votes.
        let fan: Vec<u32> = store.neighbors_of(v).to_vec();
        for u in fan {
            if visited[u as usize] {
                continue;
            }
            let (weight, any_votes, reversed) = rescore(store, &map, u);
            if reversed {
                stats.flipped += 1;
            }
            if any_votes {
                scored[u as usize] = true;
            }
            heap.set_value(u, weight);
        }

        if stats.visited % ProgressCounter::CHECK_EVERY == 0
            && !report(progress, 0.1 + 0.9 * stats.visited as f64 / total.max(1) as f64)
        {
            return Err(FanError::Cancelled);
        }
    }

    stats.unreached = fronts.saturating_sub(1);
    if stats.unreached > 0 {
        warn!(
            unreached = stats.unreached,
            "cloud has disconnected pieces; their winding keeps the seed-pass orientation"
        );
    }
    info!(
        visited = stats.visited,
        flipped = stats.flipped,
        unreached = stats.unreached,
        "propagated globally consistent fan orientation"
    );
    Ok(stats)
}

/// Recomputes the confidence of unvisited vertex `u` from the vote map,
/// reversing its fan first if opposite-winding votes dominate.
///
/// Only unanimous tallies count: a triangle whose referencing fans
/// already disagree among themselves carries no signal for `u`.
///
/// Returns `(new priority, saw any votes, fan was reversed)`.
fn rescore(store: &mut FanStore, map: &VoteMap, u: u32) -> (f64, bool, bool) {
    let mut same = 0i32;
    let mut opposite = 0i32;
    let mut any_votes = false;
    for triple in store.fan_triangles(u) {
        let (tri, flipped) = UnorientedTriangle::canonical(triple);
        let Some(votes) = map.get(&tri) else { continue };
        any_votes = true;
        if votes.same == 0 && votes.opposite > 0 {
            if flipped {
                same += 1;
            } else {
                opposite += 1;
            }
        } else if votes.opposite == 0 && votes.same > 0 {
            if flipped {
                opposite += 1;
            } else {
                same += 1;
            }
        }
    }
    let reversed = opposite > same;
    if reversed {
        store.reverse_fan(u);
    }
    (f64::from((same - opposite).abs()), any_votes, reversed)
}
