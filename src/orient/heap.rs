//! Addressable binary max-heap over per-vertex priorities.
//!
//! The orientation propagator repeatedly extracts the most confident
//! vertex and re-scores that vertex's neighbors, so it needs a priority
//! structure supporting key changes of arbitrary tracked elements. A
//! slot index per vertex id makes both directions of `set_value` run in
//! `O(log n)`.

use std::cmp::Ordering;

/// Array-backed binary max-heap with an id-to-slot index.
///
/// Ids are dense `0..n`; every id always stays in the heap (finalized
/// ids are parked at `f64::NEG_INFINITY` rather than removed, so `top`
/// reaching that sentinel means every live id has been consumed).
/// Deterministic for identical inputs: float keys are compared via
/// `partial_cmp` with ties resolved by slot order.
pub(crate) struct PriorityHeap {
    /// Vertex ids in heap order, root at slot 0.
    slots: Vec<u32>,
    /// Heap slot of each id.
    slot_of: Vec<u32>,
    /// Current priority of each id.
    values: Vec<f64>,
}

impl PriorityHeap {
    /// Builds a heap over `values`, id `i` starting at `values[i]`.
    pub fn new(values: Vec<f64>) -> Self {
        let n = values.len();
        let mut heap = Self {
            slots: (0..n as u32).collect(),
            slot_of: (0..n as u32).collect(),
            values,
        };
        for slot in (0..n / 2).rev() {
            heap.sift_down(slot);
        }
        heap
    }

    /// Id and priority of the current maximum; `None` for an empty heap.
    pub fn top(&self) -> Option<(u32, f64)> {
        let id = *self.slots.first()?;
        Some((id, self.values[id as usize]))
    }

    /// Current priority of `id`.
    pub fn value(&self, id: u32) -> f64 {
        self.values[id as usize]
    }

    /// Re-prioritizes `id`, restoring heap order in either direction.
    pub fn set_value(&mut self, id: u32, value: f64) {
        let old = self.values[id as usize];
        self.values[id as usize] = value;
        let slot = self.slot_of[id as usize] as usize;
        match value.partial_cmp(&old).unwrap_or(Ordering::Equal) {
            Ordering::Greater => self.sift_up(slot),
            Ordering::Less => self.sift_down(slot),
            Ordering::Equal => {}
        }
    }

    fn greater(&self, a: usize, b: usize) -> bool {
        let va = self.values[self.slots[a] as usize];
        let vb = self.values[self.slots[b] as usize];
        va.partial_cmp(&vb).unwrap_or(Ordering::Equal) == Ordering::Greater
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.slots.swap(a, b);
        self.slot_of[self.slots[a] as usize] = a as u32;
        self.slot_of[self.slots[b] as usize] = b as u32;
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.greater(slot, parent) {
                break;
            }
            self.swap_slots(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            if left >= self.slots.len() {
                break;
            }
            let right = left + 1;
            let child = if right < self.slots.len() && self.greater(right, left) {
                right
            } else {
                left
            };
            if !self.greater(child, slot) {
                break;
            }
            self.swap_slots(slot, child);
            slot = child;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(heap: &mut PriorityHeap) -> Vec<u32> {
        let mut order = Vec::new();
        while let Some((id, value)) = heap.top() {
            if value == f64::NEG_INFINITY {
                break;
            }
            order.push(id);
            heap.set_value(id, f64::NEG_INFINITY);
        }
        order
    }

    #[test]
    fn test_extracts_in_descending_order() {
        let mut heap = PriorityHeap::new(vec![-3.0, 0.0, -1.5, -2.0]);
        assert_eq!(drain(&mut heap), vec![1, 2, 3, 0]);
        // Fully drained: only the finalized sentinel remains on top.
        assert_eq!(heap.top().map(|(_, value)| value), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_key_increase_moves_to_front() {
        let mut heap = PriorityHeap::new(vec![-3.0, 0.0, -1.5]);
        heap.set_value(0, 5.0);
        assert_eq!(heap.top(), Some((0, 5.0)));
        assert_eq!(drain(&mut heap), vec![0, 1, 2]);
    }

    #[test]
    fn test_key_decrease_moves_back() {
        let mut heap = PriorityHeap::new(vec![3.0, 2.0, 1.0]);
        heap.set_value(0, 1.5);
        assert_eq!(drain(&mut heap), vec![1, 0, 2]);
    }

    #[test]
    fn test_value_tracks_updates() {
        let mut heap = PriorityHeap::new(vec![0.0, 1.0]);
        heap.set_value(0, 2.5);
        assert_eq!(heap.value(0), 2.5);
        assert_eq!(heap.value(1), 1.0);
    }

    #[test]
    fn test_empty_heap_has_no_top() {
        let heap = PriorityHeap::new(Vec::new());
        assert!(heap.top().is_none());
    }
}
