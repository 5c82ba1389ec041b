use serde::{Deserialize, Serialize};

/// One query result: squared Euclidean distance and the index of the stored point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub distance: f64,
    pub index: usize,
}

impl Neighbor {
    /// Index carried by padding entries that do not refer to a stored point.
    pub const NO_INDEX: usize = usize::MAX;

    /// Padding entry: infinite distance, no point.
    pub const SENTINEL: Neighbor = Neighbor { distance: f64::INFINITY, index: Self::NO_INDEX };

    pub fn new(distance: f64, index: usize) -> Self {
        Self { distance, index }
    }

    pub fn is_sentinel(&self) -> bool {
        self.index == Self::NO_INDEX
    }

    /// True Euclidean distance (the square root of [`Neighbor::distance`]).
    pub fn distance_euclidean(&self) -> f64 {
        self.distance.sqrt()
    }
}

/// Fixed capacity set of the `k` smallest `(distance, index)` pairs seen so far.
///
/// Entries are kept sorted ascending in a small array. `k` is expected to be
/// small, so an insertion shift beats a heap here.
#[derive(Clone, Debug)]
pub struct BoundedNearestSet {
    k: usize,
    entries: Vec<Neighbor>,
}

impl BoundedNearestSet {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            entries: Vec::with_capacity(k + 1),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.k
    }

    /// Current pruning bound: the k-th smallest distance, or `+inf` while under capacity.
    #[inline]
    pub fn max_key(&self) -> f64 {
        if self.is_full() {
            self.entries[self.k - 1].distance
        } else {
            f64::INFINITY
        }
    }

    /// Offers a candidate. When full, it is kept only if strictly closer than the current maximum.
    ///
    /// Returns whether the candidate was kept.
    pub fn insert(&mut self, distance: f64, index: usize) -> bool {
        if self.k == 0 || (self.is_full() && distance >= self.max_key()) {
            return false;
        }
        // Equal keys stay in arrival order.
        let mut pos = self.entries.len();
        while pos > 0 && self.entries[pos - 1].distance > distance {
            pos -= 1;
        }
        self.entries.insert(pos, Neighbor { distance, index });
        self.entries.truncate(self.k);
        true
    }

    /// The `i`-th closest entry, or the sentinel when fewer than `i + 1` entries are held.
    pub fn ith_smallest(&self, i: usize) -> Neighbor {
        self.entries.get(i).copied().unwrap_or(Neighbor::SENTINEL)
    }

    pub fn as_slice(&self) -> &[Neighbor] {
        &self.entries
    }

    /// Consumes the set, returning exactly `k` entries padded with sentinels.
    pub fn into_padded(mut self) -> Vec<Neighbor> {
        self.entries.resize(self.k, Neighbor::SENTINEL);
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    #[test]
    fn test_max_key_infinite_until_full() {
        let mut set = BoundedNearestSet::new(3);
        assert_eq!(set.max_key(), f64::INFINITY);
        set.insert(5.0, 0);
        set.insert(1.0, 1);
        assert_eq!(set.max_key(), f64::INFINITY);
        set.insert(3.0, 2);
        assert_eq!(set.max_key(), 5.0);
    }

    #[test]
    fn test_replaces_maximum_only_when_strictly_closer() {
        let mut set = BoundedNearestSet::new(2);
        set.insert(4.0, 0);
        set.insert(2.0, 1);
        assert!(!set.insert(4.0, 2));
        assert_eq!(set.ith_smallest(1), Neighbor::new(4.0, 0));
        assert!(set.insert(3.0, 3));
        assert_eq!(set.ith_smallest(0), Neighbor::new(2.0, 1));
        assert_eq!(set.ith_smallest(1), Neighbor::new(3.0, 3));
        assert_eq!(set.max_key(), 3.0);
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let mut set = BoundedNearestSet::new(3);
        set.insert(1.0, 10);
        set.insert(1.0, 11);
        set.insert(0.5, 12);
        let indices: Vec<usize> = set.as_slice().iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![12, 10, 11]);
    }

    #[test]
    fn test_padding() {
        let mut set = BoundedNearestSet::new(3);
        set.insert(2.0, 7);
        assert!(set.ith_smallest(1).is_sentinel());
        let out = set.into_padded();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Neighbor::new(2.0, 7));
        assert!(out[1].is_sentinel() && out[2].is_sentinel());
        assert_eq!(out[2].distance, f64::INFINITY);
    }

    #[test]
    fn test_matches_sorted_prefix_random() {
        let mut rng = StdRng::seed_from_u64(42);
        for k in [1usize, 2, 5, 16] {
            let mut set = BoundedNearestSet::new(k);
            let mut all = Vec::new();
            for i in 0..200 {
                let d: f64 = rng.gen_range(0.0..1000.0);
                set.insert(d, i);
                all.push(d);

                let mut sorted = all.clone();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
                let expected_max = if sorted.len() >= k { sorted[k - 1] } else { f64::INFINITY };
                assert_eq!(set.max_key(), expected_max);
            }
            all.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for i in 0..k {
                assert_eq!(set.ith_smallest(i).distance, all[i]);
            }
            for w in set.as_slice().windows(2) {
                assert!(w[0].distance <= w[1].distance);
            }
        }
    }
}
