//! Priority search for k nearest neighbors.
//!
//! Subtrees are visited in increasing order of the distance from the query to
//! their cell. Every subtree not descended into right away is parked in a
//! priority queue keyed by that distance. At a split the search continues
//! straight into the child on the query's side and enqueues the other one, so
//! good candidates are found early and tighten the pruning bound before
//! siblings are considered. The search stops once the closest remaining cell
//! is farther than the current k-th best distance divided by `(1 + eps)`:
//! nothing found afterwards could beat the current answer by more than that factor.
//!
//! Cell distances are maintained incrementally. Crossing a cut changes only
//! the cut axis's term of the squared distance, so the far child's distance is
//! the parent's with that one term replaced.

use crate::config::{SearchConfig, ShortfallPolicy};
use crate::distance::{distance_sq_bounded, prefetch};
use crate::error::{KdError, Result};
use crate::nearest::{BoundedNearestSet, Neighbor};
use crate::point::{Coordinate, PointSet};
use crate::queue::BoxPriorityQueue;
use crate::tree::{KdNode, KdTree, LeafNode, NodeId, SplitNode};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Why the search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every cell was either visited or pruned. Results are exact (within `eps`).
    QueueExhausted,
    /// The closest unvisited cell could not improve the result by more than
    /// the `eps` tolerance. Results are exact (within `eps`).
    ErrorBound,
    /// The point budget ran out first. Results are best-effort only.
    BudgetExhausted,
}

/// Counters collected during one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub points_visited: usize,
    pub leaves_visited: usize,
    pub splits_visited: usize,
    pub boxes_enqueued: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Exactly `k` neighbors in ascending distance, padded with [`Neighbor::SENTINEL`].
    pub neighbors: Vec<Neighbor>,
    pub stats: SearchStats,
    pub termination: Termination,
}

impl SearchOutcome {
    /// False when the point budget cut the search short.
    pub fn is_exact_or_bounded(&self) -> bool {
        self.termination != Termination::BudgetExhausted
    }

    /// Number of real (non-padding) neighbors.
    pub fn found(&self) -> usize {
        self.neighbors.iter().filter(|n| !n.is_sentinel()).count()
    }
}

/// State owned by one query call. Never shared between queries.
struct QueryContext<'a, C: Coordinate> {
    query: &'a [C],
    points: &'a PointSet<C>,
    error_factor: f64,
    max_points_visited: usize,
    allow_self_match: bool,
    nearest: BoundedNearestSet,
    queue: BoxPriorityQueue<NodeId>,
    stats: SearchStats,
}

impl<C: Coordinate> QueryContext<'_, C> {
    #[inline]
    fn budget_exhausted(&self) -> bool {
        self.max_points_visited != 0 && self.stats.points_visited > self.max_points_visited
    }
}

impl<C: Coordinate> KdTree<C> {
    /// The `k` nearest neighbors of `query` as squared distances, ascending.
    ///
    /// `budget` caps the number of scanned points, zero meaning unbounded.
    pub fn nearest(&self, query: &[C], k: usize, eps: f64, budget: usize) -> Result<Vec<Neighbor>> {
        let config = SearchConfig::default().with_eps(eps).with_budget(budget);
        self.search(query, k, &config).map(|outcome| outcome.neighbors)
    }

    /// Runs a priority search and reports the neighbors together with traversal statistics.
    pub fn search(&self, query: &[C], k: usize, config: &SearchConfig) -> Result<SearchOutcome> {
        self.validate_query(query, k, config)?;

        let mut ctx = QueryContext {
            query,
            points: &self.points,
            error_factor: (1.0 + config.eps) * (1.0 + config.eps),
            max_points_visited: config.max_points_visited,
            allow_self_match: config.allow_self_match,
            nearest: BoundedNearestSet::new(k),
            queue: BoxPriorityQueue::with_capacity(self.nodes.len()),
            stats: SearchStats::default(),
        };

        let root_dist = self.bbox.distance_sq(query);
        ctx.queue.insert(root_dist, self.root);

        let termination = loop {
            if !ctx.queue.non_empty() {
                break Termination::QueueExhausted;
            }
            if ctx.budget_exhausted() {
                break Termination::BudgetExhausted;
            }
            let Some((box_dist, node)) = ctx.queue.extract_min() else {
                break Termination::QueueExhausted;
            };
            if box_dist * ctx.error_factor >= ctx.nearest.max_key() {
                break Termination::ErrorBound;
            }
            self.visit(node, box_dist, &mut ctx);
        };

        log::trace!(
            "priority search stopped ({:?}): {} points, {} leaves, {} splits",
            termination,
            ctx.stats.points_visited,
            ctx.stats.leaves_visited,
            ctx.stats.splits_visited
        );
        if termination == Termination::BudgetExhausted {
            log::debug!(
                "point budget of {} exhausted after {} points, returning best-effort neighbors",
                config.max_points_visited,
                ctx.stats.points_visited
            );
        }
        if ctx.nearest.len() < k {
            log::debug!("padding {} of {} neighbor slots with sentinels", k - ctx.nearest.len(), k);
        }

        Ok(SearchOutcome {
            neighbors: ctx.nearest.into_padded(),
            stats: ctx.stats,
            termination,
        })
    }

    /// Answers many queries in parallel. Each query owns its own search state.
    pub fn nearest_batch(&self, queries: &PointSet<C>, k: usize, config: &SearchConfig) -> Result<Vec<Vec<Neighbor>>> {
        if queries.dim() != self.dim() {
            return Err(KdError::dimension_mismatch(self.dim(), queries.dim()));
        }
        (0..queries.len())
            .into_par_iter()
            .map(|i| self.search(queries.point(i), k, config).map(|outcome| outcome.neighbors))
            .collect()
    }

    fn validate_query(&self, query: &[C], k: usize, config: &SearchConfig) -> Result<()> {
        if k == 0 {
            return Err(KdError::invalid_argument("k must be at least 1"));
        }
        if self.is_empty() {
            return Err(KdError::invalid_argument("cannot search an empty tree"));
        }
        if query.len() != self.dim() {
            return Err(KdError::dimension_mismatch(self.dim(), query.len()));
        }
        if let Some(axis) = query.iter().position(|c| !c.to_f64().is_finite()) {
            return Err(KdError::invalid_argument(format!("query coordinate {} is not finite", axis)));
        }
        if !config.eps.is_finite() || config.eps < 0.0 {
            return Err(KdError::invalid_argument(format!("eps must be finite and non-negative, got {}", config.eps)));
        }
        if k > self.len() && config.shortfall == ShortfallPolicy::Fail {
            return Err(KdError::InsufficientData { requested: k, available: self.len() });
        }
        Ok(())
    }

    /// Processes one dequeued subtree.
    ///
    /// Descending into the nearer child is a tail call, so it runs as a loop:
    /// depth is bounded by the tree height without growing the call stack.
    fn visit(&self, mut node: NodeId, box_dist: f64, ctx: &mut QueryContext<'_, C>) {
        loop {
            match &self.nodes[node.index()] {
                KdNode::Split(split) => match search_split(split, box_dist, ctx) {
                    Some(near) => node = near,
                    None => return,
                },
                KdNode::Leaf(leaf) => {
                    search_leaf(leaf, ctx);
                    return;
                }
            }
        }
    }
}

/// Enqueues the far child of `split` and returns the near child to continue with.
///
/// The near child shares the parent's cell distance: the query already lies on
/// its side of the cut, so the cut axis contributes the same term.
#[inline]
fn search_split<C: Coordinate>(split: &SplitNode, box_dist: f64, ctx: &mut QueryContext<'_, C>) -> Option<NodeId> {
    ctx.stats.splits_visited += 1;

    let q = ctx.query[split.cut_axis].to_f64();
    let cut_diff = q - split.cut_value;

    let (near, far, box_diff) = if cut_diff < 0.0 {
        (split.low, split.high, (split.cut_bounds[0] - q).max(0.0))
    } else {
        (split.high, split.low, (q - split.cut_bounds[1]).max(0.0))
    };

    if let Some(far) = far {
        // Swap the cut axis term: distance to this cell's side for distance to the cut.
        let far_dist = box_dist - box_diff * box_diff + cut_diff * cut_diff;
        ctx.queue.insert(far_dist, far);
        ctx.stats.boxes_enqueued += 1;
    }
    near
}

/// Scans a bucket, feeding every point that beats the current bound into the nearest set.
#[inline]
fn search_leaf<C: Coordinate>(leaf: &LeafNode, ctx: &mut QueryContext<'_, C>) {
    ctx.stats.leaves_visited += 1;

    for &i in &leaf.bucket {
        prefetch(ctx.points.point(i));
    }

    let mut min_dist = ctx.nearest.max_key();
    for &i in &leaf.bucket {
        let Some(dist) = distance_sq_bounded(ctx.query, ctx.points.point(i), min_dist) else {
            continue;
        };
        if ctx.allow_self_match || dist != 0.0 {
            ctx.nearest.insert(dist, i);
            min_dist = ctx.nearest.max_key();
        }
    }

    ctx.stats.points_visited += leaf.bucket.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundingBox;
    use crate::config::BuildConfig;

    fn line_tree(n: usize, bucket: usize) -> KdTree<f64> {
        let coords: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let points = PointSet::new(coords, 1).unwrap();
        KdTree::build_with(points, BuildConfig::default().with_bucket_size(bucket)).unwrap()
    }

    #[test]
    fn test_far_child_distance_is_exact() {
        let split = SplitNode {
            cut_axis: 0,
            cut_value: 5.0,
            cut_bounds: [2.0, 10.0],
            low: Some(NodeId(1)),
            high: Some(NodeId(2)),
        };
        let points = PointSet::new(vec![0.0, 0.0], 2).unwrap();
        // Query left of the whole cell: x contributes (2 - 0)^2, y contributes 9.
        let query = [0.0, 3.0];
        let mut ctx = QueryContext {
            query: &query,
            points: &points,
            error_factor: 1.0,
            max_points_visited: 0,
            allow_self_match: true,
            nearest: BoundedNearestSet::new(1),
            queue: BoxPriorityQueue::new(),
            stats: SearchStats::default(),
        };
        let near = search_split(&split, 4.0 + 9.0, &mut ctx);
        assert_eq!(near, Some(NodeId(1)));
        // Far cell starts at x = 5: 25 + 9.
        assert_eq!(ctx.queue.extract_min(), Some((34.0, NodeId(2))));
    }

    #[test]
    fn test_trivial_far_child_not_enqueued() {
        let split = SplitNode {
            cut_axis: 0,
            cut_value: 1.0,
            cut_bounds: [0.0, 2.0],
            low: Some(NodeId(1)),
            high: None,
        };
        let points = PointSet::new(vec![0.0], 1).unwrap();
        let query = [0.5];
        let mut ctx = QueryContext {
            query: &query,
            points: &points,
            error_factor: 1.0,
            max_points_visited: 0,
            allow_self_match: true,
            nearest: BoundedNearestSet::new(1),
            queue: BoxPriorityQueue::new(),
            stats: SearchStats::default(),
        };
        assert_eq!(search_split(&split, 0.0, &mut ctx), Some(NodeId(1)));
        assert!(!ctx.queue.non_empty());
        assert_eq!(ctx.stats.boxes_enqueued, 0);
    }

    #[test]
    fn test_leaf_counts_whole_bucket_and_skips_self() {
        let points = PointSet::new(vec![1.0, 2.0, 3.0], 1).unwrap();
        let query = [1.0];
        let mut ctx = QueryContext {
            query: &query,
            points: &points,
            error_factor: 1.0,
            max_points_visited: 0,
            allow_self_match: false,
            nearest: BoundedNearestSet::new(1),
            queue: BoxPriorityQueue::new(),
            stats: SearchStats::default(),
        };
        search_leaf(&LeafNode { bucket: vec![0, 1, 2] }, &mut ctx);
        assert_eq!(ctx.stats.points_visited, 3);
        assert_eq!(ctx.nearest.ith_smallest(0), Neighbor::new(1.0, 1));
    }

    #[test]
    fn test_exact_search_on_line() {
        let tree = line_tree(100, 4);
        let result = tree.nearest(&[41.2], 3, 0.0, 0).unwrap();
        let indices: Vec<usize> = result.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![41, 42, 40]);
        assert!((result[0].distance - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_query_outside_bounding_box() {
        let tree = line_tree(50, 4);
        let outcome = tree.search(&[-10.0], 2, &SearchConfig::default()).unwrap();
        assert_eq!(outcome.neighbors[0], Neighbor::new(100.0, 0));
        assert_eq!(outcome.neighbors[1], Neighbor::new(121.0, 1));
        assert!(outcome.is_exact_or_bounded());
        // Only the leftmost buckets are touched.
        assert!(outcome.stats.points_visited < 50);
    }

    #[test]
    fn test_validation_errors() {
        let tree = line_tree(10, 4);
        assert!(matches!(tree.nearest(&[1.0], 0, 0.0, 0), Err(KdError::InvalidArgument(_))));
        assert!(matches!(
            tree.nearest(&[1.0, 2.0], 1, 0.0, 0),
            Err(KdError::DimensionMismatch { expected: 1, found: 2 })
        ));
        assert!(matches!(tree.nearest(&[1.0], 1, -0.5, 0), Err(KdError::InvalidArgument(_))));
        assert!(matches!(tree.nearest(&[1.0], 1, f64::NAN, 0), Err(KdError::InvalidArgument(_))));
        assert!(matches!(tree.nearest(&[f64::NAN], 1, 0.0, 0), Err(KdError::InvalidArgument(_))));
        assert!(matches!(
            tree.nearest(&[1.0], 11, 0.0, 0),
            Err(KdError::InsufficientData { requested: 11, available: 10 })
        ));

        let empty = KdTree::build(PointSet::<f64>::new(Vec::new(), 1).unwrap()).unwrap();
        assert!(matches!(empty.nearest(&[1.0], 1, 0.0, 0), Err(KdError::InvalidArgument(_))));
    }

    #[test]
    fn test_hand_built_tree_with_trivial_child() {
        let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]]).unwrap();
        let nodes = vec![
            KdNode::Split(SplitNode {
                cut_axis: 0,
                cut_value: 3.0,
                cut_bounds: [0.0, 4.0],
                low: Some(NodeId(1)),
                high: None,
            }),
            KdNode::Leaf(LeafNode { bucket: vec![2, 0, 1] }),
        ];
        let bbox = BoundingBox::new(vec![0.0, 0.0], vec![4.0, 1.0]);
        let tree = KdTree::from_parts(points, nodes, NodeId(0), bbox).unwrap();

        // Query on the empty high side still reaches the low leaf through the root.
        let result = tree.nearest(&[3.5, 0.0], 1, 0.0, 0).unwrap();
        assert_eq!(result[0], Neighbor::new(2.25, 2));
    }
}
