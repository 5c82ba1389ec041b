use crate::bounds::BoundingBox;
use crate::config::BuildConfig;
use crate::error::{KdError, Result};
use crate::point::{Coordinate, PointSet};
use crate::tree::{KdNode, KdTree, LeafNode, NodeId, SplitNode};

/// Reference tree builder: median cuts along the axis of widest spread.
///
/// Each split records its cell interval along the cut axis, derived from the
/// root bounding box by successive cuts, so the incremental box distance used
/// during search is exact.
pub struct KdTreeBuilder {
    config: BuildConfig,
}

impl KdTreeBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn build<C: Coordinate>(&self, points: PointSet<C>) -> Result<KdTree<C>> {
        if self.config.bucket_size == 0 {
            return Err(KdError::invalid_argument("bucket size must be at least 1"));
        }
        let dim = points.dim();
        let count = points.len();
        let bbox = points
            .bounding_box()
            .unwrap_or_else(|| BoundingBox::new(vec![0.0; dim], vec![0.0; dim]));

        let mut state = BuildState {
            points: &points,
            indices: (0..count).collect(),
            nodes: Vec::with_capacity(2 * count / self.config.bucket_size + 1),
            bucket_size: self.config.bucket_size,
        };
        let root = state.build_recursive(0, count, bbox.clone())?;
        let nodes = state.nodes;

        log::debug!(
            "built kd-tree: {} points, dim {}, {} nodes, bucket size {}",
            count,
            dim,
            nodes.len(),
            self.config.bucket_size
        );

        Ok(KdTree { points, nodes, root, bbox })
    }
}

impl Default for KdTreeBuilder {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

struct BuildState<'a, C: Coordinate> {
    points: &'a PointSet<C>,
    indices: Vec<usize>,
    nodes: Vec<KdNode>,
    bucket_size: usize,
}

impl<C: Coordinate> BuildState<'_, C> {
    fn push(&mut self, node: KdNode) -> Result<NodeId> {
        let id = u32::try_from(self.nodes.len())
            .map_err(|_| KdError::invalid_argument("tree exceeds u32::MAX nodes"))?;
        self.nodes.push(node);
        Ok(NodeId(id))
    }

    fn leaf(&mut self, start: usize, end: usize) -> Result<NodeId> {
        let bucket = self.indices[start..end].to_vec();
        self.push(KdNode::Leaf(LeafNode { bucket }))
    }

    fn build_recursive(&mut self, start: usize, end: usize, cell: BoundingBox) -> Result<NodeId> {
        let count = end - start;
        if count <= self.bucket_size {
            return self.leaf(start, end);
        }

        // Compute spread for this range
        let dim = self.points.dim();
        let mut min = vec![f64::INFINITY; dim];
        let mut max = vec![f64::NEG_INFINITY; dim];
        for &idx in &self.indices[start..end] {
            for (axis, c) in self.points.point(idx).iter().enumerate() {
                let v = c.to_f64();
                if v < min[axis] { min[axis] = v; }
                if v > max[axis] { max[axis] = v; }
            }
        }
        let spread = BoundingBox::new(min, max);
        let axis = spread.widest_axis();
        // Every point identical: nothing left to cut.
        if spread.hi[axis] <= spread.lo[axis] {
            return self.leaf(start, end);
        }

        // Median split
        let points = self.points;
        self.indices[start..end].select_nth_unstable_by(count / 2, |&a, &b| {
            points.coordinate(a, axis).to_f64().total_cmp(&points.coordinate(b, axis).to_f64())
        });
        let mid = start + count / 2;
        let cut_value = points.coordinate(self.indices[mid], axis).to_f64();

        let node_id = self.push(KdNode::Leaf(LeafNode { bucket: Vec::new() }))?;

        let cut_bounds = [cell.lo[axis], cell.hi[axis]];
        let mut low_cell = cell.clone();
        low_cell.hi[axis] = cut_value;
        let mut high_cell = cell;
        high_cell.lo[axis] = cut_value;

        let low = self.build_recursive(start, mid, low_cell)?;
        let high = self.build_recursive(mid, end, high_cell)?;

        self.nodes[node_id.index()] = KdNode::Split(SplitNode {
            cut_axis: axis,
            cut_value,
            cut_bounds,
            low: Some(low),
            high: Some(high),
        });
        Ok(node_id)
    }
}

impl<C: Coordinate> KdTree<C> {
    /// Builds a tree with the default [`BuildConfig`].
    pub fn build(points: PointSet<C>) -> Result<Self> {
        KdTreeBuilder::default().build(points)
    }

    pub fn build_with(points: PointSet<C>, config: BuildConfig) -> Result<Self> {
        KdTreeBuilder::new(config).build(points)
    }
}
