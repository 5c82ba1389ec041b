use crate::bounds::BoundingBox;
use crate::error::{KdError, Result};
use crate::point::{Coordinate, PointSet};

/// Index of a node inside the tree's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interior node splitting its cell by an axis-aligned hyperplane.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitNode {
    /// Axis the cut is orthogonal to.
    pub cut_axis: usize,
    /// Position of the cutting plane along `cut_axis`.
    pub cut_value: f64,
    /// This node's own `[lo, hi]` interval along `cut_axis`.
    pub cut_bounds: [f64; 2],
    /// Child holding the points at or below the cut. `None` if that side is empty.
    pub low: Option<NodeId>,
    /// Child holding the points at or above the cut. `None` if that side is empty.
    pub high: Option<NodeId>,
}

/// Terminal node holding a bucket of point indices.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafNode {
    pub bucket: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum KdNode {
    Split(SplitNode),
    Leaf(LeafNode),
}

/// A static kd-tree: node arena, root bounding box and the indexed points.
///
/// The tree is immutable once built and may be shared by any number of
/// concurrent queries without synchronization.
#[derive(Clone, Debug)]
pub struct KdTree<C: Coordinate> {
    pub(crate) points: PointSet<C>,
    pub(crate) nodes: Vec<KdNode>,
    pub(crate) root: NodeId,
    pub(crate) bbox: BoundingBox,
}

impl<C: Coordinate> KdTree<C> {
    /// Assembles a tree produced by an external builder, checking its structure.
    ///
    /// The checks are:
    /// - `bbox` has the points' dimension and ordered intervals;
    /// - every node reference is in range and every node is reached at most once;
    /// - cut axes are below the dimension and `cut_bounds` sit inside the cell
    ///   inherited from the parent, with the cut value between them;
    /// - every point is referenced by exactly one leaf and lies inside its leaf's cell.
    pub fn from_parts(points: PointSet<C>, nodes: Vec<KdNode>, root: NodeId, bbox: BoundingBox) -> Result<Self> {
        let dim = points.dim();
        if bbox.dim() != dim || bbox.hi.len() != dim {
            return Err(KdError::dimension_mismatch(dim, bbox.dim()));
        }
        if !bbox.is_valid() {
            return Err(KdError::invalid_tree("root bounding box has an inverted interval"));
        }
        if root.index() >= nodes.len() {
            return Err(KdError::invalid_tree(format!("root {} out of range", root.0)));
        }

        let mut node_seen = vec![false; nodes.len()];
        let mut point_seen = vec![false; points.len()];
        let mut stack = vec![(root, bbox.clone())];

        while let Some((id, cell)) = stack.pop() {
            let i = id.index();
            if i >= nodes.len() {
                return Err(KdError::invalid_tree(format!("node reference {} out of range", id.0)));
            }
            if node_seen[i] {
                return Err(KdError::invalid_tree(format!("node {} is reachable more than once", id.0)));
            }
            node_seen[i] = true;

            match &nodes[i] {
                KdNode::Split(split) => {
                    let axis = split.cut_axis;
                    if axis >= dim {
                        return Err(KdError::invalid_tree(format!(
                            "node {} cuts axis {} of a {}-dimensional space",
                            id.0, axis, dim
                        )));
                    }
                    let [lo, hi] = split.cut_bounds;
                    let ordered = cell.lo[axis] <= lo && lo <= split.cut_value && split.cut_value <= hi && hi <= cell.hi[axis];
                    if !ordered {
                        return Err(KdError::invalid_tree(format!(
                            "node {} has cut {} with bounds [{}, {}] outside its cell [{}, {}]",
                            id.0, split.cut_value, lo, hi, cell.lo[axis], cell.hi[axis]
                        )));
                    }
                    if let Some(low) = split.low {
                        let mut low_cell = cell.clone();
                        low_cell.lo[axis] = lo;
                        low_cell.hi[axis] = split.cut_value;
                        stack.push((low, low_cell));
                    }
                    if let Some(high) = split.high {
                        let mut high_cell = cell;
                        high_cell.lo[axis] = split.cut_value;
                        high_cell.hi[axis] = hi;
                        stack.push((high, high_cell));
                    }
                }
                KdNode::Leaf(leaf) => {
                    for &p in &leaf.bucket {
                        if p >= points.len() {
                            return Err(KdError::invalid_tree(format!("leaf {} references point {} out of range", id.0, p)));
                        }
                        if point_seen[p] {
                            return Err(KdError::invalid_tree(format!("point {} is stored in more than one leaf", p)));
                        }
                        point_seen[p] = true;
                        if !cell.contains(points.point(p)) {
                            return Err(KdError::invalid_tree(format!("point {} lies outside the cell of leaf {}", p, id.0)));
                        }
                    }
                }
            }
        }

        if let Some(missing) = point_seen.iter().position(|seen| !seen) {
            return Err(KdError::invalid_tree(format!("point {} is not reachable from any leaf", missing)));
        }

        Ok(Self { points, nodes, root, bbox })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.points.dim()
    }

    /// Number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &PointSet<C> {
        &self.points
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node behind `id`, or `None` when `id` does not belong to this tree's arena.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&KdNode> {
        self.nodes.get(id.index())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, KdNode::Leaf(_))).count()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((id, d)) = stack.pop() {
            max_depth = max_depth.max(d);
            if let Some(KdNode::Split(split)) = self.node(id) {
                stack.extend(split.low.map(|c| (c, d + 1)));
                stack.extend(split.high.map(|c| (c, d + 1)));
            }
        }
        max_depth
    }
}
