use crate::bounds::BoundingBox;
use crate::error::{KdError, Result};
use rand::prelude::*;
use rand::rngs::StdRng;

/// A scalar type usable as a point coordinate.
///
/// Coordinates are widened to `f64` before any arithmetic, so distances are
/// always reported as `f64` squared Euclidean distances regardless of storage type.
pub trait Coordinate: Copy + Send + Sync + PartialOrd + std::fmt::Debug + 'static {
    fn to_f64(self) -> f64;

    /// Squared Euclidean distance between two equally sized slices.
    ///
    /// The `simd` feature overrides this for floating point storage.
    #[inline]
    fn chunk_distance_sq(a: &[Self], b: &[Self]) -> f64 {
        let mut sum = 0.0;
        for (x, y) in a.iter().zip(b.iter()) {
            let t = x.to_f64() - y.to_f64();
            sum += t * t;
        }
        sum
    }
}

impl Coordinate for u8 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Coordinate for i16 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Coordinate for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[cfg(feature = "simd")]
    #[inline]
    fn chunk_distance_sq(a: &[Self], b: &[Self]) -> f64 {
        crate::distance::simd::distance_sq_f32(a, b)
    }
}

impl Coordinate for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[cfg(feature = "simd")]
    #[inline]
    fn chunk_distance_sq(a: &[Self], b: &[Self]) -> f64 {
        crate::distance::simd::distance_sq_f64(a, b)
    }
}

/// Flat, row-major storage for `n` points of a fixed dimension.
///
/// Point `i` occupies `coords[i * dim..(i + 1) * dim]`.
#[derive(Clone, Debug)]
pub struct PointSet<C: Coordinate> {
    coords: Vec<C>,
    dim: usize,
}

impl<C: Coordinate> PointSet<C> {
    /// Wraps a flat coordinate buffer.
    ///
    /// Fails when `dim` is zero, the buffer length is not a multiple of `dim`,
    /// or a coordinate is NaN or infinite.
    pub fn new(coords: Vec<C>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(KdError::invalid_argument("dimension must be at least 1"));
        }
        if coords.len() % dim != 0 {
            return Err(KdError::invalid_argument(format!(
                "coordinate buffer of length {} is not a multiple of dimension {}",
                coords.len(),
                dim
            )));
        }
        if let Some(pos) = coords.iter().position(|c| !c.to_f64().is_finite()) {
            return Err(KdError::invalid_argument(format!(
                "coordinate {} of point {} is not finite",
                pos % dim,
                pos / dim
            )));
        }
        Ok(Self { coords, dim })
    }

    /// Builds a point set from individual rows, all of which must share one length.
    pub fn from_rows<R: AsRef<[C]>>(rows: &[R]) -> Result<Self> {
        let dim = rows
            .first()
            .map(|r| r.as_ref().len())
            .ok_or_else(|| KdError::invalid_argument("no points given"))?;
        let mut coords = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(KdError::dimension_mismatch(dim, row.len()));
            }
            coords.extend_from_slice(row);
        }
        Self::new(coords, dim)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len() / self.dim
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates of point `index`.
    #[inline]
    pub fn point(&self, index: usize) -> &[C] {
        let start = index * self.dim;
        &self.coords[start..start + self.dim]
    }

    #[inline]
    pub fn coordinate(&self, index: usize, axis: usize) -> C {
        self.coords[index * self.dim + axis]
    }

    pub fn coords(&self) -> &[C] {
        &self.coords
    }

    pub fn iter(&self) -> impl Iterator<Item = &[C]> {
        self.coords.chunks_exact(self.dim)
    }

    /// Tight axis-aligned box around every point, or `None` for an empty set.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if self.is_empty() {
            return None;
        }
        let mut lo = vec![f64::INFINITY; self.dim];
        let mut hi = vec![f64::NEG_INFINITY; self.dim];
        for p in self.iter() {
            for (axis, c) in p.iter().enumerate() {
                let v = c.to_f64();
                if v < lo[axis] { lo[axis] = v; }
                if v > hi[axis] { hi[axis] = v; }
            }
        }
        Some(BoundingBox::new(lo, hi))
    }
}

impl PointSet<f64> {
    /// Draws `count` points uniformly inside `bounds` from a seeded generator.
    pub fn random(count: usize, bounds: &BoundingBox, seed: u64) -> Self {
        let dim = bounds.dim();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut coords = Vec::with_capacity(count * dim);
        for _ in 0..count {
            for axis in 0..dim {
                let w = bounds.hi[axis] - bounds.lo[axis];
                coords.push(bounds.lo[axis] + rng.r#gen::<f64>() * w);
            }
        }
        Self { coords, dim: dim.max(1) }
    }
}
