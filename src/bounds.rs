use crate::point::Coordinate;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with a per-axis `[lo, hi]` interval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lo: Vec<f64>,
    pub hi: Vec<f64>,
}

impl BoundingBox {
    pub fn new(lo: Vec<f64>, hi: Vec<f64>) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.lo.len()
    }

    /// True when both corner vectors agree in length and every interval is ordered.
    pub fn is_valid(&self) -> bool {
        self.lo.len() == self.hi.len() && self.lo.iter().zip(&self.hi).all(|(l, h)| l <= h)
    }

    /// Squared distance from `q` to the nearest point of the box, zero when `q` is inside.
    ///
    /// This is the lower bound used to seed the root of a priority search.
    pub fn distance_sq<C: Coordinate>(&self, q: &[C]) -> f64 {
        let mut d2 = 0.0;
        for (axis, c) in q.iter().enumerate() {
            let v = c.to_f64();
            if v < self.lo[axis] {
                let t = self.lo[axis] - v;
                d2 += t * t;
            } else if v > self.hi[axis] {
                let t = v - self.hi[axis];
                d2 += t * t;
            }
        }
        d2
    }

    pub fn contains<C: Coordinate>(&self, q: &[C]) -> bool {
        q.iter()
            .enumerate()
            .all(|(axis, c)| c.to_f64() >= self.lo[axis] && c.to_f64() <= self.hi[axis])
    }

    /// Index of the axis with the widest extent.
    pub fn widest_axis(&self) -> usize {
        let mut best = 0;
        let mut best_width = f64::NEG_INFINITY;
        for axis in 0..self.dim() {
            let w = self.hi[axis] - self.lo[axis];
            if w > best_width {
                best_width = w;
                best = axis;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_inside_is_zero() {
        let b = BoundingBox::new(vec![0.0, 0.0], vec![10.0, 10.0]);
        assert_eq!(b.distance_sq(&[5.0, 5.0]), 0.0);
        assert_eq!(b.distance_sq(&[0.0, 10.0]), 0.0);
        assert!(b.contains(&[10.0, 0.0]));
    }

    #[test]
    fn test_distance_outside() {
        let b = BoundingBox::new(vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]);
        // 2 below on x, 3 above on z
        assert_eq!(b.distance_sq(&[-2.0, 0.5, 4.0]), 4.0 + 9.0);
        assert!(!b.contains(&[-2.0, 0.5, 4.0]));
    }

    #[test]
    fn test_byte_coordinates() {
        let b = BoundingBox::new(vec![10.0, 10.0], vec![20.0, 20.0]);
        assert_eq!(b.distance_sq(&[0u8, 25]), 100.0 + 25.0);
    }

    #[test]
    fn test_widest_axis() {
        let b = BoundingBox::new(vec![0.0, 0.0, 0.0], vec![1.0, 7.0, 3.0]);
        assert_eq!(b.widest_axis(), 1);
        assert!(b.is_valid());
        assert!(!BoundingBox::new(vec![2.0], vec![1.0]).is_valid());
    }
}
