//! Squared Euclidean distance kernels for the leaf scan.

use crate::point::Coordinate;

/// Number of axes accumulated between two checks against the pruning bound.
pub const CHUNK_AXES: usize = 32;

/// Squared Euclidean distance, abandoned as soon as a partial sum exceeds `bound`.
///
/// Returns `None` if the point was abandoned, otherwise the full distance.
/// The scan always covers exactly `q.len()` axes; the last chunk may be shorter
/// than [`CHUNK_AXES`].
#[inline]
pub fn distance_sq_bounded<C: Coordinate>(q: &[C], p: &[C], bound: f64) -> Option<f64> {
    debug_assert_eq!(q.len(), p.len());
    let mut dist = 0.0;
    for (qc, pc) in q.chunks(CHUNK_AXES).zip(p.chunks(CHUNK_AXES)) {
        dist += C::chunk_distance_sq(qc, pc);
        if dist > bound {
            return None;
        }
    }
    Some(dist)
}

/// Plain squared Euclidean distance over all axes.
#[inline]
pub fn distance_sq<C: Coordinate>(q: &[C], p: &[C]) -> f64 {
    C::chunk_distance_sq(q, p)
}

/// Hints the CPU to start loading `data` into cache.
///
/// Only active with the `prefetch` feature on x86_64; a no-op otherwise.
#[inline]
pub fn prefetch<C>(data: &[C]) {
    #[cfg(all(feature = "prefetch", target_arch = "x86_64"))]
    unsafe {
        use std::arch::x86_64::{_mm_prefetch, _MM_HINT_NTA};

        let ptr = data.as_ptr() as *const i8;
        let bytes = std::mem::size_of_val(data);
        let mut offset = 0;
        while offset < bytes {
            _mm_prefetch(ptr.add(offset), _MM_HINT_NTA);
            offset += 64;
        }
    }
    #[cfg(not(all(feature = "prefetch", target_arch = "x86_64")))]
    let _ = data;
}

#[cfg(feature = "simd")]
pub(crate) mod simd {
    use wide::f64x4;

    #[inline]
    fn lanes(a: [f64; 4], b: [f64; 4]) -> f64x4 {
        let d = f64x4::new(a) - f64x4::new(b);
        d * d
    }

    pub fn distance_sq_f64(a: &[f64], b: &[f64]) -> f64 {
        let mut acc = f64x4::splat(0.0);
        let ca = a.chunks_exact(4);
        let cb = b.chunks_exact(4);
        let (ra, rb) = (ca.remainder(), cb.remainder());
        for (x, y) in ca.zip(cb) {
            acc += lanes([x[0], x[1], x[2], x[3]], [y[0], y[1], y[2], y[3]]);
        }
        let mut sum = acc.reduce_add();
        for (x, y) in ra.iter().zip(rb) {
            let t = x - y;
            sum += t * t;
        }
        sum
    }

    pub fn distance_sq_f32(a: &[f32], b: &[f32]) -> f64 {
        let mut acc = f64x4::splat(0.0);
        let ca = a.chunks_exact(4);
        let cb = b.chunks_exact(4);
        let (ra, rb) = (ca.remainder(), cb.remainder());
        for (x, y) in ca.zip(cb) {
            acc += lanes(
                [x[0] as f64, x[1] as f64, x[2] as f64, x[3] as f64],
                [y[0] as f64, y[1] as f64, y[2] as f64, y[3] as f64],
            );
        }
        let mut sum = acc.reduce_add();
        for (x, y) in ra.iter().zip(rb) {
            let t = *x as f64 - *y as f64;
            sum += t * t;
        }
        sum
    }
}
