use crate::config::{BuildConfig, SearchConfig};
use crate::error::KdError;
use crate::nearest::Neighbor;
use crate::point::PointSet;
use crate::search::Termination;
use crate::tree::KdTree;
use js_sys::Array;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_SENTINEL: &'static str = r#"
export const NO_INDEX = -1;
"#;

/// Reads a JS array of equally long numeric arrays into a flat buffer.
pub fn parse_js_rows(val: &JsValue, dim: usize) -> Option<Vec<f64>> {
    let rows = val.dyn_ref::<Array>()?;
    let mut coords = Vec::with_capacity(rows.length() as usize * dim);
    for row in rows.iter() {
        let arr = row.dyn_ref::<Array>()?;
        if arr.length() != dim as u32 {
            return None;
        }
        for i in 0..dim {
            coords.push(arr.get(i as u32).as_f64()?);
        }
    }
    Some(coords)
}

fn to_js_error(e: KdError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

const JS_NO_INDEX: i32 = -1;

/// Indices cross into JavaScript as `i32`, so an index may hold at most `i32::MAX` points.
fn ensure_js_addressable(count: usize) -> crate::Result<()> {
    if i32::try_from(count).is_err() {
        return Err(KdError::invalid_argument(format!(
            "{} points exceed the {} addressable from JavaScript",
            count,
            i32::MAX
        )));
    }
    Ok(())
}

/// Sentinels, and any index that does not fit, map to `NO_INDEX`.
fn js_index(n: &Neighbor) -> i32 {
    i32::try_from(n.index).unwrap_or(JS_NO_INDEX)
}

/// Result of a nearest neighbor query, in ascending distance.
#[wasm_bindgen]
pub struct NearestResult {
    neighbors: Vec<Neighbor>,
    points_visited: usize,
    best_effort: bool,
}

#[wasm_bindgen]
impl NearestResult {
    /// Squared distances. Padding slots hold `Infinity`.
    #[wasm_bindgen(getter)]
    pub fn distances(&self) -> Vec<f64> {
        self.neighbors.iter().map(|n| n.distance).collect()
    }

    /// Point indices. Padding slots hold `NO_INDEX` (-1).
    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> Vec<i32> {
        self.neighbors
            .iter()
            .map(js_index)
            .collect()
    }

    #[wasm_bindgen(getter, js_name = pointsVisited)]
    pub fn points_visited(&self) -> usize {
        self.points_visited
    }

    /// True when the point budget cut the search short.
    #[wasm_bindgen(getter, js_name = bestEffort)]
    pub fn best_effort(&self) -> bool {
        self.best_effort
    }
}

/// A kd-tree over `f64` points for JavaScript callers.
#[wasm_bindgen]
pub struct KdIndex {
    inner: KdTree<f64>,
}

#[wasm_bindgen]
impl KdIndex {
    /// Builds an index from a flat coordinate array `[x0, y0, ..., x1, y1, ...]`.
    #[wasm_bindgen(constructor)]
    pub fn new(points: &[f64], dim: usize, bucket_size: usize) -> Result<KdIndex, JsValue> {
        let points = PointSet::new(points.to_vec(), dim).map_err(to_js_error)?;
        ensure_js_addressable(points.len()).map_err(to_js_error)?;
        let config = BuildConfig::default().with_bucket_size(bucket_size);
        let inner = KdTree::build_with(points, config).map_err(to_js_error)?;
        Ok(KdIndex { inner })
    }

    /// Builds an index from an array of point arrays.
    #[wasm_bindgen(js_name = fromRows)]
    pub fn from_rows(rows: JsValue, dim: usize, bucket_size: usize) -> Result<KdIndex, JsValue> {
        let coords = parse_js_rows(&rows, dim)
            .ok_or_else(|| JsValue::from_str("expected an array of numeric arrays of equal length"))?;
        KdIndex::new(&coords, dim, bucket_size)
    }

    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(getter)]
    pub fn dim(&self) -> usize {
        self.inner.dim()
    }

    /// Finds the `k` nearest neighbors of `query`.
    ///
    /// `eps` is the relative error tolerance, `budget` caps the number of
    /// scanned points (zero for unbounded).
    pub fn nearest(&self, query: &[f64], k: usize, eps: f64, budget: usize) -> Result<NearestResult, JsValue> {
        let config = SearchConfig::default().with_eps(eps).with_budget(budget);
        let outcome = self.inner.search(query, k, &config).map_err(to_js_error)?;
        Ok(NearestResult {
            best_effort: outcome.termination == Termination::BudgetExhausted,
            points_visited: outcome.stats.points_visited,
            neighbors: outcome.neighbors,
        })
    }

    /// Answers a flat array of queries in parallel, returning `k` indices per query.
    #[wasm_bindgen(js_name = nearestBatch)]
    pub fn nearest_batch(&self, queries: &[f64], k: usize, eps: f64) -> Result<Vec<i32>, JsValue> {
        let queries = PointSet::new(queries.to_vec(), self.inner.dim()).map_err(to_js_error)?;
        let config = SearchConfig::default().with_eps(eps);
        let results = self.inner.nearest_batch(&queries, k, &config).map_err(to_js_error)?;
        Ok(results
            .iter()
            .flatten()
            .map(js_index)
            .collect())
    }
}
