//! # kdpri
//!
//! `kdpri` answers exact and approximate k-nearest-neighbor queries over a
//! static kd-tree by priority search, designed to be used in Rust as well as
//! compiled to WebAssembly (WASM). The tree is built once and may then be
//! queried from any number of threads.
//!
//! ## Features
//!
//! - **Priority search**: cells are visited closest first, with an incremental
//!   cell distance and an immediate descent into the child on the query's side.
//! - **Approximate queries**: an error tolerance `eps` lets the search stop once
//!   no remaining cell can beat the current answer by more than a `(1 + eps)` factor.
//! - **Point budgets**: an optional cap on scanned points for best-effort answers.
//! - **Compact coordinates**: points may be stored as `u8`, `i16`, `f32` or `f64`.
//! - **WASM-first**: a `wasm-bindgen` facade ([`KdIndex`]) for JavaScript and TypeScript.
//!
//! All reported distances are **squared** Euclidean distances.
//!
//! ## Example
//!
//! ```
//! use kdpri::{KdTree, PointSet};
//!
//! let points = PointSet::from_rows(&[[0.0, 0.0], [1.0, 0.0], [5.0, 5.0]]).unwrap();
//! let tree = KdTree::build(points).unwrap();
//! let nearest = tree.nearest(&[0.9, 0.1], 2, 0.0, 0).unwrap();
//! assert_eq!(nearest[0].index, 1);
//! assert_eq!(nearest[1].index, 0);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry point is [`KdTree`]: build it with [`KdTree::build`] or
//! hand over an externally built tree through [`KdTree::from_parts`], then call
//! [`KdTree::nearest`] or [`KdTree::search`].

mod bounds;
mod builder;
mod config;
pub mod distance;
mod error;
mod nearest;
mod point;
mod queue;
mod search;
mod tree;
mod wasm;

pub use bounds::BoundingBox;
pub use builder::KdTreeBuilder;
pub use config::BuildConfig;
pub use config::SearchConfig;
pub use config::ShortfallPolicy;
pub use error::KdError;
pub use error::Result;
pub use nearest::BoundedNearestSet;
pub use nearest::Neighbor;
pub use point::Coordinate;
pub use point::PointSet;
pub use queue::BoxPriorityQueue;
pub use search::SearchOutcome;
pub use search::SearchStats;
pub use search::Termination;
pub use tree::KdNode;
pub use tree::KdTree;
pub use tree::LeafNode;
pub use tree::NodeId;
pub use tree::SplitNode;
pub use wasm::KdIndex;
pub use wasm::NearestResult;
