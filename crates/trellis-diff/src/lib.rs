//! # trellis-diff
//!
//! Diff/patch engines for the Trellis provenance engine.
//!
//! This crate provides:
//! - The [`DiffEngine`] trait: compute a delta between two states and
//!   re-derive the target from the base plus that delta
//! - [`JsonDiff`], a structural engine over the serde data model
//! - [`WholeState`], a trivial engine whose delta is the target itself
//! - [`JsonPath`] for addressing values inside a serialized state
//!
//! ## Contract
//!
//! For every engine and every pair of states it is given,
//! `patch(base, compute(base, target)?)?` equals `target`.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use trellis_diff::{DiffEngine, JsonDiff};
//!
//! let engine = JsonDiff::new();
//! let base = json!({ "name": "", "todos": [] });
//! let target = json!({ "name": "New Name", "todos": [] });
//!
//! let delta = engine.compute(&base, &target).unwrap();
//! assert_eq!(delta.len(), 1);
//! assert_eq!(engine.patch(&base, &delta).unwrap(), target);
//! ```

mod engine;
mod error;
mod json;
mod path;

pub use engine::{DiffEngine, WholeState};
pub use error::{DiffError, PatchError};
pub use json::{DeltaOp, JsonDelta, JsonDiff};
pub use path::{JsonPath, PathSegment};
