//! The diff engine abstraction.

use crate::error::{DiffError, PatchError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Computes deltas between states and re-derives states from deltas.
///
/// Engines are pure and stateless from the caller's point of view. The
/// round-trip law must hold for every pair of states an engine is given:
/// `patch(base, &compute(base, target)?)? == *target`.
pub trait DiffEngine<S> {
    /// The delta representation stored inside diff nodes.
    type Delta: Clone + Debug + Serialize + DeserializeOwned;

    /// Compute the delta that turns `base` into `target`.
    fn compute(&self, base: &S, target: &S) -> Result<Self::Delta, DiffError>;

    /// Apply `delta` to `base`, producing a fresh state.
    ///
    /// `base` is never modified.
    fn patch(&self, base: &S, delta: &Self::Delta) -> Result<S, PatchError>;
}

/// An engine whose delta is simply the full target state.
///
/// Useful for states that are cheap to clone or that have no meaningful
/// structure to diff. Storage cost equals storing every node `Complete`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WholeState;

impl<S> DiffEngine<S> for WholeState
where
    S: Clone + Debug + Serialize + DeserializeOwned,
{
    type Delta = S;

    fn compute(&self, _base: &S, target: &S) -> Result<S, DiffError> {
        Ok(target.clone())
    }

    fn patch(&self, _base: &S, delta: &S) -> Result<S, PatchError> {
        Ok(delta.clone())
    }
}
