//! Action descriptors: what to apply, and how to record it.
//!
//! An [`Action`] bundles a transition function with the label, arguments
//! and metadata that end up on the node it creates. Setters consume and
//! return the action so they chain; nothing is validated until
//! [`Provenance::apply`](crate::Provenance::apply), which requires a label.

use crate::error::{BoxError, ProvenanceError, Result};
use std::fmt;
use std::marker::PhantomData;
use trellis_graph::{ActionType, Metadata, NodeMeta, StorageMode};

/// A state transition: `(state, args) -> next state`.
///
/// Implementations must be pure: the same state and arguments always give
/// the same result, and neither input is modified.
pub trait Transition<S, A> {
    fn run(&self, state: &S, args: &[A]) -> std::result::Result<S, BoxError>;
}

/// Adapter for transitions that cannot fail.
#[derive(Clone, Copy)]
pub struct Infallible<F>(F);

impl<S, A, F> Transition<S, A> for Infallible<F>
where
    F: Fn(&S, &[A]) -> S,
{
    fn run(&self, state: &S, args: &[A]) -> std::result::Result<S, BoxError> {
        Ok((self.0)(state, args))
    }
}

/// Adapter for transitions that return `Result<S, E>`.
pub struct Fallible<F, E> {
    f: F,
    _error: PhantomData<fn() -> E>,
}

impl<F: Clone, E> Clone for Fallible<F, E> {
    fn clone(&self) -> Self {
        Fallible {
            f: self.f.clone(),
            _error: PhantomData,
        }
    }
}

impl<S, A, F, E> Transition<S, A> for Fallible<F, E>
where
    F: Fn(&S, &[A]) -> std::result::Result<S, E>,
    E: Into<BoxError>,
{
    fn run(&self, state: &S, args: &[A]) -> std::result::Result<S, BoxError> {
        (self.f)(state, args).map_err(Into::into)
    }
}

/// A labeled, parameterized state transition ready to be applied.
pub struct Action<S, A, T> {
    label: Option<String>,
    action_type: ActionType,
    args: Vec<A>,
    metadata: Metadata,
    event_type: Option<String>,
    save_mode: StorageMode,
    transition: T,
    _state: PhantomData<fn(&S) -> S>,
}

impl<S, A, F> Action<S, A, Infallible<F>>
where
    F: Fn(&S, &[A]) -> S,
{
    /// Create an action from an infallible transition.
    pub fn new(transition: F) -> Self {
        Action::from_transition(Infallible(transition))
    }
}

impl<S, A, F, E> Action<S, A, Fallible<F, E>>
where
    F: Fn(&S, &[A]) -> std::result::Result<S, E>,
    E: Into<BoxError>,
{
    /// Create an action from a transition that may fail.
    pub fn try_new(transition: F) -> Self {
        Action::from_transition(Fallible {
            f: transition,
            _error: PhantomData,
        })
    }
}

impl<S, A, T> Action<S, A, T> {
    /// Create an action from any [`Transition`] implementation.
    pub fn from_transition(transition: T) -> Self {
        Action {
            label: None,
            action_type: ActionType::Regular,
            args: Vec::new(),
            metadata: Metadata::new(),
            event_type: None,
            save_mode: StorageMode::Diff,
            transition,
            _state: PhantomData,
        }
    }

    pub fn set_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn set_action_type(mut self, action_type: ActionType) -> Self {
        self.action_type = action_type;
        self
    }

    /// Replace the bound arguments.
    pub fn set_args(mut self, args: impl IntoIterator<Item = A>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Merge `metadata` into the existing metadata. Colliding keys take the
    /// new value.
    pub fn set_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Set a single metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn set_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn save_state_mode(mut self, mode: StorageMode) -> Self {
        self.save_mode = mode;
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn args(&self) -> &[A] {
        &self.args
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn save_mode(&self) -> StorageMode {
        self.save_mode
    }

    /// The node fields this action produces. Fails without a label.
    pub(crate) fn node_meta(&self) -> Result<NodeMeta> {
        let label = match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => return Err(ProvenanceError::MissingLabel),
        };
        Ok(NodeMeta::new(label)
            .with_action_type(self.action_type)
            .with_metadata(self.metadata.clone())
            .with_event_type(self.event_type.clone()))
    }

    /// Run the transition against `state` with the bound arguments.
    pub(crate) fn run(&self, state: &S) -> Result<S>
    where
        T: Transition<S, A>,
    {
        self.transition
            .run(state, &self.args)
            .map_err(|source| ProvenanceError::Transition {
                label: self.label.clone().unwrap_or_default(),
                source,
            })
    }
}

impl<S, A: Clone, T: Clone> Clone for Action<S, A, T> {
    fn clone(&self) -> Self {
        Action {
            label: self.label.clone(),
            action_type: self.action_type,
            args: self.args.clone(),
            metadata: self.metadata.clone(),
            event_type: self.event_type.clone(),
            save_mode: self.save_mode,
            transition: self.transition.clone(),
            _state: PhantomData,
        }
    }
}

impl<S, A: fmt::Debug, T> fmt::Debug for Action<S, A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("label", &self.label)
            .field("action_type", &self.action_type)
            .field("args", &self.args)
            .field("metadata", &self.metadata)
            .field("event_type", &self.event_type)
            .field("save_mode", &self.save_mode)
            .finish_non_exhaustive()
    }
}
