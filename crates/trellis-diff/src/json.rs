//! Structural diff over the serde data model.
//!
//! States are lowered to `serde_json::Value` and compared recursively:
//! - objects: removed keys, added keys, and per-key recursion on shared keys
//! - arrays: per-index recursion on the shared prefix, then an append of the
//!   new tail or a truncate of the old one
//! - anything else: a whole-value replace
//!
//! Operations are applied in order. Each one checks that the base has the
//! shape it was recorded against, so a delta replayed on the wrong base fails
//! with a [`PatchError`] instead of silently producing a different state.

use crate::engine::DiffEngine;
use crate::error::{DiffError, PatchError};
use crate::path::{JsonPath, PathSegment};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single edit in a [`JsonDelta`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DeltaOp {
    /// Insert a new object key, or append at the end of an array.
    Add { path: JsonPath, value: Value },
    /// Remove an existing object key or array element.
    Remove { path: JsonPath },
    /// Overwrite an existing value.
    Replace { path: JsonPath, value: Value },
    /// Shorten an array to `len` elements.
    Truncate { path: JsonPath, len: usize },
}

impl DeltaOp {
    pub fn path(&self) -> &JsonPath {
        match self {
            DeltaOp::Add { path, .. }
            | DeltaOp::Remove { path }
            | DeltaOp::Replace { path, .. }
            | DeltaOp::Truncate { path, .. } => path,
        }
    }
}

/// An ordered list of edits produced by [`JsonDiff`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonDelta(Vec<DeltaOp>);

impl JsonDelta {
    pub fn new(ops: Vec<DeltaOp>) -> Self {
        Self(ops)
    }

    pub fn ops(&self) -> &[DeltaOp] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The default structural diff engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDiff;

impl JsonDiff {
    pub fn new() -> Self {
        JsonDiff
    }

    /// Diff two JSON values directly.
    pub fn diff_values(&self, base: &Value, target: &Value) -> JsonDelta {
        let mut ops = Vec::new();
        diff_into(&JsonPath::root(), base, target, &mut ops);
        JsonDelta(ops)
    }

    /// Apply a delta to a JSON value, returning the patched copy.
    pub fn patch_value(&self, base: &Value, delta: &JsonDelta) -> Result<Value, PatchError> {
        let mut value = base.clone();
        for op in delta.ops() {
            apply_op(&mut value, op)?;
        }
        Ok(value)
    }
}

impl<S> DiffEngine<S> for JsonDiff
where
    S: Serialize + DeserializeOwned,
{
    type Delta = JsonDelta;

    fn compute(&self, base: &S, target: &S) -> Result<JsonDelta, DiffError> {
        let base = serde_json::to_value(base).map_err(|e| DiffError::Encode(e.to_string()))?;
        let target =
            serde_json::to_value(target).map_err(|e| DiffError::Encode(e.to_string()))?;
        Ok(self.diff_values(&base, &target))
    }

    fn patch(&self, base: &S, delta: &JsonDelta) -> Result<S, PatchError> {
        let base = serde_json::to_value(base)
            .map_err(|e| PatchError::Decode(format!("base could not be encoded: {}", e)))?;
        let patched = self.patch_value(&base, delta)?;
        serde_json::from_value(patched).map_err(|e| PatchError::Decode(e.to_string()))
    }
}

fn diff_into(path: &JsonPath, base: &Value, target: &Value, ops: &mut Vec<DeltaOp>) {
    if base == target {
        return;
    }

    match (base, target) {
        (Value::Object(old), Value::Object(new)) => {
            for key in old.keys().filter(|k| !new.contains_key(*k)) {
                ops.push(DeltaOp::Remove {
                    path: path.child_key(key.as_str()),
                });
            }
            for (key, new_value) in new {
                let child = path.child_key(key.as_str());
                match old.get(key) {
                    Some(old_value) => diff_into(&child, old_value, new_value, ops),
                    None => ops.push(DeltaOp::Add {
                        path: child,
                        value: new_value.clone(),
                    }),
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            let shared = old.len().min(new.len());
            for (i, (old_item, new_item)) in old.iter().zip(new.iter()).enumerate() {
                diff_into(&path.child_index(i), old_item, new_item, ops);
            }
            if new.len() < old.len() {
                ops.push(DeltaOp::Truncate {
                    path: path.clone(),
                    len: new.len(),
                });
            }
            for (i, item) in new.iter().enumerate().skip(shared) {
                ops.push(DeltaOp::Add {
                    path: path.child_index(i),
                    value: item.clone(),
                });
            }
        }
        _ => ops.push(DeltaOp::Replace {
            path: path.clone(),
            value: target.clone(),
        }),
    }
}

fn prefix(path: &JsonPath, len: usize) -> JsonPath {
    JsonPath::new(path.segments()[..len].to_vec())
}

fn resolve_mut<'a>(root: &'a mut Value, path: &JsonPath) -> Result<&'a mut Value, PatchError> {
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map
                .get_mut(key)
                .ok_or_else(|| PatchError::PathNotFound(prefix(path, depth + 1)))?,
            (PathSegment::Index(index), Value::Array(items)) => {
                let length = items.len();
                items
                    .get_mut(*index)
                    .ok_or_else(|| PatchError::IndexOutOfBounds {
                        path: prefix(path, depth),
                        index: *index,
                        length,
                    })?
            }
            (PathSegment::Key(_), _) => {
                return Err(PatchError::type_mismatch(&prefix(path, depth), "object"))
            }
            (PathSegment::Index(_), _) => {
                return Err(PatchError::type_mismatch(&prefix(path, depth), "array"))
            }
        };
    }
    Ok(current)
}

fn apply_op(root: &mut Value, op: &DeltaOp) -> Result<(), PatchError> {
    match op {
        DeltaOp::Add { path, value } => {
            let (parent_path, last) = path
                .split_last()
                .ok_or_else(|| PatchError::KeyExists(JsonPath::root()))?;
            match (last, resolve_mut(root, &parent_path)?) {
                (PathSegment::Key(key), Value::Object(map)) => {
                    if map.contains_key(key) {
                        return Err(PatchError::KeyExists(path.clone()));
                    }
                    map.insert(key.clone(), value.clone());
                }
                (PathSegment::Index(index), Value::Array(items)) => {
                    if *index != items.len() {
                        return Err(PatchError::IndexOutOfBounds {
                            path: parent_path,
                            index: *index,
                            length: items.len(),
                        });
                    }
                    items.push(value.clone());
                }
                (PathSegment::Key(_), _) => {
                    return Err(PatchError::type_mismatch(&parent_path, "object"))
                }
                (PathSegment::Index(_), _) => {
                    return Err(PatchError::type_mismatch(&parent_path, "array"))
                }
            }
        }
        DeltaOp::Remove { path } => {
            let (parent_path, last) = path
                .split_last()
                .ok_or_else(|| PatchError::PathNotFound(JsonPath::root()))?;
            match (last, resolve_mut(root, &parent_path)?) {
                (PathSegment::Key(key), Value::Object(map)) => {
                    map.remove(key)
                        .ok_or_else(|| PatchError::PathNotFound(path.clone()))?;
                }
                (PathSegment::Index(index), Value::Array(items)) => {
                    if *index >= items.len() {
                        return Err(PatchError::IndexOutOfBounds {
                            path: parent_path,
                            index: *index,
                            length: items.len(),
                        });
                    }
                    items.remove(*index);
                }
                (PathSegment::Key(_), _) => {
                    return Err(PatchError::type_mismatch(&parent_path, "object"))
                }
                (PathSegment::Index(_), _) => {
                    return Err(PatchError::type_mismatch(&parent_path, "array"))
                }
            }
        }
        DeltaOp::Replace { path, value } => {
            *resolve_mut(root, path)? = value.clone();
        }
        DeltaOp::Truncate { path, len } => match resolve_mut(root, path)? {
            Value::Array(items) => {
                if items.len() < *len {
                    return Err(PatchError::IndexOutOfBounds {
                        path: path.clone(),
                        index: *len,
                        length: items.len(),
                    });
                }
                items.truncate(*len);
            }
            _ => return Err(PatchError::type_mismatch(path, "array")),
        },
    }
    Ok(())
}
