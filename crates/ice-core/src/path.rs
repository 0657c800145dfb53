//! Path addressing inside one item entry of a Document.
//! - `ItemPath` is an ordered list of key/index segments (`actions.all.0.condition`).
//! - Resolution goes through RFC 6901 JSON Pointers on the underlying serde_json tree
//!   (`/<item>/actions/all/0/condition`).
//! - `get` never fails; `set`/`remove` report `PathError::NotFound` and leave the
//!   document untouched when an intermediate segment is missing.
use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::Document;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path not found in item '{item}': {path}")]
    NotFound { item: String, path: ItemPath },
    #[error("empty path")]
    EmptyPath,
}

/// Ordered key/index segments locating a value inside one item entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemPath(Vec<String>);

impl ItemPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn kind(&self) -> PathKind {
        PathKind::of(self)
    }

    /// JSON Pointer of this path under `item_key`.
    pub fn to_pointer(&self, item_key: &str) -> String {
        let mut out = String::with_capacity(item_key.len() + 32);
        for seg in std::iter::once(item_key).chain(self.0.iter().map(String::as_str)) {
            out.push('/');
            out.push_str(&escape_token(seg));
        }
        out
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().any(|s| s.contains('.')) {
            // Dotted form would be ambiguous.
            return match serde_json::to_string(&self.0) {
                Ok(s) => f.write_str(&s),
                Err(_) => Err(fmt::Error),
            };
        }
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for ItemPath {
    type Err = String;

    /// Accepts `a.b.0.c` or a JSON string array `["a","b","0","c"]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('[') {
            let segs: Vec<String> = serde_json::from_str(s).map_err(|e| format!("invalid path array: {}", e))?;
            return Ok(Self(segs));
        }
        if s.is_empty() {
            return Err("empty path".into());
        }
        Ok(Self(s.split('.').map(str::to_string).collect()))
    }
}

impl<S: Into<String>> FromIterator<S> for ItemPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Which codec branch applies at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathKind {
    /// Single boolean-expression string.
    String,
    /// Sequence of command lines.
    Array,
}

impl PathKind {
    pub fn of(path: &ItemPath) -> Self {
        match path.last() {
            Some("actions") | Some("lore") => PathKind::Array,
            _ => PathKind::String,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PathKind::String => "String",
            PathKind::Array => "Array<String>",
        }
    }
}

fn escape_token(tok: &str) -> String {
    tok.replace('~', "~0").replace('/', "~1")
}

fn split_parent(path: &ItemPath) -> Option<(ItemPath, &str)> {
    let (last, parent) = path.0.split_last()?;
    Some((ItemPath(parent.to_vec()), last.as_str()))
}

pub fn get<'a>(doc: &'a Document, item_key: &str, path: &ItemPath) -> Option<&'a Value> {
    doc.root().pointer(&path.to_pointer(item_key))
}

/// Assign `value` at `path`. Missing intermediate segments make this a no-op.
pub fn set(doc: &mut Document, item_key: &str, path: &ItemPath, value: Value) -> Result<(), PathError> {
    let (parent, last) = split_parent(path).ok_or(PathError::EmptyPath)?;
    let not_found = || {
        warn!("path {} does not exist in item '{}', value not written", path, item_key);
        PathError::NotFound { item: item_key.to_string(), path: path.clone() }
    };
    let Some(node) = doc.root_mut().pointer_mut(&parent.to_pointer(item_key)) else {
        return Err(not_found());
    };
    match node {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let idx: usize = last.parse().map_err(|_| not_found())?;
            if idx < arr.len() {
                arr[idx] = value;
            } else if idx == arr.len() {
                arr.push(value);
            } else {
                return Err(not_found());
            }
            Ok(())
        }
        _ => Err(not_found()),
    }
}

/// Remove the value at `path`, returning it. Absent final segment is `Ok(None)`.
pub fn remove(doc: &mut Document, item_key: &str, path: &ItemPath) -> Result<Option<Value>, PathError> {
    let (parent, last) = split_parent(path).ok_or(PathError::EmptyPath)?;
    let not_found = || PathError::NotFound { item: item_key.to_string(), path: path.clone() };
    let node = doc
        .root_mut()
        .pointer_mut(&parent.to_pointer(item_key))
        .ok_or_else(not_found)?;
    match node {
        Value::Object(map) => Ok(map.shift_remove(last)),
        Value::Array(arr) => {
            let idx: usize = last.parse().map_err(|_| not_found())?;
            if idx >= arr.len() {
                return Ok(None);
            }
            Ok(Some(arr.remove(idx)))
        }
        _ => Err(not_found()),
    }
}
