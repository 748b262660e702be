//! Data keys and the Path Resolver.
//!
//! A [`DataKey`] addresses a location inside a binding context: either the
//! context itself ([`DataKey::SelfRef`], written `"."`) or a path of field
//! names with optional sequence subscripts, such as `"address.city"` or
//! `"rows[2].name"`.
//!
//! Resolution is a set of pure functions over [`serde_json::Value`]:
//!
//! - [`read`] never mutates and returns `None` for anything unresolvable.
//! - [`write`] fails on an undefined (absent or null) context, and otherwise
//!   creates missing intermediate mappings along the path.
//! - [`remove`] takes a field or sequence element out of its parent.
//!
//! Keys are not validated against any schema; any field name is legal.
//!
//! # Example
//!
//! ```
//! use horizon_facet_core::path::{self, DataKey};
//! use serde_json::json;
//!
//! let mut data = json!({"id": 3});
//! let key = DataKey::parse("address.city");
//!
//! assert_eq!(path::read(Some(&data), &key), None);
//! path::write(Some(&mut data), &key, json!("Oslo")).unwrap();
//! assert_eq!(path::read(Some(&data), &key), Some(&json!("Oslo")));
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::BindingError;

/// The textual form of the self-reference key.
pub const SELF_KEY: &str = ".";

/// How many nulls a single write may append to a sequence before its
/// subscript.
pub const MAX_SEQUENCE_PADDING: usize = 1024;

/// One step of a [`DataPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A mapping field name.
    Key(String),
    /// A sequence subscript.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(idx) => write!(f, "[{idx}]"),
        }
    }
}

/// A parsed sequence of path segments.
///
/// The empty path addresses the root it is resolved against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: Vec<PathSegment>,
}

impl DataPath {
    /// The empty (root) path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse dot/bracket notation into a path.
    ///
    /// Empty segments are skipped, so `"a..b"` and `".a.b"` both equal `"a.b"`.
    /// A subscript that is not a non-negative integer is ignored.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut key_start = 0;
        let mut chars = path.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                '.' => {
                    if i > key_start {
                        segments.push(PathSegment::Key(path[key_start..i].to_string()));
                    }
                    key_start = i + 1;
                }
                '[' => {
                    if i > key_start {
                        segments.push(PathSegment::Key(path[key_start..i].to_string()));
                    }

                    let idx_start = i + 1;
                    let mut idx_end = path.len();
                    while let Some(&(j, ch)) = chars.peek() {
                        chars.next();
                        if ch == ']' {
                            idx_end = j;
                            break;
                        }
                    }
                    if let Ok(idx) = path[idx_start..idx_end].trim().parse::<usize>() {
                        segments.push(PathSegment::Index(idx));
                    }

                    if let Some(&(_, '.')) = chars.peek() {
                        chars.next();
                    }
                    key_start = chars.peek().map(|(i, _)| *i).unwrap_or(path.len());
                }
                _ => {}
            }
        }

        if key_start < path.len() {
            segments.push(PathSegment::Key(path[key_start..].to_string()));
        }

        Self { segments }
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a field name.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Append a sequence subscript.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// Return a new path with `key` resolved relative to this one.
    pub fn join(&self, key: &DataKey) -> DataPath {
        let mut joined = self.clone();
        if let DataKey::Path(path) = key {
            joined.segments.extend(path.segments.iter().cloned());
        }
        joined
    }

    /// Return a new path with a subscript appended.
    pub fn with_index(&self, index: usize) -> DataPath {
        let mut joined = self.clone();
        joined.push_index(index);
        joined
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "{SELF_KEY}");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i > 0 => write!(f, ".{key}")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

/// An addressing expression for a binding context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataKey {
    /// The context itself, with no descent.
    SelfRef,
    /// A field path relative to the context.
    Path(DataPath),
}

impl DataKey {
    /// Parse a key. `"."` and the empty string are the self-reference.
    pub fn parse(key: &str) -> Self {
        let trimmed = key.trim();
        if trimmed.is_empty() || trimmed == SELF_KEY {
            return Self::SelfRef;
        }
        let path = DataPath::parse(trimmed);
        if path.is_root() {
            Self::SelfRef
        } else {
            Self::Path(path)
        }
    }

    /// A single-field key.
    pub fn field(name: impl Into<String>) -> Self {
        let mut path = DataPath::root();
        path.push_key(name);
        Self::Path(path)
    }

    /// A single-subscript key.
    pub fn index(index: usize) -> Self {
        let mut path = DataPath::root();
        path.push_index(index);
        Self::Path(path)
    }

    /// Whether this is the self-reference key.
    pub fn is_self(&self) -> bool {
        matches!(self, Self::SelfRef)
    }

    /// The segments this key descends through (empty for self-reference).
    pub fn segments(&self) -> &[PathSegment] {
        match self {
            Self::SelfRef => &[],
            Self::Path(path) => path.segments(),
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfRef => write!(f, "{SELF_KEY}"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

impl FromStr for DataKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for DataKey {
    fn from(key: &str) -> Self {
        Self::parse(key)
    }
}

impl From<String> for DataKey {
    fn from(key: String) -> Self {
        Self::parse(&key)
    }
}

impl From<DataPath> for DataKey {
    fn from(path: DataPath) -> Self {
        if path.is_root() {
            Self::SelfRef
        } else {
            Self::Path(path)
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Read the value addressed by `key`.
///
/// Returns `None` when the context is absent or any segment is missing.
/// The self-reference returns the context itself.
pub fn read<'a>(context: Option<&'a Value>, key: &DataKey) -> Option<&'a Value> {
    let mut current = context?;
    for segment in key.segments() {
        current = match segment {
            PathSegment::Key(name) => current.get(name.as_str())?,
            PathSegment::Index(idx) => current.get(*idx)?,
        };
    }
    Some(current)
}

/// Mutable counterpart of [`read`], used to locate a rebinding base.
pub fn read_mut<'a>(context: Option<&'a mut Value>, key: &DataKey) -> Option<&'a mut Value> {
    let mut current = context?;
    for segment in key.segments() {
        current = match segment {
            PathSegment::Key(name) => current.get_mut(name.as_str())?,
            PathSegment::Index(idx) => current.get_mut(*idx)?,
        };
    }
    Some(current)
}

/// Write `value` at `key`.
///
/// An absent or null context is undefined and the write fails. Otherwise
/// absent intermediate mappings are created; sequences are padded with null
/// up to a subscript. Descending through an existing scalar fails, and so
/// does a subscript more than [`MAX_SEQUENCE_PADDING`] past the end of its
/// sequence. A failed write leaves the context untouched.
pub fn write(context: Option<&mut Value>, key: &DataKey, value: Value) -> Result<(), BindingError> {
    let Some(target) = context.filter(|ctx| !ctx.is_null()) else {
        return Err(BindingError::undefined_context(key));
    };

    match key {
        DataKey::SelfRef => {
            *target = value;
            Ok(())
        }
        DataKey::Path(path) => {
            if let Some(index) = unreachable_index(target, path.segments()) {
                return Err(BindingError::index_out_of_range(key, index));
            }
            set_nested(target, SELF_KEY.to_string(), path.segments(), value)
                .map_err(|segment| BindingError::not_a_container(key, segment))
        }
    }
}

/// The first subscript along `parts` that lies too far past the end of its
/// sequence. Absent sequences count as empty.
fn unreachable_index(current: &Value, parts: &[PathSegment]) -> Option<usize> {
    let mut current = Some(current);
    for part in parts {
        current = match part {
            PathSegment::Key(key) => current.and_then(|v| v.get(key.as_str())),
            PathSegment::Index(idx) => {
                let len = current.and_then(Value::as_array).map_or(0, Vec::len);
                if idx.saturating_sub(len) > MAX_SEQUENCE_PADDING {
                    return Some(*idx);
                }
                current.and_then(|v| v.get(*idx))
            }
        };
    }
    None
}

/// Remove the value at `key` from its parent mapping or sequence.
///
/// The self-reference cannot be removed and yields `None`.
pub fn remove(context: Option<&mut Value>, key: &DataKey) -> Option<Value> {
    let context = context?;
    match key {
        DataKey::SelfRef => None,
        DataKey::Path(path) => remove_nested(context, path.segments()),
    }
}

/// Sets a nested value, creating intermediate structures as needed.
///
/// `at` names `current` for error reporting. On failure returns the name of
/// the scalar that could not be descended through.
fn set_nested(current: &mut Value, at: String, parts: &[PathSegment], value: Value) -> Result<(), String> {
    let Some((part, rest)) = parts.split_first() else {
        *current = value;
        return Ok(());
    };

    match part {
        PathSegment::Key(key) => {
            if current.is_null() {
                *current = Value::Object(serde_json::Map::new());
            }
            let Some(obj) = current.as_object_mut() else {
                return Err(at);
            };
            if rest.is_empty() {
                obj.insert(key.clone(), value);
                Ok(())
            } else {
                let entry = obj.entry(key.clone()).or_insert(Value::Null);
                set_nested(entry, key.clone(), rest, value)
            }
        }
        PathSegment::Index(idx) => {
            if current.is_null() {
                *current = Value::Array(Vec::new());
            }
            let Some(arr) = current.as_array_mut() else {
                return Err(at);
            };
            if arr.len() <= *idx {
                let Some(len) = idx.checked_add(1) else {
                    return Err(at);
                };
                arr.resize(len, Value::Null);
            }
            if rest.is_empty() {
                arr[*idx] = value;
                Ok(())
            } else {
                set_nested(&mut arr[*idx], part.to_string(), rest, value)
            }
        }
    }
}

fn remove_nested(current: &mut Value, parts: &[PathSegment]) -> Option<Value> {
    let (part, rest) = parts.split_first()?;

    match part {
        PathSegment::Key(key) => {
            let obj = current.as_object_mut()?;
            if rest.is_empty() {
                obj.remove(key.as_str())
            } else {
                remove_nested(obj.get_mut(key.as_str())?, rest)
            }
        }
        PathSegment::Index(idx) => {
            let arr = current.as_array_mut()?;
            if *idx >= arr.len() {
                return None;
            }
            if rest.is_empty() {
                Some(arr.remove(*idx))
            } else {
                remove_nested(&mut arr[*idx], rest)
            }
        }
    }
}
