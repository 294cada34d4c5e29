//! Diff engine for comparing desired and actual records.
//!
//! Both sides are plain JSON mappings after normalization. Sequences are
//! compared position by position so the same edit always reports the same
//! paths.

use serde::Serialize;
use serde_json::{Map, Value};

/// A single field-level difference.
///
/// "Expected" is the desired definition, "actual" the remote resource; an
/// `Added` field is one the update will add remotely.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DiffEntry {
    /// Present in the definition only.
    Added {
        /// Dotted path of the field.
        path: String,
        /// Desired value.
        value: Value,
    },
    /// Present remotely only.
    Removed {
        /// Dotted path of the field.
        path: String,
        /// Remote value.
        value: Value,
    },
    /// Present on both sides with different values.
    Changed {
        /// Dotted path of the field.
        path: String,
        /// Remote value.
        from: Value,
        /// Desired value.
        to: Value,
    },
}

/// Ordered differences between one desired and one actual record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diff {
    entries: Vec<DiffEntry>,
}

/// Computes the ordered structural difference between two normalized
/// mappings.
///
/// Fields are reported in the definition's attribute order, followed by
/// fields that only exist remotely.
#[must_use]
pub fn diff(expected: &Map<String, Value>, actual: &Map<String, Value>) -> Diff {
    let mut entries = Vec::new();
    diff_objects("", expected, actual, &mut entries);
    Diff { entries }
}

/// Returns true if two values have no structural difference; numbers compare
/// by value, so `0` equals `0.0`.
#[must_use]
pub fn values_equal(expected: &Value, actual: &Value) -> bool {
    let mut entries = Vec::new();
    diff_values("", expected, actual, &mut entries);
    entries.is_empty()
}

fn diff_objects(
    path: &str,
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
    out: &mut Vec<DiffEntry>,
) {
    for (key, want) in expected {
        let child = join_key(path, key);
        match actual.get(key) {
            Some(have) => diff_values(&child, want, have, out),
            None => out.push(DiffEntry::Added {
                path: child,
                value: want.clone(),
            }),
        }
    }
    for (key, have) in actual {
        if !expected.contains_key(key) {
            out.push(DiffEntry::Removed {
                path: join_key(path, key),
                value: have.clone(),
            });
        }
    }
}

fn diff_values(path: &str, expected: &Value, actual: &Value, out: &mut Vec<DiffEntry>) {
    match (expected, actual) {
        (Value::Object(want), Value::Object(have)) => diff_objects(path, want, have, out),
        (Value::Array(want), Value::Array(have)) => {
            for index in 0..want.len().max(have.len()) {
                let child = format!("{path}[{index}]");
                match (want.get(index), have.get(index)) {
                    (Some(w), Some(h)) => diff_values(&child, w, h, out),
                    (Some(w), None) => out.push(DiffEntry::Added {
                        path: child,
                        value: w.clone(),
                    }),
                    (None, Some(h)) => out.push(DiffEntry::Removed {
                        path: child,
                        value: h.clone(),
                    }),
                    (None, None) => {}
                }
            }
        }
        (Value::Number(want), Value::Number(have)) => {
            if want != have && want.as_f64() != have.as_f64() {
                out.push(changed(path, expected, actual));
            }
        }
        _ if expected == actual => {}
        _ => out.push(changed(path, expected, actual)),
    }
}

fn changed(path: &str, expected: &Value, actual: &Value) -> DiffEntry {
    DiffEntry::Changed {
        path: path.to_string(),
        from: actual.clone(),
        to: expected.clone(),
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

impl Diff {
    /// Returns true if both sides are equivalent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of differing fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// The differences in report order.
    #[must_use]
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }
}

impl DiffEntry {
    /// Dotted path of the field.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path, .. } | Self::Removed { path, .. } | Self::Changed { path, .. } => {
                path
            }
        }
    }
}

impl std::fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added { path, value } => write!(f, "+{path} {value}"),
            Self::Removed { path, value } => write!(f, "-{path} {value}"),
            Self::Changed { path, from, to } => write!(f, "~{path} {from} -> {to}"),
        }
    }
}
