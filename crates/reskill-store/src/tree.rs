//! In-memory JSON tree operations with Realtime Database semantics.
//!
//! Writing `null` deletes a node, and empty objects left behind by a delete
//! disappear, so the tree never stores nulls or empty containers.

use serde_json::{Map, Value};

/// Value at `segs`, if any.
pub fn get_at<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segs {
        node = match node {
            Value::Object(map) => map.get(*seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match node {
        Value::Null => None,
        other => Some(other),
    }
}

/// Replace the node at `segs` with `value` (deleting it when `value` is empty).
pub fn set_at(root: &mut Value, segs: &[&str], value: Value) {
    let value = normalize(value);
    let Some((last, parents)) = segs.split_last() else {
        *root = value;
        return;
    };

    if value.is_null() {
        remove_at(root, parents, last);
        return;
    }

    let mut node = root;
    for seg in parents {
        node = child_mut(node, seg);
    }
    *child_mut(node, last) = value;
}

/// Merge each `(child path, value)` pair under `segs`.
///
/// Keys may contain `/` to address deeper children, like a multi-path update.
pub fn merge_at(root: &mut Value, segs: &[&str], fields: &Map<String, Value>) {
    for (key, value) in fields {
        let mut path: Vec<&str> = segs.to_vec();
        path.extend(key.split('/').filter(|s| !s.is_empty()));
        set_at(root, &path, value.clone());
    }
}

/// Drop nulls and empty containers recursively. Returns `Null` if nothing is left.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        Value::Array(items) => {
            if items.iter().all(Value::is_null) {
                Value::Null
            } else {
                Value::Array(items.into_iter().map(normalize).collect())
            }
        }
        other => other,
    }
}

/// Descend into `seg`, turning scalars into objects and growing arrays as needed.
fn child_mut<'a>(node: &'a mut Value, seg: &str) -> &'a mut Value {
    let index = match (&*node, seg.parse::<usize>()) {
        (Value::Array(items), Ok(idx)) if idx <= items.len() => Some(idx),
        _ => None,
    };
    if let Some(idx) = index {
        if let Value::Array(items) = node {
            if idx == items.len() {
                items.push(Value::Null);
            }
            return &mut items[idx];
        }
    }

    if node.is_array() {
        let items = match std::mem::take(node) {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        let map: Map<String, Value> = items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *node = Value::Object(map);
    } else if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map.entry(seg.to_owned()).or_insert(Value::Null),
        _ => unreachable!("node was just made an object"),
    }
}

fn remove_at(root: &mut Value, parents: &[&str], last: &str) {
    fn walk(node: &mut Value, parents: &[&str], last: &str) {
        match parents.split_first() {
            None => match node {
                Value::Object(map) => {
                    map.remove(last);
                }
                Value::Array(items) => {
                    if let Some(slot) = last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                        *slot = Value::Null;
                    }
                }
                _ => {}
            },
            Some((seg, rest)) => {
                let child = match node {
                    Value::Object(map) => map.get_mut(*seg),
                    Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
                    _ => None,
                };
                if let Some(child) = child {
                    walk(child, rest, last);
                }
            }
        }
        let emptied = std::mem::take(node);
        *node = normalize(emptied);
    }
    walk(root, parents, last);
}
