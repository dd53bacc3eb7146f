//! JSON-Patch application (RFC 6902 subset: add / replace / remove) with
//! RFC 6901 pointers. The summariser only ever emits these three ops, so
//! the full op set (move/copy/test) is intentionally not implemented.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProfileError, Result};

/// A single patch operation as emitted by the summariser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Apply `ops` to a copy of `doc`, in order. The input document is never
/// mutated; the first failing op aborts the whole patch.
pub fn apply_patch(doc: &Value, ops: &[PatchOp]) -> Result<Value> {
    let mut out = doc.clone();
    for op in ops {
        match op.op.as_str() {
            "add" => {
                let value = op
                    .value
                    .clone()
                    .ok_or_else(|| ProfileError::BadOp(format!("add {} needs a value", op.path)))?;
                add(&mut out, &op.path, value)?;
            }
            "replace" => {
                let value = op.value.clone().ok_or_else(|| {
                    ProfileError::BadOp(format!("replace {} needs a value", op.path))
                })?;
                replace(&mut out, &op.path, value)?;
            }
            "remove" => remove(&mut out, &op.path)?,
            other => {
                return Err(ProfileError::BadOp(format!("unsupported op: {other}")));
            }
        }
    }
    Ok(out)
}

/// Split an RFC 6901 pointer into unescaped tokens.
fn tokens(path: &str) -> Result<Vec<String>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| ProfileError::BadPointer(format!("pointer must start with '/': {path}")))?;
    Ok(rest
        .split('/')
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Navigate to the parent of the pointer target. Returns the parent node
/// and the final token.
fn parent_of<'a>(doc: &'a mut Value, path: &str) -> Result<(&'a mut Value, String)> {
    let mut toks = tokens(path)?;
    let last = toks
        .pop()
        .ok_or_else(|| ProfileError::BadPointer("cannot address the document root".into()))?;
    let mut node = doc;
    for tok in &toks {
        node = step(node, tok, path)?;
    }
    Ok((node, last))
}

fn step<'a>(node: &'a mut Value, token: &str, path: &str) -> Result<&'a mut Value> {
    match node {
        Value::Object(map) => map
            .get_mut(token)
            .ok_or_else(|| ProfileError::BadPointer(format!("missing key '{token}' in {path}"))),
        Value::Array(arr) => {
            let idx: usize = token
                .parse()
                .map_err(|_| ProfileError::BadPointer(format!("bad index '{token}' in {path}")))?;
            let len = arr.len();
            arr.get_mut(idx).ok_or_else(|| {
                ProfileError::BadPointer(format!("index {idx} out of bounds (len {len}) in {path}"))
            })
        }
        _ => Err(ProfileError::BadPointer(format!(
            "cannot descend into scalar at '{token}' in {path}"
        ))),
    }
}

fn add(doc: &mut Value, path: &str, value: Value) -> Result<()> {
    let (parent, last) = parent_of(doc, path)?;
    match parent {
        Value::Object(map) => {
            map.insert(last, value);
            Ok(())
        }
        Value::Array(arr) => {
            if last == "-" {
                arr.push(value);
                return Ok(());
            }
            let idx: usize = last
                .parse()
                .map_err(|_| ProfileError::BadPointer(format!("bad index '{last}' in {path}")))?;
            if idx > arr.len() {
                return Err(ProfileError::BadPointer(format!(
                    "index {idx} out of bounds (len {}) in {path}",
                    arr.len()
                )));
            }
            arr.insert(idx, value);
            Ok(())
        }
        _ => Err(ProfileError::BadOp(format!(
            "add target parent is a scalar: {path}"
        ))),
    }
}

fn replace(doc: &mut Value, path: &str, value: Value) -> Result<()> {
    let (parent, last) = parent_of(doc, path)?;
    let target = step(parent, &last, path)?;
    *target = value;
    Ok(())
}

fn remove(doc: &mut Value, path: &str) -> Result<()> {
    let (parent, last) = parent_of(doc, path)?;
    match parent {
        Value::Object(map) => {
            map.remove(&last)
                .ok_or_else(|| ProfileError::BadPointer(format!("missing key '{last}' in {path}")))?;
            Ok(())
        }
        Value::Array(arr) => {
            let idx: usize = last
                .parse()
                .map_err(|_| ProfileError::BadPointer(format!("bad index '{last}' in {path}")))?;
            if idx >= arr.len() {
                return Err(ProfileError::BadPointer(format!(
                    "index {idx} out of bounds (len {}) in {path}",
                    arr.len()
                )));
            }
            arr.remove(idx);
            Ok(())
        }
        _ => Err(ProfileError::BadOp(format!(
            "remove target parent is a scalar: {path}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ops(raw: serde_json::Value) -> Vec<PatchOp> {
        serde_json::from_value(raw).expect("patch ops parse")
    }

    #[test]
    fn replace_scalar() {
        let doc = json!({"user": {"name": ""}});
        let patched = apply_patch(
            &doc,
            &ops(json!([{"op": "replace", "path": "/user/name", "value": "Anna"}])),
        )
        .unwrap();
        assert_eq!(patched["user"]["name"], "Anna");
        // Source untouched.
        assert_eq!(doc["user"]["name"], "");
    }

    #[test]
    fn add_appends_to_array_with_dash() {
        let doc = json!({"memorable_events": []});
        let patched = apply_patch(
            &doc,
            &ops(json!([{
                "op": "add",
                "path": "/memorable_events/-",
                "value": {"time": "2026-07-01", "details": "first concert"}
            }])),
        )
        .unwrap();
        assert_eq!(patched["memorable_events"][0]["details"], "first concert");
    }

    #[test]
    fn remove_array_element() {
        let doc = json!({"user": {"likes": ["tea", "rain"]}});
        let patched = apply_patch(
            &doc,
            &ops(json!([{"op": "remove", "path": "/user/likes/0"}])),
        )
        .unwrap();
        assert_eq!(patched["user"]["likes"], json!(["rain"]));
    }

    #[test]
    fn escaped_pointer_tokens() {
        let doc = json!({"a/b": {"~x": 1}});
        let patched = apply_patch(
            &doc,
            &ops(json!([{"op": "replace", "path": "/a~1b/~0x", "value": 2}])),
        )
        .unwrap();
        assert_eq!(patched["a/b"]["~x"], 2);
    }

    #[test]
    fn failing_op_aborts_whole_patch() {
        let doc = json!({"user": {"name": ""}});
        let result = apply_patch(
            &doc,
            &ops(json!([
                {"op": "replace", "path": "/user/name", "value": "Anna"},
                {"op": "remove", "path": "/user/missing"}
            ])),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unsupported_op_is_rejected() {
        let doc = json!({"a": 1});
        let result = apply_patch(
            &doc,
            &ops(json!([{"op": "move", "path": "/a", "value": null}])),
        );
        assert!(matches!(result, Err(ProfileError::BadOp(_))));
    }

    #[test]
    fn replace_of_missing_key_fails() {
        let doc = json!({"user": {}});
        let result = apply_patch(
            &doc,
            &ops(json!([{"op": "replace", "path": "/user/name", "value": "x"}])),
        );
        assert!(matches!(result, Err(ProfileError::BadPointer(_))));
    }
}
