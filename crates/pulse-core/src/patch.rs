//! Wire-level patch ops (§3 "Update ops", §4.2 "Patch application").
//! Applying a patch against a live React tree is a `pulse-web` concern;
//! this module only defines the op shapes and parses them off the wire.

use indexmap::IndexMap;

use crate::error::VdomError;
use crate::path::Path;
use crate::value::PulseValue;
use crate::vdom::Node;

/// How an `update_props` op changes an element's eval set (§4.2): absent
/// means keep the current set, `[]` clears it, anything else replaces it.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalPatch {
    Keep,
    Clear,
    Replace(Vec<String>),
}

/// `new: (destIndices, newContents)` of a `reconciliation` op.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileNew {
    pub dest_indices: Vec<usize>,
    pub contents: Vec<Node>,
}

/// `reuse: (destIndices, sourceIndices)` of a `reconciliation` op.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReuse {
    pub dest_indices: Vec<usize>,
    pub source_indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Replace {
        path: Path,
        data: Node,
    },
    UpdateProps {
        path: Path,
        set: IndexMap<String, PulseValue>,
        remove: Vec<String>,
        eval: EvalPatch,
    },
    Reconciliation {
        path: Path,
        n: usize,
        new: ReconcileNew,
        reuse: ReconcileReuse,
    },
}

impl Op {
    pub fn path(&self) -> &Path {
        match self {
            Op::Replace { path, .. } => path,
            Op::UpdateProps { path, .. } => path,
            Op::Reconciliation { path, .. } => path,
        }
    }

    pub fn from_value(v: &PulseValue) -> Result<Op, VdomError> {
        let op_type = v
            .get("type")
            .and_then(|t| t.as_str().map(str::to_string))
            .ok_or_else(|| VdomError::MalformedOp("op missing `type`".into()))?;
        let path = v
            .get("path")
            .and_then(|p| p.as_str().map(Path::parse))
            .ok_or_else(|| VdomError::MalformedOp(format!("op `{op_type}` missing `path`")))?;

        match op_type.as_str() {
            "replace" => {
                let data = v
                    .get("data")
                    .ok_or_else(|| VdomError::MalformedOp("replace op missing `data`".into()))?;
                Ok(Op::Replace {
                    path,
                    data: Node::from_value(&data)?,
                })
            }
            "update_props" => {
                let set = v.get("set").and_then(|s| s.entries()).unwrap_or_default();
                let remove = match v.get("remove") {
                    Some(r) => string_list(&r, "update_props.remove")?,
                    None => Vec::new(),
                };
                let eval = match v.get("eval") {
                    None => EvalPatch::Keep,
                    Some(e) => {
                        let items = string_list(&e, "update_props.eval")?;
                        if items.is_empty() {
                            EvalPatch::Clear
                        } else {
                            EvalPatch::Replace(items)
                        }
                    }
                };
                Ok(Op::UpdateProps { path, set, remove, eval })
            }
            "reconciliation" => {
                let n = v
                    .get("N")
                    .and_then(|n| n.as_f64())
                    .ok_or_else(|| VdomError::MalformedOp("reconciliation op missing `N`".into()))?
                    as usize;

                let new_pair = v
                    .get("new")
                    .and_then(|p| p.items())
                    .filter(|p| p.len() == 2)
                    .ok_or_else(|| VdomError::MalformedOp("reconciliation `new` must be a 2-tuple".into()))?;
                let new_indices = usize_list(&new_pair[0], "reconciliation.new[0]")?;
                let contents = new_pair[1]
                    .items()
                    .ok_or_else(|| VdomError::MalformedOp("reconciliation `new[1]` is not an array".into()))?
                    .iter()
                    .map(Node::from_value)
                    .collect::<Result<Vec<_>, _>>()?;

                let reuse_pair = v
                    .get("reuse")
                    .and_then(|p| p.items())
                    .filter(|p| p.len() == 2)
                    .ok_or_else(|| VdomError::MalformedOp("reconciliation `reuse` must be a 2-tuple".into()))?;
                let reuse_dest = usize_list(&reuse_pair[0], "reconciliation.reuse[0]")?;
                let reuse_src = usize_list(&reuse_pair[1], "reconciliation.reuse[1]")?;

                Ok(Op::Reconciliation {
                    path,
                    n,
                    new: ReconcileNew { dest_indices: new_indices, contents },
                    reuse: ReconcileReuse { dest_indices: reuse_dest, source_indices: reuse_src },
                })
            }
            other => Err(VdomError::MalformedOp(format!("unknown op type `{other}`"))),
        }
    }
}

fn string_list(v: &PulseValue, ctx: &str) -> Result<Vec<String>, VdomError> {
    v.items()
        .ok_or_else(|| VdomError::MalformedOp(format!("{ctx} is not an array")))?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| VdomError::MalformedOp(format!("{ctx} entry is not a string")))
        })
        .collect()
}

fn usize_list(v: &PulseValue, ctx: &str) -> Result<Vec<usize>, VdomError> {
    v.items()
        .ok_or_else(|| VdomError::MalformedOp(format!("{ctx} is not an array")))?
        .iter()
        .map(|item| {
            item.as_f64()
                .map(|n| n as usize)
                .ok_or_else(|| VdomError::MalformedOp(format!("{ctx} entry is not a number")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(entries: Vec<(&str, PulseValue)>) -> PulseValue {
        PulseValue::object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn parses_replace_op() {
        let v = obj(vec![
            ("type", PulseValue::String("replace".into())),
            ("path", PulseValue::String("".into())),
            (
                "data",
                obj(vec![
                    ("tag", PulseValue::String("div".into())),
                    ("props", PulseValue::object(IndexMap::new())),
                ]),
            ),
        ]);
        match Op::from_value(&v).unwrap() {
            Op::Replace { path, .. } => assert!(path.is_root()),
            other => panic!("expected replace, got {other:?}"),
        }
    }

    #[test]
    fn parses_update_props_with_eval_clear() {
        let v = obj(vec![
            ("type", PulseValue::String("update_props".into())),
            ("path", PulseValue::String("0".into())),
            ("remove", PulseValue::array(vec![PulseValue::String("title".into())])),
            ("eval", PulseValue::array(vec![])),
        ]);
        match Op::from_value(&v).unwrap() {
            Op::UpdateProps { remove, eval, .. } => {
                assert_eq!(remove, vec!["title".to_string()]);
                assert_eq!(eval, EvalPatch::Clear);
            }
            other => panic!("expected update_props, got {other:?}"),
        }
    }

    #[test]
    fn parses_update_props_without_eval_field_keeps() {
        let v = obj(vec![
            ("type", PulseValue::String("update_props".into())),
            ("path", PulseValue::String("0".into())),
        ]);
        match Op::from_value(&v).unwrap() {
            Op::UpdateProps { eval, .. } => assert_eq!(eval, EvalPatch::Keep),
            other => panic!("expected update_props, got {other:?}"),
        }
    }

    #[test]
    fn parses_reconciliation_op() {
        let v = obj(vec![
            ("type", PulseValue::String("reconciliation".into())),
            ("path", PulseValue::String("".into())),
            ("N", PulseValue::Number(3.0)),
            (
                "new",
                PulseValue::array(vec![
                    PulseValue::array(vec![PulseValue::Number(2.0)]),
                    PulseValue::array(vec![obj(vec![
                        ("tag", PulseValue::String("span".into())),
                        ("children", PulseValue::array(vec![PulseValue::String("C".into())])),
                    ])]),
                ]),
            ),
            (
                "reuse",
                PulseValue::array(vec![
                    PulseValue::array(vec![PulseValue::Number(0.0), PulseValue::Number(1.0)]),
                    PulseValue::array(vec![PulseValue::Number(0.0), PulseValue::Number(1.0)]),
                ]),
            ),
        ]);
        match Op::from_value(&v).unwrap() {
            Op::Reconciliation { n, new, reuse, .. } => {
                assert_eq!(n, 3);
                assert_eq!(new.dest_indices, vec![2]);
                assert_eq!(reuse.dest_indices, vec![0, 1]);
                assert_eq!(reuse.source_indices, vec![0, 1]);
            }
            other => panic!("expected reconciliation, got {other:?}"),
        }
    }

    #[test]
    fn unknown_op_type_errors() {
        let v = obj(vec![
            ("type", PulseValue::String("bogus".into())),
            ("path", PulseValue::String("".into())),
        ]);
        assert!(Op::from_value(&v).is_err());
    }
}
