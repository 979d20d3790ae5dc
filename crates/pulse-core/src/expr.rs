//! The client-evaluable expression AST (§3 "Expression", §4.2 "Expression
//! evaluation"). This module only parses the tagged wire shape into a typed
//! tree; evaluating it against a lexical environment is a `pulse-web`
//! concern, since only that crate has a JS host to call into.

use indexmap::IndexMap;

use crate::error::VdomError;
use crate::value::PulseValue;

/// One node of an expression tree, tagged on the wire by its `t`
/// discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Component-registry lookup by name.
    Ref { name: String },
    /// Identifier lookup: current environment, falling back to a host
    /// global scope (§4.2).
    Id { name: String },
    /// An already-decoded literal value, passed through untouched.
    Lit { value: PulseValue },
    /// The `undefined` literal — distinct from `Lit(PulseValue::Null)`.
    Undefined,
    Array { items: Vec<Expr> },
    Object { entries: IndexMap<String, Expr> },
    /// `object.property`
    Member { object: Box<Expr>, property: String },
    /// `object[index]`
    Index { object: Box<Expr>, index: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    New { callee: Box<Expr>, args: Vec<Expr> },
    Unary { op: String, argument: Box<Expr> },
    Binary { op: String, left: Box<Expr>, right: Box<Expr> },
    Ternary {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// Template-string quasis interleaved with expressions:
    /// `quasis[0] exprs[0] quasis[1] exprs[1] ... quasis[n]`.
    Template { quasis: Vec<String>, exprs: Vec<Expr> },
    /// Arrow function. The body is a single expression (§9: arrow bodies
    /// are pure expressions, never statement sequences).
    Arrow { params: Vec<String>, body: Box<Expr> },
}

impl Expr {
    /// Parse a tagged expression node (`{t: "...", ...}`). Callers that
    /// already know a value carries a `t` field should prefer this over
    /// going through [`crate::vdom::Node::from_value`].
    pub fn from_value(v: &PulseValue) -> Result<Expr, VdomError> {
        let tag = v
            .get("t")
            .and_then(|t| t.as_str().map(str::to_string))
            .ok_or_else(|| VdomError::MalformedNode("expression missing `t` discriminator".into()))?;

        let field = |key: &str| -> Result<PulseValue, VdomError> {
            v.get(key)
                .ok_or_else(|| VdomError::MalformedNode(format!("expression `{tag}` missing `{key}`")))
        };
        let str_field = |key: &str| -> Result<String, VdomError> {
            field(key)?
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| VdomError::MalformedNode(format!("expression `{tag}`.{key} is not a string")))
        };
        let expr_field = |key: &str| -> Result<Box<Expr>, VdomError> {
            Ok(Box::new(Expr::from_value(&field(key)?)?))
        };
        let expr_list = |key: &str| -> Result<Vec<Expr>, VdomError> {
            field(key)?
                .items()
                .ok_or_else(|| VdomError::MalformedNode(format!("expression `{tag}`.{key} is not an array")))?
                .iter()
                .map(Expr::from_value)
                .collect()
        };
        let str_list = |key: &str| -> Result<Vec<String>, VdomError> {
            field(key)?
                .items()
                .ok_or_else(|| VdomError::MalformedNode(format!("expression `{tag}`.{key} is not an array")))?
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| VdomError::MalformedNode(format!("expression `{tag}`.{key} item is not a string")))
                })
                .collect()
        };

        match tag.as_str() {
            "ref" => Ok(Expr::Ref { name: str_field("name")? }),
            "id" => Ok(Expr::Id { name: str_field("name")? }),
            "lit" => Ok(Expr::Lit { value: field("value")? }),
            "undefined" => Ok(Expr::Undefined),
            "array" => Ok(Expr::Array { items: expr_list("items")? }),
            "object" => {
                let raw = field("entries")?;
                let raw = raw.entries().ok_or_else(|| {
                    VdomError::MalformedNode("expression `object`.entries is not an object".into())
                })?;
                let mut entries = IndexMap::with_capacity(raw.len());
                for (k, v) in raw {
                    entries.insert(k, Expr::from_value(&v)?);
                }
                Ok(Expr::Object { entries })
            }
            "member" => Ok(Expr::Member {
                object: expr_field("object")?,
                property: str_field("property")?,
            }),
            "index" => Ok(Expr::Index {
                object: expr_field("object")?,
                index: expr_field("index")?,
            }),
            "call" => Ok(Expr::Call {
                callee: expr_field("callee")?,
                args: expr_list("args")?,
            }),
            "new" => Ok(Expr::New {
                callee: expr_field("callee")?,
                args: expr_list("args")?,
            }),
            "unary" => Ok(Expr::Unary {
                op: str_field("op")?,
                argument: expr_field("argument")?,
            }),
            "binary" => Ok(Expr::Binary {
                op: str_field("op")?,
                left: expr_field("left")?,
                right: expr_field("right")?,
            }),
            "ternary" => Ok(Expr::Ternary {
                test: expr_field("test")?,
                consequent: expr_field("consequent")?,
                alternate: expr_field("alternate")?,
            }),
            "template" => Ok(Expr::Template {
                quasis: str_list("quasis")?,
                exprs: expr_list("exprs")?,
            }),
            "arrow" => Ok(Expr::Arrow {
                params: str_list("params")?,
                body: expr_field("body")?,
            }),
            other => Err(VdomError::UnknownExprTag { tag: other.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn obj(entries: Vec<(&str, PulseValue)>) -> PulseValue {
        PulseValue::object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn parses_ref_and_id() {
        let v = obj(vec![("t", PulseValue::String("ref".into())), ("name", PulseValue::String("Button".into()))]);
        assert_eq!(Expr::from_value(&v).unwrap(), Expr::Ref { name: "Button".into() });

        let v = obj(vec![("t", PulseValue::String("id".into())), ("name", PulseValue::String("x".into()))]);
        assert_eq!(Expr::from_value(&v).unwrap(), Expr::Id { name: "x".into() });
    }

    #[test]
    fn parses_nested_binary_ternary() {
        let left = obj(vec![("t", PulseValue::String("id".into())), ("name", PulseValue::String("a".into()))]);
        let right = obj(vec![("t", PulseValue::String("lit".into())), ("value", PulseValue::Number(1.0))]);
        let binary = obj(vec![
            ("t", PulseValue::String("binary".into())),
            ("op", PulseValue::String(">".into())),
            ("left", left),
            ("right", right),
        ]);
        let cons = obj(vec![("t", PulseValue::String("lit".into())), ("value", PulseValue::String("yes".into()))]);
        let alt = obj(vec![("t", PulseValue::String("lit".into())), ("value", PulseValue::String("no".into()))]);
        let ternary = obj(vec![
            ("t", PulseValue::String("ternary".into())),
            ("test", binary),
            ("consequent", cons),
            ("alternate", alt),
        ]);
        match Expr::from_value(&ternary).unwrap() {
            Expr::Ternary { test, .. } => assert!(matches!(*test, Expr::Binary { .. })),
            other => panic!("expected ternary, got {other:?}"),
        }
    }

    #[test]
    fn parses_arrow_with_params() {
        let body = obj(vec![("t", PulseValue::String("id".into())), ("name", PulseValue::String("x".into()))]);
        let arrow = obj(vec![
            ("t", PulseValue::String("arrow".into())),
            ("params", PulseValue::array(vec![PulseValue::String("x".into())])),
            ("body", body),
        ]);
        assert_eq!(
            Expr::from_value(&arrow).unwrap(),
            Expr::Arrow {
                params: vec!["x".into()],
                body: Box::new(Expr::Id { name: "x".into() }),
            }
        );
    }

    #[test]
    fn parses_object_ctor_preserving_key_order() {
        let entries = indexmap! {
            "a".to_string() => obj(vec![("t", PulseValue::String("lit".into())), ("value", PulseValue::Number(1.0))]),
            "b".to_string() => obj(vec![("t", PulseValue::String("lit".into())), ("value", PulseValue::Number(2.0))]),
        };
        let v = obj(vec![("t", PulseValue::String("object".into())), ("entries", PulseValue::object(entries))]);
        match Expr::from_value(&v).unwrap() {
            Expr::Object { entries } => assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["a", "b"]),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_errors() {
        let v = obj(vec![("t", PulseValue::String("bogus".into()))]);
        assert_eq!(
            Expr::from_value(&v),
            Err(VdomError::UnknownExprTag { tag: "bogus".into() })
        );
    }
}
