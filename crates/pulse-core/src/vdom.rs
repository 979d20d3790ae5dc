//! VDOM node types (§3 "VDOM node"). A node is a primitive, an element, or
//! an expression; this module owns parsing the decoded wire graph into that
//! shape. Turning an element into a live React tree — resolving component
//! references, evaluating `eval`-marked props, binding callbacks — is the
//! renderer's job (`pulse-web`), since it needs a JS host.

use indexmap::IndexMap;

use crate::error::VdomError;
use crate::expr::Expr;
use crate::value::PulseValue;

/// A leaf value: string, number, boolean, null, or undefined (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
}

/// An element's `tag` (§3): a plain string, or an expression that must be
/// evaluated to obtain a component reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Static(String),
    Dynamic(Box<Expr>),
}

/// How a [`Tag::Static`] string should be resolved at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticTagKind<'a> {
    Fragment,
    /// Component name, with the `$$` prefix stripped.
    Component(&'a str),
    Intrinsic(&'a str),
}

impl Tag {
    /// Classifies a static tag string per §4.2 "Rendering": empty is a
    /// fragment, `$$Name` is a registered component, anything else is an
    /// HTML intrinsic. `None` for a dynamic (expression) tag — the caller
    /// must evaluate it first.
    pub fn classify(&self) -> Option<StaticTagKind<'_>> {
        match self {
            Tag::Static(s) if s.is_empty() => Some(StaticTagKind::Fragment),
            Tag::Static(s) => s
                .strip_prefix("$$")
                .map(StaticTagKind::Component)
                .or(Some(StaticTagKind::Intrinsic(s))),
            Tag::Dynamic(_) => None,
        }
    }
}

/// `{ tag, key?, props?, children?, eval? }` (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub key: Option<String>,
    /// Raw prop values, keyed in wire order. Interpretation of
    /// `eval`-marked entries (callback placeholder, expression, nested
    /// element) happens in the renderer.
    pub props: IndexMap<String, PulseValue>,
    pub children: Vec<Node>,
    /// Prop keys whose values require client-side interpretation.
    pub eval: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Primitive(Primitive),
    Element(Element),
    Expr(Expr),
}

impl Node {
    /// Parse a decoded wire value into a VDOM node. Dispatches on shape:
    /// an object with a `tag` key is an element, one with a `t` key is an
    /// expression, anything else must be a primitive.
    pub fn from_value(v: &PulseValue) -> Result<Node, VdomError> {
        if v.has_key("tag") {
            return Ok(Node::Element(parse_element(v)?));
        }
        if v.has_key("t") {
            return Ok(Node::Expr(Expr::from_value(v)?));
        }
        match v {
            PulseValue::Null => Ok(Node::Primitive(Primitive::Null)),
            PulseValue::Undefined => Ok(Node::Primitive(Primitive::Undefined)),
            PulseValue::Bool(b) => Ok(Node::Primitive(Primitive::Bool(*b))),
            PulseValue::Number(n) => Ok(Node::Primitive(Primitive::Number(*n))),
            PulseValue::String(s) => Ok(Node::Primitive(Primitive::String(s.clone()))),
            _ => Err(VdomError::MalformedNode(
                "value is neither a primitive, an element, nor a tagged expression".into(),
            )),
        }
    }
}

fn parse_element(v: &PulseValue) -> Result<Element, VdomError> {
    let tag_value = v
        .get("tag")
        .ok_or_else(|| VdomError::MalformedNode("element missing `tag`".into()))?;
    let tag = match &tag_value {
        PulseValue::String(s) => Tag::Static(s.clone()),
        other if other.has_key("t") => Tag::Dynamic(Box::new(Expr::from_value(other)?)),
        _ => {
            return Err(VdomError::MalformedNode(
                "element `tag` is neither a string nor an expression".into(),
            ))
        }
    };

    let key = v.get("key").and_then(|k| k.as_str().map(str::to_string));

    let props = v.get("props").and_then(|p| p.entries()).unwrap_or_default();

    let children = match v.get("children") {
        Some(c) => c
            .items()
            .ok_or_else(|| VdomError::MalformedNode("element `children` is not an array".into()))?
            .iter()
            .map(Node::from_value)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let eval = match v.get("eval") {
        Some(e) => e
            .items()
            .ok_or_else(|| VdomError::MalformedNode("element `eval` is not an array".into()))?
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| VdomError::MalformedNode("element `eval` entry is not a string".into()))
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(Element { tag, key, props, children, eval })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(entries: Vec<(&str, PulseValue)>) -> PulseValue {
        PulseValue::object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn parses_primitive_string() {
        let v = PulseValue::String("Hello".into());
        assert_eq!(
            Node::from_value(&v).unwrap(),
            Node::Primitive(Primitive::String("Hello".into()))
        );
    }

    #[test]
    fn parses_div_with_children() {
        let v = obj(vec![
            ("tag", PulseValue::String("div".into())),
            ("children", PulseValue::array(vec![PulseValue::String("Hello".into())])),
        ]);
        let node = Node::from_value(&v).unwrap();
        match node {
            Node::Element(el) => {
                assert_eq!(el.tag, Tag::Static("div".into()));
                assert_eq!(el.children.len(), 1);
                assert_eq!(el.tag.classify(), Some(StaticTagKind::Intrinsic("div")));
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn empty_tag_is_fragment() {
        let tag = Tag::Static(String::new());
        assert_eq!(tag.classify(), Some(StaticTagKind::Fragment));
    }

    #[test]
    fn dollar_prefixed_tag_is_component() {
        let tag = Tag::Static("$$Counter".into());
        assert_eq!(tag.classify(), Some(StaticTagKind::Component("Counter")));
    }

    #[test]
    fn parses_eval_marked_callback_prop() {
        let mut props = IndexMap::new();
        props.insert("onClick".to_string(), PulseValue::String("$cb".into()));
        let v = obj(vec![
            ("tag", PulseValue::String("button".into())),
            ("props", PulseValue::object(props)),
            ("eval", PulseValue::array(vec![PulseValue::String("onClick".into())])),
        ]);
        match Node::from_value(&v).unwrap() {
            Node::Element(el) => {
                assert_eq!(el.eval, vec!["onClick".to_string()]);
                assert_eq!(el.props.get("onClick").unwrap().as_str(), Some("$cb"));
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn malformed_node_errors() {
        let v = PulseValue::array(vec![]);
        assert!(Node::from_value(&v).is_err());
    }
}
