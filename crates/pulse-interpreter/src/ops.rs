//! Imperative ref-op allowlist (§4.7). A server-held ref targets a live
//! DOM node by `(channelId, refId)`; the bridge forwards `ref:call` /
//! `ref:request` payloads here to be parsed and dispatched against the
//! node the ref registry has mounted for that pair.

use std::collections::HashSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use pulse_core::value::PulseValue;
use regex::Regex;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Element, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
    ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, ScrollToOptions,
};

use crate::error::RefError;

static ATTR_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_:\-.]*$").unwrap());

/// A handful of wire names that don't match their DOM attribute name.
fn attr_alias(name: &str) -> &str {
    match name {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    }
}

static GETTABLE_PROPS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "value", "checked", "disabled", "selected", "className", "id", "textContent",
        "innerText", "scrollTop", "scrollLeft", "tagName",
    ]
    .into_iter()
    .collect()
});

static SETTABLE_PROPS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "value", "checked", "disabled", "selected", "className", "id", "textContent",
        "innerText", "scrollTop", "scrollLeft",
    ]
    .into_iter()
    .collect()
});

fn validate_attr_name(name: &str) -> Result<&str, RefError> {
    let resolved = attr_alias(name);
    if resolved.starts_with("on") || !ATTR_NAME_RE.is_match(resolved) {
        return Err(RefError::InvalidAttrName { name: name.to_string() });
    }
    Ok(resolved)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefOp {
    Focus { prevent_scroll: bool },
    Blur,
    Click,
    Select,
    ScrollIntoView { block: Option<String>, inline: Option<String>, smooth: bool },
    ScrollTo { x: f64, y: f64, smooth: bool },
    ScrollBy { x: f64, y: f64, smooth: bool },
    Submit,
    Reset,
    SetSelectionRange { start: u32, end: u32, direction: Option<String> },
    Measure,
    GetValue,
    SetValue { value: String },
    GetText,
    SetText { text: String },
    GetAttr { name: String },
    SetAttr { name: String, value: String },
    RemoveAttr { name: String },
    GetProp { name: String },
    SetProp { name: String, value: PulseValue },
    SetStyle { entries: IndexMap<String, Option<String>> },
}

impl RefOp {
    pub fn parse(op: &str, args: &PulseValue) -> Result<RefOp, RefError> {
        let str_arg = |key: &str| -> Result<String, RefError> {
            args.get(key)
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or_else(|| RefError::MissingArg { op: op.to_string(), arg: key.to_string() })
        };
        let num_arg = |key: &str| -> Result<f64, RefError> {
            args.get(key)
                .and_then(|v| v.as_f64())
                .ok_or_else(|| RefError::MissingArg { op: op.to_string(), arg: key.to_string() })
        };
        let opt_str_arg = |key: &str| args.get(key).and_then(|v| v.as_str().map(str::to_string));
        let bool_arg = |key: &str| args.get(key).and_then(|v| v.as_bool()).unwrap_or(false);

        match op {
            "focus" => Ok(RefOp::Focus { prevent_scroll: bool_arg("preventScroll") }),
            "blur" => Ok(RefOp::Blur),
            "click" => Ok(RefOp::Click),
            "select" => Ok(RefOp::Select),
            "scrollIntoView" => Ok(RefOp::ScrollIntoView {
                block: opt_str_arg("block"),
                inline: opt_str_arg("inline"),
                smooth: opt_str_arg("behavior").as_deref() == Some("smooth"),
            }),
            "scrollTo" => Ok(RefOp::ScrollTo {
                x: num_arg("left").or_else(|_| num_arg("x"))?,
                y: num_arg("top").or_else(|_| num_arg("y"))?,
                smooth: opt_str_arg("behavior").as_deref() == Some("smooth"),
            }),
            "scrollBy" => Ok(RefOp::ScrollBy {
                x: num_arg("left").or_else(|_| num_arg("x"))?,
                y: num_arg("top").or_else(|_| num_arg("y"))?,
                smooth: opt_str_arg("behavior").as_deref() == Some("smooth"),
            }),
            "submit" => Ok(RefOp::Submit),
            "reset" => Ok(RefOp::Reset),
            "setSelectionRange" => Ok(RefOp::SetSelectionRange {
                start: num_arg("start")? as u32,
                end: num_arg("end")? as u32,
                direction: opt_str_arg("direction"),
            }),
            "measure" => Ok(RefOp::Measure),
            "getValue" => Ok(RefOp::GetValue),
            "setValue" => Ok(RefOp::SetValue { value: str_arg("value")? }),
            "getText" => Ok(RefOp::GetText),
            "setText" => Ok(RefOp::SetText { text: str_arg("text")? }),
            "getAttr" => Ok(RefOp::GetAttr { name: str_arg("name")? }),
            "setAttr" => Ok(RefOp::SetAttr { name: str_arg("name")?, value: str_arg("value")? }),
            "removeAttr" => Ok(RefOp::RemoveAttr { name: str_arg("name")? }),
            "getProp" => Ok(RefOp::GetProp { name: str_arg("name")? }),
            "setProp" => Ok(RefOp::SetProp {
                name: str_arg("name")?,
                value: args.get("value").unwrap_or(PulseValue::Undefined),
            }),
            "setStyle" => {
                let entries = args
                    .get("style")
                    .and_then(|s| s.entries())
                    .ok_or_else(|| RefError::MissingArg { op: op.to_string(), arg: "style".to_string() })?
                    .into_iter()
                    .map(|(k, v)| (k, v.as_str().map(str::to_string)))
                    .collect();
                Ok(RefOp::SetStyle { entries })
            }
            other => Err(RefError::UnsupportedOp { op: other.to_string() }),
        }
    }
}

/// Execute a parsed op against a live element. Returns the op's result
/// payload (`null` for ops with no return value).
pub fn apply(op: &RefOp, node: &Element) -> Result<PulseValue, RefError> {
    match op {
        RefOp::Focus { prevent_scroll } => {
            let html = as_html_element(node)?;
            let opts = web_sys::FocusOptions::new();
            opts.set_prevent_scroll(*prevent_scroll);
            html.focus_with_options(&opts).map_err(js_err)?;
            Ok(PulseValue::Null)
        }
        RefOp::Blur => {
            as_html_element(node)?.blur().map_err(js_err)?;
            Ok(PulseValue::Null)
        }
        RefOp::Click => {
            as_html_element(node)?.click();
            Ok(PulseValue::Null)
        }
        RefOp::Select => {
            if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
                input.select();
            } else if let Some(ta) = node.dyn_ref::<HtmlTextAreaElement>() {
                ta.select();
            }
            Ok(PulseValue::Null)
        }
        RefOp::ScrollIntoView { block, inline, smooth } => {
            let opts = ScrollIntoViewOptions::new();
            opts.set_behavior(if *smooth { ScrollBehavior::Smooth } else { ScrollBehavior::Auto });
            if let Some(block) = block.as_deref() {
                opts.set_block(logical_position(block));
            }
            if let Some(inline) = inline.as_deref() {
                opts.set_inline(logical_position(inline));
            }
            node.scroll_into_view_with_scroll_into_view_options(&opts);
            Ok(PulseValue::Null)
        }
        RefOp::ScrollTo { x, y, smooth } => {
            let opts = ScrollToOptions::new();
            opts.set_left(*x);
            opts.set_top(*y);
            opts.set_behavior(if *smooth { ScrollBehavior::Smooth } else { ScrollBehavior::Auto });
            node.scroll_with_scroll_to_options(&opts);
            Ok(PulseValue::Null)
        }
        RefOp::ScrollBy { x, y, smooth } => {
            let opts = ScrollToOptions::new();
            opts.set_left(*x);
            opts.set_top(*y);
            opts.set_behavior(if *smooth { ScrollBehavior::Smooth } else { ScrollBehavior::Auto });
            node.scroll_by_with_scroll_to_options(&opts);
            Ok(PulseValue::Null)
        }
        RefOp::Submit => {
            node.dyn_ref::<HtmlFormElement>()
                .ok_or_else(|| RefError::UnsupportedOp { op: "submit".into() })?
                .submit()
                .map_err(js_err)?;
            Ok(PulseValue::Null)
        }
        RefOp::Reset => {
            node.dyn_ref::<HtmlFormElement>()
                .ok_or_else(|| RefError::UnsupportedOp { op: "reset".into() })?
                .reset();
            Ok(PulseValue::Null)
        }
        RefOp::SetSelectionRange { start, end, direction } => {
            let input = node
                .dyn_ref::<HtmlInputElement>()
                .ok_or_else(|| RefError::UnsupportedOp { op: "setSelectionRange".into() })?;
            input
                .set_selection_range_with_direction(
                    *start,
                    *end,
                    direction.as_deref().unwrap_or("none"),
                )
                .map_err(js_err)?;
            Ok(PulseValue::Null)
        }
        RefOp::Measure => {
            let rect = node.get_bounding_client_rect();
            let mut entries = IndexMap::new();
            entries.insert("x".to_string(), PulseValue::Number(rect.x()));
            entries.insert("y".to_string(), PulseValue::Number(rect.y()));
            entries.insert("width".to_string(), PulseValue::Number(rect.width()));
            entries.insert("height".to_string(), PulseValue::Number(rect.height()));
            entries.insert("top".to_string(), PulseValue::Number(rect.top()));
            entries.insert("left".to_string(), PulseValue::Number(rect.left()));
            entries.insert("bottom".to_string(), PulseValue::Number(rect.bottom()));
            entries.insert("right".to_string(), PulseValue::Number(rect.right()));
            Ok(PulseValue::object(entries))
        }
        RefOp::GetValue => Ok(PulseValue::String(form_value(node))),
        RefOp::SetValue { value } => {
            set_form_value(node, value);
            Ok(PulseValue::Null)
        }
        RefOp::GetText => Ok(PulseValue::String(node.text_content().unwrap_or_default())),
        RefOp::SetText { text } => {
            node.set_text_content(Some(text));
            Ok(PulseValue::Null)
        }
        RefOp::GetAttr { name } => {
            let resolved = validate_attr_name(name)?;
            Ok(node
                .get_attribute(resolved)
                .map(PulseValue::String)
                .unwrap_or(PulseValue::Null))
        }
        RefOp::SetAttr { name, value } => {
            let resolved = validate_attr_name(name)?;
            node.set_attribute(resolved, value).map_err(js_err)?;
            Ok(PulseValue::Null)
        }
        RefOp::RemoveAttr { name } => {
            let resolved = validate_attr_name(name)?;
            node.remove_attribute(resolved).map_err(js_err)?;
            Ok(PulseValue::Null)
        }
        RefOp::GetProp { name } => {
            if !GETTABLE_PROPS.contains(name.as_str()) {
                return Err(RefError::DisallowedProp { name: name.clone() });
            }
            Ok(get_prop(node, name))
        }
        RefOp::SetProp { name, value } => {
            if !SETTABLE_PROPS.contains(name.as_str()) {
                return Err(RefError::DisallowedProp { name: name.clone() });
            }
            set_prop(node, name, value);
            Ok(PulseValue::Null)
        }
        RefOp::SetStyle { entries } => {
            let html = as_html_element(node)?;
            let style = html.style();
            for (key, value) in entries {
                match value {
                    Some(v) => {
                        let _ = style.set_property(key, v);
                    }
                    None => {
                        let _ = style.remove_property(key);
                    }
                }
            }
            Ok(PulseValue::Null)
        }
    }
}

fn logical_position(name: &str) -> ScrollLogicalPosition {
    match name {
        "start" => ScrollLogicalPosition::Start,
        "end" => ScrollLogicalPosition::End,
        "nearest" => ScrollLogicalPosition::Nearest,
        _ => ScrollLogicalPosition::Center,
    }
}

fn as_html_element(node: &Element) -> Result<&HtmlElement, RefError> {
    node.dyn_ref::<HtmlElement>()
        .ok_or_else(|| RefError::UnsupportedOp { op: "html-element-only-op".into() })
}

fn form_value(node: &Element) -> String {
    if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else if let Some(ta) = node.dyn_ref::<HtmlTextAreaElement>() {
        ta.value()
    } else {
        String::new()
    }
}

fn set_form_value(node: &Element, value: &str) {
    if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    } else if let Some(ta) = node.dyn_ref::<HtmlTextAreaElement>() {
        ta.set_value(value);
    }
}

fn get_prop(node: &Element, name: &str) -> PulseValue {
    match name {
        "value" => PulseValue::String(form_value(node)),
        "checked" => node
            .dyn_ref::<HtmlInputElement>()
            .map(|i| PulseValue::Bool(i.checked()))
            .unwrap_or(PulseValue::Null),
        "disabled" => node
            .dyn_ref::<HtmlInputElement>()
            .map(|i| PulseValue::Bool(i.disabled()))
            .unwrap_or(PulseValue::Null),
        "className" => PulseValue::String(node.class_name()),
        "id" => PulseValue::String(node.id()),
        "textContent" | "innerText" => PulseValue::String(node.text_content().unwrap_or_default()),
        "scrollTop" => PulseValue::Number(node.scroll_top() as f64),
        "scrollLeft" => PulseValue::Number(node.scroll_left() as f64),
        "tagName" => PulseValue::String(node.tag_name()),
        _ => PulseValue::Null,
    }
}

fn set_prop(node: &Element, name: &str, value: &PulseValue) {
    match name {
        "value" => {
            if let Some(s) = value.as_str() {
                set_form_value(node, s);
            }
        }
        "checked" => {
            if let (Some(input), Some(b)) = (node.dyn_ref::<HtmlInputElement>(), value.as_bool()) {
                input.set_checked(b);
            }
        }
        "disabled" => {
            if let (Some(input), Some(b)) = (node.dyn_ref::<HtmlInputElement>(), value.as_bool()) {
                input.set_disabled(b);
            }
        }
        "className" => {
            if let Some(s) = value.as_str() {
                node.set_class_name(s);
            }
        }
        "id" => {
            if let Some(s) = value.as_str() {
                node.set_id(s);
            }
        }
        "textContent" | "innerText" => {
            node.set_text_content(value.as_str());
        }
        "scrollTop" => {
            if let Some(n) = value.as_f64() {
                node.set_scroll_top(n as i32);
            }
        }
        "scrollLeft" => {
            if let Some(n) = value.as_f64() {
                node.set_scroll_left(n as i32);
            }
        }
        _ => {}
    }
}

fn js_err(e: JsValue) -> RefError {
    RefError::Js(e.as_string().unwrap_or_else(|| "unknown JS error".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_on_prefixed_attr_names() {
        assert_eq!(
            validate_attr_name("onClick"),
            Err(RefError::InvalidAttrName { name: "onClick".to_string() })
        );
    }

    #[test]
    fn aliases_class_name_to_class() {
        assert_eq!(validate_attr_name("className").unwrap(), "class");
    }

    #[test]
    fn rejects_malformed_attr_name() {
        assert!(validate_attr_name("1bad").is_err());
        assert!(validate_attr_name("has space").is_err());
    }

    #[test]
    fn parse_unknown_op_errors() {
        let args = PulseValue::object(IndexMap::new());
        assert_eq!(
            RefOp::parse("bogus", &args),
            Err(RefError::UnsupportedOp { op: "bogus".to_string() })
        );
    }

    #[test]
    fn parse_set_attr_requires_name_and_value() {
        let mut entries = IndexMap::new();
        entries.insert("name".to_string(), PulseValue::String("data-id".into()));
        entries.insert("value".to_string(), PulseValue::String("7".into()));
        let args = PulseValue::object(entries);
        assert_eq!(
            RefOp::parse("setAttr", &args).unwrap(),
            RefOp::SetAttr { name: "data-id".into(), value: "7".into() }
        );
    }

    #[test]
    fn parse_focus_defaults_prevent_scroll_false() {
        let args = PulseValue::object(IndexMap::new());
        assert_eq!(RefOp::parse("focus", &args).unwrap(), RefOp::Focus { prevent_scroll: false });
    }
}
