//! Synthetic-event field extraction (§4.4). A value is event-like iff it
//! duck-types as a React `SyntheticEvent`: a `nativeEvent` field plus an
//! `isDefaultPrevented` method. Event-like values are stripped to a fixed
//! per-kind field allowlist; everything else passes through unchanged.

use indexmap::IndexMap;
use js_sys::Reflect;
use pulse_core::value::PulseValue;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DataTransfer, TouchList};

use crate::summary;

const CORE_FIELDS: &[&str] = &[
    "bubbles",
    "cancelable",
    "eventPhase",
    "isTrusted",
    "timeStamp",
    "type",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Pointer,
    Mouse,
    Keyboard,
    Focus,
    Touch,
    Clipboard,
    Composition,
    Drag,
    Wheel,
    Animation,
    Transition,
    Toggle,
    Change,
    Form,
    Ui,
    Unknown,
}

fn kind_for_type(event_type: &str) -> EventKind {
    match event_type {
        t if t.starts_with("pointer") || t == "gotpointercapture" || t == "lostpointercapture" => {
            EventKind::Pointer
        }
        "click" | "dblclick" | "mousedown" | "mouseup" | "mousemove" | "mouseenter" | "mouseleave"
        | "mouseover" | "mouseout" | "contextmenu" | "auxclick" => EventKind::Mouse,
        "keydown" | "keyup" | "keypress" => EventKind::Keyboard,
        "focus" | "blur" | "focusin" | "focusout" => EventKind::Focus,
        "touchstart" | "touchmove" | "touchend" | "touchcancel" => EventKind::Touch,
        "copy" | "cut" | "paste" => EventKind::Clipboard,
        "compositionstart" | "compositionupdate" | "compositionend" => EventKind::Composition,
        "drag" | "dragstart" | "dragend" | "dragenter" | "dragleave" | "dragover" | "drop" => {
            EventKind::Drag
        }
        "wheel" => EventKind::Wheel,
        "animationstart" | "animationiteration" | "animationend" | "animationcancel" => {
            EventKind::Animation
        }
        "transitionrun" | "transitionstart" | "transitionend" | "transitioncancel" => {
            EventKind::Transition
        }
        "toggle" => EventKind::Toggle,
        "change" | "input" | "beforeinput" => EventKind::Change,
        "submit" | "reset" => EventKind::Form,
        "scroll" | "resize" | "load" | "select" => EventKind::Ui,
        _ => EventKind::Unknown,
    }
}

fn extra_fields(kind: EventKind) -> &'static [&'static str] {
    match kind {
        EventKind::Pointer => &[
            "altKey", "button", "buttons", "clientX", "clientY", "ctrlKey", "height", "isPrimary",
            "metaKey", "movementX", "movementY", "offsetX", "offsetY", "pageX", "pageY",
            "pointerId", "pointerType", "pressure", "relatedTarget", "screenX", "screenY",
            "shiftKey", "tangentialPressure", "tiltX", "tiltY", "twist", "width",
        ],
        EventKind::Mouse => &[
            "altKey", "button", "buttons", "clientX", "clientY", "ctrlKey", "metaKey",
            "movementX", "movementY", "offsetX", "offsetY", "pageX", "pageY", "relatedTarget",
            "screenX", "screenY", "shiftKey",
        ],
        EventKind::Keyboard => &[
            "altKey", "charCode", "code", "ctrlKey", "key", "keyCode", "locale", "location",
            "metaKey", "repeat", "shiftKey", "which",
        ],
        EventKind::Focus => &["relatedTarget"],
        EventKind::Touch => &[
            "altKey", "changedTouches", "ctrlKey", "metaKey", "shiftKey", "targetTouches",
            "touches",
        ],
        EventKind::Clipboard => &["clipboardData"],
        EventKind::Composition => &["data", "locale"],
        EventKind::Drag => &[
            "altKey", "button", "buttons", "clientX", "clientY", "ctrlKey", "dataTransfer",
            "metaKey", "pageX", "pageY", "relatedTarget", "screenX", "screenY", "shiftKey",
        ],
        EventKind::Wheel => &[
            "altKey", "button", "buttons", "clientX", "clientY", "ctrlKey", "deltaMode",
            "deltaX", "deltaY", "deltaZ", "metaKey", "pageX", "pageY", "screenX", "screenY",
            "shiftKey",
        ],
        EventKind::Animation => &["animationName", "elapsedTime", "pseudoElement"],
        EventKind::Transition => &["propertyName", "elapsedTime", "pseudoElement"],
        EventKind::Toggle => &["newState", "oldState"],
        EventKind::Change | EventKind::Form => &[],
        EventKind::Ui => &["detail"],
        EventKind::Unknown => &[],
    }
}

/// §4.4 duck-type check: `nativeEvent` field plus a callable
/// `isDefaultPrevented`.
pub fn is_event_like(value: &JsValue) -> bool {
    let has_native = Reflect::has(value, &JsValue::from_str("nativeEvent")).unwrap_or(false);
    if !has_native {
        return false;
    }
    Reflect::get(value, &JsValue::from_str("isDefaultPrevented"))
        .map(|f| f.is_function())
        .unwrap_or(false)
}

/// Strip an event-like value to its kind's field allowlist, or pass any
/// other value through as a generic JSON-ish conversion.
pub fn extract(value: &JsValue) -> PulseValue {
    if !is_event_like(value) {
        return js_to_pulse(value);
    }

    let event_type = Reflect::get(value, &JsValue::from_str("type"))
        .ok()
        .and_then(|t| t.as_string())
        .unwrap_or_default();
    let kind = kind_for_type(&event_type);

    let mut entries = IndexMap::new();
    for &field in CORE_FIELDS.iter().chain(extra_fields(kind)) {
        if let Ok(raw) = Reflect::get(value, &JsValue::from_str(field)) {
            entries.insert(field.to_string(), project_field(field, &raw));
        }
    }
    entries.insert("target".to_string(), project_target(value, "target"));
    entries.insert("defaultPrevented".to_string(), PulseValue::Bool(is_default_prevented(value)));
    PulseValue::object(entries)
}

fn is_default_prevented(value: &JsValue) -> bool {
    let Ok(method) = Reflect::get(value, &JsValue::from_str("isDefaultPrevented")) else {
        return false;
    };
    let Ok(method) = method.dyn_into::<js_sys::Function>() else {
        return false;
    };
    method
        .call0(value)
        .ok()
        .and_then(|r| r.as_bool())
        .unwrap_or(false)
}

fn project_target(value: &JsValue, field: &str) -> PulseValue {
    match Reflect::get(value, &JsValue::from_str(field)) {
        Ok(raw) if !raw.is_undefined() && !raw.is_null() => summary::element_summary(&raw),
        _ => PulseValue::Null,
    }
}

fn project_field(field: &str, raw: &JsValue) -> PulseValue {
    match field {
        "relatedTarget" => {
            if raw.is_undefined() || raw.is_null() {
                PulseValue::Null
            } else {
                summary::element_summary(raw)
            }
        }
        "dataTransfer" => raw
            .dyn_ref::<DataTransfer>()
            .map(summary::data_transfer_summary)
            .unwrap_or(PulseValue::Null),
        "touches" | "changedTouches" | "targetTouches" => raw
            .dyn_ref::<TouchList>()
            .map(summary::touch_list_summary)
            .unwrap_or(PulseValue::Null),
        _ => js_to_pulse(raw),
    }
}

/// Best-effort recursive conversion of an arbitrary `JsValue` into
/// [`PulseValue`] — used for non-event callback args and opaque scalar
/// event fields alike.
fn js_to_pulse(value: &JsValue) -> PulseValue {
    if value.is_null() {
        return PulseValue::Null;
    }
    if value.is_undefined() {
        return PulseValue::Undefined;
    }
    if let Some(b) = value.as_bool() {
        return PulseValue::Bool(b);
    }
    if let Some(n) = value.as_f64() {
        return PulseValue::Number(n);
    }
    if let Some(s) = value.as_string() {
        return PulseValue::String(s);
    }
    if js_sys::Array::is_array(value) {
        let arr: js_sys::Array = value.clone().unchecked_into();
        let items = arr.iter().map(|v| js_to_pulse(&v)).collect();
        return PulseValue::array(items);
    }
    if value.is_object() {
        let keys = js_sys::Object::keys(value.unchecked_ref());
        let mut entries = IndexMap::new();
        for key in keys.iter() {
            let Some(key) = key.as_string() else { continue };
            if let Ok(v) = Reflect::get(value, &JsValue::from_str(&key)) {
                entries.insert(key, js_to_pulse(&v));
            }
        }
        return PulseValue::object(entries);
    }
    PulseValue::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_known_event_types_to_distinct_kinds() {
        assert_eq!(kind_for_type("click"), EventKind::Mouse);
        assert_eq!(kind_for_type("pointerdown"), EventKind::Pointer);
        assert_eq!(kind_for_type("keydown"), EventKind::Keyboard);
        assert_eq!(kind_for_type("touchstart"), EventKind::Touch);
        assert_eq!(kind_for_type("submit"), EventKind::Form);
        assert_eq!(kind_for_type("bogus"), EventKind::Unknown);
    }

    #[test]
    fn unknown_kind_has_no_extra_fields_beyond_core() {
        assert!(extra_fields(EventKind::Unknown).is_empty());
        assert!(extra_fields(EventKind::Form).is_empty());
    }
}
