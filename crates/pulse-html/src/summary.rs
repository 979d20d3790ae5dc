//! Compact projections of DOM objects that are too large or too circular
//! to serialize wholesale: elements, `DataTransfer`, `TouchList` (§4.4).

use js_sys::Reflect;
use pulse_core::value::PulseValue;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DataTransfer, Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, Touch, TouchList};

/// `{tag, id, className, name?, value?, checked?, dataset}` for an
/// `EventTarget`-ish value. Non-elements project to `null`.
pub fn element_summary(value: &JsValue) -> PulseValue {
    let Some(el) = value.dyn_ref::<Element>() else {
        return PulseValue::Null;
    };

    let mut entries = indexmap::IndexMap::new();
    entries.insert("tag".to_string(), PulseValue::String(el.tag_name().to_lowercase()));
    entries.insert("id".to_string(), PulseValue::String(el.id()));
    entries.insert("className".to_string(), PulseValue::String(el.class_name()));

    if let Some(input) = value.dyn_ref::<HtmlInputElement>() {
        entries.insert("name".to_string(), PulseValue::String(input.name()));
        entries.insert("value".to_string(), PulseValue::String(input.value()));
        entries.insert("checked".to_string(), PulseValue::Bool(input.checked()));
    } else if let Some(select) = value.dyn_ref::<HtmlSelectElement>() {
        entries.insert("name".to_string(), PulseValue::String(select.name()));
        entries.insert("value".to_string(), PulseValue::String(select.value()));
    } else if let Some(textarea) = value.dyn_ref::<HtmlTextAreaElement>() {
        entries.insert("name".to_string(), PulseValue::String(textarea.name()));
        entries.insert("value".to_string(), PulseValue::String(textarea.value()));
    }

    entries.insert("dataset".to_string(), dataset_summary(el));
    PulseValue::object(entries)
}

fn dataset_summary(el: &Element) -> PulseValue {
    let Ok(dataset) = Reflect::get(el, &JsValue::from_str("dataset")) else {
        return PulseValue::object(indexmap::IndexMap::new());
    };
    let Ok(keys) = js_sys::Object::keys(dataset.unchecked_ref()).dyn_into::<js_sys::Array>() else {
        return PulseValue::object(indexmap::IndexMap::new());
    };
    let mut entries = indexmap::IndexMap::new();
    for key in keys.iter() {
        let Some(key) = key.as_string() else { continue };
        if let Ok(v) = Reflect::get(&dataset, &JsValue::from_str(&key)) {
            if let Some(s) = v.as_string() {
                entries.insert(key, PulseValue::String(s));
            }
        }
    }
    PulseValue::object(entries)
}

/// Item-wise projection of a `DataTransfer`: `{types, files, items}`.
pub fn data_transfer_summary(dt: &DataTransfer) -> PulseValue {
    let types: Vec<PulseValue> = dt
        .types()
        .iter()
        .filter_map(|t| t.as_string())
        .map(PulseValue::String)
        .collect();
    let files = dt.files().map(|f| f.length()).unwrap_or(0);
    let item_count = dt.items().length();

    let mut entries = indexmap::IndexMap::new();
    entries.insert("types".to_string(), PulseValue::array(types));
    entries.insert("fileCount".to_string(), PulseValue::Number(f64::from(files)));
    entries.insert("itemCount".to_string(), PulseValue::Number(f64::from(item_count)));
    PulseValue::object(entries)
}

/// Item-wise projection of a `TouchList`: each touch's
/// `{identifier, clientX, clientY, pageX, pageY, screenX, screenY}`.
pub fn touch_list_summary(list: &TouchList) -> PulseValue {
    let items = (0..list.length())
        .filter_map(|i| list.get(i))
        .map(touch_summary)
        .collect();
    PulseValue::array(items)
}

fn touch_summary(t: Touch) -> PulseValue {
    let mut entries = indexmap::IndexMap::new();
    entries.insert("identifier".to_string(), PulseValue::Number(f64::from(t.identifier())));
    entries.insert("clientX".to_string(), PulseValue::Number(f64::from(t.client_x())));
    entries.insert("clientY".to_string(), PulseValue::Number(f64::from(t.client_y())));
    entries.insert("pageX".to_string(), PulseValue::Number(f64::from(t.page_x())));
    entries.insert("pageY".to_string(), PulseValue::Number(f64::from(t.page_y())));
    entries.insert("screenX".to_string(), PulseValue::Number(f64::from(t.screen_x())));
    entries.insert("screenY".to_string(), PulseValue::Number(f64::from(t.screen_y())));
    PulseValue::object(entries)
}
