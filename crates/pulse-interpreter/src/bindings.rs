//! The React element-construction boundary (§4.2, §1 "Out of scope": React
//! itself is consumed through a documented interface, not reimplemented).
//! The functions declared here are supplied by the embedding application's
//! JS bundle, which links this wasm module against the real React runtime
//! — this crate only knows the call signatures.

use js_sys::{Array, Object};
use pulse_core::error::VdomError;
use pulse_core::path::Path;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/js/pulse_react_bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = createElement)]
    fn js_create_element(element_type: &JsValue, props: &Object, children: &Array) -> JsValue;

    #[wasm_bindgen(js_name = fragmentType)]
    fn js_fragment_type() -> JsValue;

    #[wasm_bindgen(js_name = resolveComponent)]
    fn js_resolve_component(registry: &JsValue, name: &str) -> JsValue;

    #[wasm_bindgen(js_name = resolveIntrinsic)]
    fn js_resolve_intrinsic(tag: &str) -> JsValue;

    #[wasm_bindgen(js_name = isValidElement)]
    fn js_is_valid_element(value: &JsValue) -> bool;
}

/// Build a React element via `React.createElement`, given an already
/// resolved element type (component, intrinsic, or fragment symbol).
pub fn create_element(element_type: &JsValue, props: &Object, children: &[JsValue]) -> JsValue {
    let arr = Array::new();
    for child in children {
        arr.push(child);
    }
    js_create_element(element_type, props, &arr)
}

/// §4.2 "Critical property preservation": `cloneElement` cannot drop a
/// prop key, so a destructive prop change must reconstruct the element via
/// `createElement` instead; the caller restores `key`/`ref` afterwards.
pub fn reconstruct_element(element_type: &JsValue, props: &Object, children: &[JsValue]) -> JsValue {
    create_element(element_type, props, children)
}

pub fn fragment_type() -> JsValue {
    js_fragment_type()
}

pub fn is_valid_element(value: &JsValue) -> bool {
    js_is_valid_element(value)
}

/// §4.2 "Rendering": resolve a `$$Name` tag's component, failing clearly
/// if the registry doesn't carry it.
pub fn resolve_component(registry: &JsValue, name: &str, path: &Path) -> Result<JsValue, VdomError> {
    let resolved = js_resolve_component(registry, name);
    if resolved.is_undefined() || resolved.is_null() {
        return Err(VdomError::MissingComponent { name: name.to_string(), path: path.clone() });
    }
    Ok(resolved)
}

/// Resolve a plain-string tag to its HTML intrinsic element type.
pub fn resolve_intrinsic(tag: &str, path: &Path) -> Result<JsValue, VdomError> {
    let resolved = js_resolve_intrinsic(tag);
    if resolved.is_undefined() || resolved.is_null() {
        return Err(VdomError::MissingIntrinsic { tag: tag.to_string(), path: path.clone() });
    }
    Ok(resolved)
}

