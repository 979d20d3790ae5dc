//! Hydration reader (§6 "Hydration contract"): the HTML page embeds a
//! `<script id="__PULSE_DATA__">` whose text is `{ vdom, routeInfo }`,
//! read once before the socket opens.

use pulse_core::route::RouteInfo;
use pulse_core::vdom::Node;
use pulse_core::VdomError;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

pub const HYDRATION_ELEMENT_ID: &str = "__PULSE_DATA__";

#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    #[error("no document available")]
    NoDocument,
    #[error("`#{0}` element not found")]
    ElementNotFound(&'static str),
    #[error("hydration payload is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("hydration payload missing `{0}`")]
    MissingField(&'static str),
    #[error(transparent)]
    Vdom(#[from] VdomError),
}

pub struct HydrationData {
    pub vdom: Node,
    pub route_info: RouteInfo,
}

/// Reads and parses the hydration script, if present. Callers treat a
/// missing script as "no hydration data" rather than an error — only an
/// element that exists but fails to parse is an [`HydrationError`].
pub fn read() -> Result<Option<HydrationData>, HydrationError> {
    let document = web_sys::window().and_then(|w| w.document()).ok_or(HydrationError::NoDocument)?;
    let Some(element) = document.get_element_by_id(HYDRATION_ELEMENT_ID) else {
        return Ok(None);
    };
    let script: HtmlScriptElement =
        element.dyn_into().map_err(|_| HydrationError::ElementNotFound(HYDRATION_ELEMENT_ID))?;
    parse(&script.text().unwrap_or_default()).map(Some)
}

fn parse(text: &str) -> Result<HydrationData, HydrationError> {
    let payload: serde_json::Value = serde_json::from_str(text)?;
    let vdom_json = payload.get("vdom").ok_or(HydrationError::MissingField("vdom"))?;
    let route_info_json = payload.get("routeInfo").ok_or(HydrationError::MissingField("routeInfo"))?;

    let vdom = Node::from_value(&crate::json::to_pulse_value(vdom_json))?;
    let route_info = RouteInfo::from_value(&crate::json::to_pulse_value(route_info_json))?;
    Ok(HydrationData { vdom, route_info })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vdom_and_route_info() {
        let text = r#"{"vdom": "Hello", "routeInfo": {"pathname": "/", "hash": "", "query": "", "queryParams": {}, "pathParams": {}, "catchall": []}}"#;
        let data = parse(text).unwrap();
        assert_eq!(data.route_info.pathname, "/");
        assert!(matches!(data.vdom, Node::Primitive(_)));
    }

    #[test]
    fn missing_vdom_field_errors() {
        let text = r#"{"routeInfo": {}}"#;
        assert!(matches!(parse(text), Err(HydrationError::MissingField("vdom"))));
    }

    #[test]
    fn invalid_json_errors() {
        assert!(matches!(parse("not json"), Err(HydrationError::InvalidJson(_))));
    }
}
