//! Incoming-message dispatch (§4.5 "Message handling"): routes a decoded
//! [`ServerMessage`] to the addressed view, the channel bridge, or a
//! browser-level effect (`fetch`, navigation, reload).

use indexmap::IndexMap;
use js_sys::Array;
use pulse_core::message::{ClientMessage, ServerMessage};
use pulse_core::value::PulseValue;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Headers, Location, Request, RequestCredentials, RequestInit, Response};

use crate::session::Session;

pub fn dispatch(session: &Session, message: ServerMessage) {
    match message {
        ServerMessage::VdomInit { path, vdom } => {
            session.with_view(&path, |view| (view.on_init)(vdom));
        }
        ServerMessage::VdomUpdate { path, ops } => {
            session.with_view(&path, |view| (view.on_update)(ops));
        }
        ServerMessage::ServerError { path, error } => match path {
            Some(path) => {
                session.with_view(&path, |view| (view.on_server_error)(error));
            }
            None => tracing::error!(message = %error.message, "server error with no attached path"),
        },
        ServerMessage::ApiCall { id, url, method, headers, body, credentials } => {
            spawn_api_call(session.clone(), id, url, method, headers, body, credentials);
        }
        ServerMessage::NavigateTo { path, replace, hard } => navigate_to(&path, replace, hard),
        ServerMessage::Reload => reload(),
        ServerMessage::ChannelMessage(envelope) => session.channels().dispatch_incoming(envelope),
        ServerMessage::JsExec { path, id, expr } => {
            let handled = session.with_view(&path, |view| (view.on_js_exec)(id.clone(), expr)).is_some();
            if !handled {
                session.send_message(ClientMessage::JsResult { id, result: None, error: None });
            }
        }
    }
}

/// §4.5 "classify destination. If `hard`, use a full-document load ...
/// Protocol-relative `//host` is normalized to the current protocol.
/// Absolute `http(s)` URLs whose origin matches the current document
/// navigate via the SPA router; other origins or schemes do a
/// full-document load. Relative paths navigate via the SPA router."
fn navigate_to(path: &str, replace: bool, hard: bool) {
    let Some(window) = web_sys::window() else { return };
    let location = window.location();
    let current = location.href().unwrap_or_default();
    let normalized = normalize_navigate_target(&location, path);

    if hard {
        hard_navigate(&location, &normalized, replace);
        return;
    }

    match pulse_router::navigation::resolve(&current, &normalized) {
        Ok(destination @ pulse_router::navigation::Destination::Internal { .. }) => {
            let options = pulse_router::navigation::NavigateOptions { replace, ..Default::default() };
            if let Err(err) =
                pulse_router::navigation::web::navigate(&destination, &options, &pulse_router::NoopLoader)
            {
                tracing::warn!(%err, "spa navigation failed, falling back to hard navigation");
                hard_navigate(&location, &normalized, replace);
            }
        }
        Ok(pulse_router::navigation::Destination::External { url }) => hard_navigate(&location, &url, replace),
        Err(err) => tracing::warn!(%err, target = %normalized, "failed to resolve navigate_to target"),
    }
}

fn normalize_navigate_target(location: &Location, path: &str) -> String {
    if let Some(rest) = path.strip_prefix("//") {
        let protocol = location.protocol().unwrap_or_else(|_| "https:".to_string());
        format!("{protocol}//{rest}")
    } else {
        path.to_string()
    }
}

fn hard_navigate(location: &Location, url: &str, replace: bool) {
    let result = if replace { location.replace(url) } else { location.assign(url) };
    if let Err(err) = result {
        tracing::warn!(?err, url, "hard navigation failed");
    }
}

fn reload() {
    if let Some(window) = web_sys::window() {
        let _ = window.location().reload();
    }
}

fn spawn_api_call(
    session: Session,
    id: String,
    url: String,
    method: String,
    headers: IndexMap<String, String>,
    body: Option<PulseValue>,
    credentials: String,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let message = match perform_fetch(&url, &method, &headers, body.as_ref(), &credentials).await {
            Ok((status, headers, body)) => {
                ClientMessage::ApiResult { id, ok: (200..300).contains(&status), status, headers, body }
            }
            Err(error) => {
                let mut details = IndexMap::new();
                details.insert("error".to_string(), PulseValue::String(error));
                ClientMessage::ApiResult {
                    id,
                    ok: false,
                    status: 0,
                    headers: IndexMap::new(),
                    body: PulseValue::object(details),
                }
            }
        };
        session.send_message(message);
    });
}

/// §4.5 "perform a `fetch` ...; JSON-decode when content-type is JSON, else
/// decode as text; reply with `api_result` containing status, headers,
/// body, and an `ok` flag."
async fn perform_fetch(
    url: &str,
    method: &str,
    headers: &IndexMap<String, String>,
    body: Option<&PulseValue>,
    credentials: &str,
) -> Result<(u16, IndexMap<String, String>, PulseValue), String> {
    let mut opts = RequestInit::new();
    opts.method(method);
    opts.credentials(parse_credentials(credentials));
    if let Some(body) = body {
        let json = serde_json::to_string(&crate::json::from_pulse_value(body)).map_err(|err| err.to_string())?;
        opts.body(Some(&JsValue::from_str(&json)));
    }

    let request = Request::new_with_str_and_init(url, &opts).map_err(|err| format!("{err:?}"))?;
    {
        let request_headers = request.headers();
        for (key, value) in headers {
            request_headers.set(key, value).map_err(|err| format!("{err:?}"))?;
        }
    }

    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let response_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|err| format!("{err:?}"))?;
    let response: Response = response_value.dyn_into().map_err(|_| "fetch did not resolve to a Response".to_string())?;
    let status = response.status();
    let response_headers = collect_headers(&response.headers());
    let content_type = response_headers.get("content-type").cloned().unwrap_or_default();

    let text_value = wasm_bindgen_futures::JsFuture::from(response.text().map_err(|err| format!("{err:?}"))?)
        .await
        .map_err(|err| format!("{err:?}"))?;
    let text = text_value.as_string().unwrap_or_default();

    let body = if content_type.contains("json") {
        if text.is_empty() {
            PulseValue::Null
        } else {
            let value: serde_json::Value = serde_json::from_str(&text).map_err(|err| err.to_string())?;
            crate::json::to_pulse_value(&value)
        }
    } else {
        PulseValue::String(text)
    };

    Ok((status, response_headers, body))
}

fn parse_credentials(value: &str) -> RequestCredentials {
    match value {
        "omit" => RequestCredentials::Omit,
        "same-origin" => RequestCredentials::SameOrigin,
        _ => RequestCredentials::Include,
    }
}

fn collect_headers(headers: &Headers) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    let Some(iterator) = js_sys::try_iter(headers).ok().flatten() else { return map };
    for entry in iterator.flatten() {
        let pair: Array = entry.unchecked_into();
        if let (Some(key), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
            map.insert(key, value);
        }
    }
    map
}

