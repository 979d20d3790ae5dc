//! Wire protocol messages (§6 "External interfaces"). Each message is the
//! body half of a codec envelope; the session client is responsible for
//! the codec round-trip, this module only knows the tagged-union shapes.

use indexmap::IndexMap;

use crate::error::VdomError;
use crate::expr::Expr;
use crate::patch::Op;
use crate::route::RouteInfo;
use crate::value::PulseValue;
use crate::vdom::Node;

/// `server_error.error` (§6).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerErrorInfo {
    pub message: String,
    pub stack: Option<String>,
    pub code: Option<String>,
    pub phase: Option<String>,
    pub details: Option<PulseValue>,
}

/// Shared shape of `channel_message` in both directions (§6): either an
/// `event` (fire-and-forget / request) or a `responseTo` (reply).
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEnvelope {
    pub channel: String,
    pub event: Option<String>,
    pub response_to: Option<String>,
    pub payload: Option<PulseValue>,
    pub request_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    VdomInit { path: String, vdom: Node },
    VdomUpdate { path: String, ops: Vec<Op> },
    ServerError { path: Option<String>, error: ServerErrorInfo },
    ApiCall {
        id: String,
        url: String,
        method: String,
        headers: IndexMap<String, String>,
        body: Option<PulseValue>,
        credentials: String,
    },
    NavigateTo { path: String, replace: bool, hard: bool },
    Reload,
    ChannelMessage(ChannelEnvelope),
    JsExec { path: String, id: String, expr: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Attach { path: String, route_info: RouteInfo },
    Update { path: String, route_info: RouteInfo },
    Detach { path: String },
    Callback { path: String, callback: String, args: Vec<PulseValue> },
    ApiResult {
        id: String,
        ok: bool,
        status: u16,
        headers: IndexMap<String, String>,
        body: PulseValue,
    },
    ChannelMessage(ChannelEnvelope),
    JsResult { id: String, result: Option<PulseValue>, error: Option<String> },
}

fn field(v: &PulseValue, key: &str, ctx: &str) -> Result<PulseValue, VdomError> {
    v.get(key)
        .ok_or_else(|| VdomError::MalformedNode(format!("`{ctx}` missing `{key}`")))
}

fn str_field(v: &PulseValue, key: &str, ctx: &str) -> Result<String, VdomError> {
    field(v, key, ctx)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| VdomError::MalformedNode(format!("`{ctx}`.{key} is not a string")))
}

fn opt_str(v: &PulseValue, key: &str) -> Option<String> {
    v.get(key).and_then(|f| f.as_str().map(str::to_string))
}

fn bool_field(v: &PulseValue, key: &str, default: bool) -> bool {
    v.get(key).and_then(|f| f.as_bool()).unwrap_or(default)
}

fn header_map(v: &PulseValue, key: &str) -> IndexMap<String, String> {
    v.get(key)
        .and_then(|h| h.entries())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
        .collect()
}

fn channel_envelope(v: &PulseValue, ctx: &str) -> Result<ChannelEnvelope, VdomError> {
    Ok(ChannelEnvelope {
        channel: str_field(v, "channel", ctx)?,
        event: opt_str(v, "event"),
        response_to: opt_str(v, "responseTo"),
        payload: v.get("payload"),
        request_id: opt_str(v, "requestId"),
        error: opt_str(v, "error"),
    })
}

fn channel_envelope_to_value(e: &ChannelEnvelope) -> PulseValue {
    let mut entries = IndexMap::new();
    entries.insert("channel".to_string(), PulseValue::String(e.channel.clone()));
    if let Some(event) = &e.event {
        entries.insert("event".to_string(), PulseValue::String(event.clone()));
    }
    if let Some(response_to) = &e.response_to {
        entries.insert("responseTo".to_string(), PulseValue::String(response_to.clone()));
    }
    if let Some(payload) = &e.payload {
        entries.insert("payload".to_string(), payload.clone());
    }
    if let Some(request_id) = &e.request_id {
        entries.insert("requestId".to_string(), PulseValue::String(request_id.clone()));
    }
    if let Some(error) = &e.error {
        entries.insert("error".to_string(), PulseValue::String(error.clone()));
    }
    PulseValue::object(entries)
}

impl ServerMessage {
    pub fn from_value(v: &PulseValue) -> Result<ServerMessage, VdomError> {
        let msg_type = str_field(v, "type", "server message")?;
        match msg_type.as_str() {
            "vdom_init" => Ok(ServerMessage::VdomInit {
                path: str_field(v, "path", "vdom_init")?,
                vdom: Node::from_value(&field(v, "vdom", "vdom_init")?)?,
            }),
            "vdom_update" => {
                let ops = field(v, "ops", "vdom_update")?
                    .items()
                    .ok_or_else(|| VdomError::MalformedNode("vdom_update.ops is not an array".into()))?
                    .iter()
                    .map(Op::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ServerMessage::VdomUpdate { path: str_field(v, "path", "vdom_update")?, ops })
            }
            "server_error" => {
                let error_value = field(v, "error", "server_error")?;
                let error = ServerErrorInfo {
                    message: str_field(&error_value, "message", "server_error.error")?,
                    stack: opt_str(&error_value, "stack"),
                    code: opt_str(&error_value, "code"),
                    phase: opt_str(&error_value, "phase"),
                    details: error_value.get("details"),
                };
                Ok(ServerMessage::ServerError { path: opt_str(v, "path"), error })
            }
            "api_call" => Ok(ServerMessage::ApiCall {
                id: str_field(v, "id", "api_call")?,
                url: str_field(v, "url", "api_call")?,
                method: v.get("method").and_then(|m| m.as_str().map(str::to_string)).unwrap_or_else(|| "GET".into()),
                headers: header_map(v, "headers"),
                body: v.get("body"),
                credentials: v
                    .get("credentials")
                    .and_then(|c| c.as_str().map(str::to_string))
                    .unwrap_or_else(|| "include".into()),
            }),
            "navigate_to" => Ok(ServerMessage::NavigateTo {
                path: str_field(v, "path", "navigate_to")?,
                replace: bool_field(v, "replace", false),
                hard: bool_field(v, "hard", false),
            }),
            "reload" => Ok(ServerMessage::Reload),
            "channel_message" => Ok(ServerMessage::ChannelMessage(channel_envelope(v, "channel_message")?)),
            "js_exec" => Ok(ServerMessage::JsExec {
                path: str_field(v, "path", "js_exec")?,
                id: str_field(v, "id", "js_exec")?,
                expr: Expr::from_value(&field(v, "expr", "js_exec")?)?,
            }),
            other => Err(VdomError::MalformedNode(format!("unknown server message type `{other}`"))),
        }
    }
}

impl ClientMessage {
    pub fn to_value(&self) -> PulseValue {
        let mut entries: IndexMap<String, PulseValue> = IndexMap::new();
        match self {
            ClientMessage::Attach { path, route_info } => {
                entries.insert("type".into(), PulseValue::String("attach".into()));
                entries.insert("path".into(), PulseValue::String(path.clone()));
                entries.insert("routeInfo".into(), route_info.to_value());
            }
            ClientMessage::Update { path, route_info } => {
                entries.insert("type".into(), PulseValue::String("update".into()));
                entries.insert("path".into(), PulseValue::String(path.clone()));
                entries.insert("routeInfo".into(), route_info.to_value());
            }
            ClientMessage::Detach { path } => {
                entries.insert("type".into(), PulseValue::String("detach".into()));
                entries.insert("path".into(), PulseValue::String(path.clone()));
            }
            ClientMessage::Callback { path, callback, args } => {
                entries.insert("type".into(), PulseValue::String("callback".into()));
                entries.insert("path".into(), PulseValue::String(path.clone()));
                entries.insert("callback".into(), PulseValue::String(callback.clone()));
                entries.insert("args".into(), PulseValue::array(args.clone()));
            }
            ClientMessage::ApiResult { id, ok, status, headers, body } => {
                entries.insert("type".into(), PulseValue::String("api_result".into()));
                entries.insert("id".into(), PulseValue::String(id.clone()));
                entries.insert("ok".into(), PulseValue::Bool(*ok));
                entries.insert("status".into(), PulseValue::Number(f64::from(*status)));
                let headers = headers.iter().map(|(k, v)| (k.clone(), PulseValue::String(v.clone()))).collect();
                entries.insert("headers".into(), PulseValue::object(headers));
                entries.insert("body".into(), body.clone());
            }
            ClientMessage::ChannelMessage(env) => return channel_envelope_with_type(env),
            ClientMessage::JsResult { id, result, error } => {
                entries.insert("type".into(), PulseValue::String("js_result".into()));
                entries.insert("id".into(), PulseValue::String(id.clone()));
                if let Some(result) = result {
                    entries.insert("result".into(), result.clone());
                }
                if let Some(error) = error {
                    entries.insert("error".into(), PulseValue::String(error.clone()));
                }
            }
        }
        PulseValue::object(entries)
    }
}

fn channel_envelope_with_type(env: &ChannelEnvelope) -> PulseValue {
    let mut entries = IndexMap::new();
    entries.insert("type".to_string(), PulseValue::String("channel_message".into()));
    if let Some(inner) = channel_envelope_to_value(env).entries() {
        entries.extend(inner);
    }
    PulseValue::object(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(entries: Vec<(&str, PulseValue)>) -> PulseValue {
        PulseValue::object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn parses_vdom_init() {
        let v = obj(vec![
            ("type", PulseValue::String("vdom_init".into())),
            ("path", PulseValue::String("/".into())),
            ("vdom", PulseValue::String("Hello".into())),
        ]);
        match ServerMessage::from_value(&v).unwrap() {
            ServerMessage::VdomInit { path, .. } => assert_eq!(path, "/"),
            other => panic!("expected vdom_init, got {other:?}"),
        }
    }

    #[test]
    fn api_call_defaults_method_and_credentials() {
        let v = obj(vec![
            ("type", PulseValue::String("api_call".into())),
            ("id", PulseValue::String("1".into())),
            ("url", PulseValue::String("/api".into())),
        ]);
        match ServerMessage::from_value(&v).unwrap() {
            ServerMessage::ApiCall { method, credentials, .. } => {
                assert_eq!(method, "GET");
                assert_eq!(credentials, "include");
            }
            other => panic!("expected api_call, got {other:?}"),
        }
    }

    #[test]
    fn callback_message_round_trips_to_value() {
        let msg = ClientMessage::Callback {
            path: "/test".into(),
            callback: "onClick".into(),
            args: vec![PulseValue::String("x".into())],
        };
        let v = msg.to_value();
        assert_eq!(v.get("type").unwrap().as_str(), Some("callback"));
        assert_eq!(v.get("path").unwrap().as_str(), Some("/test"));
        assert_eq!(v.get("callback").unwrap().as_str(), Some("onClick"));
    }

    #[test]
    fn unknown_server_message_type_errors() {
        let v = obj(vec![("type", PulseValue::String("bogus".into()))]);
        assert!(ServerMessage::from_value(&v).is_err());
    }
}
