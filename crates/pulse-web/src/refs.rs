//! Ref registry bridge (§4.7): wires the imperative ref-op allowlist
//! (`pulse_interpreter::ops`) to a channel's `ref:call`/`ref:request`
//! events, and produces the React callback-ref function for each
//! `(channelId, refId)` pair — `ref:mounted`/`ref:unmounted` fire on
//! attach/detach.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use pulse_core::value::PulseValue;
use pulse_interpreter::ops::{self, RefOp};
use pulse_interpreter::RefError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Element;

use crate::channel::ChannelRegistry;
use crate::error::PulseError;

type NodeKey = (String, String);

#[derive(Default)]
struct Nodes(RefCell<HashMap<NodeKey, Element>>);

pub struct RefRegistry {
    nodes: Rc<Nodes>,
    channels: Rc<ChannelRegistry>,
}

impl RefRegistry {
    pub fn new(channels: Rc<ChannelRegistry>) -> RefRegistry {
        RefRegistry { nodes: Rc::new(Nodes::default()), channels }
    }

    /// Wire `ref:call` (fire-and-forget) and `ref:request`
    /// (response-returning) for `channel_id`. Call once per channel, e.g.
    /// when the channel is first acquired.
    pub fn register_channel(&self, channel_id: &str) {
        let nodes = Rc::clone(&self.nodes);
        let id = channel_id.to_string();
        self.channels.on(
            channel_id,
            "ref:call",
            Rc::new(move |payload| {
                if let Err(err) = dispatch(&nodes, &id, payload) {
                    tracing::warn!(channel = %id, error = %err, "ref:call failed");
                }
            }),
        );

        let nodes = Rc::clone(&self.nodes);
        let id = channel_id.to_string();
        self.channels.on_request(
            channel_id,
            "ref:request",
            Rc::new(move |payload| dispatch(&nodes, &id, payload).map_err(PulseError::from)),
        );
    }

    /// Forget every tracked node without emitting `ref:unmounted` — used by
    /// `Session::disconnect()`, which tears down the whole bridge at once.
    pub fn clear(&self) {
        self.nodes.0.borrow_mut().clear();
    }

    /// A React callback-ref for `(channel_id, ref_id)`: tracks the mounted
    /// node and emits `ref:mounted`/`ref:unmounted` through the channel.
    pub fn callback_ref(&self, channel_id: &str, ref_id: &str) -> JsValue {
        let nodes = Rc::clone(&self.nodes);
        let channels = Rc::clone(&self.channels);
        let channel_id = channel_id.to_string();
        let ref_id = ref_id.to_string();
        let key: NodeKey = (channel_id.clone(), ref_id.clone());

        let closure = wasm_bindgen::closure::Closure::wrap(Box::new(move |node: JsValue| {
            if node.is_null() || node.is_undefined() {
                nodes.0.borrow_mut().remove(&key);
                channels.emit(&channel_id, "ref:unmounted", Some(ref_id_payload(&ref_id)));
            } else if let Some(element) = node.dyn_ref::<Element>() {
                nodes.0.borrow_mut().insert(key.clone(), element.clone());
                channels.emit(&channel_id, "ref:mounted", Some(ref_id_payload(&ref_id)));
            }
        }) as Box<dyn FnMut(JsValue)>);

        let function: js_sys::Function = closure.as_ref().clone().unchecked_into();
        closure.forget();
        function.into()
    }
}

fn ref_id_payload(ref_id: &str) -> PulseValue {
    let mut entries = IndexMap::new();
    entries.insert("refId".to_string(), PulseValue::String(ref_id.to_string()));
    PulseValue::object(entries)
}

/// Parses `{refId, op, args}` out of an incoming `ref:call`/`ref:request`
/// payload and runs it against the mounted node for `(channel_id, refId)`.
fn dispatch(nodes: &Nodes, channel_id: &str, payload: Option<PulseValue>) -> Result<PulseValue, RefError> {
    let payload = payload.unwrap_or(PulseValue::Undefined);
    let ref_id = payload
        .get("refId")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| RefError::MissingArg { op: "dispatch".into(), arg: "refId".into() })?;
    let op_name = payload
        .get("op")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| RefError::MissingArg { op: "dispatch".into(), arg: "op".into() })?;
    let args = payload.get("args").unwrap_or_else(|| PulseValue::object(IndexMap::new()));

    let op = RefOp::parse(&op_name, &args)?;
    let node = nodes
        .0
        .borrow()
        .get(&(channel_id.to_string(), ref_id.clone()))
        .cloned()
        .ok_or_else(|| RefError::MissingNode { channel_id: channel_id.to_string(), ref_id })?;
    ops::apply(&op, &node)
}

// Mounting/unmounting drives real `web-sys` `Element`s, which only work on
// the `wasm32` target — see `tests/refs.rs` for `wasm_bindgen_test` coverage.
