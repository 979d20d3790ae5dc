//! Channel bridge (§4.6): named, refcounted bidirectional subchannels
//! multiplexed over the session. A channel is created on first
//! [`ChannelRegistry::acquire`] and disposed on the matching release that
//! drops its refcount to zero.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use pulse_core::message::ChannelEnvelope;
use pulse_core::value::PulseValue;

use crate::error::PulseError;

pub type Unsubscribe = Box<dyn FnOnce()>;
pub type Handler = Rc<dyn Fn(Option<PulseValue>)>;
pub type DisconnectHandler = Rc<dyn Fn()>;
/// Answers a server-initiated request-style event (e.g. `ref:request`);
/// the bridge sends the result back as a `responseTo` reply.
pub type RequestHandler = Rc<dyn Fn(Option<PulseValue>) -> Result<PulseValue, PulseError>>;
type ResponseCallback = Box<dyn FnOnce(Result<Option<PulseValue>, PulseError>)>;

/// Sends a fully-formed `channel_message` client message through the
/// session's outbound path.
pub type OutboundSender = Rc<dyn Fn(ChannelEnvelope)>;

#[derive(Default)]
struct Entry {
    ref_count: usize,
    handlers: HashMap<String, Vec<(u64, Handler)>>,
    request_handlers: HashMap<String, RequestHandler>,
    disconnect_handlers: Vec<(u64, DisconnectHandler)>,
    pending: HashMap<String, ResponseCallback>,
}

pub struct ChannelRegistry {
    entries: Rc<RefCell<HashMap<String, Entry>>>,
    sender: OutboundSender,
    next_id: Rc<Cell<u64>>,
}

impl ChannelRegistry {
    pub fn new(sender: OutboundSender) -> ChannelRegistry {
        ChannelRegistry { entries: Rc::new(RefCell::new(HashMap::new())), sender, next_id: Rc::new(Cell::new(0)) }
    }

    fn next(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Create the channel's entry on demand and increment its refcount.
    pub fn acquire(&self, channel: &str) {
        let mut entries = self.entries.borrow_mut();
        entries.entry(channel.to_string()).or_insert_with(Entry::default).ref_count += 1;
    }

    /// Decrement the refcount; at zero the bridge is disposed, a
    /// `__close__` control message is sent, and every pending request is
    /// rejected with `PulseError::ChannelReset`.
    pub fn release(&self, channel: &str) {
        let should_dispose = {
            let mut entries = self.entries.borrow_mut();
            match entries.get_mut(channel) {
                Some(entry) => {
                    entry.ref_count = entry.ref_count.saturating_sub(1);
                    entry.ref_count == 0
                }
                None => false,
            }
        };
        if should_dispose {
            self.dispose(channel);
        }
    }

    fn dispose(&self, channel: &str) {
        let entry = self.entries.borrow_mut().remove(channel);
        if let Some(entry) = entry {
            for (_, respond) in entry.pending {
                respond(Err(PulseError::ChannelReset { channel: channel.to_string() }));
            }
        }
        (self.sender)(ChannelEnvelope {
            channel: channel.to_string(),
            event: Some("__close__".to_string()),
            response_to: None,
            payload: None,
            request_id: None,
            error: None,
        });
    }

    /// Fire-and-forget send.
    pub fn emit(&self, channel: &str, event: &str, payload: Option<PulseValue>) {
        (self.sender)(ChannelEnvelope {
            channel: channel.to_string(),
            event: Some(event.to_string()),
            response_to: None,
            payload,
            request_id: None,
            error: None,
        });
    }

    /// Allocates a unique `requestId`, sends the request, and holds
    /// `on_response` until a matching `responseTo` arrives or the channel
    /// is disposed.
    pub fn request(
        &self,
        channel: &str,
        event: &str,
        payload: Option<PulseValue>,
        on_response: impl FnOnce(Result<Option<PulseValue>, PulseError>) + 'static,
    ) {
        let request_id = format!("r{}", self.next());
        self.entries
            .borrow_mut()
            .entry(channel.to_string())
            .or_insert_with(Entry::default)
            .pending
            .insert(request_id.clone(), Box::new(on_response));
        (self.sender)(ChannelEnvelope {
            channel: channel.to_string(),
            event: Some(event.to_string()),
            response_to: None,
            payload,
            request_id: Some(request_id),
            error: None,
        });
    }

    /// Subscribe to `event` on `channel`; returns an unsubscribe thunk.
    pub fn on(&self, channel: &str, event: &str, handler: Handler) -> Unsubscribe {
        let id = self.next();
        self.entries
            .borrow_mut()
            .entry(channel.to_string())
            .or_insert_with(Entry::default)
            .handlers
            .entry(event.to_string())
            .or_default()
            .push((id, handler));

        let entries = Rc::clone(&self.entries);
        let channel = channel.to_string();
        let event = event.to_string();
        Box::new(move || {
            if let Some(entry) = entries.borrow_mut().get_mut(&channel) {
                if let Some(list) = entry.handlers.get_mut(&event) {
                    list.retain(|(hid, _)| *hid != id);
                }
            }
        })
    }

    /// Subscribe to a server-initiated request-style event (e.g.
    /// `ref:request`): when a `channel_message` with a `requestId` and no
    /// `responseTo` arrives for `event`, `handler` runs and its result is
    /// sent straight back as a `responseTo` reply. One handler per event.
    pub fn on_request(&self, channel: &str, event: &str, handler: RequestHandler) {
        self.entries
            .borrow_mut()
            .entry(channel.to_string())
            .or_insert_with(Entry::default)
            .request_handlers
            .insert(event.to_string(), handler);
    }

    /// Subscribe to transport-disconnect notifications for `channel`
    /// (state is retained, not torn down, so the subscription survives
    /// reconnect).
    pub fn on_disconnect(&self, channel: &str, handler: DisconnectHandler) -> Unsubscribe {
        let id = self.next();
        self.entries
            .borrow_mut()
            .entry(channel.to_string())
            .or_insert_with(Entry::default)
            .disconnect_handlers
            .push((id, handler));

        let entries = Rc::clone(&self.entries);
        let channel = channel.to_string();
        Box::new(move || {
            if let Some(entry) = entries.borrow_mut().get_mut(&channel) {
                entry.disconnect_handlers.retain(|(hid, _)| *hid != id);
            }
        })
    }

    /// Route an incoming `channel_message` (§4.5 "deliver to the bridge"):
    /// a `responseTo` resolves a pending request, an `event` fans out to
    /// subscribers. Delivery to no listeners is silently ignored.
    pub fn dispatch_incoming(&self, envelope: ChannelEnvelope) {
        let ChannelEnvelope { channel, event, response_to, payload, request_id, error } = envelope;

        if let Some(request_id) = response_to {
            let pending = self.entries.borrow_mut().get_mut(&channel).and_then(|e| e.pending.remove(&request_id));
            if let Some(respond) = pending {
                let result = match error {
                    Some(message) => Err(PulseError::Js(message)),
                    None => Ok(payload),
                };
                respond(result);
            }
            return;
        }

        if let (Some(event), Some(request_id)) = (event.clone(), request_id) {
            let request_handler =
                self.entries.borrow().get(&channel).and_then(|e| e.request_handlers.get(&event)).cloned();
            if let Some(handler) = request_handler {
                let reply = match handler(payload) {
                    Ok(result) => ChannelEnvelope {
                        channel: channel.clone(),
                        event: None,
                        response_to: Some(request_id),
                        payload: Some(result),
                        request_id: None,
                        error: None,
                    },
                    Err(err) => ChannelEnvelope {
                        channel: channel.clone(),
                        event: None,
                        response_to: Some(request_id),
                        payload: None,
                        request_id: None,
                        error: Some(err.to_string()),
                    },
                };
                (self.sender)(reply);
                return;
            }
        }

        if let Some(event) = event {
            let handlers: Vec<Handler> = self
                .entries
                .borrow()
                .get(&channel)
                .and_then(|e| e.handlers.get(&event))
                .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
                .unwrap_or_default();
            for handler in handlers {
                handler(payload.clone());
            }
        }
    }

    /// §4.5/§4.6 "A transport disconnect surfaces as a disconnect
    /// notification to each live bridge without deleting it."
    pub fn notify_disconnect(&self) {
        let handlers: Vec<DisconnectHandler> = self
            .entries
            .borrow()
            .values()
            .flat_map(|e| e.disconnect_handlers.iter().map(|(_, h)| Rc::clone(h)))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    /// Every channel with outstanding requests is rejected and dropped —
    /// used by `Session::disconnect()` (§5 "Cancellation").
    pub fn dispose_all(&self) {
        let channels: Vec<String> = self.entries.borrow().keys().cloned().collect();
        for channel in channels {
            self.dispose(&channel);
        }
    }

    pub fn ref_count(&self, channel: &str) -> usize {
        self.entries.borrow().get(channel).map(|e| e.ref_count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    fn registry() -> (ChannelRegistry, Rc<StdRefCell<Vec<ChannelEnvelope>>>) {
        let sent = Rc::new(StdRefCell::new(Vec::new()));
        let sent_clone = Rc::clone(&sent);
        let registry = ChannelRegistry::new(Rc::new(move |env| sent_clone.borrow_mut().push(env)));
        (registry, sent)
    }

    #[test]
    fn acquire_then_release_to_zero_sends_close_and_rejects_pending() {
        let (registry, sent) = registry();
        registry.acquire("chat");
        let rejected = Rc::new(Cell::new(false));
        let rejected_clone = Rc::clone(&rejected);
        registry.request("chat", "ping", None, move |result| {
            rejected_clone.set(matches!(result, Err(PulseError::ChannelReset { .. })));
        });
        registry.release("chat");

        assert!(rejected.get());
        assert!(sent.borrow().iter().any(|e| e.event.as_deref() == Some("__close__")));
    }

    #[test]
    fn refcount_survives_until_last_release() {
        let (registry, _sent) = registry();
        registry.acquire("chat");
        registry.acquire("chat");
        assert_eq!(registry.ref_count("chat"), 2);
        registry.release("chat");
        assert_eq!(registry.ref_count("chat"), 1);
        registry.release("chat");
        assert_eq!(registry.ref_count("chat"), 0);
    }

    #[test]
    fn on_delivers_matching_event_and_unsubscribe_stops_delivery() {
        let (registry, _sent) = registry();
        registry.acquire("chat");
        let received = Rc::new(RefCell::new(Vec::new()));
        let received_clone = Rc::clone(&received);
        let unsubscribe = registry.on("chat", "message", Rc::new(move |payload| {
            received_clone.borrow_mut().push(payload);
        }));

        registry.dispatch_incoming(ChannelEnvelope {
            channel: "chat".into(),
            event: Some("message".into()),
            response_to: None,
            payload: Some(PulseValue::String("hi".into())),
            request_id: None,
            error: None,
        });
        assert_eq!(received.borrow().len(), 1);

        unsubscribe();
        registry.dispatch_incoming(ChannelEnvelope {
            channel: "chat".into(),
            event: Some("message".into()),
            response_to: None,
            payload: Some(PulseValue::String("again".into())),
            request_id: None,
            error: None,
        });
        assert_eq!(received.borrow().len(), 1);
    }

    #[test]
    fn request_resolves_on_matching_response() {
        let (registry, sent) = registry();
        registry.acquire("chat");
        let resolved = Rc::new(RefCell::new(None));
        let resolved_clone = Rc::clone(&resolved);
        registry.request("chat", "fetch", None, move |result| {
            *resolved_clone.borrow_mut() = Some(result);
        });

        let request_id = sent.borrow().last().unwrap().request_id.clone().unwrap();
        registry.dispatch_incoming(ChannelEnvelope {
            channel: "chat".into(),
            event: None,
            response_to: Some(request_id),
            payload: Some(PulseValue::Number(42.0)),
            request_id: None,
            error: None,
        });

        match resolved.borrow_mut().take() {
            Some(Ok(Some(PulseValue::Number(n)))) => assert_eq!(n, 42.0),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn notify_disconnect_reaches_live_bridge_without_disposing_it() {
        let (registry, _sent) = registry();
        registry.acquire("chat");
        let fired = Rc::new(Cell::new(false));
        let fired_clone = Rc::clone(&fired);
        registry.on_disconnect("chat", Rc::new(move || fired_clone.set(true)));

        registry.notify_disconnect();

        assert!(fired.get());
        assert_eq!(registry.ref_count("chat"), 1);
    }

    #[test]
    fn on_request_replies_with_handler_result() {
        let (registry, sent) = registry();
        registry.acquire("chat");
        registry.on_request(
            "chat",
            "ref:request",
            Rc::new(|_payload| Ok(PulseValue::String("measured".into()))),
        );

        registry.dispatch_incoming(ChannelEnvelope {
            channel: "chat".into(),
            event: Some("ref:request".into()),
            response_to: None,
            payload: None,
            request_id: Some("srv1".into()),
            error: None,
        });

        let reply = sent.borrow().last().cloned().unwrap();
        assert_eq!(reply.response_to.as_deref(), Some("srv1"));
        assert_eq!(reply.payload.and_then(|p| p.as_str().map(str::to_string)), Some("measured".to_string()));
    }
}
