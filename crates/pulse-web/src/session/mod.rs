//! Session client (§4.5): owns the websocket, the connection state machine,
//! the outbound queue, and the map of attached views. Single-threaded —
//! every operation either returns synchronously or schedules a task on the
//! browser event loop; nothing here is `Send`/`Sync`.

mod connection;
mod queue;

pub use connection::{ConnectionStateMachine, ConnectionStatus, Delays};
pub use queue::OutboundQueue;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use indexmap::IndexMap;
use pulse_core::message::{ClientMessage, ServerMessage};
use pulse_core::route::RouteInfo;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

use crate::channel::ChannelRegistry;
use crate::config::PulseConfig;
use crate::error::PulseError;
use crate::refs::RefRegistry;
use crate::view::MountedView;

struct SocketHandles {
    socket: WebSocket,
    _onopen: Closure<dyn FnMut(JsValue)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
    _onerror: Closure<dyn FnMut(ErrorEvent)>,
}

struct Inner {
    config: PulseConfig,
    connection: ConnectionStateMachine,
    socket: RefCell<Option<SocketHandles>>,
    reconnect_timer: RefCell<Option<Timeout>>,
    views: RefCell<IndexMap<String, MountedView>>,
    queue: RefCell<OutboundQueue>,
    channels: Rc<ChannelRegistry>,
    refs: Rc<RefRegistry>,
}

/// Cheaply `Clone`-able handle (an `Rc` underneath) so socket callbacks and
/// spawned futures can hold their own reference back into the session.
#[derive(Clone)]
pub struct Session(Rc<Inner>);

impl Session {
    pub fn new(config: PulseConfig) -> Session {
        let delays = Delays {
            initial_connecting_delay_ms: config.initial_connecting_delay_ms,
            initial_error_delay_ms: config.initial_error_delay_ms,
            reconnect_error_delay_ms: config.reconnect_error_delay_ms,
        };

        let inner = Rc::new_cyclic(|weak: &Weak<Inner>| {
            let weak_for_sender = weak.clone();
            let channels = Rc::new(ChannelRegistry::new(Rc::new(move |envelope| {
                if let Some(inner) = weak_for_sender.upgrade() {
                    Session(inner).send_message(ClientMessage::ChannelMessage(envelope));
                }
            })));
            let refs = Rc::new(RefRegistry::new(Rc::clone(&channels)));
            Inner {
                connection: ConnectionStateMachine::new(delays),
                socket: RefCell::new(None),
                reconnect_timer: RefCell::new(None),
                views: RefCell::new(IndexMap::new()),
                queue: RefCell::new(OutboundQueue::new()),
                channels,
                refs,
                config,
            }
        });
        Session(inner)
    }

    pub fn connection(&self) -> ConnectionStateMachine {
        self.0.connection.clone()
    }

    pub fn channel_registry(&self) -> Rc<ChannelRegistry> {
        Rc::clone(&self.0.channels)
    }

    pub fn ref_registry(&self) -> Rc<RefRegistry> {
        Rc::clone(&self.0.refs)
    }

    /// §4.5 "Initial call to `connect()`".
    pub fn connect(&self) {
        self.0.connection.connect();
        self.open_socket();
    }

    /// §4.5 "`disconnect()` clears all timers, tears down channels and
    /// refs, clears listeners, and resets to `ok` with `hasConnectedOnce=false`".
    pub fn disconnect(&self) {
        self.0.reconnect_timer.borrow_mut().take();
        if let Some(handle) = self.0.socket.borrow_mut().take() {
            let _ = handle.socket.close();
        }
        self.0.channels.dispose_all();
        self.0.refs.clear();
        self.0.connection.reset();
    }

    fn open_socket(&self) {
        let socket = match WebSocket::new(&self.0.config.url) {
            Ok(socket) => socket,
            Err(err) => {
                tracing::warn!(url = %self.0.config.url, ?err, "failed to construct websocket");
                self.schedule_reconnect();
                return;
            }
        };

        let onopen = {
            let session = self.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |_| session.handle_open())
        };
        let onmessage = {
            let session = self.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| session.handle_message(event))
        };
        let onclose = {
            let session = self.clone();
            Closure::<dyn FnMut(CloseEvent)>::new(move |_| session.handle_close())
        };
        let onerror = {
            let session = self.clone();
            Closure::<dyn FnMut(ErrorEvent)>::new(move |event: ErrorEvent| {
                tracing::warn!(message = %event.message(), "websocket error");
                session.handle_close();
            })
        };

        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        *self.0.socket.borrow_mut() =
            Some(SocketHandles { socket, _onopen: onopen, _onmessage: onmessage, _onclose: onclose, _onerror: onerror });
    }

    fn schedule_reconnect(&self) {
        let session = self.clone();
        let timer = Timeout::new(self.0.config.reconnect_error_delay_ms, move || session.open_socket());
        *self.0.reconnect_timer.borrow_mut() = Some(timer);
    }

    fn handle_open(&self) {
        self.0.connection.on_connected();
        self.flush_after_connect();
    }

    fn handle_close(&self) {
        *self.0.socket.borrow_mut() = None;
        self.0.connection.on_disconnected();
        self.0.channels.notify_disconnect();
        self.schedule_reconnect();
    }

    fn handle_message(&self, event: MessageEvent) {
        let Some(text) = event.data().as_string() else {
            tracing::warn!("ignoring non-text websocket frame");
            return;
        };
        let json: serde_json::Value = match serde_json::from_str(&text) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(%err, "malformed message json");
                return;
            }
        };
        let decoded = match pulse_core::codec::decode(&json, pulse_core::codec::DecodeOptions { null_as_undefined: true }) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "malformed message envelope");
                return;
            }
        };
        let message = match ServerMessage::from_value(&decoded) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(%err, "unrecognized server message");
                return;
            }
        };
        crate::wire::dispatch(self, message);
    }

    /// §5 "re-issued `attach`es are sent first (in the active-views map
    /// iteration order), followed by the drained queue with `attach`
    /// duplicates and stale `update`s filtered out."
    fn flush_after_connect(&self) {
        let mut reattached = std::collections::HashSet::new();
        for (path, view) in self.0.views.borrow().iter() {
            reattached.insert(path.clone());
            self.transport_send(&ClientMessage::Attach { path: path.clone(), route_info: view.route_info.clone() });
        }
        let drained = self.0.queue.borrow_mut().drain_for_replay(&reattached);
        for message in drained {
            self.transport_send(&message);
        }
    }

    /// Send when the transport is actually open; otherwise queue. Transport
    /// readiness is checked directly against the socket, not the
    /// presentation-oriented connection-status machine (which starts at
    /// `ok` before the socket even exists).
    pub fn send_message(&self, message: ClientMessage) {
        let is_open = self.0.socket.borrow().as_ref().is_some_and(|h| h.socket.ready_state() == WebSocket::OPEN);
        if is_open {
            self.transport_send(&message);
        } else {
            self.0.queue.borrow_mut().push(message);
        }
    }

    fn transport_send(&self, message: &ClientMessage) {
        let encoded = match pulse_core::codec::encode(&message.to_value()) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "failed to encode outgoing message");
                return;
            }
        };
        let sent = self.0.socket.borrow().as_ref().map(|h| h.socket.send_with_str(&encoded.to_string()));
        if !matches!(sent, Some(Ok(()))) {
            self.0.queue.borrow_mut().push(message.clone());
        }
    }

    /// §4.5 "View lifecycle": error if `path` is already attached.
    pub fn attach(&self, path: impl Into<String>, view: MountedView) -> Result<(), PulseError> {
        let path = path.into();
        let mut views = self.0.views.borrow_mut();
        if views.contains_key(&path) {
            return Err(PulseError::ViewAlreadyAttached { path });
        }
        let route_info = view.route_info.clone();
        views.insert(path.clone(), view);
        drop(views);
        self.send_message(ClientMessage::Attach { path, route_info });
        Ok(())
    }

    /// Mutates the view's `routeInfo` and sends `update` — the server
    /// assumes the view remains mounted.
    pub fn update_route(&self, path: &str, route_info: RouteInfo) -> Result<(), PulseError> {
        {
            let mut views = self.0.views.borrow_mut();
            let view =
                views.get_mut(path).ok_or_else(|| PulseError::NoSuchView { path: path.to_string() })?;
            view.route_info = route_info.clone();
        }
        self.send_message(ClientMessage::Update { path: path.to_string(), route_info });
        Ok(())
    }

    pub fn detach(&self, path: &str) -> Result<(), PulseError> {
        if self.0.views.borrow_mut().shift_remove(path).is_none() {
            return Err(PulseError::NoSuchView { path: path.to_string() });
        }
        self.send_message(ClientMessage::Detach { path: path.to_string() });
        Ok(())
    }

    pub(crate) fn with_view<R>(&self, path: &str, f: impl FnOnce(&mut MountedView) -> R) -> Option<R> {
        self.0.views.borrow_mut().get_mut(path).map(f)
    }

    pub(crate) fn channels(&self) -> &Rc<ChannelRegistry> {
        &self.0.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_twice_to_same_path_errors() {
        let session = Session::new(PulseConfig::new("wss://example/pulse"));
        let view = MountedView::new(RouteInfo::default(), |_| {}, |_| {}, |_, _| {}, |_| {});
        session.attach("/", view).unwrap();
        let duplicate = MountedView::new(RouteInfo::default(), |_| {}, |_| {}, |_, _| {}, |_| {});
        assert!(matches!(session.attach("/", duplicate), Err(PulseError::ViewAlreadyAttached { .. })));
    }

    #[test]
    fn detach_unknown_path_errors() {
        let session = Session::new(PulseConfig::new("wss://example/pulse"));
        assert!(matches!(session.detach("/nope"), Err(PulseError::NoSuchView { .. })));
    }

    #[test]
    fn update_route_on_unknown_path_errors() {
        let session = Session::new(PulseConfig::new("wss://example/pulse"));
        assert!(matches!(session.update_route("/nope", RouteInfo::default()), Err(PulseError::NoSuchView { .. })));
    }
}
