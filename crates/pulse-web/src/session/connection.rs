//! Connection state machine (§4.5 "Connection state machine").

use std::cell::Cell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

pub type Unsubscribe = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    Connecting,
    Reconnecting,
    Error,
}

/// The three delays the state machine is parameterized over.
#[derive(Debug, Clone, Copy)]
pub struct Delays {
    pub initial_connecting_delay_ms: u32,
    pub initial_error_delay_ms: u32,
    pub reconnect_error_delay_ms: u32,
}

type Listener = Rc<dyn Fn(ConnectionStatus)>;

struct Inner {
    status: Cell<ConnectionStatus>,
    has_connected_once: Cell<bool>,
    listeners: std::cell::RefCell<Vec<(u64, Listener)>>,
    next_listener_id: Cell<u64>,
    connecting_timer: std::cell::RefCell<Option<Timeout>>,
    error_timer: std::cell::RefCell<Option<Timeout>>,
    delays: Delays,
}

/// Single-threaded, `Rc`-shared so timer closures can retarget it.
#[derive(Clone)]
pub struct ConnectionStateMachine {
    inner: Rc<Inner>,
}

impl ConnectionStateMachine {
    pub fn new(delays: Delays) -> ConnectionStateMachine {
        ConnectionStateMachine {
            inner: Rc::new(Inner {
                status: Cell::new(ConnectionStatus::Ok),
                has_connected_once: Cell::new(false),
                listeners: std::cell::RefCell::new(Vec::new()),
                next_listener_id: Cell::new(0),
                connecting_timer: std::cell::RefCell::new(None),
                error_timer: std::cell::RefCell::new(None),
                delays,
            }),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.get()
    }

    pub fn has_connected_once(&self) -> bool {
        self.inner.has_connected_once.get()
    }

    /// Registers `listener`, calling it once synchronously with the current
    /// status, then on every subsequent transition.
    pub fn on_connection_change(&self, listener: Listener) -> Unsubscribe {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::clone(&listener)));
        listener(self.status());

        let inner = Rc::clone(&self.inner);
        Box::new(move || {
            inner.listeners.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
        })
    }

    /// §4.5 "Initial call to `connect()`": sets `ok` and starts the two-stage
    /// timer (`connecting` then `error`).
    pub fn connect(&self) {
        self.clear_timers();
        self.set_status(ConnectionStatus::Ok);

        let this = self.clone();
        let error_delay = self.inner.delays.initial_error_delay_ms;
        let timer = Timeout::new(self.inner.delays.initial_connecting_delay_ms, move || {
            this.set_status(ConnectionStatus::Connecting);
            let this2 = this.clone();
            let error_timer = Timeout::new(error_delay, move || {
                this2.set_status(ConnectionStatus::Error);
            });
            *this.inner.error_timer.borrow_mut() = Some(error_timer);
        });
        *self.inner.connecting_timer.borrow_mut() = Some(timer);
    }

    /// Successful transport connect: cancels timers and returns to `ok`.
    pub fn on_connected(&self) {
        self.clear_timers();
        self.inner.has_connected_once.set(true);
        self.set_status(ConnectionStatus::Ok);
    }

    /// Transport disconnect after a first successful connect: immediately
    /// `reconnecting`, with a `reconnectErrorDelay` timer to `error`.
    pub fn on_disconnected(&self) {
        if !self.inner.has_connected_once.get() {
            return;
        }
        self.clear_timers();
        self.set_status(ConnectionStatus::Reconnecting);

        let this = self.clone();
        let timer = Timeout::new(self.inner.delays.reconnect_error_delay_ms, move || {
            this.set_status(ConnectionStatus::Error);
        });
        *self.inner.error_timer.borrow_mut() = Some(timer);
    }

    /// `disconnect()`: clears all timers, clears listeners, and resets to
    /// `ok` with `hasConnectedOnce=false`. Tearing down channels/refs is the
    /// session's job, not this state machine's.
    pub fn reset(&self) {
        self.clear_timers();
        self.inner.listeners.borrow_mut().clear();
        self.inner.has_connected_once.set(false);
        self.inner.status.set(ConnectionStatus::Ok);
    }

    fn clear_timers(&self) {
        self.inner.connecting_timer.borrow_mut().take();
        self.inner.error_timer.borrow_mut().take();
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.inner.status.set(status);
        let listeners: Vec<Listener> = self.inner.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in listeners {
            listener(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn delays() -> Delays {
        Delays { initial_connecting_delay_ms: 10, initial_error_delay_ms: 10, reconnect_error_delay_ms: 10 }
    }

    #[test]
    fn listener_receives_current_status_on_registration() {
        let machine = ConnectionStateMachine::new(delays());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _unsub = machine.on_connection_change(Rc::new(move |s| seen_clone.borrow_mut().push(s)));
        assert_eq!(seen.borrow().as_slice(), &[ConnectionStatus::Ok]);
    }

    #[test]
    fn on_connected_resets_to_ok_and_marks_has_connected_once() {
        let machine = ConnectionStateMachine::new(delays());
        machine.on_connected();
        assert_eq!(machine.status(), ConnectionStatus::Ok);
        assert!(machine.has_connected_once());
    }

    #[test]
    fn disconnect_before_first_connect_is_a_noop() {
        let machine = ConnectionStateMachine::new(delays());
        machine.on_disconnected();
        assert_eq!(machine.status(), ConnectionStatus::Ok);
    }

    #[test]
    fn transport_disconnect_after_first_connect_goes_reconnecting() {
        let machine = ConnectionStateMachine::new(delays());
        machine.on_connected();
        machine.on_disconnected();
        assert_eq!(machine.status(), ConnectionStatus::Reconnecting);
    }

    #[test]
    fn reset_clears_listeners_and_has_connected_once() {
        let machine = ConnectionStateMachine::new(delays());
        machine.on_connected();
        let calls = Rc::new(RefCell::new(0));
        let calls_clone = Rc::clone(&calls);
        let _unsub = machine.on_connection_change(Rc::new(move |_| calls_clone.set(calls_clone.get() + 1)));
        machine.reset();
        assert_eq!(machine.status(), ConnectionStatus::Ok);
        assert!(!machine.has_connected_once());
        // Registering a fresh listener after reset should be the only one left.
        let post_reset_calls = Rc::new(RefCell::new(0));
        let post_reset_clone = Rc::clone(&post_reset_calls);
        let _unsub2 = machine.on_connection_change(Rc::new(move |_| post_reset_clone.set(post_reset_clone.get() + 1)));
        assert_eq!(post_reset_calls.get(), 1);
    }

    #[test]
    fn unsubscribe_stops_future_notifications() {
        let machine = ConnectionStateMachine::new(delays());
        let calls = Rc::new(RefCell::new(0));
        let calls_clone = Rc::clone(&calls);
        let unsub = machine.on_connection_change(Rc::new(move |_| calls_clone.set(calls_clone.get() + 1)));
        assert_eq!(calls.get(), 1);
        unsub();
        machine.on_connected();
        assert_eq!(calls.get(), 1);
    }
}
