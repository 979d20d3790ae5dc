//! Callback registry (§4.3): binds `"$cb"`/`"$cb:<ms>"` placeholders to
//! client-side functions that forward events back to the server, debouncing
//! on a trailing-edge timer when a delay is present.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use pulse_core::value::PulseValue;

use crate::error::PulseError;

/// Parsed form of a `"$cb"` / `"$cb:<ms>"` placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallbackSpec {
    pub delay_ms: Option<f64>,
}

/// §4.3 "Resolution": `"$cb"` is immediate, `"$cb:N"` with a non-negative
/// finite `N` debounces by `N` ms; anything else beginning with `$cb` is a
/// malformed placeholder.
pub fn parse_placeholder(raw: &str) -> Result<CallbackSpec, PulseError> {
    if raw == "$cb" {
        return Ok(CallbackSpec { delay_ms: None });
    }
    if let Some(rest) = raw.strip_prefix("$cb:") {
        let delay: f64 = rest
            .parse()
            .map_err(|_| PulseError::Js(format!("malformed callback placeholder {raw:?}")))?;
        if !delay.is_finite() || delay < 0.0 {
            return Err(PulseError::Js(format!("malformed callback delay in {raw:?}")));
        }
        return Ok(CallbackSpec { delay_ms: Some(delay) });
    }
    Err(PulseError::Js(format!("malformed callback placeholder {raw:?}")))
}

struct Entry {
    delay_ms: Option<f64>,
    timer: Option<Timeout>,
    last_args: Vec<PulseValue>,
}

/// Sends an already-extracted callback invocation to the session. Boxed so
/// the registry doesn't need to know about the session/socket directly.
pub type Sender = Rc<dyn Fn(&str, Vec<PulseValue>)>;

#[derive(Clone)]
pub struct CallbackRegistry {
    entries: Rc<RefCell<HashMap<String, Entry>>>,
    sender: Sender,
}

impl CallbackRegistry {
    pub fn new(sender: Sender) -> CallbackRegistry {
        CallbackRegistry { entries: Rc::new(RefCell::new(HashMap::new())), sender }
    }

    /// Register (or replace) the binding for `canonical_name`, e.g.
    /// `"0.onClick"`.
    pub fn bind(&self, canonical_name: &str, spec: CallbackSpec) {
        self.entries.borrow_mut().insert(
            canonical_name.to_string(),
            Entry { delay_ms: spec.delay_ms, timer: None, last_args: Vec::new() },
        );
    }

    /// §4.3 "Invocation": immediate callbacks fire straight through; debounced
    /// ones replace any in-flight trailing-edge timer with a fresh one armed
    /// against the latest args.
    pub fn invoke(&self, canonical_name: &str, args: Vec<PulseValue>) {
        let delay_ms = {
            let mut entries = self.entries.borrow_mut();
            let Some(entry) = entries.get_mut(canonical_name) else { return };
            entry.last_args = args.clone();
            entry.delay_ms
        };

        match delay_ms {
            None => (self.sender)(canonical_name, args),
            Some(delay) => {
                let entries = Rc::clone(&self.entries);
                let sender = Rc::clone(&self.sender);
                let name = canonical_name.to_string();
                let timer = Timeout::new(delay as u32, move || {
                    let args = entries
                        .borrow_mut()
                        .get_mut(&name)
                        .map(|entry| {
                            entry.timer = None;
                            entry.last_args.clone()
                        });
                    if let Some(args) = args {
                        sender(&name, args);
                    }
                });
                if let Some(mut entry) = self.entries.borrow_mut().get_mut(canonical_name) {
                    entry.timer = Some(timer);
                } else {
                    drop(timer);
                }
            }
        }
    }

    /// §4.3 "Teardown": cancel any pending timer and forget the binding.
    pub fn teardown(&self, canonical_name: &str) {
        self.entries.borrow_mut().remove(canonical_name);
    }

    /// Tear down every binding whose canonical name starts with `prefix.`
    /// or equals `prefix` — used when a subtree is replaced or removed.
    pub fn teardown_prefix(&self, prefix: &str) {
        self.entries
            .borrow_mut()
            .retain(|name, _| !(name == prefix || name.starts_with(&format!("{prefix}."))));
    }

    /// §4.3 "Rebinding on move": retarget a binding to a new canonical name,
    /// keeping its delay and any pending timer untouched (option (a) of the
    /// two acceptable strategies).
    pub fn rebind(&self, old_name: &str, new_name: &str) {
        if let Some(entry) = self.entries.borrow_mut().remove(old_name) {
            self.entries.borrow_mut().insert(new_name.to_string(), entry);
        }
    }

    pub fn is_bound(&self, canonical_name: &str) -> bool {
        self.entries.borrow().contains_key(canonical_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn immediate_placeholder_parses_with_no_delay() {
        assert_eq!(parse_placeholder("$cb").unwrap(), CallbackSpec { delay_ms: None });
    }

    #[test]
    fn debounced_placeholder_parses_delay() {
        assert_eq!(parse_placeholder("$cb:250").unwrap(), CallbackSpec { delay_ms: Some(250.0) });
    }

    #[test]
    fn malformed_placeholder_errors() {
        assert!(parse_placeholder("$cb:abc").is_err());
        assert!(parse_placeholder("$cbfoo").is_err());
        assert!(parse_placeholder("$cb:-5").is_err());
    }

    #[test]
    fn immediate_callback_invokes_sender_synchronously() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let calls_clone = Rc::clone(&calls);
        let registry = CallbackRegistry::new(Rc::new(move |name, args| {
            calls_clone.borrow_mut().push((name.to_string(), args.len()));
        }));
        registry.bind("0.onClick", CallbackSpec { delay_ms: None });
        registry.invoke("0.onClick", vec![PulseValue::Number(1.0)]);
        assert_eq!(calls.borrow().as_slice(), &[("0.onClick".to_string(), 1)]);
    }

    #[test]
    fn teardown_prefix_removes_only_matching_subtree() {
        let invoked = Rc::new(Cell::new(0));
        let invoked_clone = Rc::clone(&invoked);
        let registry = CallbackRegistry::new(Rc::new(move |_, _| invoked_clone.set(invoked_clone.get() + 1)));
        registry.bind("0.onClick", CallbackSpec { delay_ms: None });
        registry.bind("0.footer.onClick", CallbackSpec { delay_ms: None });
        registry.bind("1.onClick", CallbackSpec { delay_ms: None });

        registry.teardown_prefix("0");

        assert!(!registry.is_bound("0.onClick"));
        assert!(!registry.is_bound("0.footer.onClick"));
        assert!(registry.is_bound("1.onClick"));
    }

    #[test]
    fn rebind_moves_entry_to_new_name() {
        let registry = CallbackRegistry::new(Rc::new(|_, _| {}));
        registry.bind("0.onClick", CallbackSpec { delay_ms: Some(100.0) });
        registry.rebind("0.onClick", "2.onClick");
        assert!(!registry.is_bound("0.onClick"));
        assert!(registry.is_bound("2.onClick"));
    }
}
