//! In-memory graph type for the wire codec (§4.1). Rust has no implicit
//! object identity the way the source runtime does, so shared structure and
//! cycles are modeled explicitly with `Rc` — two [`PulseValue`]s compare
//! identical-by-reference with [`PulseValue::ptr_eq`], which is what the
//! encoder uses to detect repeats.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

/// A reference-counted, identity-bearing graph value.
#[derive(Debug, Clone)]
pub enum PulseValue {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    /// Epoch milliseconds (UTC).
    Date(Rc<i64>),
    Array(Rc<RefCell<Vec<PulseValue>>>),
    Object(Rc<RefCell<IndexMap<String, PulseValue>>>),
    Set(Rc<RefCell<Vec<PulseValue>>>),
    /// Maps are represented with string keys, matching the wire
    /// representation (`maps` entries decode as JSON objects, §4.1).
    Map(Rc<RefCell<IndexMap<String, PulseValue>>>),
}

impl PulseValue {
    pub fn array(items: Vec<PulseValue>) -> Self {
        PulseValue::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: IndexMap<String, PulseValue>) -> Self {
        PulseValue::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn set(items: Vec<PulseValue>) -> Self {
        PulseValue::Set(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: IndexMap<String, PulseValue>) -> Self {
        PulseValue::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn date(epoch_millis: i64) -> Self {
        PulseValue::Date(Rc::new(epoch_millis))
    }

    /// Reference-type values that can participate in `refs`/`dates`/`sets`/
    /// `maps` indexing. Primitives never do.
    pub fn ptr_identity(&self) -> Option<usize> {
        match self {
            PulseValue::Date(rc) => Some(Rc::as_ptr(rc) as usize),
            PulseValue::Array(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            PulseValue::Object(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            PulseValue::Set(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            PulseValue::Map(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &PulseValue) -> bool {
        match (self.ptr_identity(), other.ptr_identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, PulseValue::Null | PulseValue::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PulseValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PulseValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PulseValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key on an `Object` or `Map`; `None` on any other shape or
    /// missing key.
    pub fn get(&self, key: &str) -> Option<PulseValue> {
        match self {
            PulseValue::Object(rc) | PulseValue::Map(rc) => rc.borrow().get(key).cloned(),
            _ => None,
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        match self {
            PulseValue::Object(rc) | PulseValue::Map(rc) => rc.borrow().contains_key(key),
            _ => false,
        }
    }

    /// Clones the contained items of an `Array` or `Set`; `None` on any
    /// other shape.
    pub fn items(&self) -> Option<Vec<PulseValue>> {
        match self {
            PulseValue::Array(rc) | PulseValue::Set(rc) => Some(rc.borrow().clone()),
            _ => None,
        }
    }

    /// Clones the contained entries of an `Object` or `Map`; `None` on any
    /// other shape.
    pub fn entries(&self) -> Option<IndexMap<String, PulseValue>> {
        match self {
            PulseValue::Object(rc) | PulseValue::Map(rc) => Some(rc.borrow().clone()),
            _ => None,
        }
    }
}
