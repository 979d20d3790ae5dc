//! Wire codec (§4.1): encodes an arbitrary [`PulseValue`] graph — cycles,
//! shared sub-objects, `Date`s, `Set`s and `Map`s included — into a
//! JSON-safe envelope `[[refs, dates, sets, maps], body]`, and decodes that
//! envelope back into an equivalent graph.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::CodecError;
use crate::value::PulseValue;

/// The index lists that accompany an encoded body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub refs: Vec<u32>,
    pub dates: Vec<u32>,
    pub sets: Vec<u32>,
    pub maps: Vec<u32>,
}

impl Envelope {
    fn to_json(&self) -> Value {
        json!([self.refs, self.dates, self.sets, self.maps])
    }

    fn from_json(v: &Value) -> Result<Envelope, CodecError> {
        let arr = v
            .as_array()
            .ok_or_else(|| CodecError::MalformedEnvelope("index header is not an array".into()))?;
        if arr.len() != 4 {
            return Err(CodecError::MalformedEnvelope(
                "index header must have exactly 4 entries".into(),
            ));
        }
        let idx_list = |v: &Value| -> Result<Vec<u32>, CodecError> {
            v.as_array()
                .ok_or_else(|| CodecError::MalformedEnvelope("index list is not an array".into()))?
                .iter()
                .map(|n| {
                    n.as_u64()
                        .map(|n| n as u32)
                        .ok_or_else(|| CodecError::MalformedEnvelope("index is not a u32".into()))
                })
                .collect()
        };
        Ok(Envelope {
            refs: idx_list(&arr[0])?,
            dates: idx_list(&arr[1])?,
            sets: idx_list(&arr[2])?,
            maps: idx_list(&arr[3])?,
        })
    }
}

struct EncodeState {
    next_index: u32,
    seen: HashMap<usize, u32>,
    envelope: Envelope,
}

/// Encode a [`PulseValue`] graph into the wire envelope.
pub fn encode(value: &PulseValue) -> Result<Value, CodecError> {
    let mut state = EncodeState {
        next_index: 0,
        seen: HashMap::new(),
        envelope: Envelope::default(),
    };
    let body = encode_value(value, &mut state)?;
    Ok(json!([state.envelope.to_json(), body]))
}

fn encode_value(value: &PulseValue, state: &mut EncodeState) -> Result<Value, CodecError> {
    match value {
        PulseValue::Null | PulseValue::Undefined => Ok(Value::Null),
        PulseValue::Bool(b) => Ok(Value::Bool(*b)),
        PulseValue::Number(n) => {
            if n.is_nan() {
                Ok(Value::Null)
            } else if n.is_infinite() {
                Err(CodecError::NonFiniteNumber)
            } else {
                Ok(serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null))
            }
        }
        PulseValue::String(s) => Ok(Value::String(s.clone())),
        PulseValue::Date(rc) => {
            let this_index = state.next_index;
            state.next_index += 1;
            let key = Rc::as_ptr(rc) as usize;
            if let Some(&earlier) = state.seen.get(&key) {
                state.envelope.refs.push(this_index);
                return Ok(json!(earlier));
            }
            state.seen.insert(key, this_index);
            state.envelope.dates.push(this_index);
            Ok(Value::String(crate::datetime::epoch_millis_to_iso(**rc)))
        }
        PulseValue::Array(rc) => encode_ref_body(rc, state, None, |items, state| {
            let encoded: Result<Vec<Value>, CodecError> =
                items.iter().map(|v| encode_value(v, state)).collect();
            Ok(Value::Array(encoded?))
        }),
        PulseValue::Set(rc) => encode_ref_body(rc, state, Some(RefKind::Set), |items, state| {
            let encoded: Result<Vec<Value>, CodecError> =
                items.iter().map(|v| encode_value(v, state)).collect();
            Ok(Value::Array(encoded?))
        }),
        PulseValue::Object(rc) => encode_map_like(rc, state, None),
        PulseValue::Map(rc) => encode_map_like(rc, state, Some(RefKind::Map)),
    }
}

enum RefKind {
    Set,
    Map,
}

fn encode_ref_body<F>(
    rc: &Rc<RefCell<Vec<PulseValue>>>,
    state: &mut EncodeState,
    kind: Option<RefKind>,
    encode_items: F,
) -> Result<Value, CodecError>
where
    F: FnOnce(&[PulseValue], &mut EncodeState) -> Result<Value, CodecError>,
{
    let this_index = state.next_index;
    state.next_index += 1;
    let key = Rc::as_ptr(rc) as *const () as usize;
    if let Some(&earlier) = state.seen.get(&key) {
        state.envelope.refs.push(this_index);
        return Ok(json!(earlier));
    }
    state.seen.insert(key, this_index);
    if let Some(RefKind::Set) = kind {
        state.envelope.sets.push(this_index);
    }
    let items = rc.borrow();
    encode_items(&items, state)
}

fn encode_map_like(
    rc: &Rc<RefCell<IndexMap<String, PulseValue>>>,
    state: &mut EncodeState,
    kind: Option<RefKind>,
) -> Result<Value, CodecError> {
    let this_index = state.next_index;
    state.next_index += 1;
    let key = Rc::as_ptr(rc) as *const () as usize;
    if let Some(&earlier) = state.seen.get(&key) {
        state.envelope.refs.push(this_index);
        return Ok(json!(earlier));
    }
    state.seen.insert(key, this_index);
    if let Some(RefKind::Map) = kind {
        state.envelope.maps.push(this_index);
    }
    let entries = rc.borrow();
    let mut obj = serde_json::Map::with_capacity(entries.len());
    for (k, v) in entries.iter() {
        obj.insert(k.clone(), encode_value(v, state)?);
    }
    Ok(Value::Object(obj))
}

/// Decoder options (§4.1 "Optional flag: coerce JSON `null` to `undefined`
/// for primitives").
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub null_as_undefined: bool,
}

struct DecodeState {
    envelope: Envelope,
    opts: DecodeOptions,
    objects: Vec<Option<PulseValue>>,
    next_index: u32,
}

impl DecodeState {
    fn is_ref(&self, index: u32) -> bool {
        self.envelope.refs.contains(&index)
    }
    fn is_date(&self, index: u32) -> bool {
        self.envelope.dates.contains(&index)
    }
    fn is_set(&self, index: u32) -> bool {
        self.envelope.sets.contains(&index)
    }
    fn is_map(&self, index: u32) -> bool {
        self.envelope.maps.contains(&index)
    }
}

/// Decode a wire envelope back into a [`PulseValue`] graph.
pub fn decode(envelope_and_body: &Value, opts: DecodeOptions) -> Result<PulseValue, CodecError> {
    let top = envelope_and_body
        .as_array()
        .ok_or_else(|| CodecError::MalformedEnvelope("top level must be a 2-tuple".into()))?;
    if top.len() != 2 {
        return Err(CodecError::MalformedEnvelope(
            "top level must be [index_header, body]".into(),
        ));
    }
    let envelope = Envelope::from_json(&top[0])?;
    let mut state = DecodeState {
        envelope,
        opts,
        objects: Vec::new(),
        next_index: 0,
    };
    decode_value(&top[1], &mut state)
}

/// Decode one body position.
///
/// The encoder only assigns a visit index to non-primitive values, so the
/// decoder cannot know in advance whether a given JSON scalar is a genuine
/// primitive or the stand-in for a non-primitive visit (a `Date` encodes as
/// a plain JSON string; a back-reference encodes as a plain JSON number).
/// It resolves the ambiguity positionally: `next_index` is the index this
/// position *would* receive if it turns out to be non-primitive, so the
/// decoder peeks the index lists before deciding whether to consume it.
/// Arrays/objects are unambiguous — they are never used to encode a
/// primitive — so they always consume an index.
fn decode_value(body: &Value, state: &mut DecodeState) -> Result<PulseValue, CodecError> {
    match body {
        Value::Null => Ok(if state.opts.null_as_undefined {
            PulseValue::Undefined
        } else {
            PulseValue::Null
        }),
        Value::Bool(b) => Ok(PulseValue::Bool(*b)),
        Value::Number(n) => {
            let candidate = state.next_index;
            if state.is_ref(candidate) {
                state.next_index += 1;
                state.objects.push(None);
                let earlier = n.as_u64().ok_or_else(|| {
                    CodecError::MalformedEnvelope(format!(
                        "ref at index {candidate} is not an integer"
                    ))
                })? as usize;
                state
                    .objects
                    .get(earlier)
                    .and_then(|o| o.clone())
                    .ok_or(CodecError::DanglingRef {
                        index: earlier as u32,
                    })
            } else {
                Ok(PulseValue::Number(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Value::String(s) => {
            let candidate = state.next_index;
            if state.is_date(candidate) {
                state.next_index += 1;
                let ms = crate::datetime::iso_to_epoch_millis(s)?;
                let value = PulseValue::date(ms);
                state.objects.push(Some(value.clone()));
                Ok(value)
            } else {
                Ok(PulseValue::String(s.clone()))
            }
        }
        Value::Array(items) => {
            let this_index = state.next_index;
            state.next_index += 1;
            let container = Rc::new(RefCell::new(Vec::with_capacity(items.len())));
            let placeholder = if state.is_set(this_index) {
                PulseValue::Set(Rc::clone(&container))
            } else {
                PulseValue::Array(Rc::clone(&container))
            };
            // Registered before decoding children so a cyclic back-reference
            // to this index resolves to the same (still-filling) container.
            state.objects.push(Some(placeholder.clone()));
            for item in items {
                let decoded = decode_value(item, state)?;
                container.borrow_mut().push(decoded);
            }
            Ok(placeholder)
        }
        Value::Object(map) => {
            let this_index = state.next_index;
            state.next_index += 1;
            let container = Rc::new(RefCell::new(IndexMap::with_capacity(map.len())));
            let placeholder = if state.is_map(this_index) {
                PulseValue::Map(Rc::clone(&container))
            } else {
                PulseValue::Object(Rc::clone(&container))
            };
            state.objects.push(Some(placeholder.clone()));
            for (k, v) in map.iter() {
                let decoded = decode_value(v, state)?;
                container.borrow_mut().insert(k.clone(), decoded);
            }
            Ok(placeholder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[test]
    fn primitives_pass_through() {
        let v = PulseValue::String("hi".into());
        let encoded = encode(&v).unwrap();
        let decoded = decode(&encoded, DecodeOptions::default()).unwrap();
        match decoded {
            PulseValue::String(s) => assert_eq!(s, "hi"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn nan_encodes_as_null() {
        let v = PulseValue::Number(f64::NAN);
        let encoded = encode(&v).unwrap();
        assert_eq!(encoded[1], Value::Null);
    }

    #[test]
    fn infinite_number_errors() {
        let v = PulseValue::Number(f64::INFINITY);
        assert_eq!(encode(&v), Err(CodecError::NonFiniteNumber));
    }

    #[test]
    fn shared_object_round_trips_as_single_occurrence() {
        let shared = PulseValue::object(indexmap! { "v".into() => PulseValue::Number(1.0) });
        let wrapper = PulseValue::array(vec![shared.clone(), shared.clone()]);
        let encoded = encode(&wrapper).unwrap();
        let decoded = decode(&encoded, DecodeOptions::default()).unwrap();
        if let PulseValue::Array(items) = decoded {
            let items = items.borrow();
            assert!(items[0].ptr_eq(&items[1]));
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn date_round_trips_with_epoch_millis() {
        let ms = 1_704_164_645_000_i64; // 2024-01-02T03:04:05.000Z
        let v = PulseValue::date(ms);
        let encoded = encode(&v).unwrap();
        assert!(encoded[0][1]
            .as_array()
            .unwrap()
            .contains(&json!(0)));
        let decoded = decode(&encoded, DecodeOptions::default()).unwrap();
        match decoded {
            PulseValue::Date(rc) => assert_eq!(*rc, ms),
            _ => panic!("expected date"),
        }
    }

    #[test]
    fn null_as_undefined_flag_coerces_primitives() {
        let v = PulseValue::Null;
        let encoded = encode(&v).unwrap();
        let decoded = decode(
            &encoded,
            DecodeOptions {
                null_as_undefined: true,
            },
        )
        .unwrap();
        assert!(matches!(decoded, PulseValue::Undefined));
    }

    #[test]
    fn cyclic_array_does_not_infinite_loop() {
        let cyclic = Rc::new(RefCell::new(Vec::new()));
        cyclic
            .borrow_mut()
            .push(PulseValue::Array(Rc::clone(&cyclic)));
        let encoded = encode(&PulseValue::Array(cyclic)).unwrap();
        let decoded = decode(&encoded, DecodeOptions::default()).unwrap();
        if let PulseValue::Array(items) = &decoded {
            assert_eq!(items.borrow().len(), 1);
        } else {
            panic!("expected array");
        }
    }
}
