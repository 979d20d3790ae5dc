//! Plain JSON conversion for [`PulseValue`], used wherever a payload is
//! *not* wire-codec-enveloped: `fetch` bodies from/to external APIs, and
//! the hydration script's embedded `{ vdom, routeInfo }` (§6 "Hydration
//! contract"), which has no `[index_header, body]` wrapper.

use indexmap::IndexMap;
use pulse_core::value::PulseValue;

pub(crate) fn to_pulse_value(value: &serde_json::Value) -> PulseValue {
    match value {
        serde_json::Value::Null => PulseValue::Null,
        serde_json::Value::Bool(b) => PulseValue::Bool(*b),
        serde_json::Value::Number(n) => PulseValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => PulseValue::String(s.clone()),
        serde_json::Value::Array(items) => PulseValue::array(items.iter().map(to_pulse_value).collect()),
        serde_json::Value::Object(entries) => {
            PulseValue::object(entries.iter().map(|(k, v)| (k.clone(), to_pulse_value(v))).collect::<IndexMap<_, _>>())
        }
    }
}

pub(crate) fn from_pulse_value(value: &PulseValue) -> serde_json::Value {
    match value {
        PulseValue::Null | PulseValue::Undefined => serde_json::Value::Null,
        PulseValue::Bool(b) => serde_json::Value::Bool(*b),
        PulseValue::Number(n) => {
            serde_json::Number::from_f64(*n).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null)
        }
        PulseValue::String(s) => serde_json::Value::String(s.clone()),
        PulseValue::Date(rc) => serde_json::Value::String(pulse_core::datetime::epoch_millis_to_iso(**rc)),
        PulseValue::Array(items) | PulseValue::Set(items) => {
            serde_json::Value::Array(items.borrow().iter().map(from_pulse_value).collect())
        }
        PulseValue::Object(entries) | PulseValue::Map(entries) => {
            serde_json::Value::Object(entries.borrow().iter().map(|(k, v)| (k.clone(), from_pulse_value(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_nested_array_and_object() {
        let json = serde_json::json!({"a": [1, "x", null, true]});
        let value = to_pulse_value(&json);
        let back = from_pulse_value(&value);
        assert_eq!(back, json);
    }
}
