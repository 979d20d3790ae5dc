//! Unified error type for the FFI boundary (`wasm_bindgen` functions must
//! return `Result<_, JsValue>`, so every internal error funnels through
//! here before crossing into JS).

use pulse_core::{CodecError, VdomError};
use pulse_interpreter::RefError;
use pulse_router::RouterError;
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum PulseError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Vdom(#[from] VdomError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("view already attached at path {path:?}")]
    ViewAlreadyAttached { path: String },

    #[error("no view attached at path {path:?}")]
    NoSuchView { path: String },

    #[error("channel {channel:?} was reset")]
    ChannelReset { channel: String },

    #[error("call target at {path} is not callable")]
    NotCallable { path: String },

    #[error("js interop error: {0}")]
    Js(String),
}

impl From<PulseError> for JsValue {
    fn from(err: PulseError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

impl From<JsValue> for PulseError {
    fn from(value: JsValue) -> PulseError {
        PulseError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}
