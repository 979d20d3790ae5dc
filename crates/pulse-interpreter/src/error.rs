//! Ref-op error taxonomy (§7 "Ref"). Unsupported ops and missing nodes
//! raise immediately for request-style ops; fire-and-forget ops log and
//! swallow instead (that distinction is made by the caller in `pulse-web`,
//! which knows whether the originating bridge message expects a reply).

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RefError {
    #[error("unsupported ref op {op:?}")]
    UnsupportedOp { op: String },

    #[error("ref {channel_id}:{ref_id} has no attached node")]
    MissingNode { channel_id: String, ref_id: String },

    #[error("attribute name {name:?} is invalid")]
    InvalidAttrName { name: String },

    #[error("prop {name:?} is not in the get/set allowlist")]
    DisallowedProp { name: String },

    #[error("op {op} expected argument {arg:?}")]
    MissingArg { op: String, arg: String },

    #[error("js interop failure: {0}")]
    Js(String),
}
