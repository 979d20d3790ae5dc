//! Error taxonomy for the wire codec and VDOM data model (§7 "Protocol" and
//! "Render" categories of the error taxonomy).

use thiserror::Error;

use crate::path::Path;

/// Errors raised while encoding or decoding the wire codec's
/// `[[refs, dates, sets, maps], body]` envelope (§4.1).
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("cannot encode non-finite number (±infinity)")]
    NonFiniteNumber,

    #[error("invalid date value at visit index {index}: {reason}")]
    InvalidDate { index: u32, reason: String },

    #[error("back-reference at visit index {index} points past the current position")]
    DanglingRef { index: u32 },

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}

/// Errors raised while parsing or applying the VDOM data model (§4.2,
/// "Failure semantics"). Each variant names the path or key responsible so
/// a session can surface a precise `onServerError`.
#[derive(Debug, Error, PartialEq)]
pub enum VdomError {
    #[error("missing component {name:?} in registry at path {path}")]
    MissingComponent { name: String, path: Path },

    #[error("no HTML intrinsic registered for tag {tag:?} at path {path}")]
    MissingIntrinsic { tag: String, path: Path },

    #[error("registry reference {name:?} not found")]
    MissingRegistryRef { name: String },

    #[error("invalid patch path {path}: {reason}")]
    InvalidPath { path: Path, reason: String },

    #[error("unknown expression node tag {tag:?}")]
    UnknownExprTag { tag: String },

    #[error("call target at path {path} is not callable")]
    NotCallable { path: Path },

    #[error("unknown operator {op:?}")]
    UnknownOperator { op: String },

    #[error("malformed node: {0}")]
    MalformedNode(String),

    #[error("malformed patch op: {0}")]
    MalformedOp(String),
}
