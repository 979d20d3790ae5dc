//! Data model shared by every layer of the Pulse client: the wire codec
//! (arbitrary graphs, with cycles, dates, sets and maps), the VDOM node and
//! expression types, the patch op types, and the dotted [`Path`] addressing
//! scheme used to name callbacks, elements and imperative-ref targets.
//!
//! This crate has no knowledge of the browser. Everything that needs
//! `web-sys`/`wasm-bindgen` (rendering into a real React tree, extracting
//! DOM events, dispatching ref ops) lives in `pulse-html`,
//! `pulse-interpreter` and `pulse-web`.

pub mod codec;
pub mod datetime;
pub mod error;
pub mod expr;
pub mod message;
pub mod path;
pub mod patch;
pub mod route;
pub mod value;
pub mod vdom;

pub use error::{CodecError, VdomError};
pub use path::{Path, PathSegment};
pub use route::RouteInfo;
