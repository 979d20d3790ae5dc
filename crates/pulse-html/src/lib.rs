//! Synthetic-event field extraction (§4.4). React event objects are
//! stripped to a fixed, per-kind field allowlist before crossing the wire;
//! this crate is the only place that touches `web-sys`/`js-sys` to do that
//! projection.

pub mod events;
pub mod summary;

pub use events::extract;
