//! wasm-bindgen entry point: tracing init (mirroring the teacher's
//! `dioxus-logger` wasm32/non-wasm split) plus the hydrate-then-connect
//! bootstrap sequence (§6 "performs React hydration before opening the
//! websocket").

use wasm_bindgen::prelude::*;

use crate::config::PulseConfig;
use crate::hydrate::{self, HydrationData};
use crate::session::Session;

/// Installs the panic hook and a tracing subscriber appropriate to the
/// target. Safe to call more than once; later calls are no-ops.
#[wasm_bindgen(js_name = initTracing)]
pub fn init_tracing() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        let _ = tracing_wasm::try_set_as_global_default();
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = tracing_subscriber::fmt::try_init();
    }
}

/// Reads the hydration script (if present), then opens the session's
/// websocket. Returns the constructed [`Session`] so the host can
/// `attach`/`detach` views and read hydration data for the initial render.
pub fn bootstrap(config: PulseConfig) -> (Session, Option<HydrationData>) {
    let hydration = if config.hydrate {
        match hydrate::read() {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(%err, "failed to read hydration data");
                None
            }
        }
    } else {
        None
    };

    let session = Session::new(config);
    session.connect();
    (session, hydration)
}
