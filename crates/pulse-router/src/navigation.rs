//! Navigation (§4.8 "Navigation"): resolving `to` against the current URL,
//! classifying external destinations, and (behind the `web` feature)
//! driving `window.history` and scroll restoration.

use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// Same scheme+origin: handled by the router without a full page load.
    Internal { pathname: String, search: String, hash: String },
    /// Different scheme or origin: the caller must fall back to a hard
    /// navigation (`window.location.assign`).
    External { url: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigateOptions {
    pub replace: bool,
    pub state: Option<serde_json::Value>,
    /// §4.8 "scroll position is saved per pathname and restored on return
    /// unless a `preventScrollReset` flag is set."
    pub prevent_scroll_reset: bool,
}

/// Resolve `to` against `current_url` and classify it (§4.8 "resolves
/// relative paths against the current URL, classifies external URLs
/// (different scheme or origin)").
pub fn resolve(current_url: &str, to: &str) -> Result<Destination, url::ParseError> {
    let base = Url::parse(current_url)?;
    let resolved = base.join(to)?;

    if resolved.scheme() != base.scheme() || resolved.host_str() != base.host_str() || resolved.port_or_known_default() != base.port_or_known_default() {
        return Ok(Destination::External { url: resolved.to_string() });
    }

    Ok(Destination::Internal {
        pathname: resolved.path().to_string(),
        search: resolved.query().map(|q| format!("?{q}")).unwrap_or_default(),
        hash: resolved.fragment().map(|h| format!("#{h}")).unwrap_or_default(),
    })
}

/// How eagerly `Link` should trigger a [`RouteModuleLoader`] preload (§4.8
/// "`Link` integrates hover (\"intent\"), viewport, or render-time
/// prefetch").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchTrigger {
    Hover,
    Viewport,
    Render,
}

/// Loading a route's lazy bundle is app/bundler-specific; the router only
/// coordinates *when* to trigger it, via this hook.
pub trait RouteModuleLoader {
    fn preload(&self, pathname: &str);
}

/// A loader that does nothing — the default when the embedding app has no
/// lazy route modules to preload.
pub struct NoopLoader;

impl RouteModuleLoader for NoopLoader {
    fn preload(&self, _pathname: &str) {}
}

#[cfg(feature = "web")]
pub mod web {
    use web_sys::{window, ScrollRestoration};

    use super::{Destination, NavigateOptions, RouteModuleLoader};

    /// Push or replace `window.history` for an already-resolved internal
    /// destination, and trigger the loader's preload (§4.8 "pushes/replaces
    /// history state, and preloads the new match's route-module lazy
    /// bundles").
    pub fn navigate(dest: &Destination, opts: &NavigateOptions, loader: &dyn RouteModuleLoader) -> Result<(), String> {
        let Destination::Internal { pathname, search, hash } = dest else {
            return Err("external destinations require a hard navigation".to_string());
        };
        let url = format!("{pathname}{search}{hash}");
        let win = window().ok_or("no window")?;
        let history = win.history().map_err(|_| "no history")?;
        let state = opts.state.clone().map(|v| v.to_string()).unwrap_or_default();
        let js_state = wasm_bindgen::JsValue::from_str(&state);
        if opts.replace {
            history.replace_state_with_url(&js_state, "", Some(&url)).map_err(|_| "replaceState failed")?;
        } else {
            history.push_state_with_url(&js_state, "", Some(&url)).map_err(|_| "pushState failed")?;
        }
        loader.preload(pathname);
        Ok(())
    }

    /// Trigger a bundle preload without navigating (§4.8 "`prefetch(to)`").
    pub fn prefetch(pathname: &str, loader: &dyn RouteModuleLoader) {
        loader.preload(pathname);
    }

    /// Ask the browser to leave scroll restoration to us; we manage it
    /// per-pathname ourselves (§4.8 scroll save/restore).
    pub fn take_manual_scroll_restoration() -> Result<(), String> {
        let win = window().ok_or("no window")?;
        let history = win.history().map_err(|_| "no history")?;
        history.set_scroll_restoration(ScrollRestoration::Manual).map_err(|_| "set_scroll_restoration failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_path_against_current_url() {
        let dest = resolve("https://app.example/dashboard/", "../settings").unwrap();
        assert_eq!(
            dest,
            Destination::Internal { pathname: "/settings".into(), search: String::new(), hash: String::new() }
        );
    }

    #[test]
    fn preserves_query_and_hash() {
        let dest = resolve("https://app.example/a", "/b?x=1#frag").unwrap();
        assert_eq!(
            dest,
            Destination::Internal { pathname: "/b".into(), search: "?x=1".into(), hash: "#frag".into() }
        );
    }

    #[test]
    fn different_origin_is_external() {
        let dest = resolve("https://app.example/a", "https://other.example/b").unwrap();
        assert_eq!(dest, Destination::External { url: "https://other.example/b".into() });
    }

    #[test]
    fn different_scheme_is_external() {
        let dest = resolve("https://app.example/a", "mailto:hello@example.com").unwrap();
        assert!(matches!(dest, Destination::External { .. }));
    }

    #[test]
    fn noop_loader_does_not_panic() {
        NoopLoader.preload("/anything");
    }
}
