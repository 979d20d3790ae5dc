//! Offline navigation helper (§4.9): when the browser reports
//! `navigator.onLine === false` and the target path has a cache entry,
//! surfaces the cached VDOM instead of waiting on the server. Tracks
//! pending navigation and the last path that was online so the session can
//! reconcile once reconnected.

use std::cell::RefCell;

use pulse_router::cache::CachedView;
use pulse_router::OfflineCache;

pub struct OfflineNavigator {
    cache: RefCell<OfflineCache>,
    pending: RefCell<Option<String>>,
    last_online_path: RefCell<Option<String>>,
}

impl OfflineNavigator {
    pub fn new(capacity: usize) -> OfflineNavigator {
        OfflineNavigator {
            cache: RefCell::new(OfflineCache::new(capacity)),
            pending: RefCell::new(None),
            last_online_path: RefCell::new(None),
        }
    }

    pub fn remember(&self, path: impl Into<String>, view: CachedView) {
        self.cache.borrow_mut().put(path, view);
    }

    /// Records that the browser was last known online at `path`, so a
    /// reconnect can re-attach there if no explicit navigation is pending.
    pub fn note_online(&self, path: impl Into<String>) {
        *self.last_online_path.borrow_mut() = Some(path.into());
    }

    pub fn last_online_path(&self) -> Option<String> {
        self.last_online_path.borrow().clone()
    }

    /// Marks `path` as the navigation currently awaited while offline;
    /// cleared once [`Self::resolve`] serves (or fails to serve) it.
    pub fn set_pending(&self, path: impl Into<String>) {
        *self.pending.borrow_mut() = Some(path.into());
    }

    pub fn pending(&self) -> Option<String> {
        self.pending.borrow().clone()
    }

    /// Serve `path` from the cache if the browser is currently offline and
    /// an entry exists; `None` otherwise (caller falls back to waiting for
    /// the server).
    pub fn resolve(&self, path: &str) -> Option<CachedView> {
        if is_online() {
            return None;
        }
        let view = self.cache.borrow_mut().get(path).cloned();
        if view.is_some() {
            self.pending.borrow_mut().take();
        }
        view
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.borrow().contains(path)
    }
}

fn is_online() -> bool {
    web_sys::window().map(|w| w.navigator().on_line()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::route::RouteInfo;
    use pulse_core::value::PulseValue;

    fn sample_view() -> CachedView {
        let value = PulseValue::String("Hello".into());
        CachedView {
            vdom: pulse_core::vdom::Node::from_value(&value).unwrap(),
            vdom_wire: pulse_core::codec::encode(&value).unwrap(),
            route_info: RouteInfo::default(),
        }
    }

    #[test]
    fn pending_path_tracks_set_and_clear_on_resolve() {
        let nav = OfflineNavigator::new(4);
        nav.set_pending("/a");
        assert_eq!(nav.pending(), Some("/a".to_string()));
    }

    #[test]
    fn remembers_last_online_path() {
        let nav = OfflineNavigator::new(4);
        assert_eq!(nav.last_online_path(), None);
        nav.note_online("/dashboard");
        assert_eq!(nav.last_online_path(), Some("/dashboard".to_string()));
    }

    #[test]
    fn is_cached_reflects_remembered_entries() {
        let nav = OfflineNavigator::new(4);
        assert!(!nav.is_cached("/a"));
        nav.remember("/a", sample_view());
        assert!(nav.is_cached("/a"));
    }
}
