//! Offline cache (§4.9 "Offline cache & offline navigation"): an LRU of the
//! last-rendered VDOM per path, optionally persisted to local storage so a
//! reload while offline can still render something.

use std::num::NonZeroUsize;

use lru::LruCache;
use pulse_core::codec::{self, DecodeOptions};
use pulse_core::route::RouteInfo;
use pulse_core::vdom::Node;

pub const DEFAULT_CAPACITY: usize = 50;

/// A cached view. `vdom_wire` is the codec envelope (§4.1) the entry was
/// decoded from — kept alongside the parsed [`Node`] because `Node`/
/// [`RouteInfo`] aren't `serde`-derivable (they're built from the
/// hand-rolled [`pulse_core::value::PulseValue`] graph), so persistence
/// round-trips through the wire envelope instead of the parsed types.
#[derive(Debug, Clone)]
pub struct CachedView {
    pub vdom: Node,
    pub vdom_wire: serde_json::Value,
    pub route_info: RouteInfo,
}

pub struct OfflineCache {
    entries: LruCache<String, CachedView>,
}

impl OfflineCache {
    pub fn new(capacity: usize) -> OfflineCache {
        OfflineCache { entries: LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap()) }
    }

    pub fn put(&mut self, path: impl Into<String>, view: CachedView) {
        self.entries.put(path.into(), view);
    }

    pub fn get(&mut self, path: &str) -> Option<&CachedView> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize every cached entry's wire-level fields for local-storage
    /// persistence, most-recently-used first.
    pub fn to_json(&self) -> serde_json::Value {
        let entries: Vec<serde_json::Value> = self
            .entries
            .iter()
            .map(|(path, view)| {
                serde_json::json!({
                    "path": path,
                    "vdom": view.vdom_wire,
                    "routeInfo": route_info_to_json(&view.route_info),
                })
            })
            .collect();
        serde_json::Value::Array(entries)
    }

    /// Rebuild a cache from a previously persisted `to_json` payload. Entries
    /// whose VDOM fails to parse are skipped rather than failing the whole
    /// load — a single corrupt entry shouldn't strand the rest.
    pub fn from_json(payload: &serde_json::Value, capacity: usize) -> OfflineCache {
        let mut cache = OfflineCache::new(capacity);
        let Some(entries) = payload.as_array() else { return cache };
        // Oldest-first in storage order; insert in that order so the most
        // recently used entry (last in the array) ends up hottest in the LRU.
        for entry in entries {
            let (Some(path), Some(vdom_wire), Some(route_info_json)) =
                (entry.get("path").and_then(|p| p.as_str()), entry.get("vdom"), entry.get("routeInfo"))
            else {
                continue;
            };
            let Ok(pulse_value) = codec::decode(vdom_wire, DecodeOptions::default()) else { continue };
            let Ok(vdom) = Node::from_value(&pulse_value) else { continue };
            let route_info = route_info_from_json(route_info_json);
            cache.put(path.to_string(), CachedView { vdom, vdom_wire: vdom_wire.clone(), route_info });
        }
        cache
    }
}

fn route_info_to_json(info: &RouteInfo) -> serde_json::Value {
    let query_params: serde_json::Map<String, serde_json::Value> = info
        .query_params
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    let path_params: serde_json::Map<String, serde_json::Value> = info
        .path_params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone().map(serde_json::Value::String).unwrap_or(serde_json::Value::Null)))
        .collect();

    serde_json::json!({
        "pathname": info.pathname,
        "hash": info.hash,
        "query": info.query,
        "queryParams": serde_json::Value::Object(query_params),
        "pathParams": serde_json::Value::Object(path_params),
        "catchall": info.catchall,
    })
}

fn route_info_from_json(v: &serde_json::Value) -> RouteInfo {
    RouteInfo {
        pathname: v.get("pathname").and_then(|s| s.as_str()).unwrap_or_default().to_string(),
        hash: v.get("hash").and_then(|s| s.as_str()).unwrap_or_default().to_string(),
        query: v.get("query").and_then(|s| s.as_str()).unwrap_or_default().to_string(),
        query_params: v
            .get("queryParams")
            .and_then(|q| q.as_object())
            .map(|m| m.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect())
            .unwrap_or_default(),
        path_params: v
            .get("pathParams")
            .and_then(|q| q.as_object())
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.as_str().map(str::to_string))).collect())
            .unwrap_or_default(),
        catchall: v
            .get("catchall")
            .and_then(|c| c.as_array())
            .map(|a| a.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn sample_view(pathname: &str) -> CachedView {
        let value = pulse_core::value::PulseValue::String("Hello".into());
        CachedView {
            vdom: Node::from_value(&value).unwrap(),
            vdom_wire: codec::encode(&value).unwrap(),
            route_info: RouteInfo { pathname: pathname.to_string(), ..Default::default() },
        }
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let mut cache = OfflineCache::new(2);
        cache.put("/a", sample_view("/a"));
        cache.put("/b", sample_view("/b"));
        cache.put("/c", sample_view("/c"));
        assert!(!cache.contains("/a"));
        assert!(cache.contains("/b"));
        assert!(cache.contains("/c"));
    }

    #[test]
    fn default_capacity_matches_spec() {
        assert_eq!(DEFAULT_CAPACITY, 50);
    }

    #[test]
    fn round_trips_through_json_persistence() {
        let mut cache = OfflineCache::new(10);
        cache.put("/users/42", sample_view("/users/42"));
        let json = cache.to_json();
        let restored = OfflineCache::from_json(&json, 10);
        assert!(restored.contains("/users/42"));
    }

    #[test]
    fn route_info_json_round_trip_preserves_params() {
        let info = RouteInfo {
            pathname: "/users/42".into(),
            path_params: indexmap! { "id".to_string() => Some("42".to_string()) },
            ..Default::default()
        };
        let round_tripped = route_info_from_json(&route_info_to_json(&info));
        assert_eq!(round_tripped, info);
    }
}
