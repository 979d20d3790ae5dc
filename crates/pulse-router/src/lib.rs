//! Route table, matching, navigation and offline cache (§4.8, §4.9). The
//! matching and pattern grammar are platform-independent; navigation's
//! `web` module and the offline cache's local-storage persistence need a
//! browser and sit behind the `web`/`serialize` features.

pub mod cache;
pub mod error;
pub mod hooks;
pub mod match_route;
pub mod navigation;
pub mod pattern;
pub mod route_info;

pub use cache::{CachedView, OfflineCache, DEFAULT_CAPACITY};
pub use error::RouterError;
pub use match_route::{select_best_match, RouteDef, RouteMatch};
pub use navigation::{resolve, Destination, NavigateOptions, NoopLoader, PrefetchTrigger, RouteModuleLoader};
pub use pattern::Pattern;
pub use route_info::build_route_info;
