//! Assembles a [`RouteInfo`] from a resolved URL and a [`RouteMatch`] (§6
//! "Route info shape", §4.8 "Route matching produces ... merged `params`,
//! and a `catchall[]` accessor"). This is the seam between the pure
//! pattern-matching half of the router ([`crate::match_route`]) and the
//! wire-shaped type the session attaches/updates with.

use url::Url;

use pulse_core::route::RouteInfo;

use crate::match_route::RouteMatch;

/// Builds the `RouteInfo` the session sends on `attach`/`update` for
/// `url`, given the route table match already computed for its path.
/// Query-param keys/values are percent-decoded by [`Url::query_pairs`].
pub fn build_route_info(url: &Url, matched: &RouteMatch) -> RouteInfo {
    let query = url.query().map(|q| format!("?{q}")).unwrap_or_default();
    let query_params = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let hash = url.fragment().map(|h| format!("#{h}")).unwrap_or_default();

    tracing::debug!(pathname = url.path(), chain = ?matched.chain, "built route info");

    RouteInfo {
        pathname: url.path().to_string(),
        hash,
        query,
        query_params,
        path_params: matched.params.clone(),
        catchall: matched.catchall.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_route::select_best_match;
    use crate::match_route::RouteDef;

    #[test]
    fn builds_route_info_with_decoded_query_and_params() {
        let routes = vec![RouteDef::leaf("user", "/users/:id")];
        let url = Url::parse("https://app.example/users/42?sort=asc%20desc#top").unwrap();
        let segments: Vec<&str> = url.path().trim_matches('/').split('/').collect();
        let matched = select_best_match(&routes, &segments).unwrap();

        let info = build_route_info(&url, &matched);
        assert_eq!(info.pathname, "/users/42");
        assert_eq!(info.hash, "#top");
        assert_eq!(info.query, "?sort=asc%20desc");
        assert_eq!(info.query_params.get("sort"), Some(&"asc desc".to_string()));
        assert_eq!(info.path_params.get("id"), Some(&Some("42".to_string())));
    }

    #[test]
    fn carries_catchall_segments_through() {
        let routes = vec![RouteDef::leaf("files", "/files/*")];
        let url = Url::parse("https://app.example/files/a/b").unwrap();
        let segments: Vec<&str> = url.path().trim_matches('/').split('/').collect();
        let matched = select_best_match(&routes, &segments).unwrap();

        let info = build_route_info(&url, &matched);
        assert_eq!(info.catchall, vec!["a".to_string(), "b".to_string()]);
    }
}
