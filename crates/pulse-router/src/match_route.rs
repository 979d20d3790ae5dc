//! Route matching (§4.8 "Match", "Nested routes", "Specificity").

use indexmap::IndexMap;

use crate::pattern::{cmp_specificity, Pattern, Segment};

/// A node in a route table. A layout route has `pattern: None` and
/// contributes to the match chain without consuming path segments; an
/// index route has `index: true` and matches only when no segments remain.
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub id: String,
    pub pattern: Option<Pattern>,
    pub index: bool,
    pub children: Vec<RouteDef>,
}

impl RouteDef {
    pub fn layout(id: impl Into<String>, children: Vec<RouteDef>) -> RouteDef {
        RouteDef { id: id.into(), pattern: None, index: false, children }
    }

    pub fn leaf(id: impl Into<String>, pattern: &str) -> RouteDef {
        RouteDef { id: id.into(), pattern: Some(Pattern::parse(pattern).expect("valid pattern")), index: false, children: Vec::new() }
    }

    pub fn index(id: impl Into<String>) -> RouteDef {
        RouteDef { id: id.into(), pattern: None, index: true, children: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    /// Route ids from outermost layout to the matched leaf.
    pub chain: Vec<String>,
    pub params: IndexMap<String, Option<String>>,
    pub catchall: Vec<String>,
    specificity: Vec<u8>,
}

/// A single candidate produced while walking the route tree.
struct Candidate {
    chain: Vec<String>,
    params: IndexMap<String, Option<String>>,
    catchall: Vec<String>,
    specificity: Vec<u8>,
}

/// §4.8 `selectBestMatch`: find the most specific matching route for
/// `path_segments`, or `None` if nothing matches.
pub fn select_best_match(routes: &[RouteDef], path_segments: &[&str]) -> Option<RouteMatch> {
    let mut candidates = Vec::new();
    for route in routes {
        collect_matches(route, path_segments, Vec::new(), IndexMap::new(), Vec::new(), &mut candidates);
    }
    candidates
        .into_iter()
        .max_by(|a, b| cmp_specificity(&a.specificity, &b.specificity))
        .map(|c| RouteMatch { chain: c.chain, params: c.params, catchall: c.catchall, specificity: c.specificity })
}

fn collect_matches(
    route: &RouteDef,
    remaining: &[&str],
    mut chain: Vec<String>,
    mut params: IndexMap<String, Option<String>>,
    mut catchall: Vec<String>,
    out: &mut Vec<Candidate>,
) {
    chain.push(route.id.clone());

    if route.index {
        if remaining.is_empty() {
            out.push(Candidate { chain, params, catchall, specificity: Vec::new() });
        }
        return;
    }

    let Some(pattern) = &route.pattern else {
        // Layout route: consumes no segments, descend into children as-is.
        for child in &route.children {
            collect_matches(child, remaining, chain.clone(), params.clone(), catchall.clone(), out);
        }
        return;
    };

    let Some(consumed) = match_segments(pattern, remaining, &mut params, &mut catchall) else {
        return;
    };
    let own_specificity = pattern.specificity();
    let rest = &remaining[consumed..];

    if route.children.is_empty() {
        if rest.is_empty() || matches!(pattern.segments.last(), Some(Segment::CatchAll)) {
            out.push(Candidate { chain, params, catchall, specificity: own_specificity });
        }
        return;
    }

    for child in &route.children {
        let before = out.len();
        collect_matches(child, rest, chain.clone(), params.clone(), catchall.clone(), out);
        for candidate in &mut out[before..] {
            let mut combined = own_specificity.clone();
            combined.append(&mut candidate.specificity);
            candidate.specificity = combined;
        }
    }
}

/// Matches a single pattern's segments against a prefix of `remaining`,
/// returning how many segments were consumed. Populates `params` and
/// `catchall` on success. A `*` segment greedily consumes everything left.
fn match_segments(
    pattern: &Pattern,
    remaining: &[&str],
    params: &mut IndexMap<String, Option<String>>,
    catchall: &mut Vec<String>,
) -> Option<usize> {
    let mut consumed = 0;
    for (i, segment) in pattern.segments.iter().enumerate() {
        let here = remaining.get(consumed);
        match segment {
            Segment::Static(literal) => {
                if here != Some(&literal.as_str()) {
                    return None;
                }
                consumed += 1;
            }
            Segment::Dynamic { name, optional } => match here {
                Some(value) => {
                    params.insert(name.clone(), Some(value.to_string()));
                    consumed += 1;
                }
                None if *optional => {
                    params.insert(name.clone(), None);
                }
                None => return None,
            },
            Segment::CatchAll => {
                debug_assert_eq!(i, pattern.segments.len() - 1);
                catchall.extend(remaining[consumed..].iter().map(|s| s.to_string()));
                consumed = remaining.len();
            }
        }
    }
    Some(consumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &str) -> Vec<&str> {
        path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect()
    }

    #[test]
    fn flat_static_route_matches_exactly() {
        let routes = vec![RouteDef::leaf("home", "/"), RouteDef::leaf("about", "/about")];
        let m = select_best_match(&routes, &segs("/about")).unwrap();
        assert_eq!(m.chain, vec!["about".to_string()]);
    }

    #[test]
    fn dynamic_segment_captures_param() {
        let routes = vec![RouteDef::leaf("user", "/users/:id")];
        let m = select_best_match(&routes, &segs("/users/42")).unwrap();
        assert_eq!(m.params.get("id"), Some(&Some("42".to_string())));
    }

    #[test]
    fn optional_segment_absent_yields_none_param() {
        let routes = vec![RouteDef::leaf("user", "/users/:id/edit/:tab?")];
        let m = select_best_match(&routes, &segs("/users/42/edit")).unwrap();
        assert_eq!(m.params.get("tab"), Some(&None));
    }

    #[test]
    fn catchall_collects_remaining_segments() {
        let routes = vec![RouteDef::leaf("files", "/files/*")];
        let m = select_best_match(&routes, &segs("/files/a/b/c")).unwrap();
        assert_eq!(m.catchall, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn static_route_wins_over_dynamic_sibling() {
        let routes = vec![RouteDef::leaf("new_post", "/posts/new"), RouteDef::leaf("post", "/posts/:id")];
        let m = select_best_match(&routes, &segs("/posts/new")).unwrap();
        assert_eq!(m.chain, vec!["new_post".to_string()]);
    }

    #[test]
    fn nested_layout_and_index_route_match() {
        let routes = vec![RouteDef::layout(
            "layout",
            vec![RouteDef::index("dashboard_index"), RouteDef::leaf("settings", "/settings")],
        )];
        let index_match = select_best_match(&routes, &segs("/")).unwrap();
        assert_eq!(index_match.chain, vec!["layout".to_string(), "dashboard_index".to_string()]);

        let settings_match = select_best_match(&routes, &segs("/settings")).unwrap();
        assert_eq!(settings_match.chain, vec!["layout".to_string(), "settings".to_string()]);
    }

    #[test]
    fn no_match_returns_none() {
        let routes = vec![RouteDef::leaf("about", "/about")];
        assert!(select_best_match(&routes, &segs("/missing")).is_none());
    }
}
