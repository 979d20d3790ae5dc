//! [`RouteInfo`] (§3, §6 "Route info shape") — derived from the current URL
//! and the matched route, and carried on `attach`/`update` client messages.
//! Matching the pattern grammar against a route table is `pulse-router`'s
//! job; this type is the shared shape both that crate and the session
//! client depend on.

use indexmap::IndexMap;

use crate::error::VdomError;
use crate::value::PulseValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteInfo {
    pub pathname: String,
    pub hash: String,
    pub query: String,
    pub query_params: IndexMap<String, String>,
    /// `undefined` for an absent optional (`:name?`) segment.
    pub path_params: IndexMap<String, Option<String>>,
    pub catchall: Vec<String>,
}

impl RouteInfo {
    pub fn from_value(v: &PulseValue) -> Result<RouteInfo, VdomError> {
        let str_field = |key: &str| -> String {
            v.get(key).and_then(|s| s.as_str().map(str::to_string)).unwrap_or_default()
        };

        let query_params = v
            .get("queryParams")
            .and_then(|q| q.entries())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect();

        let path_params = v
            .get("pathParams")
            .and_then(|p| p.entries())
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.as_str().map(str::to_string)))
            .collect();

        let catchall = v
            .get("catchall")
            .and_then(|c| c.items())
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        Ok(RouteInfo {
            pathname: str_field("pathname"),
            hash: str_field("hash"),
            query: str_field("query"),
            query_params,
            path_params,
            catchall,
        })
    }

    pub fn to_value(&self) -> PulseValue {
        let query_params = self
            .query_params
            .iter()
            .map(|(k, v)| (k.clone(), PulseValue::String(v.clone())))
            .collect();
        let path_params = self
            .path_params
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    v.clone().map(PulseValue::String).unwrap_or(PulseValue::Undefined),
                )
            })
            .collect();
        let catchall = self.catchall.iter().cloned().map(PulseValue::String).collect();

        let mut entries = IndexMap::new();
        entries.insert("pathname".to_string(), PulseValue::String(self.pathname.clone()));
        entries.insert("hash".to_string(), PulseValue::String(self.hash.clone()));
        entries.insert("query".to_string(), PulseValue::String(self.query.clone()));
        entries.insert("queryParams".to_string(), PulseValue::object(query_params));
        entries.insert("pathParams".to_string(), PulseValue::object(path_params));
        entries.insert("catchall".to_string(), PulseValue::array(catchall));
        PulseValue::object(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[test]
    fn round_trips_through_value() {
        let info = RouteInfo {
            pathname: "/users/42".into(),
            hash: "#top".into(),
            query: "?sort=asc".into(),
            query_params: indexmap! { "sort".to_string() => "asc".to_string() },
            path_params: indexmap! { "id".to_string() => Some("42".to_string()) },
            catchall: vec![],
        };
        let round_tripped = RouteInfo::from_value(&info.to_value()).unwrap();
        assert_eq!(round_tripped, info);
    }

    #[test]
    fn missing_optional_param_round_trips_as_none() {
        let info = RouteInfo {
            pathname: "/posts".into(),
            path_params: indexmap! { "id".to_string() => None },
            ..Default::default()
        };
        let round_tripped = RouteInfo::from_value(&info.to_value()).unwrap();
        assert_eq!(round_tripped.path_params.get("id"), Some(&None));
    }
}
