//! Dotted-string [`Path`]s addressing a subtree or prop inside a VDOM tree
//! (§3 "Path"). Numeric segments index into a children array; string
//! segments name a render-prop or callback-prop key.

use std::fmt;

/// One step in a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Index into a rendered children array.
    Index(usize),
    /// A render-prop or callback-prop key.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => write!(f, "{k}"),
        }
    }
}

/// A position in a VDOM tree, built from the node's ancestry.
///
/// The root path is empty and displays as `""`. `Path::root().child_index(0)`
/// displays as `"0"`; extending that with a render-prop key `"footer"`
/// displays as `"0.footer"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[must_use]
    pub fn child_index(&self, index: usize) -> Path {
        let mut segs = self.0.clone();
        segs.push(PathSegment::Index(index));
        Path(segs)
    }

    #[must_use]
    pub fn child_key(&self, key: impl Into<String>) -> Path {
        let mut segs = self.0.clone();
        segs.push(PathSegment::Key(key.into()));
        Path(segs)
    }

    /// The canonical wire name for a callback bound at this path's prop
    /// `prop_key`: `"<path>.<propKey>"` (§4.3).
    pub fn callback_name(&self, prop_key: &str) -> String {
        if self.is_root() {
            prop_key.to_string()
        } else {
            format!("{self}.{prop_key}")
        }
    }

    /// True if `self` addresses `other` or a descendant of `other` — used to
    /// decide whether a callback binding lies within a subtree being torn
    /// down (§3 invariants, §8 "Callback teardown").
    pub fn is_within(&self, ancestor: &Path) -> bool {
        self.0.len() >= ancestor.0.len() && self.0[..ancestor.0.len()] == ancestor.0[..]
    }

    /// Parse a dotted wire path string. Segments that parse as an unsigned
    /// integer become [`PathSegment::Index`]; everything else is a
    /// [`PathSegment::Key`].
    pub fn parse(raw: &str) -> Path {
        if raw.is_empty() {
            return Path::root();
        }
        let segs = raw
            .split('.')
            .map(|s| match s.parse::<usize>() {
                Ok(i) => PathSegment::Index(i),
                Err(_) => PathSegment::Key(s.to_string()),
            })
            .collect();
        Path(segs)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            first = false;
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl serde::Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Path::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_empty() {
        assert_eq!(Path::root().to_string(), "");
    }

    #[test]
    fn child_chain_displays_dotted() {
        let p = Path::root().child_index(0).child_key("footer").child_index(2);
        assert_eq!(p.to_string(), "0.footer.2");
    }

    #[test]
    fn parse_round_trips() {
        let p = Path::parse("0.footer.2");
        assert_eq!(p.to_string(), "0.footer.2");
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Index(0),
                PathSegment::Key("footer".into()),
                PathSegment::Index(2)
            ]
        );
    }

    #[test]
    fn callback_name_joins_with_dot() {
        let p = Path::root().child_index(1);
        assert_eq!(p.callback_name("onClick"), "1.onClick");
        assert_eq!(Path::root().callback_name("onClick"), "onClick");
    }

    #[test]
    fn is_within_detects_subtree_membership() {
        let ancestor = Path::root().child_index(0);
        let descendant = ancestor.child_key("footer").child_index(3);
        assert!(descendant.is_within(&ancestor));
        assert!(!ancestor.is_within(&descendant));
        assert!(ancestor.is_within(&ancestor));
    }
}
