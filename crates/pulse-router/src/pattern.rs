//! Route pattern grammar (§4.8): literal segments, `:name` (required
//! dynamic), `:name?` (optional dynamic), and a terminal `*` catch-all.

use crate::error::RouterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Dynamic { name: String, optional: bool },
    CatchAll,
}

/// Per-segment specificity rank used to break ties between matching
/// routes (§4.8 "Specificity"): static > dynamic > optional > catch-all.
impl Segment {
    fn rank(&self) -> u8 {
        match self {
            Segment::Static(_) => 3,
            Segment::Dynamic { optional: false, .. } => 2,
            Segment::Dynamic { optional: true, .. } => 1,
            Segment::CatchAll => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub raw: String,
    pub segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a pattern string. Trailing slashes are normalized away before
    /// splitting (§4.8 "Trailing slashes are normalized").
    pub fn parse(raw: &str) -> Result<Pattern, RouterError> {
        let trimmed = raw.trim_start_matches('/').trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Pattern { raw: raw.to_string(), segments: Vec::new() });
        }
        let parts: Vec<&str> = trimmed.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                return Err(RouterError::EmptySegment { pattern: raw.to_string() });
            }
            let segment = if *part == "*" {
                if i != parts.len() - 1 {
                    return Err(RouterError::CatchAllNotLast { pattern: raw.to_string() });
                }
                Segment::CatchAll
            } else if let Some(rest) = part.strip_prefix(':') {
                match rest.strip_suffix('?') {
                    Some(name) => Segment::Dynamic { name: name.to_string(), optional: true },
                    None => Segment::Dynamic { name: rest.to_string(), optional: false },
                }
            } else {
                Segment::Static(part.to_string())
            };
            segments.push(segment);
        }
        Ok(Pattern { raw: raw.to_string(), segments })
    }

    /// The per-segment specificity trail, most-significant segment first.
    pub fn specificity(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::rank).collect()
    }
}

/// Compares two specificity trails per §4.8: segment-by-segment rank
/// first, then a longer trail (more segments matched) wins a tie.
pub fn cmp_specificity(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_dynamic_optional_catchall() {
        let p = Pattern::parse("/users/:id/edit/:tab?/*").unwrap();
        assert_eq!(
            p.segments,
            vec![
                Segment::Static("users".into()),
                Segment::Dynamic { name: "id".into(), optional: false },
                Segment::Static("edit".into()),
                Segment::Dynamic { name: "tab".into(), optional: true },
                Segment::CatchAll,
            ]
        );
    }

    #[test]
    fn catchall_not_last_errors() {
        assert_eq!(
            Pattern::parse("/files/*/name"),
            Err(RouterError::CatchAllNotLast { pattern: "/files/*/name".into() })
        );
    }

    #[test]
    fn trailing_slash_normalizes_to_same_pattern() {
        assert_eq!(Pattern::parse("/users/:id/").unwrap().segments, Pattern::parse("/users/:id").unwrap().segments);
    }

    #[test]
    fn static_outranks_dynamic_outranks_optional_outranks_catchall() {
        let static_seg = Segment::Static("new".into());
        let dynamic_seg = Segment::Dynamic { name: "id".into(), optional: false };
        let optional_seg = Segment::Dynamic { name: "id".into(), optional: true };
        let catchall = Segment::CatchAll;
        assert!(static_seg.rank() > dynamic_seg.rank());
        assert!(dynamic_seg.rank() > optional_seg.rank());
        assert!(optional_seg.rank() > catchall.rank());
    }
}
