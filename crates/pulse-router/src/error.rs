//! Router error taxonomy (§7 "Router": "unmatched URL yields `null`", so
//! no-match isn't an error — these are only the pattern-grammar violations
//! that should be caught when a route table is built, not at match time).

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RouterError {
    #[error("`*` catch-all segment must be the last segment of pattern {pattern:?}")]
    CatchAllNotLast { pattern: String },

    #[error("pattern {pattern:?} has an empty segment")]
    EmptySegment { pattern: String },
}
