//! Scroll behaviors layered on top of navigation (§4.8 `useHashScroll`,
//! scroll position save/restore).

use std::collections::HashMap;

/// Per-pathname scroll position, saved on navigation away and restored on
/// return unless the destination set `preventScrollReset` (§4.8).
#[derive(Debug, Default)]
pub struct ScrollMemory {
    positions: HashMap<String, (f64, f64)>,
}

impl ScrollMemory {
    pub fn new() -> ScrollMemory {
        ScrollMemory::default()
    }

    pub fn save(&mut self, pathname: &str, x: f64, y: f64) {
        self.positions.insert(pathname.to_string(), (x, y));
    }

    pub fn restore(&self, pathname: &str) -> Option<(f64, f64)> {
        self.positions.get(pathname).copied()
    }

    pub fn forget(&mut self, pathname: &str) {
        self.positions.remove(pathname);
    }
}

/// §4.8 `useHashScroll`: given the new hash (without `#`), decide which
/// element id (if any) should be scrolled into view. An empty hash scrolls
/// nowhere.
pub fn hash_scroll_target(hash: &str) -> Option<&str> {
    let id = hash.strip_prefix('#').unwrap_or(hash);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[cfg(feature = "web")]
pub mod web {
    use web_sys::{window, Element, ScrollIntoViewOptions};

    /// Scroll the element with `id` into view, per `useHashScroll` firing on
    /// hash change.
    pub fn scroll_hash_into_view(id: &str) -> Option<()> {
        let document = window()?.document()?;
        let element: Element = document.get_element_by_id(id)?;
        element.scroll_into_view_with_scroll_into_view_options(&ScrollIntoViewOptions::new());
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hash_has_no_scroll_target() {
        assert_eq!(hash_scroll_target(""), None);
        assert_eq!(hash_scroll_target("#"), None);
    }

    #[test]
    fn hash_strips_leading_pound() {
        assert_eq!(hash_scroll_target("#section-2"), Some("section-2"));
    }

    #[test]
    fn scroll_memory_restores_saved_position() {
        let mut memory = ScrollMemory::new();
        memory.save("/dashboard", 0.0, 420.0);
        assert_eq!(memory.restore("/dashboard"), Some((0.0, 420.0)));
        assert_eq!(memory.restore("/other"), None);
    }

    #[test]
    fn forget_clears_saved_position() {
        let mut memory = ScrollMemory::new();
        memory.save("/dashboard", 0.0, 420.0);
        memory.forget("/dashboard");
        assert_eq!(memory.restore("/dashboard"), None);
    }
}
