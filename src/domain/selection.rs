/// Character selection: browse the catalog, commit one avatar.
///
/// Two states: browsing (`committed == None`) and committed.
/// `advance` only moves the highlight while browsing; `reset` returns to
/// browsing without moving the highlight, so the next playthrough starts
/// from the same avatar.

use super::avatar::{Avatar, CATALOG};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Clone, Debug)]
pub struct SelectionController {
    catalog: &'static [Avatar],
    highlighted: usize,
    committed: Option<&'static Avatar>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::with_catalog(&CATALOG)
    }

    /// Selection over an arbitrary non-empty catalog.
    pub fn with_catalog(catalog: &'static [Avatar]) -> Self {
        assert!(!catalog.is_empty(), "avatar catalog must not be empty");
        SelectionController { catalog, highlighted: 0, committed: None }
    }

    pub fn catalog(&self) -> &'static [Avatar] {
        self.catalog
    }

    pub fn highlighted_index(&self) -> usize {
        self.highlighted
    }

    pub fn highlighted(&self) -> &'static Avatar {
        let catalog = self.catalog;
        &catalog[self.highlighted]
    }

    pub fn committed(&self) -> Option<&'static Avatar> {
        self.committed
    }

    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    pub fn advance(&mut self, direction: Direction) {
        if self.committed.is_some() { return; }
        let len = self.catalog.len();
        self.highlighted = match direction {
            Direction::Previous => (self.highlighted + len - 1) % len,
            Direction::Next => (self.highlighted + 1) % len,
        };
    }

    /// Commit the highlighted avatar. Calling again while committed keeps
    /// the existing choice.
    pub fn confirm(&mut self) -> &'static Avatar {
        let pick = self.highlighted();
        *self.committed.get_or_insert(pick)
    }

    pub fn reset(&mut self) {
        self.committed = None;
    }
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}
