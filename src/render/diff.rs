//! Chrome diff protocol for incremental updates

use crate::render::{BreakMarker, ChromeLayer, ChromePage};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A single patch operation for the host renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChromePatch {
    /// Append a new page representation
    InsertPage { page: ChromePage },
    /// Remove a page that no longer exists
    RemovePage { page_index: usize },
    /// Replace (or clear) the header of a page
    UpdateHeader {
        page_index: usize,
        text: Option<String>,
    },
    /// Replace (or clear) the footer of a page
    UpdateFooter {
        page_index: usize,
        text: Option<String>,
    },
    /// Draw a break marker
    InsertBreak { marker: BreakMarker },
    /// Remove a break marker that no longer points into content
    RemoveBreak { page_number: usize },
}

/// Complete chrome diff to send to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChromeDiff {
    pub generation: u64,
    pub patches: Vec<ChromePatch>,
}

impl ChromeDiff {
    /// Create empty diff
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            patches: Vec::new(),
        }
    }

    /// Patches turning `previous` into `current`
    pub fn between(previous: &ChromeLayer, current: &ChromeLayer) -> Self {
        let mut diff = Self::new(current.generation);
        diff.diff_pages(previous, current);
        diff.diff_markers(previous, current);
        diff
    }

    pub fn add_patch(&mut self, patch: ChromePatch) {
        self.patches.push(patch);
    }

    /// Append a later diff; applying the result equals applying both in order
    pub fn merge(&mut self, later: ChromeDiff) {
        self.generation = later.generation;
        self.patches.extend(later.patches);
    }

    pub fn has_patches(&self) -> bool {
        !self.patches.is_empty()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    fn diff_pages(&mut self, previous: &ChromeLayer, current: &ChromeLayer) {
        let prev_count = previous.pages.len();
        let curr_count = current.pages.len();

        // Trailing pages go first, last to first, so indices stay valid
        for page_index in (curr_count..prev_count).rev() {
            self.add_patch(ChromePatch::RemovePage { page_index });
        }

        for (page_index, curr) in current.pages.iter().enumerate() {
            let Some(prev) = previous.pages.get(page_index) else {
                self.add_patch(ChromePatch::InsertPage { page: curr.clone() });
                continue;
            };

            if prev.bounds != curr.bounds || prev.background() != curr.background() {
                self.add_patch(ChromePatch::RemovePage { page_index });
                self.add_patch(ChromePatch::InsertPage { page: curr.clone() });
                continue;
            }

            if prev.header() != curr.header() {
                self.add_patch(ChromePatch::UpdateHeader {
                    page_index,
                    text: curr.header().map(str::to_string),
                });
            }
            if prev.footer() != curr.footer() {
                self.add_patch(ChromePatch::UpdateFooter {
                    page_index,
                    text: curr.footer().map(str::to_string),
                });
            }
        }
    }

    fn diff_markers(&mut self, previous: &ChromeLayer, current: &ChromeLayer) {
        let prev_markers: FxHashMap<usize, f32> = previous
            .break_markers
            .iter()
            .map(|m| (m.page_number, m.y))
            .collect();
        let curr_markers: FxHashMap<usize, f32> = current
            .break_markers
            .iter()
            .map(|m| (m.page_number, m.y))
            .collect();

        for marker in previous.break_markers.iter().rev() {
            let moved = curr_markers
                .get(&marker.page_number)
                .is_some_and(|y| *y != marker.y);
            if moved || !curr_markers.contains_key(&marker.page_number) {
                self.add_patch(ChromePatch::RemoveBreak {
                    page_number: marker.page_number,
                });
            }
        }

        for marker in &current.break_markers {
            if prev_markers.get(&marker.page_number) != Some(&marker.y) {
                self.add_patch(ChromePatch::InsertBreak { marker: *marker });
            }
        }
    }
}

/// Diff engine remembering the last layer sent to the host
#[derive(Debug, Default)]
pub struct ChromeDiffEngine {
    previous: ChromeLayer,
}

impl ChromeDiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer the host currently displays
    pub fn current(&self) -> &ChromeLayer {
        &self.previous
    }

    /// Diff against the last layer and remember `current`
    pub fn update(&mut self, current: ChromeLayer) -> ChromeDiff {
        let diff = ChromeDiff::between(&self.previous, &current);
        self.previous = current;
        diff
    }

    /// Forget the displayed layer, so the next update re-sends everything
    pub fn reset(&mut self) {
        self.previous = ChromeLayer::default();
    }
}
