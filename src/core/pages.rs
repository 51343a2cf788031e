//! # Page / Focus Stack
//!
//! The ordered set of displayed pages and the order in which focus must be
//! handed back as they close.
//!
//! ```text
//!   pages:  [ Root | QueryBar | History ]        (last = on top)
//!   focus:  [ {QueryBar ← Content} {History ← QueryBar} ]
//! ```
//!
//! The base page sits at index 0, is never removed and has no focus entry.
//! Every other *visible* page owns exactly one focus entry recording who had
//! focus when it was shown. Hiding the top entry hands focus back to that
//! holder. Hiding a page further down the stack removes its entry and
//! passes its restore target to the entry above, so the chain still ends at
//! whoever had focus before the whole nest was opened.
//!
//! This type only does the bookkeeping. [`App`](super::app::App) owns it,
//! moves focus according to what it returns, and publishes `FocusChanged`.

use log::{debug, warn};

use super::id::ComponentId;

/// A displayed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: ComponentId,
    /// Drawn over the full screen (overlays center themselves). A page that
    /// does not resize keeps the place its parent layout gives it.
    pub resize: bool,
    pub visible: bool,
    /// Whether showing the page moves input focus to it.
    pub focusable: bool,
}

impl Page {
    /// A visible, focusable page drawn over the full screen.
    pub fn overlay(id: ComponentId) -> Self {
        Self {
            id,
            resize: true,
            visible: true,
            focusable: true,
        }
    }

    /// A visible, focusable page drawn in place by its parent.
    pub fn docked(id: ComponentId) -> Self {
        Self {
            id,
            resize: false,
            visible: true,
            focusable: true,
        }
    }
}

/// A page transition requested by a component, applied by the orchestrator
/// on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Show(Page),
    Hide(ComponentId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FocusEntry {
    owner: ComponentId,
    restore: Option<ComponentId>,
}

/// What a call to [`PageStack::show`] or [`PageStack::hide`] means for focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusMove {
    /// Leave focus where it is.
    Stay,
    /// Give focus to this component.
    To(ComponentId),
    /// Focus goes back to nothing (the page was shown before anything
    /// held focus).
    Clear,
}

#[derive(Debug, Clone)]
pub struct PageStack {
    pages: Vec<Page>,
    focus: Vec<FocusEntry>,
}

impl PageStack {
    pub fn new(base: ComponentId) -> Self {
        Self {
            pages: vec![Page {
                id: base,
                resize: true,
                visible: true,
                focusable: true,
            }],
            focus: Vec::new(),
        }
    }

    pub fn base(&self) -> &ComponentId {
        &self.pages[0].id
    }

    /// Show `page`, recording `current` as the focus to restore when it is
    /// hidden.
    ///
    /// An id already on the stack is updated in place: it keeps its
    /// position, gains a focus entry if it becomes visible and loses it if
    /// it becomes hidden.
    pub fn show(&mut self, page: Page, current: Option<&ComponentId>) -> FocusMove {
        if page.id == *self.base() {
            warn!("Ignoring show of base page {}", page.id);
            return FocusMove::Stay;
        }

        let has_entry = self.focus_index(&page.id).is_some();
        let visible = page.visible;
        let focusable = page.focusable;
        let id = page.id.clone();

        match self.pages.iter_mut().find(|p| p.id == page.id) {
            Some(existing) => {
                debug!("Replacing page {} in place", id);
                *existing = page;
            }
            None => {
                debug!("Showing page {} (visible={})", id, visible);
                self.pages.push(page);
            }
        }

        match (visible, has_entry) {
            (true, false) => {
                self.focus.push(FocusEntry {
                    owner: id.clone(),
                    restore: current.cloned(),
                });
                if focusable {
                    FocusMove::To(id)
                } else {
                    FocusMove::Stay
                }
            }
            (false, true) => self.release(&id),
            _ => FocusMove::Stay,
        }
    }

    /// Remove the page `id`. Unknown ids and the base page are left alone.
    pub fn hide(&mut self, id: &ComponentId) -> FocusMove {
        if id == self.base() {
            warn!("Refusing to hide base page {}", id);
            return FocusMove::Stay;
        }
        let Some(index) = self.pages.iter().position(|p| p.id == *id) else {
            debug!("Hide of {} ignored: not shown", id);
            return FocusMove::Stay;
        };
        self.pages.remove(index);
        self.release(id)
    }

    /// Drop the focus entry owned by `id` and work out where focus goes.
    fn release(&mut self, id: &ComponentId) -> FocusMove {
        let Some(index) = self.focus_index(id) else {
            debug!("{} held no focus entry", id);
            return FocusMove::Stay;
        };
        let entry = self.focus.remove(index);

        if index == self.focus.len() {
            return match entry.restore {
                Some(target) => FocusMove::To(target),
                None => FocusMove::Clear,
            };
        }

        // Closed from underneath: the entry above inherits the restore target.
        if let Some(above) = self.focus.get_mut(index) {
            above.restore = entry.restore;
        }
        FocusMove::Stay
    }

    fn focus_index(&self, id: &ComponentId) -> Option<usize> {
        self.focus.iter().position(|e| e.owner == *id)
    }

    pub fn has_page(&self, id: &ComponentId) -> bool {
        self.pages.iter().any(|p| p.id == *id)
    }

    pub fn page(&self, id: &ComponentId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == *id)
    }

    /// Pages bottom to top, base first.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// The topmost visible page.
    pub fn top(&self) -> &Page {
        self.pages
            .iter()
            .rev()
            .find(|p| p.visible)
            .unwrap_or(&self.pages[0])
    }

    pub fn page_depth(&self) -> usize {
        self.pages.len()
    }

    pub fn focus_depth(&self) -> usize {
        self.focus.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::id;

    fn stack() -> PageStack {
        PageStack::new(id::ROOT)
    }

    #[test]
    fn test_show_then_hide_restores_focus() {
        let mut pages = stack();
        let moved = pages.show(Page::overlay(id::HELP), Some(&id::CONTENT));
        assert_eq!(moved, FocusMove::To(id::HELP));
        assert_eq!((pages.page_depth(), pages.focus_depth()), (2, 1));

        assert_eq!(pages.hide(&id::HELP), FocusMove::To(id::CONTENT));
        assert_eq!((pages.page_depth(), pages.focus_depth()), (1, 0));
    }

    #[test]
    fn test_hide_unknown_page_changes_nothing() {
        let mut pages = stack();
        pages.show(Page::overlay(id::HELP), Some(&id::CONTENT));
        assert_eq!(pages.hide(&id::DOC_PEEKER), FocusMove::Stay);
        assert_eq!((pages.page_depth(), pages.focus_depth()), (2, 1));
    }

    #[test]
    fn test_base_page_cannot_be_hidden_or_replaced() {
        let mut pages = stack();
        assert_eq!(pages.hide(&id::ROOT), FocusMove::Stay);
        assert_eq!(pages.show(Page::overlay(id::ROOT), None), FocusMove::Stay);
        assert_eq!(pages.page_depth(), 1);
        assert_eq!(pages.base(), &id::ROOT);
    }

    #[test]
    fn test_nested_pages_unwind_in_order() {
        let mut pages = stack();
        pages.show(Page::docked(id::QUERY_BAR), Some(&id::CONTENT));
        pages.show(Page::overlay(id::HISTORY), Some(&id::QUERY_BAR));

        assert_eq!(pages.top().id, id::HISTORY);
        assert_eq!(pages.hide(&id::HISTORY), FocusMove::To(id::QUERY_BAR));
        assert_eq!(pages.hide(&id::QUERY_BAR), FocusMove::To(id::CONTENT));
    }

    #[test]
    fn test_hiding_lower_page_passes_restore_target_up() {
        let mut pages = stack();
        pages.show(Page::docked(id::QUERY_BAR), Some(&id::CONTENT));
        pages.show(Page::overlay(id::HISTORY), Some(&id::QUERY_BAR));

        assert_eq!(pages.hide(&id::QUERY_BAR), FocusMove::Stay);
        assert_eq!(pages.focus_depth(), 1);
        assert_eq!(pages.hide(&id::HISTORY), FocusMove::To(id::CONTENT));
    }

    #[test]
    fn test_show_existing_page_replaces_in_place() {
        let mut pages = stack();
        pages.show(Page::overlay(id::HELP), Some(&id::CONTENT));
        pages.show(Page::overlay(id::DOC_PEEKER), Some(&id::HELP));

        let again = pages.show(Page::overlay(id::HELP), Some(&id::DOC_PEEKER));
        assert_eq!(again, FocusMove::Stay);
        assert_eq!((pages.page_depth(), pages.focus_depth()), (3, 2));
        let order: Vec<&str> = pages.pages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["Root", "Help", "DocPeeker"]);
    }

    #[test]
    fn test_hidden_page_takes_no_focus_entry() {
        let mut pages = stack();
        let hidden = Page {
            visible: false,
            ..Page::overlay(id::HELP)
        };
        assert_eq!(pages.show(hidden, Some(&id::CONTENT)), FocusMove::Stay);
        assert_eq!((pages.page_depth(), pages.focus_depth()), (2, 0));
        assert_eq!(pages.top().id, id::ROOT);

        // Becoming visible pushes the entry.
        let moved = pages.show(Page::overlay(id::HELP), Some(&id::CONTENT));
        assert_eq!(moved, FocusMove::To(id::HELP));
        assert_eq!(pages.focus_depth(), 1);

        // Going invisible again gives focus back but keeps the page.
        let hidden = Page {
            visible: false,
            ..Page::overlay(id::HELP)
        };
        assert_eq!(pages.show(hidden, None), FocusMove::To(id::CONTENT));
        assert!(pages.has_page(&id::HELP));
        assert_eq!(pages.focus_depth(), 0);
    }

    #[test]
    fn test_unfocusable_page_keeps_focus_but_restores_on_hide() {
        let mut pages = stack();
        let passive = Page {
            focusable: false,
            ..Page::overlay(id::KEY_HINTS)
        };
        assert_eq!(pages.show(passive, Some(&id::CONTENT)), FocusMove::Stay);
        assert_eq!(pages.focus_depth(), 1);
        assert_eq!(pages.hide(&id::KEY_HINTS), FocusMove::To(id::CONTENT));
    }

    #[test]
    fn test_show_without_prior_focus_clears_on_hide() {
        let mut pages = stack();
        pages.show(Page::overlay(id::HELP), None);
        assert_eq!(pages.hide(&id::HELP), FocusMove::Clear);
    }

    #[test]
    fn test_focus_depth_never_exceeds_page_depth() {
        let mut pages = stack();
        let ids = [id::HELP, id::DOC_PEEKER, id::HISTORY, id::STYLE_PICKER];
        // A fixed pseudo-random walk over show/hide.
        let mut seed: u32 = 7;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let target = ids[(seed >> 16) as usize % ids.len()].clone();
            if (seed >> 8) & 1 == 0 {
                pages.show(Page::overlay(target), Some(&id::CONTENT));
            } else {
                pages.hide(&target);
            }
            assert!(pages.focus_depth() < pages.page_depth());
        }
        for target in ids {
            pages.hide(&target);
        }
        assert_eq!((pages.page_depth(), pages.focus_depth()), (1, 0));
    }
}
