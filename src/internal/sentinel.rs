use super::document::{Document, ScrollRegion};
use super::state::PageState;

/// How close to the bottom of the scrollable region the viewport must be
/// before the next page is requested.
pub const SCROLL_THRESHOLD_PX: f64 = 3700.0;

/// How often the sentinel re-evaluates, plus one eager evaluation at start.
pub const TICK_INTERVAL_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Start a fetch: the guard must be set before any async work begins.
    Fetch,
    /// Nothing to do this tick.
    Wait,
    /// Search view detected: disable pagination for the container's
    /// lifetime and hide the loading affordance.
    Disable,
}

/// Evaluate the tick preconditions, in order: container present, not a
/// search view, no fetch in flight, not exhausted, scroll near the bottom
/// of the route's region.
pub fn decide<D: Document>(
    doc: &D,
    state: &PageState,
    region: ScrollRegion,
    threshold_px: f64,
) -> Decision {
    if doc.container().is_none() {
        return Decision::Wait;
    }
    if doc.search_view_active() {
        return Decision::Disable;
    }
    if state.is_in_flight() || state.is_exhausted() {
        return Decision::Wait;
    }
    if doc.scroll_offset() > doc.scroll_height(region) - threshold_px {
        Decision::Fetch
    } else {
        Decision::Wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::document::MemoryDocument;

    const PAGE: &str = r#"
        <div id="index-container" data-which="videos" data-params="{}"></div>
        <div class="single-article" id="follows-1"></div>
        <div class="single-article" id="follows-2"></div>
    "#;

    fn doc(location: &str) -> MemoryDocument {
        MemoryDocument::from_html(PAGE, location)
    }

    #[test]
    fn fetches_when_near_the_bottom_and_idle() {
        let mut page = doc("/videos");
        page.set_region_height(ScrollRegion::Document, 10_000.0);
        page.set_scroll(6_301.0);

        let state = PageState::new();
        assert_eq!(
            decide(&page, &state, ScrollRegion::Document, SCROLL_THRESHOLD_PX),
            Decision::Fetch
        );
    }

    #[test]
    fn waits_when_far_from_the_bottom() {
        let mut page = doc("/videos");
        page.set_region_height(ScrollRegion::Document, 10_000.0);
        page.set_scroll(6_300.0);

        let state = PageState::new();
        assert_eq!(
            decide(&page, &state, ScrollRegion::Document, SCROLL_THRESHOLD_PX),
            Decision::Wait
        );
    }

    #[test]
    fn in_flight_and_exhausted_suppress_fetches() {
        let page = doc("/videos");

        let mut state = PageState::new();
        assert!(state.begin_fetch());
        assert_eq!(
            decide(&page, &state, ScrollRegion::Document, SCROLL_THRESHOLD_PX),
            Decision::Wait
        );

        state.exhaust();
        assert_eq!(
            decide(&page, &state, ScrollRegion::Document, SCROLL_THRESHOLD_PX),
            Decision::Wait
        );
    }

    #[test]
    fn search_views_disable_pagination() {
        let page = doc("/videos?q=cats");
        let state = PageState::new();
        assert_eq!(
            decide(&page, &state, ScrollRegion::Document, SCROLL_THRESHOLD_PX),
            Decision::Disable
        );
    }

    #[test]
    fn missing_container_means_wait() {
        let page = MemoryDocument::from_html("<html><body></body></html>", "/");
        let state = PageState::new();
        assert_eq!(
            decide(&page, &state, ScrollRegion::Document, SCROLL_THRESHOLD_PX),
            Decision::Wait
        );
    }
}
