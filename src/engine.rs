use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{FeedClient, PageFetch};
use crate::internal::context::RequestContext;
use crate::internal::document::Document;
use crate::internal::endpoint::{self, Route};
use crate::internal::render::RenderEngine;
use crate::internal::sentinel::{self, Decision, SCROLL_THRESHOLD_PX, TICK_INTERVAL_MS};
use crate::internal::state::PageState;

/// Completion messages from spawned fetch tasks.
#[derive(Debug)]
enum Action {
    PageFetched(Result<PageFetch>),
}

/// Notifications for external listeners (moderation filtering, the
/// harness's progress log).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// New content landed; listeners may want to re-apply block lists.
    CheckBlockedContent,
    PageInserted { fresh: usize, replaced: usize },
    Exhausted,
    LoadFailed,
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub threshold_px: f64,
    pub tick_interval: Duration,
    /// Stop the run loop after this many pages; None pages until the
    /// server is exhausted.
    pub max_pages: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threshold_px: SCROLL_THRESHOLD_PX,
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            max_pages: None,
        }
    }
}

/// The pagination engine for one container.
///
/// Owns the document, the pagination state, the renderer and the gateway;
/// everything runs on one logical thread of control (the select! loop),
/// with fetches spawned as tasks that report back through the action
/// channel. `inFlight` is set synchronously before a fetch is spawned and
/// cleared only when its completion is applied, so at most one fetch is
/// ever outstanding.
pub struct FeedEngine<D: Document> {
    doc: D,
    state: PageState,
    renderer: RenderEngine,
    client: Arc<FeedClient>,
    ctx: RequestContext,
    route: Route,
    opts: EngineOptions,
    action_tx: UnboundedSender<Action>,
    action_rx: UnboundedReceiver<Action>,
    events: Option<UnboundedSender<EngineEvent>>,
}

impl<D: Document> FeedEngine<D> {
    /// Bind an engine to the document's pagination container. Fails when
    /// no container is present; navigating to a new listing means
    /// attaching a fresh engine.
    pub fn attach(doc: D, client: FeedClient, opts: EngineOptions) -> Result<Self> {
        let dataset = doc
            .container()
            .context("document has no pagination container")?;
        let ctx = RequestContext::from_dataset(&dataset)?;
        let route = endpoint::select(&ctx);
        let renderer = RenderEngine::attach(&doc);
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let mut engine = Self {
            doc,
            state: PageState::new(),
            renderer,
            client: Arc::new(client),
            ctx,
            route,
            opts,
            action_tx,
            action_rx,
            events: None,
        };
        engine.initial_affordance_check();
        tracing::info!(
            source = %engine.ctx.source,
            endpoint = engine.route.path,
            exhausted = engine.state.is_exhausted(),
            "pagination engine attached"
        );
        Ok(engine)
    }

    pub fn with_events(mut self, events: UnboundedSender<EngineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    // A page with next to no content has nothing to page through, and a
    // search view is out of scope: both park the engine immediately.
    fn initial_affordance_check(&mut self) {
        if self.doc.search_view_active() || self.doc.content_card_count() < 2 {
            self.doc.set_loading_visible(false);
            self.state.exhaust();
        } else {
            self.doc.set_loading_visible(true);
        }
    }

    /// One sentinel evaluation. Returns true when a fetch was started.
    pub fn tick(&mut self) -> bool {
        match sentinel::decide(
            &self.doc,
            &self.state,
            self.route.region,
            self.opts.threshold_px,
        ) {
            Decision::Wait => false,
            Decision::Disable => {
                self.state.exhaust();
                self.doc.set_loading_visible(false);
                tracing::info!("search view detected, pagination disabled");
                false
            }
            Decision::Fetch => {
                if !self.state.begin_fetch() {
                    return false;
                }
                let client = Arc::clone(&self.client);
                let tx = self.action_tx.clone();
                let route = self.route.clone();
                let ctx = self.ctx.clone();
                let page = self.state.cursor();
                tokio::spawn(async move {
                    let result = client.fetch_page(&route, &ctx, page).await;
                    let _ = tx.send(Action::PageFetched(result));
                });
                true
            }
        }
    }

    /// Apply the next fetch completion. Callers pair this with a `tick()`
    /// that returned true; awaiting with nothing in flight would park
    /// forever.
    pub async fn process_next_action(&mut self) -> Result<()> {
        match self.action_rx.recv().await {
            Some(action) => {
                self.apply(action);
                Ok(())
            }
            None => bail!("action channel closed"),
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::PageFetched(Ok(PageFetch::Skipped)) => {
                tracing::info!("search parameter in container params, pagination disabled");
                self.state.exhaust();
                self.doc.set_loading_visible(false);
                self.emit(EngineEvent::Exhausted);
            }
            Action::PageFetched(Ok(PageFetch::Page(items))) => {
                self.state.advance_cursor();
                if items.is_empty() {
                    self.state.exhaust();
                    self.doc.set_loading_visible(false);
                    tracing::info!(pages = self.state.cursor(), "feed exhausted");
                    self.emit(EngineEvent::Exhausted);
                } else {
                    let outcome =
                        self.renderer
                            .insert_page(&mut self.doc, self.route.builder, &items);
                    self.state.release();
                    self.doc.set_retry_notice(false);
                    self.emit(EngineEvent::PageInserted {
                        fresh: outcome.inserted,
                        replaced: outcome.replaced,
                    });
                    self.emit(EngineEvent::CheckBlockedContent);
                }
            }
            Action::PageFetched(Err(err)) => {
                tracing::warn!(
                    error = ?err,
                    cursor = self.state.cursor(),
                    "page fetch failed, will retry on a later tick"
                );
                self.state.release();
                self.doc.set_retry_notice(true);
                self.emit(EngineEvent::LoadFailed);
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    /// Timer loop: an eager first evaluation, then one every tick interval,
    /// interleaved with fetch completions. Returns once the container is
    /// exhausted (or the optional page budget is spent) with no fetch in
    /// flight.
    pub async fn run_until_exhausted(&mut self) -> Result<()> {
        let mut interval = tokio::time::interval(self.opts.tick_interval);
        loop {
            if self.state.is_exhausted() {
                break;
            }
            if let Some(max) = self.opts.max_pages
                && self.state.cursor() >= max
                && !self.state.is_in_flight()
            {
                tracing::info!(pages = self.state.cursor(), "page budget reached");
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                Some(action) = self.action_rx.recv() => {
                    self.apply(action);
                }
            }
        }
        Ok(())
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn into_document(self) -> D {
        self.doc
    }
}
