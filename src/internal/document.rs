use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use strum_macros::Display;

use crate::api::query::has_search_marker;

/// The scrollable region the sentinel measures for a given page kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScrollRegion {
    MainContent,
    Dashboard,
    Document,
}

/// Where a rendered batch lands in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// A `paged-stories` wrapper inserted after the last visible card.
    AfterLastCard,
    /// Appended inside the video collection list.
    VideoList,
    /// Appended inside the following list.
    FollowList,
}

/// One built item handed to the document for insertion.
#[derive(Debug, Clone)]
pub struct RenderedNode {
    pub id: Option<String>,
    pub path: Option<String>,
    pub markup: String,
    /// Counts as a content card for the "anything to page?" check.
    pub card: bool,
    /// The node is a story card, eligible for in-place replacement.
    pub story_card: bool,
}

/// The engine's view of the page. A real frontend would back this with the
/// live DOM; the harness and the tests use [`MemoryDocument`].
pub trait Document {
    /// Dataset of the pagination container, if one exists on the page.
    fn container(&self) -> Option<HashMap<String, String>>;
    fn csrf_token(&self) -> Option<String>;
    fn location_path(&self) -> &str;
    /// A filtered/search view: marker element present, or `q=` in the
    /// location query string.
    fn search_view_active(&self) -> bool;
    fn content_card_count(&self) -> usize;
    fn known_ids(&self) -> Vec<String>;
    fn has_element(&self, id: &str) -> bool;
    /// Whether `dom_id` sits directly under a story card that is not
    /// already hosting an embedded video player.
    fn replaceable_story_card(&self, dom_id: &str, article_id: u64) -> bool;
    fn replace_story_card(&mut self, dom_id: &str, node: RenderedNode) -> bool;
    fn insert_batch(&mut self, position: InsertPosition, nodes: Vec<RenderedNode>, delegate_clicks: bool);
    fn set_loading_visible(&mut self, visible: bool);
    fn set_retry_notice(&mut self, visible: bool);
    fn scroll_offset(&self) -> f64;
    fn scroll_height(&self, region: ScrollRegion) -> f64;
}

static CONTAINER_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("#index-container").unwrap());
static ANY_ID_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("[id]").unwrap());
static CSRF_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="csrf-token"]"#).unwrap());
static STORY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".crayons-story").unwrap());
static SINGLE_ARTICLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".single-article").unwrap());
static QUERY_WRAPPER_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("#query-wrapper").unwrap());
static LOADING_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("#loading-articles").unwrap());

const DEFAULT_REGION_HEIGHT: f64 = 2000.0;

#[derive(Debug, Clone)]
struct SeededNode {
    id: String,
    story_card_parent: bool,
}

#[derive(Debug, Clone)]
struct Batch {
    position: InsertPosition,
    delegated: bool,
    nodes: Vec<RenderedNode>,
}

/// In-memory page model, seeded from a server-rendered HTML snapshot so the
/// engine can absorb content that was present before it attached.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    location_path: String,
    location_query: String,
    container: Option<HashMap<String, String>>,
    csrf: Option<String>,
    seeded: Vec<SeededNode>,
    seeded_ids: HashSet<String>,
    seeded_story_cards: usize,
    seeded_single_articles: usize,
    query_wrapper: bool,
    loading_present: bool,
    loading_visible: bool,
    retry_visible: bool,
    batches: Vec<Batch>,
    replace_counts: HashMap<String, usize>,
    scroll_y: f64,
    region_heights: HashMap<ScrollRegion, f64>,
    auto_scroll: bool,
}

impl MemoryDocument {
    /// Parse a page snapshot. `location` is the browser-style location the
    /// page was served under, e.g. `/latest` or `/search?q=rust`.
    pub fn from_html(html: &str, location: &str) -> Self {
        let parsed = Html::parse_document(html);

        let (path, query) = match location.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (location.to_string(), String::new()),
        };

        let container = parsed.select(&CONTAINER_SEL).next().map(dataset_of);
        let csrf = parsed
            .select(&CSRF_SEL)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(str::to_string);

        let mut seeded = Vec::new();
        let mut seeded_ids = HashSet::new();
        for el in parsed.select(&ANY_ID_SEL) {
            let Some(id) = el.value().id() else { continue };
            seeded.push(SeededNode {
                id: id.to_string(),
                story_card_parent: parent_is_story_card(el),
            });
            seeded_ids.insert(id.to_string());
        }

        let loading_present = parsed.select(&LOADING_SEL).next().is_some();

        Self {
            location_path: path,
            location_query: query,
            container,
            csrf,
            seeded,
            seeded_ids,
            seeded_story_cards: parsed.select(&STORY_SEL).count(),
            seeded_single_articles: parsed.select(&SINGLE_ARTICLE_SEL).count(),
            query_wrapper: parsed.select(&QUERY_WRAPPER_SEL).next().is_some(),
            loading_present,
            loading_visible: loading_present,
            retry_visible: false,
            batches: Vec::new(),
            replace_counts: HashMap::new(),
            scroll_y: 0.0,
            region_heights: HashMap::new(),
            auto_scroll: false,
        }
    }

    /// Keep the simulated viewport pinned to the bottom of every region.
    pub fn set_auto_scroll(&mut self, on: bool) {
        self.auto_scroll = on;
    }

    pub fn set_scroll(&mut self, offset: f64) {
        self.scroll_y = offset;
    }

    pub fn set_region_height(&mut self, region: ScrollRegion, height: f64) {
        self.region_heights.insert(region, height);
    }

    pub fn loading_visible(&self) -> bool {
        self.loading_visible
    }

    pub fn retry_notice_visible(&self) -> bool {
        self.retry_visible
    }

    /// Number of nodes carrying `id`, seeded and inserted. Never exceeds 1
    /// when the dedup invariant holds.
    pub fn count_nodes(&self, id: &str) -> usize {
        let seeded = self.seeded.iter().filter(|node| node.id == id).count();
        let inserted = self
            .batches
            .iter()
            .flat_map(|batch| batch.nodes.iter())
            .filter(|node| node.id.as_deref() == Some(id))
            .count();
        seeded + inserted
    }

    /// How many times the card owning `id` was replaced in place.
    pub fn replace_count(&self, id: &str) -> usize {
        self.replace_counts.get(id).copied().unwrap_or(0)
    }

    /// Simulate a click on an inserted node: resolves the navigable path
    /// through the batch wrapper's delegated handler, if one was attached.
    pub fn resolve_click(&self, id: &str) -> Option<String> {
        for batch in &self.batches {
            for node in &batch.nodes {
                if node.id.as_deref() == Some(id) {
                    return if batch.delegated { node.path.clone() } else { None };
                }
            }
        }
        None
    }

    /// Concatenated markup of everything the engine appended, in insertion
    /// order. Story batches keep their wrapper block.
    pub fn appended_html(&self) -> String {
        let mut out = String::new();
        for batch in &self.batches {
            let inner: String = batch.nodes.iter().map(|n| n.markup.as_str()).collect();
            match batch.position {
                InsertPosition::AfterLastCard => {
                    out.push_str("<div class=\"paged-stories\">");
                    out.push_str(&inner);
                    out.push_str("</div>");
                }
                InsertPosition::VideoList | InsertPosition::FollowList => out.push_str(&inner),
            }
        }
        out
    }

    fn inserted_node(&self, id: &str) -> Option<&RenderedNode> {
        self.batches
            .iter()
            .flat_map(|batch| batch.nodes.iter())
            .find(|node| node.id.as_deref() == Some(id))
    }
}

impl Document for MemoryDocument {
    fn container(&self) -> Option<HashMap<String, String>> {
        self.container.clone()
    }

    fn csrf_token(&self) -> Option<String> {
        self.csrf.clone()
    }

    fn location_path(&self) -> &str {
        &self.location_path
    }

    fn search_view_active(&self) -> bool {
        self.query_wrapper || has_search_marker(&self.location_query)
    }

    fn content_card_count(&self) -> usize {
        let inserted = self
            .batches
            .iter()
            .flat_map(|batch| batch.nodes.iter())
            .filter(|node| node.card)
            .count();
        self.seeded_story_cards + self.seeded_single_articles + inserted
    }

    fn known_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.seeded.iter().map(|node| node.id.clone()).collect();
        ids.extend(
            self.batches
                .iter()
                .flat_map(|batch| batch.nodes.iter())
                .filter_map(|node| node.id.clone()),
        );
        ids
    }

    fn has_element(&self, id: &str) -> bool {
        self.seeded_ids.contains(id) || self.inserted_node(id).is_some()
    }

    fn replaceable_story_card(&self, dom_id: &str, article_id: u64) -> bool {
        if self.has_element(&format!("video-player-{article_id}")) {
            return false;
        }
        if let Some(node) = self.seeded.iter().find(|node| node.id == dom_id) {
            return node.story_card_parent;
        }
        self.inserted_node(dom_id).is_some_and(|node| node.story_card)
    }

    fn replace_story_card(&mut self, dom_id: &str, node: RenderedNode) -> bool {
        let mut hit = false;
        for batch in &mut self.batches {
            if let Some(existing) = batch
                .nodes
                .iter_mut()
                .find(|existing| existing.id.as_deref() == Some(dom_id))
            {
                *existing = node.clone();
                hit = true;
                break;
            }
        }
        if !hit && !self.seeded.iter().any(|seeded| seeded.id == dom_id) {
            return false;
        }
        *self.replace_counts.entry(dom_id.to_string()).or_insert(0) += 1;
        true
    }

    fn insert_batch(
        &mut self,
        position: InsertPosition,
        nodes: Vec<RenderedNode>,
        delegate_clicks: bool,
    ) {
        self.batches.push(Batch {
            position,
            delegated: delegate_clicks,
            nodes,
        });
    }

    fn set_loading_visible(&mut self, visible: bool) {
        if self.loading_present {
            self.loading_visible = visible;
        }
    }

    fn set_retry_notice(&mut self, visible: bool) {
        self.retry_visible = visible;
    }

    fn scroll_offset(&self) -> f64 {
        if self.auto_scroll {
            self.region_heights
                .values()
                .copied()
                .fold(DEFAULT_REGION_HEIGHT, f64::max)
        } else {
            self.scroll_y
        }
    }

    fn scroll_height(&self, region: ScrollRegion) -> f64 {
        self.region_heights
            .get(&region)
            .copied()
            .unwrap_or(DEFAULT_REGION_HEIGHT)
    }
}

fn parent_is_story_card(el: ElementRef<'_>) -> bool {
    el.parent()
        .and_then(ElementRef::wrap)
        .map(|parent| parent.value().classes().any(|class| class == "crayons-story"))
        .unwrap_or(false)
}

/// data-* attributes of an element, with the DOM's kebab-to-camelCase
/// dataset key conversion applied (`data-requires-approval` ->
/// `requiresApproval`).
fn dataset_of(el: ElementRef<'_>) -> HashMap<String, String> {
    el.value()
        .attrs()
        .filter_map(|(name, value)| {
            name.strip_prefix("data-")
                .map(|key| (kebab_to_camel(key), value.to_string()))
        })
        .collect()
}

fn kebab_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
