use std::collections::HashSet;

use super::builders;
use super::document::{Document, InsertPosition, RenderedNode};
use super::endpoint::BuilderKind;
use super::models::FeedItem;

/// Paths on which an already-rendered article card may be replaced in
/// place by freshly built markup (late-arriving metadata changes).
const MAIN_FEED_PATHS: [&str; 6] = [
    "/",
    "/top/week",
    "/top/month",
    "/top/year",
    "/top/infinity",
    "/latest",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
}

/// Converts fetched items to markup and attaches only new items to the
/// document. Dedup runs against an explicit set of rendered ids, seeded
/// from the document once at attach so server-rendered content is absorbed.
#[derive(Debug)]
pub struct RenderEngine {
    rendered: HashSet<String>,
}

impl RenderEngine {
    pub fn attach<D: Document>(doc: &D) -> Self {
        Self {
            rendered: doc.known_ids().into_iter().collect(),
        }
    }

    /// Insert a fetched page. New markup is built per item, batched, and
    /// handed to the document in a single insertion; duplicates are skipped
    /// or, for main-feed article cards, replaced in place.
    pub fn insert_page<D: Document>(
        &mut self,
        doc: &mut D,
        kind: BuilderKind,
        items: &[FeedItem],
    ) -> InsertOutcome {
        let mut outcome = InsertOutcome::default();
        let mut fresh: Vec<RenderedNode> = Vec::new();

        for item in items {
            let dom_id = item.dom_id();
            let duplicate = dom_id
                .as_deref()
                .is_some_and(|id| self.rendered.contains(id) || doc.has_element(id));

            if !duplicate {
                if let Some(id) = &dom_id {
                    self.rendered.insert(id.clone());
                }
                fresh.push(build_node(item));
                outcome.inserted += 1;
                continue;
            }

            let id = dom_id.as_deref().unwrap_or_default();
            if let FeedItem::Article(article) = item
                && MAIN_FEED_PATHS.contains(&doc.location_path())
                && doc.replaceable_story_card(id, article.id)
                && doc.replace_story_card(id, build_node(item))
            {
                outcome.replaced += 1;
            } else {
                outcome.skipped += 1;
            }
        }

        if !fresh.is_empty() {
            let (position, delegate_clicks) = match kind {
                BuilderKind::Article => (InsertPosition::AfterLastCard, true),
                BuilderKind::Video => (InsertPosition::VideoList, false),
                BuilderKind::Follow | BuilderKind::Tag => (InsertPosition::FollowList, false),
            };
            doc.insert_batch(position, fresh, delegate_clicks);
        }

        tracing::debug!(
            inserted = outcome.inserted,
            replaced = outcome.replaced,
            skipped = outcome.skipped,
            "page rendered"
        );
        outcome
    }
}

fn build_node(item: &FeedItem) -> RenderedNode {
    match item {
        FeedItem::Article(article) => RenderedNode {
            id: item.dom_id(),
            path: article.path.clone(),
            markup: builders::build_article(article),
            card: true,
            story_card: true,
        },
        FeedItem::Video(video) => RenderedNode {
            id: item.dom_id(),
            path: video.path.clone(),
            markup: builders::build_video(video),
            card: false,
            story_card: false,
        },
        FeedItem::Follow(follow) => RenderedNode {
            id: item.dom_id(),
            path: follow.path.clone(),
            markup: builders::build_follow(follow),
            card: true,
            story_card: false,
        },
        FeedItem::Tag(tag) => RenderedNode {
            id: item.dom_id(),
            path: tag.name.as_ref().map(|name| format!("/t/{name}")),
            markup: builders::build_tag(tag),
            card: true,
            story_card: false,
        },
        FeedItem::Billboard(html) => RenderedNode {
            id: None,
            path: None,
            markup: builders::build_billboard(html),
            card: false,
            story_card: false,
        },
    }
}
