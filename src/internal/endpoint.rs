use strum_macros::Display;

use super::context::{FeedSource, RequestContext};
use super::document::ScrollRegion;

/// Which builder family renders a route's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BuilderKind {
    Article,
    Video,
    Follow,
    Tag,
}

/// A resolved pagination route: endpoint path, builder family, and the
/// scrollable region the sentinel watches for this page kind.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: &'static str,
    pub builder: BuilderKind,
    pub region: ScrollRegion,
}

/// Map the container context to its route. Pure and total: every context
/// resolves to exactly one route.
pub fn select(ctx: &RequestContext) -> Route {
    match ctx.source {
        FeedSource::Videos => Route {
            path: "/api/videos",
            builder: BuilderKind::Video,
            region: ScrollRegion::Document,
        },
        FeedSource::Followers => Route {
            path: "/api/followers/users",
            builder: BuilderKind::Follow,
            region: ScrollRegion::Dashboard,
        },
        FeedSource::Following => following_route(ctx.action()),
        FeedSource::Feed => Route {
            path: "/search/feed_content",
            builder: BuilderKind::Article,
            region: ScrollRegion::MainContent,
        },
    }
}

fn following_route(action: Option<&str>) -> Route {
    let action = action.unwrap_or_default();
    let (path, builder) = if action.contains("users") {
        ("/followings/users", BuilderKind::Follow)
    } else if action.contains("podcasts") {
        ("/followings/podcasts", BuilderKind::Follow)
    } else if action.contains("organizations") {
        ("/followings/organizations", BuilderKind::Follow)
    } else if action.contains("hidden_tags") || action.contains("tags") {
        ("/followings/tags", BuilderKind::Tag)
    } else {
        // Unrecognized sub-actions still land on the tags listing, but
        // loudly: an unmatched action here is a routing gap upstream.
        tracing::warn!(action, "unmatched following action, defaulting to tags");
        ("/followings/tags", BuilderKind::Tag)
    };

    Route {
        path,
        builder,
        region: ScrollRegion::Dashboard,
    }
}
