use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use strum_macros::Display;

/// Which listing the container paginates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
#[strum(serialize_all = "snake_case")]
pub enum FeedSource {
    #[default]
    Feed,
    Videos,
    Followers,
    Following,
}

impl FeedSource {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("videos") => FeedSource::Videos,
            Some("followers") => FeedSource::Followers,
            Some("following") => FeedSource::Following,
            _ => FeedSource::Feed,
        }
    }
}

/// Sorting/filter strategy of the main feed, from the container's `feed`
/// attribute. Anything other than the two named kinds gets the
/// reaction-ranked strategy with a publish-date floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
#[strum(serialize_all = "snake_case")]
pub enum FeedKind {
    BaseFeed,
    Latest,
    #[default]
    Trending,
}

impl FeedKind {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("base-feed") => FeedKind::BaseFeed,
            Some("latest") => FeedKind::Latest,
            _ => FeedKind::Trending,
        }
    }
}

/// Pagination configuration, read once from the container element's data
/// attributes when the engine attaches. Immutable for the container's
/// lifetime; a new container means a new context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source: FeedSource,
    pub params: Map<String, Value>,
    pub tag: Option<String>,
    pub requires_approval: bool,
    pub feed: FeedKind,
    pub articles_since: Option<String>,
}

impl RequestContext {
    pub fn from_dataset(dataset: &HashMap<String, String>) -> Result<Self> {
        let params = match dataset.get("params") {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Value>(raw)
                .context("container params attribute is not valid JSON")?
                .as_object()
                .cloned()
                .context("container params attribute is not a JSON object")?,
            _ => Map::new(),
        };

        Ok(Self {
            source: FeedSource::parse(dataset.get("which").map(String::as_str)),
            params,
            tag: dataset.get("tag").filter(|t| !t.is_empty()).cloned(),
            requires_approval: dataset.get("requiresApproval").map(String::as_str) == Some("true"),
            feed: FeedKind::parse(dataset.get("feed").map(String::as_str)),
            articles_since: dataset.get("articlesSince").filter(|s| !s.is_empty()).cloned(),
        })
    }

    /// The originating server-side action, used for `following` sub-routing
    /// (and renamed to `controller_action` on the wire).
    pub fn action(&self) -> Option<&str> {
        self.params.get("action").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_a_following_container() {
        let ctx = RequestContext::from_dataset(&dataset(&[
            ("which", "following"),
            ("params", r#"{"action": "following_users", "per_page": 30}"#),
        ]))
        .unwrap();

        assert_eq!(ctx.source, FeedSource::Following);
        assert_eq!(ctx.action(), Some("following_users"));
        assert!(!ctx.requires_approval);
        assert!(ctx.tag.is_none());
    }

    #[test]
    fn unknown_which_defaults_to_the_feed() {
        let ctx = RequestContext::from_dataset(&dataset(&[("which", "")])).unwrap();
        assert_eq!(ctx.source, FeedSource::Feed);
        assert_eq!(ctx.feed, FeedKind::Trending);
        assert!(ctx.params.is_empty());
    }

    #[test]
    fn feed_kind_and_flags_come_from_the_dataset() {
        let ctx = RequestContext::from_dataset(&dataset(&[
            ("feed", "latest"),
            ("tag", "rust"),
            ("requiresApproval", "true"),
            ("articlesSince", "2026-01-01"),
        ]))
        .unwrap();

        assert_eq!(ctx.feed, FeedKind::Latest);
        assert_eq!(ctx.tag.as_deref(), Some("rust"));
        assert!(ctx.requires_approval);
        assert_eq!(ctx.articles_since.as_deref(), Some("2026-01-01"));
    }

    #[test]
    fn malformed_params_json_is_an_error() {
        let err = RequestContext::from_dataset(&dataset(&[("params", "{not json")]));
        assert!(err.is_err());
    }
}
