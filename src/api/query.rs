//! Query-string assembly for the pagination endpoints.

use jiff::Timestamp;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::internal::context::{FeedKind, RequestContext};

pub const DEFAULT_PER_PAGE: u32 = 15;

/// Requests repeat within a coarse time bucket so intermediary caches can
/// coalesce them without going stale for long.
const SIGNATURE_BUCKET_MS: i64 = 400_000;

static SEARCH_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|&)q=").unwrap());

/// True when a query string carries a full-text-search parameter, which
/// puts the page outside infinite scroll's scope.
pub fn has_search_marker(query: &str) -> bool {
    SEARCH_MARKER.is_match(query)
}

pub fn cache_bust_signature() -> i64 {
    Timestamp::now().as_millisecond() / SIGNATURE_BUCKET_MS
}

/// Query for the listing endpoints (videos, followers, following):
/// `page=N&<container params>&signature=S`. Returns None when the params
/// carry a search marker; such a container is out of scope for paging.
///
/// The server router treats `action` as reserved, so it travels as
/// `controller_action`.
pub fn listing_query(params: &Map<String, Value>, page: u32, signature: i64) -> Option<String> {
    let mut pairs: Vec<(String, String)> = vec![("page".to_string(), page.to_string())];
    for (key, value) in params {
        let key = if key == "action" {
            "controller_action".to_string()
        } else {
            key.clone()
        };
        pairs.push((key, scalar_string(value)));
    }
    pairs.push(("signature".to_string(), signature.to_string()));

    let query = encode_pairs(&pairs);
    if has_search_marker(&query) {
        return None;
    }
    Some(query)
}

/// Structured search request for `/search/feed_content`: per-page default
/// and cursor, container params merged over them, optional tag filter, the
/// approval flag, and the class/sort strategy for the container's feed
/// kind. The `action` rename applies here too.
///
/// Container params may override `per_page` but never `page`: the cursor
/// must not regress.
pub fn feed_search_query(ctx: &RequestContext, page: u32) -> String {
    let mut per_page = DEFAULT_PER_PAGE.to_string();
    let mut tag_names: Vec<String> = Vec::new();
    let mut extras: Vec<(String, String)> = Vec::new();

    for (key, value) in &ctx.params {
        match key.as_str() {
            "per_page" => per_page = scalar_string(value),
            "page" => {}
            "tag_names" => match value {
                Value::Array(items) => tag_names.extend(items.iter().map(scalar_string)),
                other => tag_names.push(scalar_string(other)),
            },
            _ => {
                let key = if key == "action" {
                    "controller_action"
                } else {
                    key.as_str()
                };
                match value {
                    Value::Array(items) => {
                        extras.extend(
                            items
                                .iter()
                                .map(|item| (format!("{key}[]"), scalar_string(item))),
                        );
                    }
                    other => extras.push((key.to_string(), scalar_string(other))),
                }
            }
        }
    }

    if let Some(tag) = &ctx.tag {
        tag_names.push(tag.clone());
    }

    let mut pairs: Vec<(String, String)> = Vec::new();
    pairs.push(("per_page".to_string(), per_page));
    pairs.push(("page".to_string(), page.to_string()));
    pairs.extend(extras);
    for tag in tag_names {
        pairs.push(("tag_names[]".to_string(), tag));
    }
    pairs.push((
        "approved".to_string(),
        if ctx.requires_approval {
            "true".to_string()
        } else {
            String::new()
        },
    ));
    pairs.push(("class_name".to_string(), "Article".to_string()));
    match ctx.feed {
        FeedKind::BaseFeed => {}
        FeedKind::Latest => {
            pairs.push(("sort_by".to_string(), "published_at".to_string()));
        }
        FeedKind::Trending => {
            if let Some(since) = &ctx.articles_since {
                pairs.push(("published_at[gte]".to_string(), since.clone()));
            }
            pairs.push(("sort_by".to_string(), "public_reactions_count".to_string()));
        }
    }

    encode_pairs(&pairs)
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::context::RequestContext;
    use std::collections::HashMap;

    fn feed_ctx(pairs: &[(&str, &str)]) -> RequestContext {
        let dataset: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RequestContext::from_dataset(&dataset).unwrap()
    }

    fn params(json: &str) -> Map<String, Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn listing_query_renames_action_and_appends_cursor_and_signature() {
        let query = listing_query(&params(r#"{"action": "hidden_tags"}"#), 3, 4242).unwrap();
        assert_eq!(query, "page=3&controller_action=hidden_tags&signature=4242");
    }

    #[test]
    fn listing_query_short_circuits_on_a_search_marker() {
        assert!(listing_query(&params(r#"{"q": "rust"}"#), 0, 1).is_none());
        // a key merely ending in q is not a search
        assert!(listing_query(&params(r#"{"faq": "1"}"#), 0, 1).is_some());
    }

    #[test]
    fn listing_query_stringifies_scalars_and_arrays() {
        let query = listing_query(
            &params(r#"{"ids": [1, 2, 3], "hidden": true}"#),
            0,
            7,
        )
        .unwrap();
        assert!(query.contains("ids=1%2C2%2C3"));
        assert!(query.contains("hidden=true"));
    }

    #[test]
    fn base_feed_sends_only_the_class_filter() {
        let ctx = feed_ctx(&[("feed", "base-feed")]);
        let query = feed_search_query(&ctx, 0);
        assert!(query.contains("per_page=15"));
        assert!(query.contains("page=0"));
        assert!(query.contains("class_name=Article"));
        assert!(!query.contains("sort_by"));
        assert!(!query.contains("published_at%5Bgte%5D"));
    }

    #[test]
    fn latest_feed_sorts_by_publish_time_without_a_date_floor() {
        let ctx = feed_ctx(&[("feed", "latest"), ("articlesSince", "2026-01-01")]);
        let query = feed_search_query(&ctx, 2);
        assert!(query.contains("class_name=Article"));
        assert!(query.contains("sort_by=published_at"));
        assert!(query.contains("page=2"));
        assert!(!query.contains("published_at%5Bgte%5D"));
    }

    #[test]
    fn trending_feed_ranks_by_reactions_above_the_date_floor() {
        let ctx = feed_ctx(&[("feed", "relevant"), ("articlesSince", "2026-01-01")]);
        let query = feed_search_query(&ctx, 0);
        assert!(query.contains("published_at%5Bgte%5D=2026-01-01"));
        assert!(query.contains("sort_by=public_reactions_count"));
    }

    #[test]
    fn tag_and_approval_flags_are_carried() {
        let ctx = feed_ctx(&[
            ("feed", "base-feed"),
            ("tag", "rust"),
            ("requiresApproval", "true"),
        ]);
        let query = feed_search_query(&ctx, 0);
        assert!(query.contains("tag_names%5B%5D=rust"));
        assert!(query.contains("approved=true"));
    }

    #[test]
    fn feed_search_also_renames_the_reserved_action_key() {
        let ctx = feed_ctx(&[
            ("feed", "base-feed"),
            ("params", r#"{"action": "discover"}"#),
        ]);
        let query = feed_search_query(&ctx, 0);
        assert!(query.contains("controller_action=discover"));
        assert!(!query.contains("&action="));
    }

    #[test]
    fn params_override_per_page_but_never_the_cursor() {
        let ctx = feed_ctx(&[
            ("feed", "base-feed"),
            ("params", r#"{"per_page": 30, "page": 99}"#),
        ]);
        let query = feed_search_query(&ctx, 1);
        assert!(query.contains("per_page=30"));
        assert!(query.contains("page=1"));
        assert!(!query.contains("page=99"));
    }

    #[test]
    fn array_params_expand_to_bracketed_keys() {
        let ctx = feed_ctx(&[
            ("feed", "base-feed"),
            ("params", r#"{"tag_names": ["a", "b"], "flags": ["x"]}"#),
        ]);
        let query = feed_search_query(&ctx, 0);
        assert!(query.contains("tag_names%5B%5D=a"));
        assert!(query.contains("tag_names%5B%5D=b"));
        assert!(query.contains("flags%5B%5D=x"));
    }

    #[test]
    fn signature_buckets_are_coarse() {
        let a = cache_bust_signature();
        let b = cache_bust_signature();
        assert!(b - a <= 1);
    }
}
