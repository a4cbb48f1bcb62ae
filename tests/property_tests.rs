use proptest::prelude::*;

use feedscroll::api::query::listing_query;
use feedscroll::config::AppConfig;
use feedscroll::internal::builders::{build_article, build_follow};
use feedscroll::internal::models::{ArticleRecord, FollowRecord};
use feedscroll::internal::state::PageState;
use feedscroll::utils::html::escape_html;

proptest! {
    #[test]
    fn escape_html_never_leaves_markup_metacharacters(s in "\\PC*") {
        let out = escape_html(&s);
        prop_assert!(!out.contains('<'));
        prop_assert!(!out.contains('>'));
        prop_assert!(!out.contains('"'));
    }

    #[test]
    fn builders_never_panic_on_arbitrary_text(title in "\\PC*", path in "\\PC*") {
        let article = ArticleRecord {
            id: 1,
            title: Some(title.clone()),
            path: Some(path.clone()),
            ..Default::default()
        };
        let _ = build_article(&article);

        let follow = FollowRecord {
            id: 2,
            name: Some(title),
            path: Some(path),
            ..Default::default()
        };
        let _ = build_follow(&follow);
    }

    #[test]
    fn article_markup_always_carries_its_derived_id(title in "\\PC*", id in 0u64..u64::MAX) {
        let article = ArticleRecord {
            id,
            title: Some(title),
            ..Default::default()
        };
        let html = build_article(&article);
        let needle = format!("id=\"article-link-{}\"", id);
        prop_assert!(html.contains(&needle));
    }

    #[test]
    fn listing_query_frames_params_with_cursor_and_signature(
        key in "[a-z][a-z_]{0,7}",
        value in "[a-zA-Z0-9 ]{0,12}",
        page in 0u32..1000,
    ) {
        let mut params = serde_json::Map::new();
        params.insert(key.clone(), serde_json::Value::String(value));

        match listing_query(&params, page, 17) {
            None => prop_assert_eq!(key, "q".to_string()),
            Some(query) => {
                prop_assert!(key != "q");
                let prefix = format!("page={}&", page);
                prop_assert!(query.starts_with(&prefix));
                prop_assert!(query.ends_with("&signature=17"));
            }
        }
    }

    #[test]
    fn page_state_cursor_never_regresses_and_exhaustion_is_terminal(
        ops in proptest::collection::vec(0u8..4, 0..64),
    ) {
        let mut state = PageState::new();
        let mut last_cursor = 0;
        for op in ops {
            let was_exhausted = state.is_exhausted();
            match op {
                0 => {
                    let started = state.begin_fetch();
                    if was_exhausted {
                        prop_assert!(!started);
                    }
                }
                1 => state.advance_cursor(),
                2 => state.release(),
                _ => state.exhaust(),
            }
            prop_assert!(state.cursor() >= last_cursor);
            last_cursor = state.cursor();
            if was_exhausted {
                prop_assert!(state.is_exhausted());
            }
        }
    }

    #[test]
    fn config_parsing_never_panics_on_garbage(s in "\\PC*") {
        let _ = ron::from_str::<AppConfig>(&s);
    }
}
