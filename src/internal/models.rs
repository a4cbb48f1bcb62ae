use serde::Deserialize;

/// Fetch guard for a pagination container.
///
/// `Exhausted` is terminal: once the server returns an empty page (or the
/// page turns out to be a search view) no further fetch is issued for the
/// container's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    InFlight,
    Exhausted,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct UserRef {
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ArticleRecord {
    pub id: u64,
    pub title: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub tag_list: Vec<String>,
    pub readable_publish_date: Option<String>,
    #[serde(default)]
    pub public_reactions_count: u32,
    #[serde(default)]
    pub comments_count: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct VideoRecord {
    pub id: u64,
    pub path: Option<String>,
    pub cloudinary_video_url: Option<String>,
    pub video_duration_in_minutes: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct FollowRecord {
    pub id: u64,
    pub path: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct TagRecord {
    pub id: u64,
    pub name: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub points: f64,
}

/// Wire shape of a `/search/feed_content` result entry: either a raw HTML
/// billboard or an article object.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum FeedContentEntry {
    Billboard(String),
    Article(ArticleRecord),
}

/// One fetched item, decoded from the wire payload at the gateway boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Article(ArticleRecord),
    Video(VideoRecord),
    Follow(FollowRecord),
    Tag(TagRecord),
    Billboard(String),
}

impl FeedItem {
    /// The DOM element id this item renders under, used for dedup lookup.
    /// Billboards are opaque HTML with no stable identity.
    pub fn dom_id(&self) -> Option<String> {
        match self {
            FeedItem::Article(a) => Some(format!("article-link-{}", a.id)),
            FeedItem::Video(v) => Some(format!("video-article-{}", v.id)),
            FeedItem::Follow(f) => Some(format!("follows-{}", f.id)),
            FeedItem::Tag(t) => Some(format!("follows-{}", t.id)),
            FeedItem::Billboard(_) => None,
        }
    }
}

impl From<FeedContentEntry> for FeedItem {
    fn from(entry: FeedContentEntry) -> Self {
        match entry {
            FeedContentEntry::Billboard(html) => FeedItem::Billboard(html),
            FeedContentEntry::Article(record) => FeedItem::Article(record),
        }
    }
}
