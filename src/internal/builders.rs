//! Pure item -> markup builders. No I/O, no document access: each function
//! maps one fetched record to an HTML string, with every interpolated value
//! escaped.

use crate::utils::html::escape_html;

use super::models::{ArticleRecord, FollowRecord, TagRecord, VideoRecord};

pub fn build_article(article: &ArticleRecord) -> String {
    let path = escape_html(article.path.as_deref().unwrap_or(""));
    let title = escape_html(article.title.as_deref().unwrap_or(""));
    let author = escape_html(
        article
            .user
            .as_ref()
            .and_then(|user| user.name.as_deref())
            .unwrap_or(""),
    );
    let date = escape_html(article.readable_publish_date.as_deref().unwrap_or(""));
    let tags: String = article
        .tag_list
        .iter()
        .map(|tag| {
            let tag = escape_html(tag);
            format!(
                r##"<a class="crayons-tag" href="/t/{tag}"><span class="crayons-tag__prefix">#</span>{tag}</a>"##
            )
        })
        .collect();

    format!(
        r#"<div class="crayons-story" data-article-path="{path}">
    <a href="{path}" id="article-link-{id}" class="crayons-story__hidden-navigation-link">{title}</a>
    <div class="crayons-story__body">
      <div class="crayons-story__top">
        <div class="crayons-story__meta">{author} <span class="crayons-story__tertiary">{date}</span></div>
      </div>
      <h2 class="crayons-story__title"><a href="{path}" data-article-path="{path}">{title}</a></h2>
      <div class="crayons-story__tags">{tags}</div>
      <div class="crayons-story__bottom">
        <span class="crayons-story__reactions">{reactions} reactions</span>
        <span class="crayons-story__comments">{comments} comments</span>
      </div>
    </div>
  </div>"#,
        id = article.id,
        reactions = article.public_reactions_count,
        comments = article.comments_count,
    )
}

pub fn build_video(video: &VideoRecord) -> String {
    let path = escape_html(video.path.as_deref().unwrap_or(""));
    let title = escape_html(video.title.as_deref().unwrap_or(""));
    let thumbnail = escape_html(video.cloudinary_video_url.as_deref().unwrap_or(""));
    let duration = escape_html(video.video_duration_in_minutes.as_deref().unwrap_or(""));
    let author = escape_html(
        video
            .user
            .as_ref()
            .and_then(|user| user.name.as_deref())
            .unwrap_or(""),
    );

    format!(
        r#"<a href="{path}" id="video-article-{id}" class="crayons-card media-card">
    <div class="media-card__artwork">
      <img src="{thumbnail}" class="w-100 object-cover block aspect-16-9 h-auto" width="320" height="180" alt="{title}">
      <span class="media-card__artwork__badge">{duration}</span>
    </div>
    <div class="media-card__content">
      <h2 class="fs-base mb-2 fw-medium">{title}</h2>
      <small class="fs-s">{author}</small>
    </div>
  </a>"#,
        id = video.id,
    )
}

pub fn build_follow(follow: &FollowRecord) -> String {
    let path = escape_html(follow.path.as_deref().unwrap_or(""));
    let username = escape_html(follow.username.as_deref().unwrap_or(""));
    let name = escape_html(follow.name.as_deref().unwrap_or(""));
    let image = escape_html(follow.profile_image.as_deref().unwrap_or(""));

    format!(
        r#"<div class="crayons-card p-4 m:p-6 flex s:grid single-article" id="follows-{id}"><a href="{path}" class="crayons-avatar crayons-avatar--2xl s:mb-2 s:mx-auto"><img alt="@{username} profile image" class="crayons-avatar__image" src="{image}" /></a><div class="pl-4 s:pl-0 self-center"><h3 class="s:mb-1 p-0"><a href="{path}">{name}</a></h3><p class="s:mb-4"><a href="{path}" class="crayons-link crayons-link--secondary">@{username}</a></p></div></div>"#,
        id = follow.id,
    )
}

pub fn build_tag(tag: &TagRecord) -> String {
    let name = escape_html(tag.name.as_deref().unwrap_or(""));
    let color = escape_html(tag.color.as_deref().unwrap_or(""));
    let antifollow = if tag.points < 0.0 {
        concat!(
            r#"<span class="c-indicator c-indicator--danger" "#,
            r#"title="This tag has negative follow weight">Anti-follow</span>"#
        )
    } else {
        ""
    };

    format!(
        r##"<div class="crayons-card p-4 m:p-6 flex flex-col single-article" id="follows-{id}" style="border: 1px solid {color}; box-shadow: 3px 3px 0 {color}">
    <h3 class="s:mb-1 p-0 fw-medium">
      <a href="/t/{name}" class="crayons-tag crayons-tag--l"><span class="crayons-tag__prefix">#</span>{name}</a>
      {antifollow}
    </h3>
    <input name="follows[][id]" id="follow_id_{name}" type="hidden" form="follows_update_form" value="{id}">
    <input step="any" class="crayons-textfield flex-1 fs-s" required="required" type="number" form="follows_update_form" value="{points}" name="follows[][explicit_points]" id="follow_points_{name}" aria-label="{name} tag weight">
  </div>"##,
        id = tag.id,
        points = tag.points,
    )
}

/// Billboards arrive as ready-made HTML and pass through untouched.
pub fn build_billboard(html: &str) -> String {
    html.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::models::UserRef;

    #[test]
    fn article_markup_carries_id_path_and_escaped_title() {
        let article = ArticleRecord {
            id: 42,
            title: Some("Why <script> is evil".to_string()),
            path: Some("/alice/why-script".to_string()),
            user: Some(UserRef {
                name: Some("Alice".to_string()),
                username: Some("alice".to_string()),
            }),
            tag_list: vec!["security".to_string()],
            readable_publish_date: Some("Aug 7".to_string()),
            public_reactions_count: 12,
            comments_count: 3,
        };

        let html = build_article(&article);
        assert!(html.contains(r#"id="article-link-42""#));
        assert!(html.contains(r#"data-article-path="/alice/why-script""#));
        assert!(html.contains("Why &lt;script&gt; is evil"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r##"href="/t/security""##));
        assert!(html.contains("12 reactions"));
    }

    #[test]
    fn video_markup_carries_badge_and_author() {
        let video = VideoRecord {
            id: 8,
            path: Some("/bob/talk".to_string()),
            cloudinary_video_url: Some("https://cdn.example/thumb.jpg".to_string()),
            video_duration_in_minutes: Some("11:02".to_string()),
            title: Some("A talk".to_string()),
            user: Some(UserRef {
                name: Some("Bob".to_string()),
                username: None,
            }),
        };

        let html = build_video(&video);
        assert!(html.contains(r#"id="video-article-8""#));
        assert!(html.contains(r#"<span class="media-card__artwork__badge">11:02</span>"#));
        assert!(html.contains("<small class=\"fs-s\">Bob</small>"));
    }

    #[test]
    fn tag_markup_flags_negative_follow_weight() {
        let mut tag = TagRecord {
            id: 5,
            name: Some("webdev".to_string()),
            color: Some("#1ab".to_string()),
            points: 1.0,
        };
        let html = build_tag(&tag);
        assert!(html.contains(r#"id="follows-5""#));
        assert!(html.contains(r#"value="1""#));
        assert!(!html.contains("Anti-follow"));

        tag.points = -0.5;
        let html = build_tag(&tag);
        assert!(html.contains("Anti-follow"));
        assert!(html.contains(r#"value="-0.5""#));
    }

    #[test]
    fn billboard_passes_through_verbatim() {
        let html = "<div class='bb'><b>ad</b></div>";
        assert_eq!(build_billboard(html), html);
    }
}
