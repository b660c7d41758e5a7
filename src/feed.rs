use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use time::format_description::well_known::Rfc2822;

use crate::models::Post;

pub const FEED_SIZE: i64 = 20;
const TITLE_CHARS: usize = 80;

fn rss_err<E: std::fmt::Debug>(err: E) -> anyhow::Error {
    anyhow::anyhow!("error building rss feed: {:?}", err)
}

fn item(base_url: &str, post: &Post) -> anyhow::Result<Item> {
    let link = format!("{base_url}/blog/{}", post.slug);
    let title = post
        .text
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(TITLE_CHARS)
        .collect::<String>();

    Ok(ItemBuilder::default()
        .title(Some(title))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().value(link).permalink(true).build()))
        .pub_date(Some(post.date.format(&Rfc2822).map_err(rss_err)?))
        .description(Some(post.text.clone()))
        .categories(
            post.tags
                .iter()
                .map(|tag| rss::CategoryBuilder::default().name(tag.clone()).build())
                .collect::<Vec<_>>(),
        )
        .build())
}

/// RSS channel with the given posts, newest first.
pub fn build_feed(base_url: &str, channel: &str, posts: &[Post]) -> anyhow::Result<Channel> {
    let base_url = base_url.trim_end_matches('/');
    let items = posts
        .iter()
        .map(|p| item(base_url, p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ChannelBuilder::default()
        .title(format!("{channel} blog"))
        .link(format!("{base_url}/blog"))
        .description(format!("Posts mirrored from the @{channel} telegram channel"))
        .items(items)
        .build())
}
