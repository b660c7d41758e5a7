use once_cell::sync::Lazy;
use regex::Regex;

const SLUG_SOURCE_CHARS: usize = 60;

static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)#[a-z0-9а-яґєіїё_]+").expect("valid hashtag regex"));

fn is_slug_char(ch: char) -> bool {
    matches!(ch, 'a'..='z' | '0'..='9' | 'а'..='я' | 'ґ' | 'є' | 'і' | 'ї' | 'ё')
}

/// Builds a url slug out of the first 60 characters of `text`.
///
/// Returns an empty string when nothing usable is left.
pub fn slugify(text: &str) -> String {
    let head: String = text.chars().take(SLUG_SOURCE_CHARS).collect();
    let cleaned: String = head
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| is_slug_char(*ch) || ch.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Appends `-1`, `-2`, ... to `base` until `taken` reports the candidate as free.
pub async fn unique_slug<F, Fut>(base: &str, mut taken: F) -> anyhow::Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<bool>>,
{
    let mut candidate = base.to_string();
    let mut suffix = 1;
    while taken(candidate.clone()).await? {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    Ok(candidate)
}

/// Hashtags of `text` without the leading `#`, first occurrence wins.
pub fn hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for m in HASHTAG.find_iter(text) {
        let tag = &m.as_str()[1..];
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
