use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use time::OffsetDateTime;

pub type TelegramPostId = i64;
pub type BlobId = i64;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

/// Attachment embedded in a post. Either served by `/api/media/{file_id}` from
/// blob storage, or pointing at an external player when `is_external` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub file_id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_external: bool,

    // needed to fetch the original file again from telegram
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_access_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_file_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_dc_id: Option<i32>,
}

impl Media {
    pub fn external(kind: MediaKind, file_id: String, url: String, mime_type: &str) -> Self {
        Self {
            kind,
            file_id,
            url,
            mime_type: Some(mime_type.to_string()),
            file_name: None,
            caption: None,
            thumbnail_url: None,
            is_external: true,
            telegram_file_id: None,
            telegram_access_hash: None,
            telegram_file_reference: None,
            telegram_dc_id: None,
        }
    }

    /// Path of the local media endpoint serving this entry.
    pub fn local_url(file_id: &str) -> String {
        format!("/api/media/{file_id}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub message_id: TelegramPostId,
    pub text: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub views: i64,
    pub media: Vec<Media>,
    pub tags: Vec<String>,
    pub url: Option<String>,
}

impl Post {
    /// Points every stored attachment at the local media endpoint.
    pub fn with_local_media_urls(mut self) -> Self {
        for media in self.media.iter_mut().filter(|m| !m.is_external) {
            media.url = Media::local_url(&media.file_id);
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub message_id: TelegramPostId,
    pub text: String,
    pub slug: String,
    pub date: OffsetDateTime,
    pub media: Vec<Media>,
    pub tags: Vec<String>,
    pub url: String,
}

impl From<NewPost> for Post {
    fn from(p: NewPost) -> Self {
        Self {
            message_id: p.message_id,
            text: p.text,
            slug: p.slug,
            date: p.date,
            views: 0,
            media: p.media,
            tags: p.tags,
            url: Some(p.url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MediaFile {
    pub file_id: String,
    pub media_type: String,
    pub mime_type: String,
    pub file_name: String,
    pub blob_id: BlobId,
    pub thumbnail: Option<Vec<u8>>,
    pub message_id: TelegramPostId,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBlob {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub message_id: TelegramPostId,
    pub file_id: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivismRecord {
    pub url: String,
    pub author: Option<String>,
    pub text: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub activism_categories: Vec<String>,
    pub timestamp: Option<OffsetDateTime>,
    pub processed_at: OffsetDateTime,
}

/// Counts over the whole activism table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivismStats {
    pub total: i64,
    pub with_images: i64,
    pub with_videos: i64,
    /// Category and number of records tagged with it, ordered by category.
    pub categories: Vec<(String, i64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageMetadata {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub metadata: PageMetadata,
}
