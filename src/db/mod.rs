use async_trait::async_trait;

use crate::models::{
    ActivismRecord, ActivismStats, BlobId, Media, MediaFile, NewBlob, NewPost, Post, TelegramPostId,
};

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::DbService;

/// Filter and window for a posts listing.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub tag: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

/// Everything the handlers and the sync job need from persistence.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn post_exists(&self, message_id: TelegramPostId) -> anyhow::Result<bool>;
    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool>;
    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post>;
    /// Page of posts, newest first, plus the total count for the same filter.
    async fn list_posts(&self, query: &PostQuery) -> anyhow::Result<(Vec<Post>, i64)>;
    /// Bumps the view counter and returns the updated post.
    async fn view_post(&self, slug: &str) -> anyhow::Result<Option<Post>>;
    async fn all_tags(&self) -> anyhow::Result<Vec<String>>;
    /// Media entry with `file_id` embedded in any post.
    async fn find_post_media(&self, file_id: &str) -> anyhow::Result<Option<Media>>;

    async fn media_file(&self, file_id: &str) -> anyhow::Result<Option<MediaFile>>;
    async fn insert_media_file(&self, file: MediaFile) -> anyhow::Result<()>;

    async fn find_blob_by_name(&self, file_name: &str) -> anyhow::Result<Option<BlobId>>;
    async fn put_blob(&self, blob: NewBlob) -> anyhow::Result<BlobId>;
    async fn blob_data(&self, id: BlobId) -> anyhow::Result<Option<Vec<u8>>>;

    async fn activism_records(&self, limit: i64) -> anyhow::Result<Vec<ActivismRecord>>;
    async fn activism_stats(&self) -> anyhow::Result<ActivismStats>;
}
