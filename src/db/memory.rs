use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PostQuery, Storage};
use crate::models::{
    ActivismRecord, ActivismStats, BlobId, Media, MediaFile, NewBlob, NewPost, Post, TelegramPostId,
};

#[derive(Default)]
struct Inner {
    posts: Vec<Post>,
    media_files: Vec<MediaFile>,
    blobs: Vec<(BlobId, NewBlob)>,
    activism: Vec<ActivismRecord>,
    fail_activism: bool,
}

/// Storage kept in process memory, used by the tests.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.inner.lock().unwrap().posts.clone()
    }

    pub fn blobs(&self) -> Vec<NewBlob> {
        self.inner
            .lock()
            .unwrap()
            .blobs
            .iter()
            .map(|(_, b)| b.clone())
            .collect()
    }

    pub fn media_files(&self) -> Vec<MediaFile> {
        self.inner.lock().unwrap().media_files.clone()
    }

    pub fn push_post(&self, post: Post) {
        self.inner.lock().unwrap().posts.push(post);
    }

    pub fn push_activism(&self, record: ActivismRecord) {
        self.inner.lock().unwrap().activism.push(record);
    }

    pub fn fail_activism(&self) {
        self.inner.lock().unwrap().fail_activism = true;
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn post_exists(&self, message_id: TelegramPostId) -> anyhow::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.posts.iter().any(|p| p.message_id == message_id))
    }

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.posts.iter().any(|p| p.slug == slug))
    }

    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .posts
            .iter()
            .any(|p| p.message_id == post.message_id || p.slug == post.slug)
        {
            anyhow::bail!("duplicate post {}", post.message_id);
        }
        let post = Post::from(post);
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self, query: &PostQuery) -> anyhow::Result<(Vec<Post>, i64)> {
        let inner = self.inner.lock().unwrap();
        let mut matching: Vec<Post> = inner
            .posts
            .iter()
            .filter(|p| match &query.tag {
                Some(tag) => p.tags.contains(tag),
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn view_post(&self, slug: &str) -> anyhow::Result<Option<Post>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.posts.iter_mut().find(|p| p.slug == slug).map(|p| {
            p.views += 1;
            p.clone()
        }))
    }

    async fn all_tags(&self) -> anyhow::Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        let tags: BTreeSet<String> = inner
            .posts
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn find_post_media(&self, file_id: &str) -> anyhow::Result<Option<Media>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .posts
            .iter()
            .flat_map(|p| p.media.iter())
            .find(|m| m.file_id == file_id)
            .cloned())
    }

    async fn media_file(&self, file_id: &str) -> anyhow::Result<Option<MediaFile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .media_files
            .iter()
            .find(|f| f.file_id == file_id)
            .cloned())
    }

    async fn insert_media_file(&self, file: MediaFile) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.media_files.iter().any(|f| f.file_id == file.file_id) {
            inner.media_files.push(file);
        }
        Ok(())
    }

    async fn find_blob_by_name(&self, file_name: &str) -> anyhow::Result<Option<BlobId>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .blobs
            .iter()
            .find(|(_, b)| b.file_name == file_name)
            .map(|(id, _)| *id))
    }

    async fn put_blob(&self, blob: NewBlob) -> anyhow::Result<BlobId> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.blobs.len() as BlobId + 1;
        inner.blobs.push((id, blob));
        Ok(id)
    }

    async fn blob_data(&self, id: BlobId) -> anyhow::Result<Option<Vec<u8>>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .blobs
            .iter()
            .find(|(blob_id, _)| *blob_id == id)
            .map(|(_, b)| b.data.clone()))
    }

    async fn activism_records(&self, limit: i64) -> anyhow::Result<Vec<ActivismRecord>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_activism {
            anyhow::bail!("activism table unavailable");
        }
        Ok(inner
            .activism
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn activism_stats(&self) -> anyhow::Result<ActivismStats> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_activism {
            anyhow::bail!("activism table unavailable");
        }
        let mut categories: BTreeMap<String, i64> = BTreeMap::new();
        for category in inner.activism.iter().flat_map(|r| r.activism_categories.iter()) {
            *categories.entry(category.clone()).or_default() += 1;
        }
        Ok(ActivismStats {
            total: inner.activism.len() as i64,
            with_images: inner.activism.iter().filter(|r| !r.images.is_empty()).count() as i64,
            with_videos: inner.activism.iter().filter(|r| !r.videos.is_empty()).count() as i64,
            categories: categories.into_iter().collect(),
        })
    }
}
