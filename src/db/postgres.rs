use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;
use time::OffsetDateTime;

use super::{PostQuery, Storage};
use crate::models::{
    self, ActivismRecord, ActivismStats, BlobId, Media, MediaFile, NewBlob, NewPost, TelegramPostId,
};

const POST_COLUMNS: &str = "message_id, text, slug, date, views, media, tags, url";

#[derive(Clone)]
pub struct DbService {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    message_id: i64,
    text: String,
    slug: String,
    date: OffsetDateTime,
    views: i64,
    media: Json<Vec<Media>>,
    tags: Vec<String>,
    url: Option<String>,
}

impl From<PostRow> for models::Post {
    fn from(r: PostRow) -> Self {
        Self {
            message_id: r.message_id,
            text: r.text,
            slug: r.slug,
            date: r.date,
            views: r.views,
            media: r.media.0,
            tags: r.tags,
            url: r.url,
        }
    }
}

impl DbService {
    pub async fn new(
        db_url: &str,
        db_name: Option<&str>,
        max_connections: u32,
    ) -> anyhow::Result<Self> {
        let mut options = PgConnectOptions::from_str(db_url)?;
        if let Some(name) = db_name {
            options = options.database(name);
        }
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Storage for DbService {
    async fn post_exists(&self, message_id: TelegramPostId) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE message_id = $1)")
                .bind(message_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_post(&self, post: NewPost) -> anyhow::Result<models::Post> {
        let row: PostRow = sqlx::query_as(&format!(
            r#"INSERT INTO posts (message_id, text, slug, date, media, tags, url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}"#
        ))
        .bind(post.message_id)
        .bind(&post.text)
        .bind(&post.slug)
        .bind(post.date)
        .bind(Json(&post.media))
        .bind(&post.tags)
        .bind(&post.url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_posts(&self, query: &PostQuery) -> anyhow::Result<(Vec<models::Post>, i64)> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            r#"SELECT {POST_COLUMNS}
            FROM posts
            WHERE $1::text IS NULL OR $1 = ANY(tags)
            ORDER BY date DESC, id DESC
            OFFSET $2
            LIMIT $3"#
        ))
        .bind(&query.tag)
        .bind(query.offset)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE $1::text IS NULL OR $1 = ANY(tags)")
                .bind(&query.tag)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn view_post(&self, slug: &str) -> anyhow::Result<Option<models::Post>> {
        let row: Option<PostRow> = sqlx::query_as(&format!(
            r#"UPDATE posts SET views = views + 1, updated_at = now()
            WHERE slug = $1
            RETURNING {POST_COLUMNS}"#
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn all_tags(&self) -> anyhow::Result<Vec<String>> {
        let tags: Vec<String> =
            sqlx::query("SELECT DISTINCT unnest(tags) AS tag FROM posts ORDER BY tag")
                .fetch(&self.pool)
                .map_ok(|row| row.get::<String, _>("tag"))
                .try_collect()
                .await?;
        Ok(tags)
    }

    async fn find_post_media(&self, file_id: &str) -> anyhow::Result<Option<Media>> {
        let media: Option<Json<Media>> = sqlx::query_scalar(
            r#"SELECT m
            FROM posts, jsonb_array_elements(media) AS m
            WHERE media @> jsonb_build_array(jsonb_build_object('fileId', $1::text))
                AND m->>'fileId' = $1
            LIMIT 1"#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(media.map(|m| m.0))
    }

    async fn media_file(&self, file_id: &str) -> anyhow::Result<Option<MediaFile>> {
        Ok(sqlx::query_as(
            r#"SELECT file_id, media_type, mime_type, file_name, blob_id, thumbnail, message_id, created_at
            FROM media_files
            WHERE file_id = $1"#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_media_file(&self, file: MediaFile) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO media_files (file_id, media_type, mime_type, file_name, blob_id, thumbnail, message_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT(file_id) DO NOTHING"#,
        )
        .bind(&file.file_id)
        .bind(&file.media_type)
        .bind(&file.mime_type)
        .bind(&file.file_name)
        .bind(file.blob_id)
        .bind(&file.thumbnail)
        .bind(file.message_id)
        .bind(file.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_blob_by_name(&self, file_name: &str) -> anyhow::Result<Option<BlobId>> {
        Ok(
            sqlx::query_scalar("SELECT id FROM blobs WHERE file_name = $1 ORDER BY id LIMIT 1")
                .bind(file_name)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn put_blob(&self, blob: NewBlob) -> anyhow::Result<BlobId> {
        let metadata = serde_json::json!({
            "messageId": blob.message_id,
            "fileId": blob.file_id,
        });
        Ok(sqlx::query_scalar(
            r#"INSERT INTO blobs (file_name, content_type, data, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING id"#,
        )
        .bind(&blob.file_name)
        .bind(&blob.content_type)
        .bind(&blob.data)
        .bind(Json(metadata))
        .fetch_one(&self.pool)
        .await?)
    }

    async fn blob_data(&self, id: BlobId) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(sqlx::query_scalar("SELECT data FROM blobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn activism_records(&self, limit: i64) -> anyhow::Result<Vec<ActivismRecord>> {
        Ok(sqlx::query_as(
            r#"SELECT url, author, text, images, videos, activism_categories, timestamp, processed_at
            FROM activism
            ORDER BY id
            LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn activism_stats(&self) -> anyhow::Result<ActivismStats> {
        let (total, with_images, with_videos): (i64, i64, i64) = sqlx::query_as(
            r#"SELECT COUNT(*),
                COUNT(*) FILTER (WHERE cardinality(images) > 0),
                COUNT(*) FILTER (WHERE cardinality(videos) > 0)
            FROM activism"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let categories: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT category, COUNT(*)
            FROM activism, unnest(activism_categories) AS category
            GROUP BY category
            ORDER BY category"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ActivismStats {
            total,
            with_images,
            with_videos,
            categories,
        })
    }
}
