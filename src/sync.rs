//! Channel to blog synchronization.
//!
//! A run connects to the channel, fetches the latest messages under a single
//! timeout and turns every unseen message into a [`Post`](crate::models::Post).
//! Messages are handled one at a time; a failing message is logged and skipped.
//! The source is always disconnected at the end of a run.
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::bail;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::app::App;
use crate::db::Storage;
use crate::links::extract_video_links;
use crate::models::{Media, MediaFile, MediaKind, NewBlob, NewPost};
use crate::slug::{hashtags, slugify, unique_slug};
use crate::telegram::{Attachment, AttachmentKind, ChannelMessage, ChannelSource};

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "webm"];
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("TIMEOUT: fetching messages took longer than {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub processed: usize,
    pub added: usize,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Channel handle without `@`, used for post links.
    pub channel: String,
    pub fetch_timeout: Duration,
}

pub async fn sync_channel(
    source: &dyn ChannelSource,
    storage: &dyn Storage,
    options: &SyncOptions,
    limit: i32,
) -> Result<SyncReport, SyncError> {
    let result = fetch_and_store(source, storage, options, limit).await;
    if let Err(err) = source.disconnect().await {
        log::error!("cannot disconnect from channel: {err:?}");
    }
    result
}

async fn fetch_and_store(
    source: &dyn ChannelSource,
    storage: &dyn Storage,
    options: &SyncOptions,
    limit: i32,
) -> Result<SyncReport, SyncError> {
    source.connect().await?;
    log::info!("fetching up to {limit} messages from {}", options.channel);

    let messages = tokio::time::timeout(options.fetch_timeout, source.latest_messages(limit))
        .await
        .map_err(|_| SyncError::Timeout(options.fetch_timeout))??;

    let mut report = SyncReport {
        processed: messages.len(),
        added: 0,
    };
    for message in messages.iter() {
        match process_message(source, storage, options, message).await {
            Ok(true) => {
                report.added += 1;
                log::info!("saved message {}", message.id);
            }
            Ok(false) => {}
            Err(err) => log::error!("cannot process message {}: {err:?}", message.id),
        }
    }

    log::info!(
        "sync finished: {} processed, {} added",
        report.processed,
        report.added
    );
    Ok(report)
}

async fn process_message(
    source: &dyn ChannelSource,
    storage: &dyn Storage,
    options: &SyncOptions,
    message: &ChannelMessage,
) -> anyhow::Result<bool> {
    if message.text.is_none() && message.attachment.is_none() {
        log::debug!("skipping message {}: no text or media", message.id);
        return Ok(false);
    }
    if storage.post_exists(message.id).await? {
        log::debug!("message {} is already stored", message.id);
        return Ok(false);
    }

    let mut media = Vec::new();
    if let Some(attachment) = &message.attachment {
        let item = attachment_media(message, attachment);
        if let Err(err) = store_attachment(source, storage, message, &item).await {
            log::error!("cannot store media {}: {err:?}", item.file_id);
        }
        media.push(item);
    }

    let text = message
        .text
        .clone()
        .unwrap_or_else(|| format!("Message {}", message.id));
    let links = extract_video_links(&text);
    media.extend(links.media);

    let mut base = slugify(&links.text);
    if base.is_empty() {
        base = format!("post-{}", message.id);
    }
    let slug = unique_slug(&base, |candidate| async move {
        storage.slug_exists(&candidate).await
    })
    .await?;

    let post = NewPost {
        message_id: message.id,
        tags: hashtags(&links.text),
        text: links.text,
        slug,
        date: OffsetDateTime::from_unix_timestamp(message.date)?,
        media,
        url: format!("https://t.me/{}/{}", options.channel, message.id),
    };
    storage.insert_post(post).await?;
    Ok(true)
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Media entry for a telegram attachment. Generic documents are reclassified
/// as photo or video by their file extension.
fn attachment_media(message: &ChannelMessage, attachment: &Attachment) -> Media {
    let (kind, file_id, mime_type, file_name) = match attachment.kind {
        AttachmentKind::Photo => (
            MediaKind::Photo,
            format!("tg_photo_{}", message.id),
            "image/jpeg".to_string(),
            None,
        ),
        AttachmentKind::Video => (
            MediaKind::Video,
            format!("tg_video_{}", message.id),
            attachment
                .mime_type
                .clone()
                .unwrap_or_else(|| "video/mp4".to_string()),
            None,
        ),
        AttachmentKind::Document => {
            let file_name = attachment
                .file_name
                .clone()
                .unwrap_or_else(|| format!("doc_{}", message.id));
            let ext = extension(&file_name);
            let is_video = ext.as_deref().map_or(false, |e| VIDEO_EXTENSIONS.contains(&e));
            let is_image = ext.as_deref().map_or(false, |e| IMAGE_EXTENSIONS.contains(&e));

            let mut mime_type = attachment
                .mime_type
                .clone()
                .unwrap_or_else(|| OCTET_STREAM.to_string());
            let kind = if is_video {
                if !mime_type.starts_with("video/") {
                    mime_type = "video/mp4".to_string();
                }
                MediaKind::Video
            } else if is_image {
                if !mime_type.starts_with("image/") {
                    mime_type = "image/jpeg".to_string();
                }
                MediaKind::Photo
            } else {
                MediaKind::Document
            };
            (
                kind,
                format!("tg_doc_{}", message.id),
                mime_type,
                Some(file_name),
            )
        }
    };

    let url = Media::local_url(&file_id);
    Media {
        kind,
        thumbnail_url: attachment
            .thumbnail
            .as_ref()
            .map(|_| format!("{url}?thumbnail=true")),
        file_id,
        url,
        mime_type: Some(mime_type),
        file_name,
        caption: message.text.clone(),
        is_external: false,
        telegram_file_id: Some(attachment.file.remote_id.clone()),
        telegram_access_hash: attachment.file.access_hash.clone(),
        telegram_file_reference: attachment.file.file_reference.clone(),
        telegram_dc_id: attachment.file.dc_id,
    }
}

/// Name and content type the attachment bytes are stored under.
fn blob_name(message_id: i64, media: &Media) -> (String, String) {
    match media.kind {
        MediaKind::Photo => (format!("photo_{message_id}.jpg"), "image/jpeg".to_string()),
        MediaKind::Video => (
            format!("video_{message_id}.mp4"),
            media
                .mime_type
                .clone()
                .unwrap_or_else(|| "video/mp4".to_string()),
        ),
        MediaKind::Document => (
            media
                .file_name
                .clone()
                .unwrap_or_else(|| format!("file_{message_id}.bin")),
            media
                .mime_type
                .clone()
                .unwrap_or_else(|| OCTET_STREAM.to_string()),
        ),
    }
}

async fn store_attachment(
    source: &dyn ChannelSource,
    storage: &dyn Storage,
    message: &ChannelMessage,
    media: &Media,
) -> anyhow::Result<()> {
    if storage.media_file(&media.file_id).await?.is_some() {
        log::debug!("media file {} already exists", media.file_id);
        return Ok(());
    }

    let download = match source.download(message).await? {
        None => bail!("message {} has nothing to download", message.id),
        Some(download) => download,
    };

    let (file_name, mime_type) = blob_name(message.id, media);
    let blob_id = match storage.find_blob_by_name(&file_name).await? {
        Some(id) => {
            log::info!("reusing stored blob {id} for {file_name}");
            id
        }
        None => {
            storage
                .put_blob(NewBlob {
                    file_name: file_name.clone(),
                    content_type: mime_type.clone(),
                    data: download.data,
                    message_id: message.id,
                    file_id: media.file_id.clone(),
                })
                .await?
        }
    };

    // a crash between the blob upload and this insert leaves an orphaned blob
    storage
        .insert_media_file(MediaFile {
            file_id: media.file_id.clone(),
            media_type: media.kind.to_string(),
            mime_type,
            file_name,
            blob_id,
            thumbnail: download.thumbnail,
            message_id: message.id,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;
    log::info!("stored media file {} as blob {blob_id}", media.file_id);
    Ok(())
}

/// Runs `run` and, when it times out, runs it once more after `retry_delay`.
pub async fn retry_on_timeout<F, Fut>(
    retry_delay: Duration,
    mut run: F,
) -> Result<SyncReport, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SyncReport, SyncError>>,
{
    match run().await {
        Err(SyncError::Timeout(after)) => {
            log::warn!("sync timed out after {after:?}, retrying in {retry_delay:?}");
            tokio::time::sleep(retry_delay).await;
            run().await
        }
        result => result,
    }
}

/// Periodic sync: one run right away, then one per configured interval.
pub async fn run_scheduled(app: App) {
    let settings = app.settings().sync.clone();
    let mut interval = tokio::time::interval(Duration::from_secs(settings.interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        log::info!("starting scheduled sync");
        let result = retry_on_timeout(Duration::from_secs(settings.retry_delay_secs), || {
            app.sync(settings.batch_limit)
        })
        .await;
        if let Err(err) = result {
            log::error!("scheduled sync failed: {err:?}");
        }
    }
}
