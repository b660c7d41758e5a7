use std::sync::Arc;

use async_trait::async_trait;

use crate::models::TelegramPostId;
use crate::settings::TelegramSettings;

#[cfg(feature = "tdlib")]
mod parsers;
#[cfg(feature = "tdlib")]
mod service;

#[cfg(feature = "tdlib")]
pub use service::TelegramService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Video,
    Document,
}

/// Where a file lives on telegram's side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteFile {
    pub local_id: i32,
    pub remote_id: String,
    pub access_hash: Option<String>,
    pub file_reference: Option<String>,
    pub dc_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file: RemoteFile,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub thumbnail: Option<RemoteFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub id: TelegramPostId,
    /// Unix timestamp, seconds.
    pub date: i64,
    pub text: Option<String>,
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, Default)]
pub struct Download {
    pub data: Vec<u8>,
    pub thumbnail: Option<Vec<u8>>,
}

/// A channel the sync job can read posts from.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn connect(&self) -> anyhow::Result<()>;
    /// Most recent messages first.
    async fn latest_messages(&self, limit: i32) -> anyhow::Result<Vec<ChannelMessage>>;
    /// Attachment bytes of `message`, `None` when it has nothing to fetch.
    async fn download(&self, message: &ChannelMessage) -> anyhow::Result<Option<Download>>;
    async fn disconnect(&self) -> anyhow::Result<()>;
}

/// Stand-in used when the binary is built without tdlib.
pub struct UnavailableSource;

#[async_trait]
impl ChannelSource for UnavailableSource {
    async fn connect(&self) -> anyhow::Result<()> {
        anyhow::bail!("telegram support is disabled, rebuild with the `tdlib` feature")
    }

    async fn latest_messages(&self, _limit: i32) -> anyhow::Result<Vec<ChannelMessage>> {
        anyhow::bail!("telegram source is not connected")
    }

    async fn download(&self, _message: &ChannelMessage) -> anyhow::Result<Option<Download>> {
        Ok(None)
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(feature = "tdlib")]
pub fn channel_source(settings: &TelegramSettings) -> Arc<dyn ChannelSource> {
    Arc::new(TelegramService::new(settings.clone()))
}

#[cfg(not(feature = "tdlib"))]
pub fn channel_source(settings: &TelegramSettings) -> Arc<dyn ChannelSource> {
    log::warn!(
        "built without tdlib, channel {} will not be synchronized",
        settings.channel
    );
    Arc::new(UnavailableSource)
}
