use super::parsers::parse_message;
use super::{ChannelMessage, ChannelSource, Download, RemoteFile};
use crate::settings::TelegramSettings;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use rust_tdlib::client::tdlib_client::TdJson;
use rust_tdlib::client::{
    AuthStateHandlerProxy, Client, ClientIdentifier, ConsoleClientStateHandlerIdentified, Worker,
};
use rust_tdlib::tdjson::set_log_verbosity_level;
use rust_tdlib::types::{DownloadFile, GetChatHistory, SearchPublicChat, TdlibParameters};
use std::sync::Arc;
use tokio::sync::RwLock;

type TgWorker = Worker<AuthStateHandlerProxy, TdJson>;
type TgClient = Client<TdJson>;

/// tdlib session reading one public channel with a user account.
#[derive(Clone)]
pub struct TelegramService {
    settings: TelegramSettings,
    inner: Arc<RwLock<Option<Inner>>>,
}

struct Inner {
    client: TgClient,
    worker: TgWorker,
    chat_id: i64,
}

impl TelegramService {
    pub fn new(settings: TelegramSettings) -> Self {
        Self {
            settings,
            inner: Arc::new(RwLock::new(None)),
        }
    }

    async fn build_client(&self, worker: &mut TgWorker) -> Result<TgClient> {
        let client = Client::builder()
            .with_tdlib_parameters(
                TdlibParameters::builder()
                    .database_directory(self.settings.database_dir.clone())
                    .use_test_dc(false)
                    .api_id(self.settings.api_id)
                    .api_hash(self.settings.api_hash.clone())
                    .system_language_code("en")
                    .device_model("Unknown")
                    .system_version("Unknown")
                    .application_version(env!("CARGO_PKG_VERSION"))
                    .enable_storage_optimizer(true)
                    .build(),
            )
            .with_client_auth_state_handler(ConsoleClientStateHandlerIdentified::new(
                ClientIdentifier::PhoneNumber(self.settings.phone.clone()),
            ))
            .build()?;

        Ok(worker.bind_client(client).await?)
    }

    async fn download_file(client: &TgClient, file: &RemoteFile) -> Result<Vec<u8>> {
        let downloaded = client
            .download_file(
                DownloadFile::builder()
                    .file_id(file.local_id)
                    .priority(1)
                    .synchronous(true)
                    .build(),
            )
            .await?;
        let path = downloaded.local().path();
        if path.is_empty() {
            bail!("file {} was not downloaded", file.remote_id);
        }
        Ok(tokio::fs::read(path).await?)
    }
}

#[async_trait]
impl ChannelSource for TelegramService {
    async fn connect(&self) -> Result<()> {
        if self.inner.read().await.is_some() {
            return Ok(());
        }

        set_log_verbosity_level(
            std::env::var("TDLIB_LOG_VERBOSITY")
                .unwrap_or("1".to_string())
                .parse()?,
        );
        let auth_handler =
            AuthStateHandlerProxy::new_with_encryption_key(self.settings.session_key.clone());
        let mut worker = Worker::builder()
            .with_auth_state_handler(auth_handler)
            .build()?;
        worker.start();

        let client = self.build_client(&mut worker).await?;
        let chat = client
            .search_public_chat(
                SearchPublicChat::builder()
                    .username(self.settings.channel_name())
                    .build(),
            )
            .await?;
        log::info!("connected to channel {} ({})", chat.title(), chat.id());

        *self.inner.write().await = Some(Inner {
            client,
            worker,
            chat_id: chat.id(),
        });
        Ok(())
    }

    async fn latest_messages(&self, limit: i32) -> Result<Vec<ChannelMessage>> {
        let guard = self.inner.read().await;
        let inner = guard
            .as_ref()
            .ok_or_else(|| anyhow!("telegram service is not connected"))?;

        let history = inner
            .client
            .get_chat_history(
                GetChatHistory::builder()
                    .chat_id(inner.chat_id)
                    .limit(limit)
                    .offset(0)
                    .from_message_id(0)
                    .build(),
            )
            .await?;

        Ok(history
            .messages()
            .iter()
            .flatten()
            .map(parse_message)
            .collect())
    }

    async fn download(&self, message: &ChannelMessage) -> Result<Option<Download>> {
        let attachment = match &message.attachment {
            None => return Ok(None),
            Some(attachment) => attachment,
        };
        let guard = self.inner.read().await;
        let inner = guard
            .as_ref()
            .ok_or_else(|| anyhow!("telegram service is not connected"))?;

        let data = Self::download_file(&inner.client, &attachment.file).await?;
        let thumbnail = match &attachment.thumbnail {
            None => None,
            Some(thumb) => match Self::download_file(&inner.client, thumb).await {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    log::warn!("cannot download thumbnail of message {}: {err}", message.id);
                    None
                }
            },
        };
        Ok(Some(Download { data, thumbnail }))
    }

    async fn disconnect(&self) -> Result<()> {
        let mut guard = self.inner.write().await;
        if let Some(inner) = guard.take() {
            inner.worker.stop();
            log::info!("disconnected from telegram");
        }
        Ok(())
    }
}
