use crate::db::Storage;
use crate::mail::Mailer;
use crate::settings::Settings;
use crate::sync::{sync_channel, SyncError, SyncOptions, SyncReport};
use crate::telegram::ChannelSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

struct Inner {
    settings: Settings,
    db: Arc<dyn Storage>,
    tg: Arc<dyn ChannelSource>,
    mailer: Arc<dyn Mailer>,
    // one telegram session at a time
    sync_lock: Mutex<()>,
}

/// Shared state of the http handlers and the scheduled sync.
#[derive(Clone)]
pub struct App {
    inner: Arc<Inner>,
}

impl App {
    pub fn new(
        settings: Settings,
        db: Arc<dyn Storage>,
        tg: Arc<dyn ChannelSource>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                db,
                tg,
                mailer,
                sync_lock: Mutex::new(()),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn db(&self) -> &dyn Storage {
        self.inner.db.as_ref()
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    pub async fn sync(&self, limit: i32) -> Result<SyncReport, SyncError> {
        let _guard = self.inner.sync_lock.lock().await;
        let options = SyncOptions {
            channel: self.inner.settings.telegram.channel_name().to_string(),
            fetch_timeout: Duration::from_secs(self.inner.settings.sync.fetch_timeout_secs),
        };
        sync_channel(self.inner.tg.as_ref(), self.db(), &options, limit).await
    }
}
