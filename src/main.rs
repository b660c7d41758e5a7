mod activism;
mod api;
mod app;
mod db;
mod feed;
mod links;
mod mail;
pub mod models;
mod settings;
mod slug;
mod sync;
mod telegram;

use std::sync::Arc;

use anyhow::Context;

use crate::app::App;
use db::DbService;
use mail::ResendMailer;
use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let settings = Settings::new().context("can't get config")?;

    log::info!("initializing database");
    let db = DbService::new(
        &settings.db.url,
        settings.db.name.as_deref(),
        settings.db.max_connections,
    )
    .await
    .context("can't connect to db")?;

    let telegram = telegram::channel_source(&settings.telegram);
    let mailer = ResendMailer::new(&settings.mail);
    let app = App::new(settings, Arc::new(db), telegram, Arc::new(mailer));

    if app.settings().sync.enabled {
        log::info!(
            "scheduling channel sync every {}s",
            app.settings().sync.interval_secs
        );
        tokio::spawn(sync::run_scheduled(app.clone()));
    }

    api::serve(app).await?;
    log::info!("finished");
    Ok(())
}
