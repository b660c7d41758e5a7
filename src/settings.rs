use anyhow::bail;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DbSettings {
    pub url: String,
    pub name: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    pub api_hash: String,
    pub api_id: i32,
    pub session_key: String,
    pub phone: String,
    pub channel: String,
    pub database_dir: String,
}

impl TelegramSettings {
    /// Channel handle without the leading `@`.
    pub fn channel_name(&self) -> &str {
        self.channel.trim_start_matches('@')
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub bind: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
    pub resend_api_key: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    pub api_key: String,
    pub enabled: bool,
    pub interval_secs: u64,
    pub batch_limit: i32,
    pub fetch_timeout_secs: u64,
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub telegram: TelegramSettings,
    pub db: DbSettings,
    pub http: HttpSettings,
    pub mail: MailSettings,
    pub sync: SyncSettings,
}

impl Settings {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::builder()
            .set_default("db.max_connections", 5)?
            .set_default("telegram.database_dir", "tdlib")?
            .set_default("http.bind", "0.0.0.0:3000")?
            .set_default("http.public_base_url", "http://localhost:3000")?
            .set_default("mail.from", "Contact form <contact@mediamood.today>")?
            .set_default("sync.enabled", true)?
            .set_default("sync.interval_secs", 600)?
            .set_default("sync.batch_limit", 1)?
            .set_default("sync.fetch_timeout_secs", 40)?
            .set_default("sync.retry_delay_secs", 30)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::default().separator("__"))
            .build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.sync.interval_secs == 0 {
            bail!("sync.interval_secs must be greater than zero");
        }
        if self.sync.batch_limit < 1 {
            bail!("sync.batch_limit must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings {
        telegram: TelegramSettings {
            api_hash: "hash".to_string(),
            api_id: 1,
            session_key: "session".to_string(),
            phone: "+380000000000".to_string(),
            channel: "@mediamood".to_string(),
            database_dir: "tdlib".to_string(),
        },
        db: DbSettings {
            url: "postgres://localhost/blog".to_string(),
            name: None,
            max_connections: 1,
        },
        http: HttpSettings {
            bind: "127.0.0.1:0".to_string(),
            public_base_url: "https://example.com".to_string(),
        },
        mail: MailSettings {
            resend_api_key: "re_test".to_string(),
            from: "Contact form <contact@example.com>".to_string(),
            to: "owner@example.com".to_string(),
        },
        sync: SyncSettings {
            api_key: "secret".to_string(),
            enabled: false,
            interval_secs: 600,
            batch_limit: 1,
            fetch_timeout_secs: 1,
            retry_delay_secs: 0,
        },
    }
}
