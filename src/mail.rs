use anyhow::bail;
use async_trait::async_trait;
use serde::Serialize;

use crate::settings::MailSettings;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends `email`, returning the provider's response body.
    async fn send(&self, email: Email) -> anyhow::Result<serde_json::Value>;
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
}

impl ResendMailer {
    pub fn new(settings: &MailSettings) -> Self {
        if settings.resend_api_key.is_empty() {
            log::error!("mail.resend_api_key is empty, contact form will fail");
        }
        Self {
            client: reqwest::Client::new(),
            api_key: settings.resend_api_key.clone(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: Email) -> anyhow::Result<serde_json::Value> {
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            bail!("resend responded with {status}: {message}");
        }
        Ok(body)
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Email sent to the site owner for a contact form submission.
pub fn contact_email(settings: &MailSettings, name: &str, email: &str, message: &str) -> Email {
    let html = format!(
        "<h2>New message from your site</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Message:</strong></p>\
         <p>{}</p>",
        escape_html(name),
        escape_html(email),
        escape_html(message).replace('\n', "<br>"),
    );
    let text = format!(
        "New message from your site\n\nName: {name}\nEmail: {email}\n\nMessage:\n{message}"
    );
    Email {
        from: settings.from.clone(),
        to: settings.to.clone(),
        subject: format!("New message from {name}"),
        html,
        text,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::test_settings;

    #[test]
    fn contact_email_escapes_and_breaks_lines() {
        let settings = test_settings().mail;
        let email = contact_email(&settings, "Ann", "ann@example.com", "hi <b>\nbye");
        assert_eq!(email.to, "owner@example.com");
        assert_eq!(email.subject, "New message from Ann");
        assert!(email.html.contains("hi &lt;b&gt;<br>bye"));
        assert!(email.text.ends_with("Message:\nhi <b>\nbye"));
    }
}
