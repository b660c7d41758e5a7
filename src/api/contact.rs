use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::AppError;
use crate::app::App;
use crate::mail::contact_email;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    name: Option<String>,
    email: Option<String>,
    message: Option<String>,
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn send_contact(
    State(app): State<App>,
    Json(form): Json<ContactForm>,
) -> Result<Json<Value>, AppError> {
    let (name, email, message) = match (
        required(&form.name),
        required(&form.email),
        required(&form.message),
    ) {
        (Some(name), Some(email), Some(message)) => (name, email, message),
        _ => {
            return Err(AppError::BadRequest(
                "Please fill in all form fields".to_string(),
            ))
        }
    };

    let settings = &app.settings().mail;
    log::info!("sending contact form email to {}", settings.to);
    let data = app
        .mailer()
        .send(contact_email(settings, name, email, message))
        .await
        .map_err(AppError::MailFailed)?;

    Ok(Json(json!({ "success": true, "data": data })))
}
